//! Error types for the v2 client.
//!
//! Every non-2xx response becomes an [`ApiError`] carrying the HTTP status,
//! its [`StatusKind`] classification and whatever error details the API put
//! in the body.

use serde::Deserialize;

/// Errors from the JW Platform client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Api(ApiError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid API secret")]
    InvalidSecret,
}

impl Error {
    /// HTTP status of an API error, if the request reached the server.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api(api) => Some(api.status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// True for a 429 response.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::Api(api) if api.kind == StatusKind::TooManyRequests)
    }

    /// True when the connection dropped or never got established.
    ///
    /// These are the failures worth repeating for idempotent calls: nothing
    /// was answered, so the server state is unknown but unchanged by a retry.
    pub fn is_connection_error(&self) -> bool {
        match self {
            Error::Http(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            _ => false,
        }
    }
}

/// A non-2xx answer from the API.
#[derive(Debug, Clone, thiserror::Error)]
#[error("API error {status} ({kind:?}): {}", self.summary())]
pub struct ApiError {
    pub status: u16,
    pub kind: StatusKind,
    pub errors: Vec<ErrorDetail>,
    /// Raw response body, kept for diagnostics when it isn't structured.
    pub body: String,
}

impl ApiError {
    /// Builds an error from a status code and raw body.
    ///
    /// The body is parsed as `{"errors": [{"code", "description"}]}` when it
    /// has that shape; anything else leaves `errors` empty.
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        let errors = serde_json::from_slice::<ErrorBody>(body)
            .map(|b| b.errors)
            .unwrap_or_default();
        Self {
            status,
            kind: StatusKind::from_status(status),
            errors,
            body: String::from_utf8_lossy(body).into_owned(),
        }
    }

    /// True for 4xx statuses.
    pub fn is_client_error(&self) -> bool {
        self.kind.is_client_error()
    }

    /// True for 5xx statuses.
    pub fn is_server_error(&self) -> bool {
        self.kind.is_server_error()
    }

    fn summary(&self) -> String {
        if self.errors.is_empty() {
            return self.body.clone();
        }
        self.errors
            .iter()
            .map(|e| format!("{}: {}", e.code, e.description))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// One entry of the `errors` array in an API error body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

/// Classification of an error status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    MethodNotAllowed,
    Conflict,
    UnprocessableEntity,
    TooManyRequests,
    /// Any other 4xx.
    ClientError,
    InternalServerError,
    BadGateway,
    ServiceUnavailable,
    GatewayTimeout,
    /// Any other 5xx.
    ServerError,
    /// Outside the 4xx/5xx ranges.
    Unexpected,
}

impl StatusKind {
    /// Maps an HTTP status code to its kind.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => Self::BadRequest,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            405 => Self::MethodNotAllowed,
            409 => Self::Conflict,
            422 => Self::UnprocessableEntity,
            429 => Self::TooManyRequests,
            400..=499 => Self::ClientError,
            500 => Self::InternalServerError,
            502 => Self::BadGateway,
            503 => Self::ServiceUnavailable,
            504 => Self::GatewayTimeout,
            500..=599 => Self::ServerError,
            _ => Self::Unexpected,
        }
    }

    pub fn is_client_error(self) -> bool {
        matches!(
            self,
            Self::BadRequest
                | Self::Unauthorized
                | Self::Forbidden
                | Self::NotFound
                | Self::MethodNotAllowed
                | Self::Conflict
                | Self::UnprocessableEntity
                | Self::TooManyRequests
                | Self::ClientError
        )
    }

    pub fn is_server_error(self) -> bool {
        matches!(
            self,
            Self::InternalServerError
                | Self::BadGateway
                | Self::ServiceUnavailable
                | Self::GatewayTimeout
                | Self::ServerError
        )
    }
}
