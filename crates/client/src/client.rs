//! JW Platform v2 API client.
//!
//! Async HTTP client using `reqwest` with Bearer token authentication.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::Method;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::Value;
use tracing::debug;

use crate::error::{ApiError, Error};
use crate::resource::SiteResource;
use crate::response::ApiResponse;

/// Default API host.
pub const JWPLATFORM_API_HOST: &str = "api.jwplayer.com";

const USER_AGENT: &str = concat!("jwplatform_client-rust/", env!("CARGO_PKG_VERSION"));

/// Characters left unescaped in query strings and path segments.
pub(crate) const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// JW Platform v2 API client.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
}

impl Client {
    /// Creates a client for the default API host.
    pub fn new(secret: &str) -> Result<Self, Error> {
        Self::with_host(secret, JWPLATFORM_API_HOST)
    }

    /// Creates a client for `host`.
    ///
    /// A bare host name is reached over https; a value that already carries
    /// a scheme (`http://127.0.0.1:8080`) is used as-is.
    pub fn with_host(secret: &str, host: &str) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {secret}")).map_err(|_| Error::InvalidSecret)?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url_for(host),
        })
    }

    /// Overrides the base URL (scheme, host and port).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends a request and returns the response whatever its status.
    ///
    /// `path` may already carry a query string.
    pub async fn raw_request(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<ApiResponse, Error> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.http.request(method, &url);
        if let Some(body) = body {
            req = req.body(body);
        }

        let resp = req.send().await?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await?.to_vec();
        Ok(ApiResponse::new(status, body))
    }

    /// Sends a JSON request; non-2xx statuses become [`Error::Api`].
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        query: &[(String, String)],
    ) -> Result<ApiResponse, Error> {
        let target = with_query(path, query);
        let body = body.map(serde_json::to_vec).transpose()?;

        debug!(%method, target = %target, "API request");
        let resp = self.raw_request(method, &target, body).await?;

        if !resp.is_success() {
            let err = ApiError::from_response(resp.status, &resp.body);
            debug!(status = resp.status, kind = ?err.kind, "API request failed");
            return Err(Error::Api(err));
        }
        Ok(resp)
    }

    pub fn media(&self) -> SiteResource<'_> {
        SiteResource::new(self, "media")
    }

    pub fn playlists(&self) -> SiteResource<'_> {
        SiteResource::new(self, "playlists")
    }

    pub fn players(&self) -> SiteResource<'_> {
        SiteResource::new(self, "players")
    }

    pub fn channels(&self) -> SiteResource<'_> {
        SiteResource::new(self, "channels")
    }

    pub fn thumbnails(&self) -> SiteResource<'_> {
        SiteResource::new(self, "thumbnails")
    }
}

/// Turns a host or URL into a base URL without a trailing slash.
///
/// A bare host name gets `https://`; anything with a scheme is kept.
pub fn base_url_for(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.contains("://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

/// Appends percent-encoded query parameters to `path`.
pub(crate) fn with_query(path: &str, query: &[(String, String)]) -> String {
    if query.is_empty() {
        return path.to_string();
    }
    let encoded = query
        .iter()
        .map(|(k, v)| {
            format!(
                "{}={}",
                utf8_percent_encode(k, QUERY_ENCODE_SET),
                utf8_percent_encode(v, QUERY_ENCODE_SET)
            )
        })
        .collect::<Vec<_>>()
        .join("&");
    let sep = if path.contains('?') { '&' } else { '?' };
    format!("{path}{sep}{encoded}")
}
