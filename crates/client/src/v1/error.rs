/// Errors from the legacy v1 API.
#[derive(Debug, thiserror::Error)]
pub enum V1Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{code}: {message}")]
    Api { code: V1ErrorCode, message: String },
}

impl V1Error {
    pub fn code(&self) -> Option<V1ErrorCode> {
        match self {
            V1Error::Api { code, .. } => Some(*code),
            V1Error::Http(_) => None,
        }
    }

    pub(crate) fn unknown(message: impl Into<String>) -> Self {
        V1Error::Api {
            code: V1ErrorCode::Unknown,
            message: message.into(),
        }
    }
}

macro_rules! error_codes {
    ($($variant:ident => $name:literal,)*) => {
        /// Error codes reported in the `code` field of a v1 error body.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum V1ErrorCode {
            $($variant,)*
        }

        impl V1ErrorCode {
            /// Maps a reported code, with or without its `Error` suffix.
            /// Codes this client doesn't know become [`V1ErrorCode::Unknown`].
            pub fn from_code(code: &str) -> Self {
                let base = code.strip_suffix("Error").unwrap_or(code);
                match base {
                    $($name => Self::$variant,)*
                    _ => Self::Unknown,
                }
            }

            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)*
                }
            }
        }
    };
}

error_codes! {
    Unknown => "Unknown",
    NotFound => "NotFound",
    NoMethod => "NoMethod",
    NotImplemented => "NotImplemented",
    NotSupported => "NotSupported",
    CallFailed => "CallFailed",
    CallUnavailable => "CallUnavailable",
    CallInvalid => "CallInvalid",
    ParameterMissing => "ParameterMissing",
    ParameterEmpty => "ParameterEmpty",
    ParameterEncoding => "ParameterEncoding",
    ParameterInvalid => "ParameterInvalid",
    PreconditionFailed => "PreconditionFailed",
    ItemAlreadyExists => "ItemAlreadyExists",
    PermissionDenied => "PermissionDenied",
    Database => "Database",
    Integrity => "Integrity",
    DigestMissing => "DigestMissing",
    DigestInvalid => "DigestInvalid",
    FileUploadFailed => "FileUploadFailed",
    FileSizeMissing => "FileSizeMissing",
    FileSizeInvalid => "FileSizeInvalid",
    Internal => "Internal",
    ApiKeyMissing => "ApiKeyMissing",
    ApiKeyInvalid => "ApiKeyInvalid",
    TimestampMissing => "TimestampMissing",
    TimestampInvalid => "TimestampInvalid",
    TimestampExpired => "TimestampExpired",
    NonceMissing => "NonceMissing",
    NonceInvalid => "NonceInvalid",
    SignatureMissing => "SignatureMissing",
    SignatureInvalid => "SignatureInvalid",
    RateLimitExceeded => "RateLimitExceeded",
}

impl std::fmt::Display for V1ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}Error", self.as_str())
    }
}
