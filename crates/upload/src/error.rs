//! Upload errors and their classification.

use crate::context::UploadMethod;

/// Errors produced while creating, uploading or resuming media.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("part size of {size} bytes is below the minimum of {min} bytes")]
    PartSizeTooSmall { size: u64, min: u64 },

    #[error(
        "a file of {file_size} bytes splits into {part_count} parts, more than the maximum of {max}; increase the part size"
    )]
    TooManyParts {
        file_size: u64,
        part_count: u64,
        max: u64,
    },

    #[error("file of {size} bytes exceeds the maximum of {max} bytes")]
    FileTooLarge { size: u64, max: u64 },

    #[error("retry count must be at least 1")]
    InvalidRetryCount,

    #[error("no upload context given")]
    MissingContext,

    #[error("invalid upload context: {0}")]
    InvalidContext(String),

    #[error("a {0} upload cannot be resumed")]
    NotResumable(UploadMethod),

    #[error("digest mismatch: computed {expected}, server reported {actual:?}")]
    DataIntegrity { expected: String, actual: String },

    #[error("storage rejected the part with status {status}: {body}")]
    PartUpload { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("short read for part {part_number}: expected {expected} bytes, got {actual}")]
    ShortRead {
        part_number: u64,
        expected: u64,
        actual: u64,
    },

    #[error("invalid upload link for part {0}")]
    InvalidUploadLink(u64),

    #[error("upload session returned {available} part links, {expected} needed")]
    MissingPartLinks { expected: u64, available: u64 },

    #[error("{0}")]
    Unrecoverable(String),

    #[error("max retries ({retries}) exceeded while uploading {target}")]
    MaxRetriesExceeded {
        retries: u32,
        target: String,
        #[source]
        source: Box<UploadError>,
    },

    #[error("API error: {0}")]
    Api(#[from] jwplatform_client::Error),

    #[error("unexpected API response: {0}")]
    Decode(String),
}

/// Broad classes of [`UploadError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input; fails before any transfer.
    Configuration,
    /// Server-reported digest differs from the local one.
    DataIntegrity,
    /// The storage endpoint failed or the connection broke.
    Transport,
    /// Local preconditions for a part failed.
    Local,
    /// The server already holds different data for a part.
    Unrecoverable,
    RetriesExhausted,
    /// The control-plane API failed.
    ControlPlane,
}

impl ErrorKind {
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::DataIntegrity | ErrorKind::Transport)
    }
}

impl UploadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            UploadError::PartSizeTooSmall { .. }
            | UploadError::TooManyParts { .. }
            | UploadError::FileTooLarge { .. }
            | UploadError::InvalidRetryCount
            | UploadError::MissingContext
            | UploadError::InvalidContext(_)
            | UploadError::NotResumable(_) => ErrorKind::Configuration,
            UploadError::DataIntegrity { .. } => ErrorKind::DataIntegrity,
            UploadError::PartUpload { .. } | UploadError::Transport(_) | UploadError::Io(_) => {
                ErrorKind::Transport
            }
            UploadError::ShortRead { .. }
            | UploadError::InvalidUploadLink(_)
            | UploadError::MissingPartLinks { .. } => ErrorKind::Local,
            UploadError::Unrecoverable(_) => ErrorKind::Unrecoverable,
            UploadError::MaxRetriesExceeded { .. } => ErrorKind::RetriesExhausted,
            UploadError::Api(_) | UploadError::Decode(_) => ErrorKind::ControlPlane,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    /// True when the connection dropped before an answer came back.
    ///
    /// Listing parts and completing an upload are repeated on these.
    pub fn is_connection_drop(&self) -> bool {
        match self {
            UploadError::Api(e) => e.is_connection_error(),
            UploadError::Transport(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            UploadError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::TimedOut
            ),
            _ => false,
        }
    }
}
