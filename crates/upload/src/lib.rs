//! Media uploads to JW Platform.
//!
//! Small files go up in one PUT to a direct link. Larger files are split into
//! parts that are uploaded one by one to pre-signed links handed out by the
//! upload host, each verified against its MD5 digest, then completed. A
//! multipart upload that got interrupted can be resumed from its
//! [`UploadContext`]: parts the server already holds are skipped.

mod config;
mod context;
mod digest;
mod error;
mod media;
mod multipart;
mod session;
mod single;
mod source;
mod transport;

#[cfg(test)]
mod testing;

pub use config::UploadConfig;
pub use context::{UploadContext, UploadMethod};
pub use digest::{digests_match, md5_hex, normalize_digest};
pub use error::{ErrorKind, UploadError};
pub use media::{MediaRequest, MediaUploader, ResumeOutcome, determine_upload_method};
pub use multipart::MultipartUpload;
pub use session::{PartLink, PartsPage, UploadSession};
pub use single::SingleUpload;
pub use source::MediaFile;
pub use transport::{HttpTransport, PartTransport};

/// Page length used when listing part links.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Smallest accepted part size: 5 MiB.
pub const MIN_PART_SIZE: u64 = 5 * 1024 * 1024;

/// Largest file the platform accepts.
pub const MAX_FILE_SIZE: u64 = 25 * 1000 * 1024 * 1024;

/// A multipart upload has at most this many parts.
pub const MAX_PART_COUNT: u64 = 10_000;

pub const DEFAULT_RETRY_COUNT: u32 = 3;

/// Attempts for listing parts and completing an upload when the connection
/// drops.
pub const CONNECTION_RETRY_COUNT: u32 = 3;
