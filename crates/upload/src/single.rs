//! Direct upload of a whole file in one PUT.

use tokio::io::{AsyncRead, AsyncSeek};
use tracing::{debug, warn};

use crate::digest::md5_hex;
use crate::error::UploadError;
use crate::source::MediaFile;
use crate::transport::{PartTransport, put_verified};

/// Uploads a file to a direct link, verifying the returned ETag.
pub struct SingleUpload<'a> {
    transport: &'a dyn PartTransport,
    upload_link: &'a str,
    retry_count: u32,
}

impl<'a> SingleUpload<'a> {
    pub fn new(transport: &'a dyn PartTransport, upload_link: &'a str, retry_count: u32) -> Self {
        Self {
            transport,
            upload_link,
            retry_count,
        }
    }

    /// Reads the file from offset 0 and PUTs it, retrying digest mismatches
    /// and transport failures up to `retry_count` attempts in total.
    ///
    /// On error the file cursor is at offset 0.
    pub async fn upload<R>(&self, file: &mut MediaFile<R>) -> Result<(), UploadError>
    where
        R: AsyncRead + AsyncSeek + Unpin + Send,
    {
        let result = self.run(file).await;
        if result.is_err() {
            file.rewind_after_failure().await;
        }
        result
    }

    async fn run<R>(&self, file: &mut MediaFile<R>) -> Result<(), UploadError>
    where
        R: AsyncRead + AsyncSeek + Unpin + Send,
    {
        if self.retry_count == 0 {
            return Err(UploadError::InvalidRetryCount);
        }

        debug!(file = file.name(), "starting direct upload");
        file.rewind().await?;
        let data = file.read_remaining().await?;
        let expected = md5_hex(&data);

        let mut attempt = 0;
        loop {
            attempt += 1;
            match put_verified(self.transport, self.upload_link, data.clone(), &expected).await {
                Ok(()) => {
                    debug!(file = file.name(), bytes = data.len(), attempt, "direct upload done");
                    return Ok(());
                }
                Err(e) if e.is_retryable() => {
                    warn!(
                        file = file.name(),
                        attempt,
                        retry_count = self.retry_count,
                        error = %e,
                        "direct upload attempt failed"
                    );
                    if attempt >= self.retry_count {
                        return Err(UploadError::MaxRetriesExceeded {
                            retries: self.retry_count,
                            target: format!("file {}", file.name()),
                            source: Box::new(e),
                        });
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }
}
