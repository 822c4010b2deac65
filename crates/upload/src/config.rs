use jwplatform_client::{JWPLATFORM_UPLOAD_HOST, base_url_for};
use serde::{Deserialize, Serialize};

use crate::error::UploadError;
use crate::{DEFAULT_RETRY_COUNT, MIN_PART_SIZE};

/// Settings shared by every upload of a [`MediaUploader`](crate::MediaUploader).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Size of every part but the last, in bytes. Files no larger than this
    /// are uploaded directly.
    pub target_part_size: u64,
    /// Total attempts per part (or per direct upload), at least 1.
    pub retry_count: u32,
    /// Base URL of the upload host.
    pub upload_base_url: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            target_part_size: MIN_PART_SIZE,
            retry_count: DEFAULT_RETRY_COUNT,
            upload_base_url: base_url_for(JWPLATFORM_UPLOAD_HOST),
        }
    }
}

impl UploadConfig {
    pub fn with_target_part_size(mut self, size: u64) -> Self {
        self.target_part_size = size;
        self
    }

    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    /// Sets the upload host; a bare host name is reached over https.
    pub fn with_upload_host(mut self, host: &str) -> Self {
        self.upload_base_url = base_url_for(host);
        self
    }

    /// Checks the retry count. The part size is checked by the multipart
    /// engine, since direct uploads don't split the file.
    pub fn validate(&self) -> Result<(), UploadError> {
        if self.retry_count == 0 {
            return Err(UploadError::InvalidRetryCount);
        }
        Ok(())
    }

    pub(crate) fn check_part_size(&self) -> Result<(), UploadError> {
        if self.target_part_size < MIN_PART_SIZE {
            return Err(UploadError::PartSizeTooSmall {
                size: self.target_part_size,
                min: MIN_PART_SIZE,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = UploadConfig::default();
        assert_eq!(config.target_part_size, 5 * 1024 * 1024);
        assert_eq!(config.retry_count, 3);
        assert_eq!(config.upload_base_url, "https://upload.jwplayer.com");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn upload_host_override() {
        let config = UploadConfig::default().with_upload_host("upload.example.com");
        assert_eq!(config.upload_base_url, "https://upload.example.com");
        let config = UploadConfig::default().with_upload_host("http://127.0.0.1:9000/");
        assert_eq!(config.upload_base_url, "http://127.0.0.1:9000");
    }

    #[test]
    fn zero_retries_rejected() {
        let err = UploadConfig::default().with_retry_count(0).validate().unwrap_err();
        assert!(matches!(err, UploadError::InvalidRetryCount));
    }

    #[test]
    fn small_part_size_rejected() {
        let config = UploadConfig::default().with_target_part_size(MIN_PART_SIZE - 1);
        assert!(matches!(
            config.check_part_size(),
            Err(UploadError::PartSizeTooSmall { .. })
        ));
        assert!(UploadConfig::default().check_part_size().is_ok());
    }
}
