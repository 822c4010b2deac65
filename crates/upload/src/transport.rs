//! Transfer of part bytes to storage.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use reqwest::header::ETAG;
use tracing::debug;

use crate::digest::digests_match;
use crate::error::UploadError;

/// Uploads bytes to a pre-signed storage link.
///
/// Implemented over HTTP by [`HttpTransport`]; tests swap in mocks.
pub trait PartTransport: Send + Sync {
    /// PUTs `data` to `upload_link` and returns the `ETag` the storage
    /// reported, if any. A non-2xx answer is an error.
    fn put_part<'a>(
        &'a self,
        upload_link: &'a str,
        data: Bytes,
    ) -> Pin<Box<dyn Future<Output = Result<Option<String>, UploadError>> + Send + 'a>>;
}

/// [`PartTransport`] over plain HTTP PUTs.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a preconfigured client, e.g. one with timeouts.
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl PartTransport for HttpTransport {
    fn put_part<'a>(
        &'a self,
        upload_link: &'a str,
        data: Bytes,
    ) -> Pin<Box<dyn Future<Output = Result<Option<String>, UploadError>> + Send + 'a>> {
        Box::pin(async move {
            let len = data.len();
            let resp = self.http.put(upload_link).body(data).send().await?;
            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(UploadError::PartUpload {
                    status: status.as_u16(),
                    body,
                });
            }

            let etag = resp
                .headers()
                .get(ETAG)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            debug!(bytes = len, status = status.as_u16(), etag = ?etag, "part stored");
            Ok(etag)
        })
    }
}

/// PUTs `data` and checks the returned ETag against `expected`.
///
/// A missing ETag counts as a mismatch.
pub(crate) async fn put_verified(
    transport: &dyn PartTransport,
    upload_link: &str,
    data: Bytes,
    expected: &str,
) -> Result<(), UploadError> {
    match transport.put_part(upload_link, data).await? {
        Some(etag) if digests_match(&etag, expected) => Ok(()),
        Some(etag) => Err(UploadError::DataIntegrity {
            expected: expected.to_string(),
            actual: etag,
        }),
        None => Err(UploadError::DataIntegrity {
            expected: expected.to_string(),
            actual: String::new(),
        }),
    }
}
