//! Control plane of a multipart upload session.

use std::future::Future;
use std::pin::Pin;

use jwplatform_client::UploadsClient;
use serde::Deserialize;

use crate::error::UploadError;

/// Pre-signed target of one part.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PartLink {
    #[serde(alias = "id")]
    pub part_number: u64,
    #[serde(default)]
    pub upload_link: Option<String>,
    /// Digest of the data the server already holds for this part.
    #[serde(default)]
    pub etag: Option<String>,
}

impl PartLink {
    /// The recorded digest, ignoring empty values.
    pub fn recorded_etag(&self) -> Option<&str> {
        self.etag.as_deref().filter(|e| !e.trim().is_empty())
    }
}

/// One page of part links.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartsPage {
    #[serde(default)]
    pub parts: Vec<PartLink>,
    #[serde(default)]
    pub total: Option<u64>,
}

/// Lists part links and completes an upload, authenticated with the
/// session's upload token.
pub trait UploadSession: Send + Sync {
    fn list_parts<'a>(
        &'a self,
        upload_id: &'a str,
        page: u32,
        page_length: u32,
    ) -> Pin<Box<dyn Future<Output = Result<PartsPage, UploadError>> + Send + 'a>>;

    fn complete<'a>(
        &'a self,
        upload_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), UploadError>> + Send + 'a>>;
}

impl UploadSession for UploadsClient {
    fn list_parts<'a>(
        &'a self,
        upload_id: &'a str,
        page: u32,
        page_length: u32,
    ) -> Pin<Box<dyn Future<Output = Result<PartsPage, UploadError>> + Send + 'a>> {
        Box::pin(async move {
            let resp = self.list(upload_id, page, page_length).await?;
            resp.json::<PartsPage>()
                .map_err(|e| UploadError::Decode(format!("parts page: {e}")))
        })
    }

    fn complete<'a>(
        &'a self,
        upload_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), UploadError>> + Send + 'a>> {
        Box::pin(async move {
            UploadsClient::complete(self, upload_id).await?;
            Ok(())
        })
    }
}
