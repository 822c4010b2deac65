//! Upload-host endpoints of a multipart upload session.
//!
//! These calls go to the upload host, not the API host, and authenticate
//! with the per-upload token handed out when the media was created.

use percent_encoding::utf8_percent_encode;
use reqwest::Method;

use crate::client::{Client, QUERY_ENCODE_SET};
use crate::error::Error;
use crate::response::ApiResponse;

/// Default upload host.
pub const JWPLATFORM_UPLOAD_HOST: &str = "upload.jwplayer.com";

/// Client for one upload session, authenticated by its upload token.
#[derive(Debug, Clone)]
pub struct UploadsClient {
    inner: Client,
}

impl UploadsClient {
    /// Creates a client for `host` (bare host or full URL).
    pub fn new(upload_token: &str, host: &str) -> Result<Self, Error> {
        Ok(Self {
            inner: Client::with_host(upload_token, host)?,
        })
    }

    pub fn with_base_url(self, url: impl Into<String>) -> Self {
        Self {
            inner: self.inner.with_base_url(url),
        }
    }

    pub fn base_url(&self) -> &str {
        self.inner.base_url()
    }

    /// Lists one page of the session's parts.
    pub async fn list(
        &self,
        upload_id: &str,
        page: u32,
        page_length: u32,
    ) -> Result<ApiResponse, Error> {
        let query = [
            ("page".to_string(), page.to_string()),
            ("page_length".to_string(), page_length.to_string()),
        ];
        let path = format!("{}/parts", upload_path(upload_id));
        self.inner.request(Method::GET, &path, None, &query).await
    }

    /// Marks the session complete once every part is stored.
    pub async fn complete(&self, upload_id: &str) -> Result<ApiResponse, Error> {
        let path = format!("{}/complete", upload_path(upload_id));
        self.inner.request(Method::PUT, &path, None, &[]).await
    }
}

fn upload_path(upload_id: &str) -> String {
    format!("/v1/uploads/{}", utf8_percent_encode(upload_id, QUERY_ENCODE_SET))
}
