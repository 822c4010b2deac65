use std::fmt;

use jwplatform_client::ApiResponse;
use serde::{Deserialize, Serialize};

/// How a media file is transferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadMethod {
    /// One PUT of the whole file to a direct link.
    Direct,
    /// Parts uploaded to pre-signed links, then completed.
    Multipart,
}

impl UploadMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            UploadMethod::Direct => "direct",
            UploadMethod::Multipart => "multipart",
        }
    }
}

impl fmt::Display for UploadMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything needed to carry out, or pick up again, the upload of one media.
///
/// Built from the media-create response and never changed afterwards. It is
/// serializable so it can be kept across processes and handed to
/// [`MediaUploader::resume`](crate::MediaUploader::resume).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadContext {
    upload_method: UploadMethod,
    #[serde(default)]
    upload_id: Option<String>,
    #[serde(default)]
    upload_token: Option<String>,
    #[serde(default)]
    direct_link: Option<String>,
}

impl UploadContext {
    pub fn new(
        upload_method: UploadMethod,
        upload_id: Option<String>,
        upload_token: Option<String>,
        direct_link: Option<String>,
    ) -> Self {
        Self {
            upload_method,
            upload_id,
            upload_token,
            direct_link,
        }
    }

    /// Reads `upload_id`, `upload_token` and `upload_link` from a media-create
    /// response. Absent fields stay `None`.
    pub fn from_create_response(upload_method: UploadMethod, resp: &ApiResponse) -> Self {
        let field = |key: &str| resp.str_field(key).map(str::to_string);
        Self::new(
            upload_method,
            field("upload_id"),
            field("upload_token"),
            field("upload_link"),
        )
    }

    pub fn upload_method(&self) -> UploadMethod {
        self.upload_method
    }

    pub fn upload_id(&self) -> Option<&str> {
        self.upload_id.as_deref()
    }

    pub fn upload_token(&self) -> Option<&str> {
        self.upload_token.as_deref()
    }

    pub fn direct_link(&self) -> Option<&str> {
        self.direct_link.as_deref()
    }

    /// Only multipart uploads with both an id and a token can be resumed.
    pub fn can_resume(&self) -> bool {
        self.upload_method == UploadMethod::Multipart
            && self.upload_id.is_some()
            && self.upload_token.is_some()
    }
}
