//! Media creation and upload orchestration.

use jwplatform_client::{Client, UploadsClient};
use serde_json::{Map, Value};
use tokio::io::{AsyncRead, AsyncSeek};
use tracing::{debug, info};

use crate::config::UploadConfig;
use crate::context::{UploadContext, UploadMethod};
use crate::error::UploadError;
use crate::multipart::MultipartUpload;
use crate::single::SingleUpload;
use crate::source::MediaFile;
use crate::transport::HttpTransport;
use crate::MAX_FILE_SIZE;

/// Picks direct or multipart upload for a file of `file_size` bytes.
///
/// Files over [`MAX_FILE_SIZE`] are rejected.
pub fn determine_upload_method(
    file_size: u64,
    target_part_size: u64,
) -> Result<UploadMethod, UploadError> {
    if file_size > MAX_FILE_SIZE {
        return Err(UploadError::FileTooLarge {
            size: file_size,
            max: MAX_FILE_SIZE,
        });
    }
    if file_size <= target_part_size {
        Ok(UploadMethod::Direct)
    } else {
        Ok(UploadMethod::Multipart)
    }
}

/// What to create when a direct upload has to start over as a new media.
#[derive(Debug, Clone)]
pub struct MediaRequest {
    pub site_id: String,
    pub body: Value,
    pub query_params: Vec<(String, String)>,
}

/// Result of [`MediaUploader::resume`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeOutcome {
    /// The upload of the given context was finished.
    Resumed,
    /// A new media was created and uploaded; its context replaces the old one.
    Restarted(UploadContext),
}

/// Creates media records and uploads their files.
#[derive(Debug, Clone)]
pub struct MediaUploader {
    client: Client,
    transport: HttpTransport,
    config: UploadConfig,
}

impl MediaUploader {
    pub fn new(client: Client, config: UploadConfig) -> Self {
        Self {
            client,
            transport: HttpTransport::new(),
            config,
        }
    }

    pub fn with_transport(mut self, transport: HttpTransport) -> Self {
        self.transport = transport;
        self
    }

    /// Creates the media record for `file` and returns its upload context.
    ///
    /// `body["upload"]["method"]` is set from the file size; the rest of
    /// `body` is sent as given. Nothing is transferred.
    pub async fn create_media_and_get_upload_context<R>(
        &self,
        file: &mut MediaFile<R>,
        body: Value,
        query_params: &[(String, String)],
        site_id: &str,
    ) -> Result<UploadContext, UploadError>
    where
        R: AsyncRead + AsyncSeek + Unpin + Send,
    {
        self.config.validate()?;
        let file_size = file.size().await?;
        let method = determine_upload_method(file_size, self.config.target_part_size)?;
        if method == UploadMethod::Multipart {
            self.config.check_part_size()?;
        }
        let body = with_upload_method(body, method);

        debug!(site_id, file = file.name(), file_size, %method, "creating media");
        let resp = self.client.media().create(site_id, &body, query_params).await?;
        let context = UploadContext::from_create_response(method, &resp);
        info!(
            site_id,
            media_id = resp.str_field("id").unwrap_or_default(),
            %method,
            "media created"
        );
        Ok(context)
    }

    /// Uploads `file` as described by `context`.
    ///
    /// On error the file cursor is at offset 0.
    pub async fn upload<R>(
        &self,
        file: &mut MediaFile<R>,
        context: &UploadContext,
    ) -> Result<(), UploadError>
    where
        R: AsyncRead + AsyncSeek + Unpin + Send,
    {
        let result = self.dispatch(file, context).await;
        if result.is_err() {
            file.rewind_after_failure().await;
        }
        result
    }

    async fn dispatch<R>(
        &self,
        file: &mut MediaFile<R>,
        context: &UploadContext,
    ) -> Result<(), UploadError>
    where
        R: AsyncRead + AsyncSeek + Unpin + Send,
    {
        self.config.validate()?;
        match context.upload_method() {
            UploadMethod::Direct => {
                let link = context.direct_link().ok_or_else(|| {
                    UploadError::InvalidContext("direct upload without a direct link".into())
                })?;
                SingleUpload::new(&self.transport, link, self.config.retry_count)
                    .upload(file)
                    .await
            }
            UploadMethod::Multipart => {
                let (Some(upload_id), Some(token)) = (context.upload_id(), context.upload_token())
                else {
                    return Err(UploadError::InvalidContext(
                        "multipart upload without an upload id and token".into(),
                    ));
                };
                let session = UploadsClient::new(token, &self.config.upload_base_url)?;
                MultipartUpload::new(&session, &self.transport, upload_id, &self.config)
                    .upload(file)
                    .await
            }
        }
    }

    /// Finishes an interrupted upload.
    ///
    /// A resumable context is uploaded again; parts the server already
    /// holds are skipped. A direct upload cannot be resumed: with `restart`
    /// a new media is created from it and uploaded instead, otherwise
    /// [`UploadError::NotResumable`] is returned.
    ///
    /// On error the file cursor is at offset 0.
    pub async fn resume<R>(
        &self,
        file: &mut MediaFile<R>,
        context: Option<&UploadContext>,
        restart: Option<&MediaRequest>,
    ) -> Result<ResumeOutcome, UploadError>
    where
        R: AsyncRead + AsyncSeek + Unpin + Send,
    {
        let result = self.resume_inner(file, context, restart).await;
        if result.is_err() {
            file.rewind_after_failure().await;
        }
        result
    }

    async fn resume_inner<R>(
        &self,
        file: &mut MediaFile<R>,
        context: Option<&UploadContext>,
        restart: Option<&MediaRequest>,
    ) -> Result<ResumeOutcome, UploadError>
    where
        R: AsyncRead + AsyncSeek + Unpin + Send,
    {
        let context = context.ok_or(UploadError::MissingContext)?;

        if context.can_resume() {
            info!(
                upload_id = context.upload_id().unwrap_or_default(),
                file = file.name(),
                "resuming upload"
            );
            self.upload(file, context).await?;
            return Ok(ResumeOutcome::Resumed);
        }

        let method = context.upload_method();
        if method == UploadMethod::Multipart {
            return Err(UploadError::InvalidContext(
                "multipart upload without an upload id and token".into(),
            ));
        }
        let Some(request) = restart else {
            return Err(UploadError::NotResumable(method));
        };

        info!(site_id = %request.site_id, file = file.name(), "restarting upload as a new media");
        let context = self
            .create_media_and_get_upload_context(
                file,
                request.body.clone(),
                &request.query_params,
                &request.site_id,
            )
            .await?;
        self.upload(file, &context).await?;
        Ok(ResumeOutcome::Restarted(context))
    }
}

/// Sets `body["upload"]["method"]`, keeping every other field.
fn with_upload_method(body: Value, method: UploadMethod) -> Value {
    let mut fields = match body {
        Value::Object(fields) => fields,
        _ => Map::new(),
    };
    let mut upload = match fields.remove("upload") {
        Some(Value::Object(upload)) => upload,
        _ => Map::new(),
    };
    upload.insert("method".into(), Value::String(method.as_str().into()));
    fields.insert("upload".into(), Value::Object(upload));
    Value::Object(fields)
}
