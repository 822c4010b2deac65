//! Multipart upload engine.
//!
//! The file is cut into parts of `target_part_size` bytes (the last one
//! holds the remainder). Part links are listed from the upload session one
//! page at a time and the parts are sent in ascending order, one after the
//! other. A part whose link already carries the digest of the local bytes
//! was stored by an earlier attempt and is skipped, which is what makes a
//! resumed upload cheap. Once every part is stored the session is completed.

use std::future::Future;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncSeek};
use tracing::{debug, info, warn};

use crate::config::UploadConfig;
use crate::digest::{digests_match, md5_hex};
use crate::error::UploadError;
use crate::session::{PartLink, PartsPage, UploadSession};
use crate::source::MediaFile;
use crate::transport::{PartTransport, put_verified};
use crate::{CONNECTION_RETRY_COUNT, MAX_PAGE_SIZE, MAX_PART_COUNT};

pub struct MultipartUpload<'a> {
    session: &'a dyn UploadSession,
    transport: &'a dyn PartTransport,
    upload_id: &'a str,
    config: &'a UploadConfig,
}

/// Where a part sits in the upload.
struct PartInfo<'f> {
    position: u64,
    part_count: u64,
    file_name: &'f str,
}

impl<'a> MultipartUpload<'a> {
    pub fn new(
        session: &'a dyn UploadSession,
        transport: &'a dyn PartTransport,
        upload_id: &'a str,
        config: &'a UploadConfig,
    ) -> Self {
        Self {
            session,
            transport,
            upload_id,
            config,
        }
    }

    /// Uploads every part not yet stored, then completes the upload.
    ///
    /// On error the file cursor is at offset 0 and `complete` has not been
    /// called.
    pub async fn upload<R>(&self, file: &mut MediaFile<R>) -> Result<(), UploadError>
    where
        R: AsyncRead + AsyncSeek + Unpin + Send,
    {
        let result = self.run(file).await;
        if let Err(e) = &result {
            warn!(upload_id = self.upload_id, file = file.name(), error = %e, "multipart upload failed");
            file.rewind_after_failure().await;
        }
        result
    }

    async fn run<R>(&self, file: &mut MediaFile<R>) -> Result<(), UploadError>
    where
        R: AsyncRead + AsyncSeek + Unpin + Send,
    {
        self.config.validate()?;
        self.config.check_part_size()?;

        let part_size = self.config.target_part_size;
        let file_size = file.size().await?;
        let part_count = file_size.div_ceil(part_size);
        if part_count > MAX_PART_COUNT {
            return Err(UploadError::TooManyParts {
                file_size,
                part_count,
                max: MAX_PART_COUNT,
            });
        }
        if part_count == 0 {
            return Err(UploadError::InvalidContext(format!(
                "multipart upload of empty file {}",
                file.name()
            )));
        }

        file.rewind().await?;
        for (page, batch) in pages(part_count) {
            debug!(upload_id = self.upload_id, page, page_length = MAX_PAGE_SIZE, "listing part links");
            let mut parts = self.list_page(page).await?.parts;
            parts.sort_by_key(|p| p.part_number);

            let listed_before = u64::from(page - 1) * u64::from(MAX_PAGE_SIZE);
            if (parts.len() as u64) < batch {
                return Err(UploadError::MissingPartLinks {
                    expected: part_count,
                    available: listed_before + parts.len() as u64,
                });
            }
            parts.truncate(batch as usize);

            for (idx, link) in parts.iter().enumerate() {
                let position = listed_before + idx as u64 + 1;
                if link.part_number != position {
                    warn!(
                        upload_id = self.upload_id,
                        expected = position,
                        listed = link.part_number,
                        "part links out of sequence"
                    );
                    return Err(UploadError::InvalidUploadLink(position));
                }
                let expected = if position == part_count {
                    file_size - (part_count - 1) * part_size
                } else {
                    part_size
                };

                let data = file.read_part(expected).await?;
                if data.len() as u64 != expected {
                    return Err(UploadError::ShortRead {
                        part_number: position,
                        expected,
                        actual: data.len() as u64,
                    });
                }

                let info = PartInfo {
                    position,
                    part_count,
                    file_name: file.name(),
                };
                self.upload_part(link, data, &info).await?;
            }
        }

        retry_on_connection_drop("complete upload", || self.session.complete(self.upload_id))
            .await?;
        info!(upload_id = self.upload_id, file = file.name(), part_count, "upload complete");
        Ok(())
    }

    async fn list_page(&self, page: u32) -> Result<PartsPage, UploadError> {
        retry_on_connection_drop("list part links", || {
            self.session.list_parts(self.upload_id, page, MAX_PAGE_SIZE)
        })
        .await
    }

    async fn upload_part(
        &self,
        link: &PartLink,
        data: Bytes,
        info: &PartInfo<'_>,
    ) -> Result<(), UploadError> {
        let digest = md5_hex(&data);

        if let Some(recorded) = link.recorded_etag() {
            if digests_match(recorded, &digest) {
                debug!(part = info.position, "part already uploaded, skipping");
                return Ok(());
            }
            return Err(UploadError::Unrecoverable(format!(
                "part {} of {} for file {} was already uploaded with digest {}, but the local part has digest {}",
                info.position, info.part_count, info.file_name, recorded, digest
            )));
        }

        let Some(upload_link) = link.upload_link.as_deref() else {
            return Err(UploadError::InvalidUploadLink(info.position));
        };

        let retry_count = self.config.retry_count;
        let mut attempt = 0;
        loop {
            attempt += 1;
            match put_verified(self.transport, upload_link, data.clone(), &digest).await {
                Ok(()) => {
                    debug!(
                        upload_id = self.upload_id,
                        part = info.position,
                        part_count = info.part_count,
                        attempt,
                        "part uploaded"
                    );
                    return Ok(());
                }
                Err(e) if e.is_retryable() => {
                    warn!(
                        part = info.position,
                        part_count = info.part_count,
                        file = info.file_name,
                        attempt,
                        retry_count,
                        error = %e,
                        "part upload attempt failed"
                    );
                    if attempt >= retry_count {
                        return Err(UploadError::MaxRetriesExceeded {
                            retries: retry_count,
                            target: format!(
                                "part {} of {} for file {}",
                                info.position, info.part_count, info.file_name
                            ),
                            source: Box::new(e),
                        });
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Pages to list for `part_count` parts, with how many links each must
/// supply.
fn pages(part_count: u64) -> impl Iterator<Item = (u32, u64)> {
    let page_size = u64::from(MAX_PAGE_SIZE);
    (1..=part_count.div_ceil(page_size)).map(move |page| {
        let batch = (part_count - (page - 1) * page_size).min(page_size);
        (page as u32, batch)
    })
}

/// Runs `op`, repeating it while the connection drops, up to
/// [`CONNECTION_RETRY_COUNT`] attempts.
async fn retry_on_connection_drop<T, F, Fut>(what: &str, mut op: F) -> Result<T, UploadError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, UploadError>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op().await {
            Err(e) if e.is_connection_drop() && attempt < CONNECTION_RETRY_COUNT => {
                warn!(attempt, error = %e, "{what} failed, retrying");
            }
            result => return result,
        }
    }
}
