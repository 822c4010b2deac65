//! The byte source of an upload.

use std::io::SeekFrom;
use std::path::Path;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt};
use tracing::warn;

/// A seekable media file owned by the caller.
///
/// Uploads borrow it mutably for the duration of one call and only move its
/// cursor. Whenever an upload fails, the cursor is back at offset 0 when the
/// error is returned.
#[derive(Debug)]
pub struct MediaFile<R> {
    reader: R,
    name: String,
}

impl MediaFile<tokio::fs::File> {
    /// Opens a file on disk; its path becomes the display name.
    pub async fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let file = tokio::fs::File::open(path).await?;
        Ok(Self::new(file, path.display().to_string()))
    }
}

impl<R> MediaFile<R>
where
    R: AsyncRead + AsyncSeek + Unpin + Send,
{
    pub fn new(reader: R, name: impl Into<String>) -> Self {
        Self {
            reader,
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Total size in bytes. The cursor is left where it was.
    pub async fn size(&mut self) -> std::io::Result<u64> {
        let pos = self.reader.stream_position().await?;
        let end = self.reader.seek(SeekFrom::End(0)).await?;
        self.reader.seek(SeekFrom::Start(pos)).await?;
        Ok(end)
    }

    pub async fn position(&mut self) -> std::io::Result<u64> {
        self.reader.stream_position().await
    }

    pub async fn rewind(&mut self) -> std::io::Result<()> {
        self.reader.seek(SeekFrom::Start(0)).await?;
        Ok(())
    }

    /// Reads up to `len` bytes; fewer only at end of file.
    pub async fn read_part(&mut self, len: u64) -> std::io::Result<Bytes> {
        let mut buf = Vec::with_capacity(usize::try_from(len).unwrap_or(0));
        (&mut self.reader).take(len).read_to_end(&mut buf).await?;
        Ok(Bytes::from(buf))
    }

    /// Reads from the cursor to the end of the file.
    pub async fn read_remaining(&mut self) -> std::io::Result<Bytes> {
        let mut buf = Vec::new();
        self.reader.read_to_end(&mut buf).await?;
        Ok(Bytes::from(buf))
    }

    /// Rewinds after a failed upload. The upload error is what the caller
    /// gets, so a failing seek is only logged.
    pub(crate) async fn rewind_after_failure(&mut self) {
        if let Err(e) = self.rewind().await {
            warn!(file = %self.name, error = %e, "failed to rewind media file");
        }
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}
