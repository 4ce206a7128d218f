//! Thumbnail writer
//!
//! Thumbnails skip the pipeline: the image is validated by declared type,
//! streamed into the assets directory under a size cap, and served as a
//! plain public URL.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tubely_core::validation::{extension_for_content_type, validate_content_type, ContentTypeError};
use tubely_storage::PartialFile;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ThumbnailError {
    #[error("Invalid thumbnail: {0}")]
    InvalidContentType(#[from] ContentTypeError),

    #[error("Thumbnail exceeds the {limit} byte limit")]
    TooLarge { limit: u64 },

    #[error("Thumbnail upload aborted: {0}")]
    Aborted(String),

    #[error("Thumbnail is empty")]
    Empty,

    #[error("Failed to write thumbnail: {0}")]
    WriteFailed(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct ThumbnailWriter {
    assets_root: PathBuf,
    public_base_url: String,
    max_bytes: u64,
    allowed_content_types: Vec<String>,
}

impl ThumbnailWriter {
    pub fn new(
        assets_root: PathBuf,
        public_base_url: String,
        max_bytes: u64,
        allowed_content_types: Vec<String>,
    ) -> Self {
        Self {
            assets_root,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            max_bytes,
            allowed_content_types,
        }
    }

    /// Store a thumbnail for `video_id` and return its public URL.
    ///
    /// Replaces any previous thumbnail with the same extension.
    #[tracing::instrument(skip(self, stream))]
    pub async fn write<S, E>(
        &self,
        video_id: Uuid,
        content_type: Option<&str>,
        stream: S,
    ) -> Result<String, ThumbnailError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Display,
    {
        let content_type = validate_content_type(content_type, &self.allowed_content_types)?;
        let file_name = format!("{}.{}", video_id, extension_for_content_type(&content_type));

        tokio::fs::create_dir_all(&self.assets_root).await?;
        let dest = self.assets_root.join(&file_name);
        let partial = PartialFile::beside(&dest);

        let size_bytes = self.copy_bounded(stream, partial.path()).await?;
        partial.commit().await?;
        tracing::info!(
            path = %dest.display(),
            content_type = %content_type,
            size_bytes,
            "Thumbnail stored"
        );

        Ok(format!("{}/assets/{}", self.public_base_url, file_name))
    }

    async fn copy_bounded<S, E>(&self, stream: S, path: &Path) -> Result<u64, ThumbnailError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Display,
    {
        let mut file = tokio::fs::File::create(path).await?;
        let mut stream = std::pin::pin!(stream);
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| ThumbnailError::Aborted(e.to_string()))?;
            written += chunk.len() as u64;
            if written > self.max_bytes {
                return Err(ThumbnailError::TooLarge {
                    limit: self.max_bytes,
                });
            }
            file.write_all(&chunk).await?;
        }

        if written == 0 {
            return Err(ThumbnailError::Empty);
        }

        file.flush().await?;
        Ok(written)
    }
}
