//! Staging Manager
//!
//! Materializes an inbound upload stream into a private temporary directory.
//! The directory and everything written into it (including remux output) is
//! removed when the [`StagedFile`] is dropped, on every exit path.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tubely_core::validation::extension_for_content_type;

#[derive(Debug, Error)]
pub enum StagingError {
    #[error("Failed to create staging file: {0}")]
    CreateFailed(#[source] std::io::Error),

    #[error("Failed to write staging file: {0}")]
    CopyFailed(#[source] std::io::Error),

    #[error("Upload exceeds the {limit} byte limit")]
    TooLarge { limit: u64 },

    #[error("Upload stream aborted: {0}")]
    Aborted(String),

    #[error("Upload is empty")]
    Empty,
}

/// Where uploads are staged and how large they may be
#[derive(Debug, Clone)]
pub struct StagingArea {
    root: Option<PathBuf>,
    max_bytes: u64,
}

/// A fully written upload inside its own temporary directory
#[derive(Debug)]
pub struct StagedFile {
    // Removes the directory on drop; must outlive `path`
    dir: TempDir,
    path: PathBuf,
    size_bytes: u64,
    content_type: String,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Private directory holding this upload and any derived files
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Open the staged file for reading from the start
    pub async fn open(&self) -> std::io::Result<tokio::fs::File> {
        tokio::fs::File::open(&self.path).await
    }
}

impl StagingArea {
    /// `root` of `None` stages under the OS temp directory
    pub fn new(root: Option<PathBuf>, max_bytes: u64) -> Self {
        Self { root, max_bytes }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Create this upload's private directory off the async workers.
    async fn create_dir(&self) -> std::io::Result<TempDir> {
        if let Some(root) = &self.root {
            tokio::fs::create_dir_all(root).await?;
        }

        let root = self.root.clone();
        tokio::task::spawn_blocking(move || {
            let mut builder = tempfile::Builder::new();
            builder.prefix("tubely-upload-");
            match root {
                Some(root) => builder.tempdir_in(root),
                None => builder.tempdir(),
            }
        })
        .await
        .map_err(std::io::Error::other)?
    }

    /// Copy `stream` into a new staged file.
    ///
    /// The size limit is checked before each chunk is written, so an oversized
    /// upload never lands on disk past the limit.
    #[tracing::instrument(skip(self, stream), fields(max_bytes = self.max_bytes))]
    pub async fn stage<S, E>(&self, stream: S, content_type: &str) -> Result<StagedFile, StagingError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Display,
    {
        let dir = self.create_dir().await.map_err(StagingError::CreateFailed)?;
        let path = dir
            .path()
            .join(format!("tubely-upload.{}", extension_for_content_type(content_type)));

        let mut file = tokio::fs::File::create(&path)
            .await
            .map_err(StagingError::CreateFailed)?;

        let mut stream = std::pin::pin!(stream);
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| StagingError::Aborted(e.to_string()))?;
            written += chunk.len() as u64;
            if written > self.max_bytes {
                return Err(StagingError::TooLarge {
                    limit: self.max_bytes,
                });
            }
            file.write_all(&chunk)
                .await
                .map_err(StagingError::CopyFailed)?;
        }

        if written == 0 {
            return Err(StagingError::Empty);
        }

        file.flush().await.map_err(StagingError::CopyFailed)?;
        file.sync_all().await.map_err(StagingError::CopyFailed)?;

        tracing::debug!(
            path = %path.display(),
            size_bytes = written,
            "Upload staged"
        );

        Ok(StagedFile {
            dir,
            path,
            size_bytes: written,
            content_type: content_type.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use tokio::io::AsyncReadExt;

    fn chunks(parts: &[&'static str]) -> impl Stream<Item = Result<Bytes, std::io::Error>> {
        let parts: Vec<Result<Bytes, std::io::Error>> = parts
            .iter()
            .map(|p| Ok(Bytes::from_static(p.as_bytes())))
            .collect();
        stream::iter(parts)
    }

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    async fn stages_whole_stream_and_cleans_up_on_drop() {
        let root = tempfile::tempdir().unwrap();
        let area = StagingArea::new(Some(root.path().to_path_buf()), 1024);

        let staged = area
            .stage(chunks(&["hello ", "world"]), "video/mp4")
            .await
            .unwrap();

        assert_eq!(staged.size_bytes(), 11);
        assert!(staged.path().ends_with("tubely-upload.mp4"));

        let mut contents = String::new();
        staged
            .open()
            .await
            .unwrap()
            .read_to_string(&mut contents)
            .await
            .unwrap();
        assert_eq!(contents, "hello world");

        let dir = staged.dir().to_path_buf();
        drop(staged);
        assert!(!dir.exists());
        assert_eq!(entries(root.path()), 0);
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected_and_removed() {
        let root = tempfile::tempdir().unwrap();
        let area = StagingArea::new(Some(root.path().to_path_buf()), 8);

        let err = area
            .stage(chunks(&["12345", "67890"]), "video/mp4")
            .await
            .unwrap_err();

        assert!(matches!(err, StagingError::TooLarge { limit: 8 }));
        assert_eq!(entries(root.path()), 0);
    }

    #[tokio::test]
    async fn stream_error_is_aborted() {
        let root = tempfile::tempdir().unwrap();
        let area = StagingArea::new(Some(root.path().to_path_buf()), 1024);

        let failing = stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "client went away",
            )),
        ]);
        let err = area.stage(failing, "video/mp4").await.unwrap_err();

        assert!(matches!(err, StagingError::Aborted(msg) if msg.contains("client went away")));
        assert_eq!(entries(root.path()), 0);
    }

    #[tokio::test]
    async fn missing_root_is_created_on_first_upload() {
        let base = tempfile::tempdir().unwrap();
        let root = base.path().join("var").join("staging");
        let area = StagingArea::new(Some(root.clone()), 1024);

        let staged = area.stage(chunks(&["clip"]), "video/mp4").await.unwrap();
        assert!(staged.dir().starts_with(&root));
        assert_eq!(entries(&root), 1);

        drop(staged);
        assert_eq!(entries(&root), 0);
    }

    #[tokio::test]
    async fn empty_upload_is_rejected() {
        let root = tempfile::tempdir().unwrap();
        let area = StagingArea::new(Some(root.path().to_path_buf()), 1024);

        let err = area.stage(chunks(&[]), "video/mp4").await.unwrap_err();
        assert!(matches!(err, StagingError::Empty));
        assert_eq!(entries(root.path()), 0);
    }
}
