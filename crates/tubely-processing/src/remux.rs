//! Stream Remuxer
//!
//! Rewrites an MP4 with its index (moov atom) ahead of the media data so
//! playback can start before the whole file has downloaded. Streams are
//! copied, never re-encoded.

use crate::tools::{MediaTools, ToolError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemuxError {
    #[error("Remux process failed: {0}")]
    ProcessFailed(#[from] ToolError),

    #[error("Remux produced an empty file")]
    EmptyOutput,

    #[error("Remux output missing: {0}")]
    WriteFailed(#[source] std::io::Error),
}

/// Remux output; the file is deleted when this value is dropped
#[derive(Debug)]
pub struct RemuxedFile {
    path: PathBuf,
    size_bytes: u64,
}

impl RemuxedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }
}

impl Drop for RemuxedFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(error = %e, path = %self.path.display(), "Failed to remove remux output");
            }
        }
    }
}

/// `{input}.processing`
fn output_path(input: &Path) -> PathBuf {
    let mut raw = input.as_os_str().to_owned();
    raw.push(".processing");
    PathBuf::from(raw)
}

#[derive(Clone)]
pub struct StreamRemuxer {
    tools: Arc<dyn MediaTools>,
}

impl StreamRemuxer {
    pub fn new(tools: Arc<dyn MediaTools>) -> Self {
        Self { tools }
    }

    /// Produce a fast-start copy of `input` next to it.
    ///
    /// A zero exit status is not trusted on its own: the output must exist
    /// and be non-empty.
    pub async fn remux(&self, input: &Path) -> Result<RemuxedFile, RemuxError> {
        let start = std::time::Instant::now();

        // Owns the output path from here on, so partial output is removed on failure
        let mut output = RemuxedFile {
            path: output_path(input),
            size_bytes: 0,
        };

        if let Err(e) = self.tools.remux(input, &output.path).await {
            tracing::error!(
                error = %e,
                stderr = e.stderr().unwrap_or_default(),
                input = %input.display(),
                "ffmpeg remux failed"
            );
            return Err(RemuxError::ProcessFailed(e));
        }

        let metadata = tokio::fs::metadata(&output.path)
            .await
            .map_err(RemuxError::WriteFailed)?;
        if metadata.len() == 0 {
            return Err(RemuxError::EmptyOutput);
        }
        output.size_bytes = metadata.len();

        tracing::info!(
            input = %input.display(),
            size_bytes = output.size_bytes,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Fast-start remux completed"
        );

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    enum Behaviour {
        Copy,
        WriteEmpty,
        WriteNothing,
        FailAfterPartialWrite,
    }

    struct ScriptedRemux(Behaviour);

    #[async_trait]
    impl MediaTools for ScriptedRemux {
        async fn probe(&self, _input: &Path) -> Result<Vec<u8>, ToolError> {
            unreachable!("remuxer never probes")
        }

        async fn remux(&self, input: &Path, output: &Path) -> Result<(), ToolError> {
            match self.0 {
                Behaviour::Copy => {
                    tokio::fs::copy(input, output).await.unwrap();
                    Ok(())
                }
                Behaviour::WriteEmpty => {
                    tokio::fs::write(output, b"").await.unwrap();
                    Ok(())
                }
                Behaviour::WriteNothing => Ok(()),
                Behaviour::FailAfterPartialWrite => {
                    tokio::fs::write(output, b"partial").await.unwrap();
                    Err(ToolError::Exit {
                        tool: "ffmpeg",
                        status: "exit status: 1".to_string(),
                        stderr: "moov atom not found".to_string(),
                    })
                }
            }
        }
    }

    async fn input_in(dir: &Path) -> PathBuf {
        let input = dir.join("tubely-upload.mp4");
        tokio::fs::write(&input, b"ftyp....mdat....moov").await.unwrap();
        input
    }

    #[tokio::test]
    async fn writes_processing_file_and_removes_it_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let input = input_in(dir.path()).await;

        let remuxer = StreamRemuxer::new(Arc::new(ScriptedRemux(Behaviour::Copy)));
        let output = remuxer.remux(&input).await.unwrap();

        assert_eq!(output.path(), dir.path().join("tubely-upload.mp4.processing"));
        assert_eq!(output.size_bytes(), 20);

        let path = output.path().to_path_buf();
        drop(output);
        assert!(!path.exists());
        assert!(input.exists());
    }

    #[tokio::test]
    async fn empty_output_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = input_in(dir.path()).await;

        let remuxer = StreamRemuxer::new(Arc::new(ScriptedRemux(Behaviour::WriteEmpty)));
        let err = remuxer.remux(&input).await.unwrap_err();

        assert!(matches!(err, RemuxError::EmptyOutput));
        assert!(!output_path(&input).exists());
    }

    #[tokio::test]
    async fn missing_output_is_write_failed() {
        let dir = tempfile::tempdir().unwrap();
        let input = input_in(dir.path()).await;

        let remuxer = StreamRemuxer::new(Arc::new(ScriptedRemux(Behaviour::WriteNothing)));
        let err = remuxer.remux(&input).await.unwrap_err();
        assert!(matches!(err, RemuxError::WriteFailed(_)));
    }

    #[tokio::test]
    async fn process_failure_removes_partial_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = input_in(dir.path()).await;

        let remuxer = StreamRemuxer::new(Arc::new(ScriptedRemux(
            Behaviour::FailAfterPartialWrite,
        )));
        let err = remuxer.remux(&input).await.unwrap_err();

        match err {
            RemuxError::ProcessFailed(tool) => {
                assert_eq!(tool.stderr(), Some("moov atom not found"))
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!output_path(&input).exists());
    }
}
