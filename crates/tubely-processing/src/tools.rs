//! External media tools (ffprobe / ffmpeg)
//!
//! [`MediaTools`] is the seam between the pipeline and the subprocesses it
//! drives, so stages can be exercised without the binaries installed.

use async_trait::async_trait;
use std::path::Path;
use std::process::Output;
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Failed to run {tool}: {source}")]
    Spawn {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with {status}: {stderr}")]
    Exit {
        tool: &'static str,
        status: String,
        stderr: String,
    },

    #[error("Invalid path for {tool}: {path}")]
    InvalidPath { tool: &'static str, path: String },
}

impl ToolError {
    /// Captured diagnostic output, when the tool ran and failed
    pub fn stderr(&self) -> Option<&str> {
        match self {
            ToolError::Exit { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}

#[async_trait]
pub trait MediaTools: Send + Sync {
    /// Run the stream analyser and return its raw JSON output
    async fn probe(&self, input: &Path) -> Result<Vec<u8>, ToolError>;

    /// Copy `input` into `output` with the container index moved to the front
    async fn remux(&self, input: &Path, output: &Path) -> Result<(), ToolError>;
}

/// Validate that a path doesn't contain shell metacharacters or traversal
fn validate_path(tool: &'static str, path: &str) -> Result<(), ToolError> {
    let dangerous_chars = [';', '|', '&', '$', '`', '(', ')', '<', '>', '\n', '\r'];
    if path.is_empty() || path.chars().any(|c| dangerous_chars.contains(&c)) || path.contains("..")
    {
        return Err(ToolError::InvalidPath {
            tool,
            path: path.to_string(),
        });
    }
    Ok(())
}

fn validate_executable(tool: &'static str, path: &str) -> Result<(), ToolError> {
    validate_path(tool, path)?;
    if !path
        .chars()
        .all(|c| c.is_alphanumeric() || c == '/' || c == '-' || c == '_' || c == '.' || c == '\\')
    {
        return Err(ToolError::InvalidPath {
            tool,
            path: path.to_string(),
        });
    }
    Ok(())
}

fn check_status(tool: &'static str, output: &Output) -> Result<(), ToolError> {
    if output.status.success() {
        return Ok(());
    }
    Err(ToolError::Exit {
        tool,
        status: output.status.to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    })
}

/// ffprobe/ffmpeg run as child processes
#[derive(Debug, Clone)]
pub struct FfmpegTools {
    ffmpeg_path: String,
    ffprobe_path: String,
}

impl FfmpegTools {
    pub fn new(ffmpeg_path: String, ffprobe_path: String) -> Result<Self, ToolError> {
        validate_executable("ffmpeg", &ffmpeg_path)?;
        validate_executable("ffprobe", &ffprobe_path)?;
        Ok(Self {
            ffmpeg_path,
            ffprobe_path,
        })
    }

    /// Run `-version` on both binaries. Called once at startup so a missing
    /// tool fails the process instead of every upload.
    pub async fn verify(&self) -> Result<(), ToolError> {
        for (tool, path) in [("ffmpeg", &self.ffmpeg_path), ("ffprobe", &self.ffprobe_path)] {
            let output = Command::new(path)
                .arg("-version")
                .output()
                .await
                .map_err(|source| ToolError::Spawn { tool, source })?;
            check_status(tool, &output)?;

            let version = String::from_utf8_lossy(&output.stdout);
            tracing::info!(
                tool,
                path = %path,
                version = %version.lines().next().unwrap_or_default(),
                "Media tool available"
            );
        }
        Ok(())
    }
}

#[async_trait]
impl MediaTools for FfmpegTools {
    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffprobe",
        process.executable.path = %self.ffprobe_path,
        ffmpeg.operation = "probe"
    ))]
    async fn probe(&self, input: &Path) -> Result<Vec<u8>, ToolError> {
        validate_path("ffprobe", &input.to_string_lossy())?;

        let output = Command::new(&self.ffprobe_path)
            .args(["-v", "error", "-print_format", "json", "-show_streams"])
            .arg(input)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ToolError::Spawn {
                tool: "ffprobe",
                source,
            })?;

        check_status("ffprobe", &output)?;
        Ok(output.stdout)
    }

    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffmpeg",
        process.executable.path = %self.ffmpeg_path,
        ffmpeg.operation = "faststart"
    ))]
    async fn remux(&self, input: &Path, output: &Path) -> Result<(), ToolError> {
        validate_path("ffmpeg", &input.to_string_lossy())?;
        validate_path("ffmpeg", &output.to_string_lossy())?;

        let result = Command::new(&self.ffmpeg_path)
            .args(["-y", "-v", "error", "-i"])
            .arg(input)
            .args(["-c", "copy", "-movflags", "faststart", "-f", "mp4"])
            .arg(output)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ToolError::Spawn {
                tool: "ffmpeg",
                source,
            })?;

        check_status("ffmpeg", &result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_shell_metacharacters_in_tool_paths() {
        assert!(FfmpegTools::new("ffmpeg".into(), "ffprobe".into()).is_ok());
        assert!(FfmpegTools::new("/usr/bin/ffmpeg".into(), "/usr/bin/ffprobe".into()).is_ok());
        assert!(FfmpegTools::new("ffmpeg; rm -rf /".into(), "ffprobe".into()).is_err());
        assert!(FfmpegTools::new("ffmpeg".into(), "$(whoami)".into()).is_err());
        assert!(FfmpegTools::new("".into(), "ffprobe".into()).is_err());
    }

    #[tokio::test]
    async fn missing_binary_is_a_spawn_error() {
        let tools = FfmpegTools::new(
            "/nonexistent/tubely-ffmpeg".into(),
            "/nonexistent/tubely-ffprobe".into(),
        )
        .unwrap();

        let err = tools.verify().await.unwrap_err();
        assert!(matches!(err, ToolError::Spawn { tool: "ffmpeg", .. }));

        let err = tools.probe(Path::new("/tmp/input.mp4")).await.unwrap_err();
        assert!(matches!(err, ToolError::Spawn { tool: "ffprobe", .. }));
    }

    #[tokio::test]
    async fn rejects_unsafe_input_paths() {
        let tools = FfmpegTools::new("ffmpeg".into(), "ffprobe".into()).unwrap();
        let err = tools
            .probe(Path::new("/tmp/a;touch pwned.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidPath { .. }));
    }
}
