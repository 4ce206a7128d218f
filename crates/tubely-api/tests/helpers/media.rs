use async_trait::async_trait;
use std::path::Path;
use tubely_processing::{MediaTools, ToolError};

/// Scripted stand-in for ffprobe/ffmpeg. The probe reports a fixed display
/// aspect ratio; the remux copies input to output unchanged.
pub struct FakeTools {
    pub aspect_ratio: &'static str,
    pub fail_remux: bool,
}

impl FakeTools {
    pub fn landscape() -> Self {
        Self {
            aspect_ratio: "16:9",
            fail_remux: false,
        }
    }

    pub fn portrait() -> Self {
        Self {
            aspect_ratio: "9:16",
            fail_remux: false,
        }
    }

    pub fn broken_remux() -> Self {
        Self {
            aspect_ratio: "16:9",
            fail_remux: true,
        }
    }
}

#[async_trait]
impl MediaTools for FakeTools {
    async fn probe(&self, _input: &Path) -> Result<Vec<u8>, ToolError> {
        Ok(format!(
            r#"{{"streams":[{{"codec_type":"video","display_aspect_ratio":"{}"}}]}}"#,
            self.aspect_ratio
        )
        .into_bytes())
    }

    async fn remux(&self, input: &Path, output: &Path) -> Result<(), ToolError> {
        if self.fail_remux {
            return Err(ToolError::Exit {
                tool: "ffmpeg",
                status: "exit status: 1".to_string(),
                stderr: "moov atom not found".to_string(),
            });
        }
        tokio::fs::copy(input, output)
            .await
            .map(|_| ())
            .map_err(|source| ToolError::Spawn {
                tool: "ffmpeg",
                source,
            })
    }
}
