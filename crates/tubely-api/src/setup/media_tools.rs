//! ffprobe / ffmpeg discovery

use anyhow::{Context, Result};
use std::sync::Arc;
use tubely_core::Config;
use tubely_processing::{FfmpegTools, MediaTools};

/// Resolve the configured binaries and check both run before serving traffic
pub async fn setup_media_tools(config: &Config) -> Result<Arc<dyn MediaTools>> {
    let tools = FfmpegTools::new(config.ffmpeg_path.clone(), config.ffprobe_path.clone())
        .context("Invalid media tool path")?;

    tools
        .verify()
        .await
        .context("ffmpeg/ffprobe are not usable; install them or set FFMPEG_PATH and FFPROBE_PATH")?;

    Ok(Arc::new(tools))
}
