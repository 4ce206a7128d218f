//! Tubely Processing Library
//!
//! The video ingestion pipeline: stage an upload to a private temp file,
//! classify its aspect ratio with ffprobe, remux it for fast start with
//! ffmpeg, store it, and commit the object reference to the video record.
//! Also hosts the bounded thumbnail writer.

pub mod inspect;
pub mod pipeline;
pub mod remux;
pub mod staging;
pub mod thumbnail;
pub mod tools;

pub use inspect::{InspectionError, MediaInspector, ProbedAspect};
pub use pipeline::{AssetUpload, PipelineError, PipelineStage, UploadReceipt, VideoPipeline};
pub use remux::{RemuxError, RemuxedFile, StreamRemuxer};
pub use staging::{StagedFile, StagingArea, StagingError};
pub use thumbnail::{ThumbnailError, ThumbnailWriter};
pub use tools::{FfmpegTools, MediaTools, ToolError};
