//! Pipeline Orchestrator
//!
//! Drives one upload through `Staged -> Inspected -> Remuxed -> Uploaded ->
//! Committed`. Stages run strictly in order and are never retried; the first
//! failure ends the run. Temporary files are owned values, so they are gone
//! by the time an error reaches the caller.

use crate::inspect::{InspectionError, MediaInspector};
use crate::remux::{RemuxError, StreamRemuxer};
use crate::staging::{StagingArea, StagingError};
use crate::tools::MediaTools;
use bytes::Bytes;
use futures::Stream;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tubely_core::validation::{validate_content_type, ContentTypeError};
use tubely_core::{AppError, Classification, Config, Video};
use tubely_db::VideoRepository;
use tubely_storage::{object_key, Storage, StorageError, StoredObject};
use uuid::Uuid;

/// One inbound upload, as received from the client
pub struct AssetUpload<S> {
    pub user_id: Uuid,
    pub video_id: Uuid,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
    pub body: S,
}

/// Stage at which a run failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Validation,
    Staging,
    Inspection,
    Remux,
    Upload,
    Commit,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Validation => "validation",
            PipelineStage::Staging => "staging",
            PipelineStage::Inspection => "inspection",
            PipelineStage::Remux => "remux",
            PipelineStage::Upload => "upload",
            PipelineStage::Commit => "commit",
        }
    }
}

impl Display for PipelineStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ContentTypeError),

    #[error("Staging failed: {0}")]
    Staging(#[from] StagingError),

    #[error("Inspection failed: {0}")]
    Inspection(#[from] InspectionError),

    #[error("Remux failed: {0}")]
    Remux(#[from] RemuxError),

    #[error("Upload failed: {0}")]
    Upload(#[from] StorageError),

    #[error("Commit failed: {0}")]
    Commit(#[source] AppError),
}

impl PipelineError {
    pub fn stage(&self) -> PipelineStage {
        match self {
            PipelineError::Validation(_) => PipelineStage::Validation,
            PipelineError::Staging(_) => PipelineStage::Staging,
            PipelineError::Inspection(_) => PipelineStage::Inspection,
            PipelineError::Remux(_) => PipelineStage::Remux,
            PipelineError::Upload(_) => PipelineStage::Upload,
            PipelineError::Commit(_) => PipelineStage::Commit,
        }
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Validation(e) => AppError::InvalidInput(e.to_string()),
            PipelineError::Staging(StagingError::TooLarge { limit }) => {
                AppError::PayloadTooLarge(format!("Video exceeds the {} byte limit", limit))
            }
            PipelineError::Staging(e @ (StagingError::Aborted(_) | StagingError::Empty)) => {
                AppError::BadRequest(e.to_string())
            }
            PipelineError::Staging(e) => AppError::Staging(e.to_string()),
            PipelineError::Inspection(e) => AppError::Inspection(e.to_string()),
            PipelineError::Remux(e) => AppError::Remux(e.to_string()),
            PipelineError::Upload(e) => AppError::Storage(e.to_string()),
            PipelineError::Commit(e) => e,
        }
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone)]
pub struct UploadReceipt {
    /// The committed record; `video_url` holds the encoded reference
    pub video: Video,
    pub object: StoredObject,
    pub classification: Classification,
}

#[derive(Clone)]
pub struct VideoPipeline {
    staging: StagingArea,
    inspector: MediaInspector,
    remuxer: StreamRemuxer,
    storage: Arc<dyn Storage>,
    videos: Arc<dyn VideoRepository>,
    allowed_content_types: Vec<String>,
}

impl VideoPipeline {
    pub fn new(
        staging: StagingArea,
        tools: Arc<dyn MediaTools>,
        storage: Arc<dyn Storage>,
        videos: Arc<dyn VideoRepository>,
        allowed_content_types: Vec<String>,
    ) -> Self {
        Self {
            staging,
            inspector: MediaInspector::new(tools.clone()),
            remuxer: StreamRemuxer::new(tools),
            storage,
            videos,
            allowed_content_types,
        }
    }

    pub fn from_config(
        config: &Config,
        tools: Arc<dyn MediaTools>,
        storage: Arc<dyn Storage>,
        videos: Arc<dyn VideoRepository>,
    ) -> Self {
        Self::new(
            StagingArea::new(config.staging_dir.clone(), config.max_video_size_bytes),
            tools,
            storage,
            videos,
            config.video_allowed_content_types.clone(),
        )
    }

    /// Ingest `upload` into `video` and commit the stored object's reference.
    ///
    /// The caller is responsible for authorization; `video` must already be
    /// owned by `upload.user_id`.
    #[tracing::instrument(
        skip_all,
        fields(video_id = %video.id, user_id = %upload.user_id, file_name = ?upload.file_name)
    )]
    pub async fn run<S, E>(
        &self,
        video: Video,
        upload: AssetUpload<S>,
    ) -> Result<UploadReceipt, PipelineError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Display,
    {
        let start = Instant::now();
        let video_id = video.id;

        match self.run_stages(video, upload).await {
            Ok(receipt) => {
                tracing::info!(
                    video_id = %video_id,
                    stage = "committed",
                    classification = %receipt.classification,
                    bucket = %receipt.object.bucket,
                    key = %receipt.object.key,
                    size_bytes = receipt.object.size_bytes,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Video upload committed"
                );
                Ok(receipt)
            }
            Err(e) => {
                let stage = e.stage();
                match stage {
                    PipelineStage::Validation => tracing::debug!(
                        video_id = %video_id,
                        failed_stage = %stage,
                        error = %e,
                        "Video upload rejected"
                    ),
                    _ => tracing::error!(
                        video_id = %video_id,
                        failed_stage = %stage,
                        error = %e,
                        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                        "Video upload failed"
                    ),
                }
                Err(e)
            }
        }
    }

    async fn run_stages<S, E>(
        &self,
        video: Video,
        upload: AssetUpload<S>,
    ) -> Result<UploadReceipt, PipelineError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Display,
    {
        let content_type =
            validate_content_type(upload.content_type.as_deref(), &self.allowed_content_types)?;

        let staged = self.staging.stage(upload.body, &content_type).await?;
        tracing::debug!(video_id = %video.id, stage = "staged", size_bytes = staged.size_bytes(), "Stage complete");

        let (aspect, classification) = self.inspector.inspect(staged.path()).await?;
        tracing::debug!(
            video_id = %video.id,
            stage = "inspected",
            aspect = ?aspect,
            classification = %classification,
            "Stage complete"
        );

        let remuxed = self.remuxer.remux(staged.path()).await?;
        tracing::debug!(video_id = %video.id, stage = "remuxed", size_bytes = remuxed.size_bytes(), "Stage complete");

        let key = object_key(classification, &content_type);
        let object = self
            .storage
            .put_file(&key, remuxed.path(), &content_type)
            .await?;
        tracing::debug!(video_id = %video.id, stage = "uploaded", key = %object.key, "Stage complete");

        // Local copies are no longer needed once the object is durable
        drop(remuxed);
        drop(staged);

        let video = self
            .videos
            .set_object_ref(video.id, &object.reference())
            .await
            .map_err(PipelineError::Commit)?;

        Ok(UploadReceipt {
            video,
            object,
            classification,
        })
    }
}
