//! Reference Resolver
//!
//! Turns the `bucket,key` references held in video records into URLs a
//! client can fetch. Signed URLs are produced fresh on every read and are
//! never written back to the record.

use crate::traits::{Storage, StorageError};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tubely_core::{ObjectRef, Video};

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Failed to sign URL for {reference}: {message}")]
    SigningFailed { reference: String, message: String },

    #[error("Reference {reference} names a bucket this deployment does not serve")]
    UnknownStore { reference: String },
}

/// Resolves object references against the configured store
#[derive(Clone)]
pub struct ReferenceResolver {
    storage: Arc<dyn Storage>,
    default_ttl: Duration,
}

impl ReferenceResolver {
    pub fn new(storage: Arc<dyn Storage>, default_ttl: Duration) -> Self {
        Self {
            storage,
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Produce a client-usable URL for `reference`, valid for `ttl` when the
    /// backend signs its URLs.
    pub async fn resolve(&self, reference: &ObjectRef, ttl: Duration) -> Result<String, ResolveError> {
        if reference.bucket != self.storage.bucket() {
            return Err(ResolveError::UnknownStore {
                reference: reference.encode(),
            });
        }

        self.storage
            .presigned_get_url(&reference.key, ttl)
            .await
            .map_err(|e| {
                let message = match e {
                    StorageError::SigningFailed(msg) => msg,
                    other => other.to_string(),
                };
                ResolveError::SigningFailed {
                    reference: reference.encode(),
                    message,
                }
            })
    }

    /// Return a copy of `video` whose `video_url` is a freshly resolved URL.
    ///
    /// Records without a video, or holding a plain URL rather than a
    /// reference, come back unchanged.
    pub async fn sign_video(&self, mut video: Video) -> Result<Video, ResolveError> {
        let Some(reference) = video.object_ref() else {
            return Ok(video);
        };

        let url = self.resolve(&reference, self.default_ttl).await?;
        video.video_url = Some(url);
        Ok(video)
    }
}
