//! Application state shared by every handler.

use crate::auth::JwtAuth;
use std::sync::Arc;
use tubely_core::Config;
use tubely_db::VideoRepository;
use tubely_processing::{MediaTools, ThumbnailWriter, VideoPipeline};
use tubely_storage::{ReferenceResolver, Storage};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub videos: Arc<dyn VideoRepository>,
    pub storage: Arc<dyn Storage>,
    pub pipeline: VideoPipeline,
    pub thumbnails: ThumbnailWriter,
    pub resolver: ReferenceResolver,
    pub jwt: JwtAuth,
}

impl AppState {
    /// Wire the collaborators together. Everything configurable comes from
    /// `config`; the store, object storage and media tools are injected.
    pub fn new(
        config: Config,
        videos: Arc<dyn VideoRepository>,
        storage: Arc<dyn Storage>,
        tools: Arc<dyn MediaTools>,
    ) -> Self {
        let pipeline =
            VideoPipeline::from_config(&config, tools, storage.clone(), videos.clone());
        let thumbnails = ThumbnailWriter::new(
            config.assets_root.clone(),
            config.public_base_url.clone(),
            config.max_thumbnail_size_bytes,
            config.thumbnail_allowed_content_types.clone(),
        );
        let resolver = ReferenceResolver::new(storage.clone(), config.signed_url_ttl);
        let jwt = JwtAuth::new(&config.jwt_secret);

        Self {
            config,
            videos,
            storage,
            pipeline,
            thumbnails,
            resolver,
            jwt,
        }
    }
}
