//! Test helpers: build AppState and router for integration tests.
//!
//! Runs entirely in-process: in-memory metadata store, local storage under a
//! temp dir, and scripted media tools instead of ffprobe/ffmpeg.

pub mod auth;
pub mod media;

use axum_test::TestServer;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use tubely_api::auth::JwtAuth;
use tubely_api::setup::routes;
use tubely_api::AppState;
use tubely_core::{Config, NewVideo, Video};
use tubely_db::{InMemoryVideoRepository, VideoRepository};
use uuid::Uuid;

pub use media::FakeTools;

pub const PUBLIC_BASE_URL: &str = "http://tubely.test";

/// Test application: server, store, and owned resources.
pub struct TestApp {
    pub server: TestServer,
    pub videos: Arc<InMemoryVideoRepository>,
    pub jwt: JwtAuth,
    pub assets_root: PathBuf,
    pub staging_root: PathBuf,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Insert a draft video owned by `user_id`
    pub async fn seed_video(&self, user_id: Uuid) -> Video {
        let video = Video::new(
            user_id,
            NewVideo {
                title: "Boot demo".to_string(),
                description: "Walking in the new boots".to_string(),
            },
        );
        self.videos
            .create(&video)
            .await
            .expect("Failed to seed video");
        video
    }

    pub async fn videos_get(&self, id: Uuid) -> Video {
        self.videos
            .get(id)
            .await
            .expect("Failed to read video")
            .expect("Video should exist")
    }

    pub async fn videos_update(&self, video: &Video) {
        self.videos
            .update(video)
            .await
            .expect("Failed to update video");
    }

    /// Request path of a URL issued under [`PUBLIC_BASE_URL`]
    pub fn local_path<'a>(&self, url: &'a str) -> &'a str {
        url.strip_prefix(PUBLIC_BASE_URL)
            .expect("URL should be served by this deployment")
    }
}

pub fn test_config(temp_dir: &TempDir) -> Config {
    let vars: HashMap<&str, String> = HashMap::from([
        ("JWT_SECRET", auth::TEST_JWT_SECRET.to_string()),
        ("METADATA_STORE", "memory".to_string()),
        ("STORAGE_BACKEND", "local".to_string()),
        ("ASSETS_ROOT", temp_dir.path().join("assets").display().to_string()),
        ("STAGING_DIR", temp_dir.path().join("staging").display().to_string()),
        ("PUBLIC_BASE_URL", PUBLIC_BASE_URL.to_string()),
        ("MAX_VIDEO_SIZE_MB", "1".to_string()),
        ("MAX_THUMBNAIL_SIZE_MB", "1".to_string()),
    ]);

    let config = Config::from_lookup(|key| vars.get(key).cloned())
        .expect("Failed to build test config");
    config.validate().expect("Test config should be valid");
    config
}

/// Setup test app with a landscape-reporting fake probe
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(FakeTools::landscape()).await
}

pub async fn setup_test_app_with(tools: FakeTools) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let config = test_config(&temp_dir);
    let assets_root = config.assets_root.clone();
    let staging_root = temp_dir.path().join("staging");
    std::fs::create_dir_all(&staging_root).expect("Failed to create staging dir");

    let storage = tubely_storage::create_storage(&config)
        .await
        .expect("Failed to create local storage");
    let videos = Arc::new(InMemoryVideoRepository::new());
    let jwt = JwtAuth::new(&config.jwt_secret);

    let state = Arc::new(AppState::new(
        config,
        videos.clone(),
        storage,
        Arc::new(tools),
    ));
    let router = routes::setup_routes(state).expect("Failed to build router");
    let server = TestServer::new(router).expect("Failed to start test server");

    TestApp {
        server,
        videos,
        jwt,
        assets_root,
        staging_root,
        _temp_dir: temp_dir,
    }
}
