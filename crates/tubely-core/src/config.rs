//! Configuration module
//!
//! Settings are read once at startup and handed to the pipeline, storage and
//! API layers at construction time.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::storage_types::StorageBackend;

// Common constants
const SERVER_PORT: u16 = 8091;
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const MAX_VIDEO_SIZE_MB: u64 = 1024;
const MAX_THUMBNAIL_SIZE_MB: u64 = 10;
const SIGNED_URL_TTL_SECS: u64 = 300;
const VIDEO_ALLOWED_CONTENT_TYPES: &str = "video/mp4";
const THUMBNAIL_ALLOWED_CONTENT_TYPES: &str = "image/jpeg,image/png";

/// Which metadata store backs the video records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataStore {
    Postgres,
    Memory,
}

impl FromStr for MetadataStore {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(MetadataStore::Postgres),
            "memory" => Ok(MetadataStore::Memory),
            _ => Err(anyhow::anyhow!("Invalid metadata store: {}", s)),
        }
    }
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    pub jwt_secret: String,
    pub log_format: String,
    // Metadata store
    pub metadata_store: MetadataStore,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    // Object storage
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub assets_root: PathBuf,
    pub public_base_url: String,
    pub signed_url_ttl: Duration,
    // Media processing
    pub staging_dir: Option<PathBuf>,
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    pub max_video_size_bytes: u64,
    pub max_thumbnail_size_bytes: u64,
    pub video_allowed_content_types: Vec<String>,
    pub thumbnail_allowed_content_types: Vec<String>,
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Config {
    /// Load configuration from the process environment (and `.env` if present)
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Missing or unparsable optional values fall back to defaults; values that
    /// change behaviour in a way a typo would hide (port, backend names) are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let server_port: u16 = lookup("PORT")
            .unwrap_or_else(|| SERVER_PORT.to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?;

        let metadata_store = lookup("METADATA_STORE")
            .unwrap_or_else(|| "postgres".to_string())
            .parse::<MetadataStore>()?;

        let storage_backend = lookup("STORAGE_BACKEND")
            .unwrap_or_else(|| "s3".to_string())
            .parse::<StorageBackend>()?;

        let max_video_size_mb = lookup("MAX_VIDEO_SIZE_MB")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(MAX_VIDEO_SIZE_MB);

        let max_thumbnail_size_mb = lookup("MAX_THUMBNAIL_SIZE_MB")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(MAX_THUMBNAIL_SIZE_MB);

        let signed_url_ttl_secs = lookup("SIGNED_URL_TTL_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(SIGNED_URL_TTL_SECS);

        let max_video_size_bytes = max_video_size_mb
            .checked_mul(1024 * 1024)
            .ok_or_else(|| anyhow::anyhow!("MAX_VIDEO_SIZE_MB too large: {}", max_video_size_mb))?;
        let max_thumbnail_size_bytes = max_thumbnail_size_mb
            .checked_mul(1024 * 1024)
            .ok_or_else(|| {
                anyhow::anyhow!("MAX_THUMBNAIL_SIZE_MB too large: {}", max_thumbnail_size_mb)
            })?;

        let public_base_url = lookup("PUBLIC_BASE_URL")
            .unwrap_or_else(|| format!("http://localhost:{}", server_port))
            .trim_end_matches('/')
            .to_string();

        Ok(Config {
            server_port,
            cors_origins: split_list(&lookup("CORS_ORIGINS").unwrap_or_else(|| "*".to_string())),
            jwt_secret: lookup("JWT_SECRET").unwrap_or_default(),
            log_format: lookup("LOG_FORMAT").unwrap_or_else(|| "compact".to_string()),
            metadata_store,
            database_url: lookup("DATABASE_URL"),
            db_max_connections: lookup("DB_MAX_CONNECTIONS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: lookup("DB_TIMEOUT_SECONDS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            storage_backend,
            s3_bucket: lookup("S3_BUCKET"),
            s3_region: lookup("S3_REGION").or_else(|| lookup("AWS_REGION")),
            s3_endpoint: lookup("S3_ENDPOINT"),
            assets_root: PathBuf::from(lookup("ASSETS_ROOT").unwrap_or_else(|| "assets".to_string())),
            public_base_url,
            signed_url_ttl: Duration::from_secs(signed_url_ttl_secs),
            staging_dir: lookup("STAGING_DIR").map(PathBuf::from),
            ffmpeg_path: lookup("FFMPEG_PATH").unwrap_or_else(|| "ffmpeg".to_string()),
            ffprobe_path: lookup("FFPROBE_PATH").unwrap_or_else(|| "ffprobe".to_string()),
            max_video_size_bytes,
            max_thumbnail_size_bytes,
            video_allowed_content_types: split_list(
                &lookup("VIDEO_ALLOWED_CONTENT_TYPES")
                    .unwrap_or_else(|| VIDEO_ALLOWED_CONTENT_TYPES.to_string()),
            ),
            thumbnail_allowed_content_types: split_list(
                &lookup("THUMBNAIL_ALLOWED_CONTENT_TYPES")
                    .unwrap_or_else(|| THUMBNAIL_ALLOWED_CONTENT_TYPES.to_string()),
            ),
            environment,
        })
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.jwt_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 32 characters long"
            ));
        }

        if self.is_production() && self.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        if self.metadata_store == MetadataStore::Postgres {
            match self.database_url.as_deref() {
                Some(url) if url.starts_with("postgres://") || url.starts_with("postgresql://") => {}
                _ => {
                    return Err(anyhow::anyhow!(
                        "DATABASE_URL must be a valid PostgreSQL connection string"
                    ))
                }
            }
        }

        if self.storage_backend == StorageBackend::S3 {
            if self.s3_bucket.is_none() {
                return Err(anyhow::anyhow!(
                    "S3_BUCKET must be set when using S3 storage backend"
                ));
            }
            if self.s3_region.is_none() {
                return Err(anyhow::anyhow!(
                    "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                ));
            }
        }

        if self.video_allowed_content_types.is_empty() {
            return Err(anyhow::anyhow!(
                "VIDEO_ALLOWED_CONTENT_TYPES must name at least one content type"
            ));
        }

        if self.signed_url_ttl.is_zero() {
            return Err(anyhow::anyhow!("SIGNED_URL_TTL_SECS must be greater than zero"));
        }

        Ok(())
    }
}
