use crate::keys::validate_key;
use crate::partial::PartialFile;
use crate::traits::{Storage, StorageError, StorageResult, StoredObject};
use crate::StorageBackend;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Bucket name reported by the local backend in object references
pub const LOCAL_BUCKET: &str = "local";

/// Local filesystem storage implementation
///
/// Objects are written under `base_path` and served publicly (no signing) at
/// `{base_url}/{key}`.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "./assets")
    /// * `base_url` - Base URL the directory is served from (e.g., "http://localhost:8091/assets")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::Config(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
        })
    }

    /// Convert storage key to filesystem path with traversal validation
    fn key_to_path(&self, key: &str) -> StorageResult<PathBuf> {
        if !validate_key(key) {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }
        Ok(self.base_path.join(key))
    }

    /// Generate public URL for file
    fn generate_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }

    fn write_error(&self, path: &Path, action: &str, e: std::io::Error) -> StorageError {
        StorageError::TransportFailed {
            bucket: LOCAL_BUCKET.to_string(),
            message: format!("Failed to {} {}: {}", action, path.display(), e),
        }
    }

    async fn copy_into(&self, source: &Path, dest: &Path) -> StorageResult<u64> {
        let mut input = fs::File::open(source).await?;
        let mut output = fs::File::create(dest)
            .await
            .map_err(|e| self.write_error(dest, "create", e))?;

        let size = tokio::io::copy(&mut input, &mut output)
            .await
            .map_err(|e| self.write_error(dest, "write", e))?;
        output
            .flush()
            .await
            .map_err(|e| self.write_error(dest, "flush", e))?;
        output
            .sync_all()
            .await
            .map_err(|e| self.write_error(dest, "sync", e))?;

        Ok(size)
    }
}

#[async_trait]
impl Storage for LocalStorage {
    fn bucket(&self) -> &str {
        LOCAL_BUCKET
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }

    async fn put_file(
        &self,
        key: &str,
        path: &Path,
        content_type: &str,
    ) -> StorageResult<StoredObject> {
        let dest = self.key_to_path(key)?;
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }

        let start = std::time::Instant::now();

        // Write beside the target and rename so readers never see a partial object
        let partial = PartialFile::beside(&dest);
        let size_bytes = match self.copy_into(path, partial.path()).await {
            Ok(size) => size,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Local storage upload failed"
                );
                return Err(e);
            }
        };

        partial
            .commit()
            .await
            .map_err(|e| self.write_error(&dest, "rename into", e))?;

        tracing::info!(
            path = %dest.display(),
            key = %key,
            size_bytes,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(StoredObject {
            bucket: LOCAL_BUCKET.to_string(),
            key: key.to_string(),
            content_type: content_type.to_string(),
            size_bytes,
        })
    }

    async fn presigned_get_url(&self, key: &str, _expires_in: Duration) -> StorageResult<String> {
        self.key_to_path(key)?;
        Ok(self.generate_url(key))
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(key)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.key_to_path(key)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(());
        }

        fs::remove_file(&path).await?;

        tracing::info!(path = %path.display(), key = %key, "Local storage delete successful");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn storage_in(dir: &Path) -> LocalStorage {
        LocalStorage::new(dir.join("objects"), "http://localhost:8091/assets".to_string())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_put_file_copies_bytes() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;

        let source = dir.path().join("input.mp4");
        tokio::fs::write(&source, b"fake mp4 bytes").await.unwrap();

        let stored = storage
            .put_file("landscape/abc.mp4", &source, "video/mp4")
            .await
            .unwrap();

        assert_eq!(stored.bucket, LOCAL_BUCKET);
        assert_eq!(stored.size_bytes, 14);
        assert!(storage.exists("landscape/abc.mp4").await.unwrap());

        let written = tokio::fs::read(dir.path().join("objects/landscape/abc.mp4"))
            .await
            .unwrap();
        assert_eq!(written, b"fake mp4 bytes");
        assert!(!dir.path().join("objects/landscape/abc.mp4.part").exists());
    }

    #[tokio::test]
    async fn test_missing_source_leaves_no_object() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;

        let result = storage
            .put_file("other/x.mp4", &dir.path().join("missing.mp4"), "video/mp4")
            .await;

        assert!(result.is_err());
        assert!(!storage.exists("other/x.mp4").await.unwrap());
    }

    #[tokio::test]
    async fn test_url_is_public_path() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;

        let url = storage
            .presigned_get_url("portrait/abc.mp4", Duration::from_secs(300))
            .await
            .unwrap();
        assert_eq!(url, "http://localhost:8091/assets/portrait/abc.mp4");
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;

        let result = storage.delete("../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.exists("/etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_delete_nonexistent() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;
        assert!(storage.delete("other/nothing.mp4").await.is_ok());
    }
}
