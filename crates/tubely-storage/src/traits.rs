//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tubely_core::ObjectRef;

/// Storage operation errors
///
/// Upload failures always carry the bucket so operators can tell which store
/// refused the write.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload to bucket {bucket} failed: {message}")]
    TransportFailed { bucket: String, message: String },

    #[error("Bucket {bucket} rejected the object: {message}")]
    Rejected { bucket: String, message: String },

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// An object that has been fully written to a store. Never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bucket: String,
    pub key: String,
    pub content_type: String,
    pub size_bytes: u64,
}

impl StoredObject {
    pub fn reference(&self) -> ObjectRef {
        ObjectRef::new(self.bucket.clone(), self.key.clone())
    }
}

/// Storage abstraction trait
///
/// Objects are written once per key and read back through URLs produced by
/// [`Storage::presigned_get_url`].
#[async_trait]
pub trait Storage: Send + Sync {
    /// Bucket (or bucket-like namespace) this store writes into
    fn bucket(&self) -> &str;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;

    /// Stream a local file to the store under `key`.
    ///
    /// The file is read incrementally; it is never held in memory as a whole.
    /// Either the whole object is written or no object is visible under `key`.
    async fn put_file(
        &self,
        key: &str,
        path: &Path,
        content_type: &str,
    ) -> StorageResult<StoredObject>;

    /// Generate a time-limited GET URL for `key`.
    ///
    /// Backends that serve objects publicly ignore `expires_in`.
    async fn presigned_get_url(&self, key: &str, expires_in: Duration) -> StorageResult<String>;

    /// Check if an object exists
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Delete an object. Deleting a missing object is not an error.
    async fn delete(&self, key: &str) -> StorageResult<()>;
}
