//! Tubely Storage Library
//!
//! Storage abstraction for finished video files plus the two backends that
//! implement it (S3-compatible object storage and a local directory).
//!
//! # Storage key format
//!
//! Video objects are stored under `{classification}/{random}.{ext}`, where
//! `random` is 32 bytes of OS randomness encoded as unpadded base64url. Keys must
//! not contain `..` or a leading `/`. Key generation lives in the `keys` module
//! so every backend sees the same layout.
//!
//! Records never hold URLs for these objects. They hold an encoded
//! [`ObjectRef`](tubely_core::ObjectRef) which the [`ReferenceResolver`] turns
//! into a (signed, when the backend needs it) URL on every read.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod partial;
pub mod resolver;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use keys::object_key;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use partial::PartialFile;
pub use resolver::{ReferenceResolver, ResolveError};
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult, StoredObject};
pub use tubely_core::StorageBackend;
