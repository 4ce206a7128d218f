//! Tubely Core Library
//!
//! This crate provides domain models, error types, configuration, and content-type
//! validation shared by all Tubely components.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;
pub mod validation;

// Re-export commonly used types
pub use config::{Config, MetadataStore};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{Classification, NewVideo, ObjectRef, Video};
pub use storage_types::StorageBackend;
