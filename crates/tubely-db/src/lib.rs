//! Tubely Database Library
//!
//! Metadata store for video records. [`VideoRepository`] abstracts the
//! backend; PostgreSQL is used in deployments, the in-memory store in
//! development and tests.

pub mod memory;
pub mod video;

pub use memory::InMemoryVideoRepository;
pub use video::{PgVideoRepository, VideoRepository};
