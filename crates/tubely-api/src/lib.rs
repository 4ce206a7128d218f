//! Tubely API Library
//!
//! HTTP surface of the ingestion service: authentication, upload and read
//! handlers, error rendering, and application setup.

mod api_doc;
mod handlers;
mod telemetry;

pub mod auth;
pub mod error;
pub mod setup;
pub mod state;

pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
