//! Data models for the application

mod classification;
mod object_ref;
mod video;

pub use classification::Classification;
pub use object_ref::ObjectRef;
pub use video::{NewVideo, Video};
