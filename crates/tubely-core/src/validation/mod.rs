//! Validation modules

pub mod content_type;

pub use content_type::{
    extension_for_content_type, normalize_mime_type, validate_content_type, ContentTypeError,
};
