//! Declared content type checks
//!
//! Uploads are accepted or rejected on the declared MIME type alone, before
//! any byte is written to disk.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContentTypeError {
    #[error("Missing content type")]
    Missing,

    #[error("Malformed content type: {0}")]
    Malformed(String),

    #[error("Invalid content type '{content_type}'. Allowed types: {allowed}")]
    NotAllowed {
        content_type: String,
        allowed: String,
    },
}

/// Strip parameters (`; codecs=...`) and lowercase the MIME type.
///
/// `image/jpg` is folded into `image/jpeg`.
pub fn normalize_mime_type(content_type: &str) -> String {
    let essence = content_type
        .split(';')
        .next()
        .map(|s| s.trim())
        .unwrap_or(content_type)
        .to_lowercase();

    if essence == "image/jpg" {
        "image/jpeg".to_string()
    } else {
        essence
    }
}

/// Validate content type against an allowlist and return its normalized form.
/// Compares the normalized MIME type only, so parameters cannot bypass the check.
pub fn validate_content_type(
    content_type: Option<&str>,
    allowed_types: &[String],
) -> Result<String, ContentTypeError> {
    let raw = content_type
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ContentTypeError::Missing)?;

    let normalized = normalize_mime_type(raw);
    let well_formed = normalized
        .split_once('/')
        .map(|(kind, sub)| !kind.is_empty() && !sub.is_empty() && !sub.contains('/'))
        .unwrap_or(false);
    if !well_formed {
        return Err(ContentTypeError::Malformed(raw.to_string()));
    }

    if !allowed_types
        .iter()
        .any(|ct| normalize_mime_type(ct) == normalized)
    {
        return Err(ContentTypeError::NotAllowed {
            content_type: normalized,
            allowed: allowed_types.join(", "),
        });
    }

    Ok(normalized)
}

/// File extension used for stored objects of the given content type.
pub fn extension_for_content_type(content_type: &str) -> String {
    let normalized = normalize_mime_type(content_type);
    match normalized.as_str() {
        "video/mp4" => "mp4".to_string(),
        "video/quicktime" => "mov".to_string(),
        "image/jpeg" => "jpg".to_string(),
        "image/png" => "png".to_string(),
        other => {
            let subtype: String = other
                .split_once('/')
                .map(|(_, sub)| sub)
                .unwrap_or("bin")
                .chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .collect();
            if subtype.is_empty() {
                "bin".to_string()
            } else {
                subtype
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowed(types: &[&str]) -> Vec<String> {
        types.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parameters_are_ignored() {
        assert_eq!(
            normalize_mime_type("Video/MP4; codecs=\"avc1\""),
            "video/mp4"
        );
        assert_eq!(
            validate_content_type(Some("video/mp4; charset=binary"), &allowed(&["video/mp4"])),
            Ok("video/mp4".to_string())
        );
    }

    #[test]
    fn webm_is_not_an_allowed_video_type() {
        let err = validate_content_type(Some("video/webm"), &allowed(&["video/mp4"])).unwrap_err();
        assert!(matches!(err, ContentTypeError::NotAllowed { .. }));
    }

    #[test]
    fn gif_is_not_an_allowed_thumbnail_type() {
        let thumbs = allowed(&["image/jpeg", "image/png"]);
        assert!(validate_content_type(Some("image/gif"), &thumbs).is_err());
        assert_eq!(
            validate_content_type(Some("image/jpg"), &thumbs),
            Ok("image/jpeg".to_string())
        );
    }

    #[test]
    fn missing_and_malformed_types() {
        let videos = allowed(&["video/mp4"]);
        assert_eq!(
            validate_content_type(None, &videos),
            Err(ContentTypeError::Missing)
        );
        assert_eq!(
            validate_content_type(Some("   "), &videos),
            Err(ContentTypeError::Missing)
        );
        assert!(matches!(
            validate_content_type(Some("mp4"), &videos),
            Err(ContentTypeError::Malformed(_))
        ));
    }

    #[test]
    fn extensions() {
        assert_eq!(extension_for_content_type("video/mp4"), "mp4");
        assert_eq!(extension_for_content_type("image/jpg"), "jpg");
        assert_eq!(extension_for_content_type("image/png"), "png");
        assert_eq!(extension_for_content_type("video/x-matroska"), "xmatroska");
    }
}
