use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::object_ref::ObjectRef;

/// A video record as stored in the metadata store.
///
/// `video_url` holds either an encoded [`ObjectRef`] (`bucket,key`) or, for
/// records written before references were introduced, a plain URL. It is
/// never stored signed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Video {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub title: String,
    pub description: String,
    pub user_id: Uuid,
    pub thumbnail_url: Option<String>,
    pub video_url: Option<String>,
}

impl Video {
    pub fn new(user_id: Uuid, draft: NewVideo) -> Self {
        let now = Utc::now();
        Video {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            title: draft.title,
            description: draft.description,
            user_id,
            thumbnail_url: None,
            video_url: None,
        }
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }

    /// Parsed object reference, if `video_url` holds one.
    pub fn object_ref(&self) -> Option<ObjectRef> {
        self.video_url.as_deref().and_then(ObjectRef::parse)
    }

    /// Point the record at a newly stored object.
    pub fn set_object_ref(&mut self, reference: &ObjectRef) {
        self.video_url = Some(reference.encode());
        self.updated_at = Utc::now();
    }

    pub fn set_thumbnail_url(&mut self, url: String) {
        self.thumbnail_url = Some(url);
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewVideo {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Video {
        Video::new(
            Uuid::new_v4(),
            NewVideo {
                title: "Boots".to_string(),
                description: "Trailer".to_string(),
            },
        )
    }

    #[test]
    fn set_object_ref_encodes_reference() {
        let mut video = sample();
        let before = video.updated_at;
        let reference = ObjectRef::new("tubely-media", "landscape/abc.mp4");
        video.set_object_ref(&reference);
        assert_eq!(
            video.video_url.as_deref(),
            Some("tubely-media,landscape/abc.mp4")
        );
        assert_eq!(video.object_ref(), Some(reference));
        assert!(video.updated_at >= before);
    }

    #[test]
    fn legacy_url_has_no_object_ref() {
        let mut video = sample();
        video.video_url = Some("https://cdn.example.com/boots.mp4".to_string());
        assert_eq!(video.object_ref(), None);
    }

    #[test]
    fn serializes_with_snake_case_fields() {
        let video = sample();
        let json = serde_json::to_value(&video).unwrap();
        assert!(json.get("user_id").is_some());
        assert!(json.get("thumbnail_url").unwrap().is_null());
        assert!(json.get("video_url").unwrap().is_null());
    }
}
