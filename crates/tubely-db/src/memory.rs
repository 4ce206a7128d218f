use crate::video::VideoRepository;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tubely_core::{AppError, ObjectRef, Video};
use uuid::Uuid;

/// Process-local video store
#[derive(Clone, Default)]
pub struct InMemoryVideoRepository {
    videos: Arc<RwLock<HashMap<Uuid, Video>>>,
}

impl InMemoryVideoRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn modify(&self, id: Uuid, apply: impl FnOnce(&mut Video)) -> Result<Video, AppError> {
        let mut videos = self.videos.write().await;
        let existing = videos
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Video {} not found", id)))?;
        apply(existing);
        Ok(existing.clone())
    }
}

#[async_trait::async_trait]
impl VideoRepository for InMemoryVideoRepository {
    async fn get(&self, id: Uuid) -> Result<Option<Video>, AppError> {
        Ok(self.videos.read().await.get(&id).cloned())
    }

    async fn update(&self, video: &Video) -> Result<(), AppError> {
        let mut videos = self.videos.write().await;
        match videos.get_mut(&video.id) {
            Some(existing) => {
                *existing = video.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(format!("Video {} not found", video.id))),
        }
    }

    async fn set_object_ref(&self, id: Uuid, reference: &ObjectRef) -> Result<Video, AppError> {
        self.modify(id, |video| video.set_object_ref(reference)).await
    }

    async fn set_thumbnail_url(&self, id: Uuid, url: &str) -> Result<Video, AppError> {
        self.modify(id, |video| video.set_thumbnail_url(url.to_string()))
            .await
    }

    async fn create(&self, video: &Video) -> Result<(), AppError> {
        let mut videos = self.videos.write().await;
        if videos.contains_key(&video.id) {
            return Err(AppError::BadRequest(format!(
                "Video {} already exists",
                video.id
            )));
        }
        videos.insert(video.id, video.clone());
        Ok(())
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Video>, AppError> {
        let mut owned: Vec<Video> = self
            .videos
            .read()
            .await
            .values()
            .filter(|v| v.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tubely_core::NewVideo;

    fn draft(title: &str) -> NewVideo {
        NewVideo {
            title: title.to_string(),
            description: String::new(),
        }
    }

    #[tokio::test]
    async fn create_get_update() {
        let repo = InMemoryVideoRepository::new();
        let mut video = Video::new(Uuid::new_v4(), draft("first"));
        repo.create(&video).await.unwrap();

        video.set_object_ref(&ObjectRef::new("local", "landscape/a.mp4"));
        repo.update(&video).await.unwrap();

        let stored = repo.get(video.id).await.unwrap().unwrap();
        assert_eq!(stored.video_url.as_deref(), Some("local,landscape/a.mp4"));
    }

    #[tokio::test]
    async fn update_of_missing_record_is_not_found() {
        let repo = InMemoryVideoRepository::new();
        let video = Video::new(Uuid::new_v4(), draft("ghost"));
        let err = repo.update(&video).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn single_field_writes_keep_the_other_fields() {
        let repo = InMemoryVideoRepository::new();
        let video = Video::new(Uuid::new_v4(), draft("boots"));
        repo.create(&video).await.unwrap();

        repo.set_thumbnail_url(video.id, "http://localhost:8091/assets/t.png")
            .await
            .unwrap();
        let stored = repo
            .set_object_ref(video.id, &ObjectRef::new("local", "portrait/b.mp4"))
            .await
            .unwrap();

        assert_eq!(stored.thumbnail_url.as_deref(), Some("http://localhost:8091/assets/t.png"));
        assert_eq!(stored.video_url.as_deref(), Some("local,portrait/b.mp4"));
        assert_eq!(stored.title, "boots");
        assert_eq!(repo.get(video.id).await.unwrap(), Some(stored));
    }

    #[tokio::test]
    async fn single_field_write_of_missing_record_is_not_found() {
        let repo = InMemoryVideoRepository::new();
        let err = repo
            .set_object_ref(Uuid::new_v4(), &ObjectRef::new("local", "other/c.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn list_is_scoped_to_owner() {
        let repo = InMemoryVideoRepository::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        repo.create(&Video::new(alice, draft("a1"))).await.unwrap();
        repo.create(&Video::new(alice, draft("a2"))).await.unwrap();
        repo.create(&Video::new(bob, draft("b1"))).await.unwrap();

        let listed = repo.list_for_user(alice).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|v| v.user_id == alice));
    }
}
