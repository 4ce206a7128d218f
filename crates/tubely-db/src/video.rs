use tubely_core::{AppError, ObjectRef, Video};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Video record persistence
#[async_trait::async_trait]
pub trait VideoRepository: Send + Sync {
    /// Fetch a record by id
    async fn get(&self, id: Uuid) -> Result<Option<Video>, AppError>;

    /// Overwrite the mutable fields of an existing record.
    ///
    /// Fails with `AppError::NotFound` if the record no longer exists.
    async fn update(&self, video: &Video) -> Result<(), AppError>;

    /// Point `video_url` at a stored object, leaving every other field as the
    /// store currently has it. Returns the record after the write.
    async fn set_object_ref(&self, id: Uuid, reference: &ObjectRef) -> Result<Video, AppError>;

    /// Set `thumbnail_url` alone. Returns the record after the write.
    async fn set_thumbnail_url(&self, id: Uuid, url: &str) -> Result<Video, AppError>;

    async fn create(&self, video: &Video) -> Result<(), AppError>;

    /// Records owned by `user_id`, newest first
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Video>, AppError>;
}

#[derive(Clone)]
pub struct PgVideoRepository {
    pool: PgPool,
}

impl PgVideoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Single-column write; `column` is always one of our own literals.
    async fn set_column(&self, id: Uuid, column: &'static str, value: &str) -> Result<Video, AppError> {
        let sql = format!(
            r#"
            UPDATE videos
            SET {column} = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, created_at, updated_at, title, description, user_id, thumbnail_url, video_url
            "#
        );

        sqlx::query_as::<Postgres, Video>(&sql)
            .bind(id)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, video_id = %id, column, "Failed to update video record");
                AppError::Database(e)
            })?
            .ok_or_else(|| AppError::NotFound(format!("Video {} not found", id)))
    }
}

#[async_trait::async_trait]
impl VideoRepository for PgVideoRepository {
    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select", db.record_id = %id))]
    async fn get(&self, id: Uuid) -> Result<Option<Video>, AppError> {
        let video = sqlx::query_as::<Postgres, Video>(
            r#"
            SELECT id, created_at, updated_at, title, description, user_id, thumbnail_url, video_url
            FROM videos
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(video)
    }

    #[tracing::instrument(skip(self, video), fields(db.table = "videos", db.operation = "update", db.record_id = %video.id))]
    async fn update(&self, video: &Video) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE videos
            SET title = $2, description = $3, thumbnail_url = $4, video_url = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(video.id)
        .bind(&video.title)
        .bind(&video.description)
        .bind(&video.thumbnail_url)
        .bind(&video.video_url)
        .bind(video.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = ?e, video_id = %video.id, "Failed to update video record");
            AppError::Database(e)
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Video {} not found", video.id)));
        }

        Ok(())
    }

    #[tracing::instrument(skip(self, reference), fields(db.table = "videos", db.operation = "update", db.record_id = %id))]
    async fn set_object_ref(&self, id: Uuid, reference: &ObjectRef) -> Result<Video, AppError> {
        self.set_column(id, "video_url", &reference.encode()).await
    }

    #[tracing::instrument(skip(self, url), fields(db.table = "videos", db.operation = "update", db.record_id = %id))]
    async fn set_thumbnail_url(&self, id: Uuid, url: &str) -> Result<Video, AppError> {
        self.set_column(id, "thumbnail_url", url).await
    }

    #[tracing::instrument(skip(self, video), fields(db.table = "videos", db.operation = "insert", db.record_id = %video.id))]
    async fn create(&self, video: &Video) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO videos (id, created_at, updated_at, title, description, user_id, thumbnail_url, video_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(video.id)
        .bind(video.created_at)
        .bind(video.updated_at)
        .bind(&video.title)
        .bind(&video.description)
        .bind(video.user_id)
        .bind(&video.thumbnail_url)
        .bind(&video.video_url)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select"))]
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Video>, AppError> {
        let videos = sqlx::query_as::<Postgres, Video>(
            r#"
            SELECT id, created_at, updated_at, title, description, user_id, thumbnail_url, video_url
            FROM videos
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(videos)
    }
}
