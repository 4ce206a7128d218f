pub mod health;
pub mod thumbnail_upload;
pub mod video_get;
pub mod video_upload;

use crate::auth::AuthenticatedUser;
use crate::error::HttpAppError;
use crate::state::AppState;
use tubely_core::{AppError, Video};
use uuid::Uuid;

pub(crate) fn parse_video_id(raw: &str) -> Result<Uuid, HttpAppError> {
    Uuid::parse_str(raw)
        .map_err(|_| HttpAppError(AppError::InvalidInput("Invalid video ID".to_string())))
}

/// Fetch `video_id` and check the caller owns it
pub(crate) async fn load_owned_video(
    state: &AppState,
    user: AuthenticatedUser,
    video_id: Uuid,
) -> Result<Video, HttpAppError> {
    let video = state
        .videos
        .get(video_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Couldn't find video".to_string()))?;

    if !video.is_owned_by(user.user_id) {
        return Err(AppError::Unauthorized("Video owner mismatch".to_string()).into());
    }

    Ok(video)
}
