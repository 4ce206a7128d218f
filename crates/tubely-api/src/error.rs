//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`. Stage errors
//! convert into [`AppError`] first, so every failure renders the same way:
//! status, JSON body and a log line at the variant's level.

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::OnceLock;
use tubely_core::{AppError, Config, ErrorMetadata, LogLevel};
use tubely_processing::{PipelineError, ThumbnailError};
use tubely_storage::ResolveError;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    /// Whether this error is recoverable (can be retried)
    pub recoverable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

/// Wrapper so `AppError` (defined in tubely-core) can implement `IntoResponse`
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        })
    }
}

impl From<PipelineError> for HttpAppError {
    fn from(err: PipelineError) -> Self {
        HttpAppError(err.into())
    }
}

impl From<ResolveError> for HttpAppError {
    fn from(err: ResolveError) -> Self {
        HttpAppError(AppError::Signing(err.to_string()))
    }
}

impl From<ThumbnailError> for HttpAppError {
    fn from(err: ThumbnailError) -> Self {
        let app = match err {
            ThumbnailError::InvalidContentType(e) => AppError::InvalidInput(e.to_string()),
            ThumbnailError::TooLarge { limit } => {
                AppError::PayloadTooLarge(format!("Thumbnail exceeds the {} byte limit", limit))
            }
            e @ (ThumbnailError::Aborted(_) | ThumbnailError::Empty) => {
                AppError::BadRequest(e.to_string())
            }
            ThumbnailError::WriteFailed(e) => {
                AppError::Internal(format!("Failed to write thumbnail: {}", e))
            }
        };
        HttpAppError(app)
    }
}

impl From<MultipartError> for HttpAppError {
    fn from(err: MultipartError) -> Self {
        let app = if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(err.body_text())
        } else {
            AppError::BadRequest(format!("Invalid multipart body: {}", err.body_text()))
        };
        HttpAppError(app)
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_type = error_type, "Error occurred");
        }
    }
}

static HIDE_DETAILS: OnceLock<bool> = OnceLock::new();

/// Fix, from configuration, whether error bodies omit internal details.
///
/// The first call wins. Until it is made, details are hidden.
pub fn configure_error_details(config: &Config) {
    let _ = HIDE_DETAILS.set(config.is_production());
}

fn error_body(app_error: &AppError, hide_details: bool) -> ErrorResponse {
    let show_details = !hide_details && !app_error.is_sensitive();
    ErrorResponse {
        error: app_error.client_message(),
        details: show_details.then(|| app_error.detailed_message()),
        error_type: show_details.then(|| app_error.error_type().to_string()),
        code: app_error.error_code().to_string(),
        recoverable: app_error.is_recoverable(),
        suggested_action: app_error.suggested_action().map(String::from),
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        let hide_details = HIDE_DETAILS.get().copied().unwrap_or(true);
        (status, Json(error_body(app_error, hide_details))).into_response()
    }
}
