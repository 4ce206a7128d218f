use crate::auth::jwt::JwtAuth;
use crate::auth::models::AuthenticatedUser;
use crate::error::HttpAppError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tubely_core::AppError;

/// Require a valid bearer token and record the caller in request extensions
pub async fn auth_middleware(
    State(jwt): State<JwtAuth>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = match request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
    {
        Some(h) => h,
        None => {
            return HttpAppError(AppError::Unauthorized(
                "Missing authorization header".to_string(),
            ))
            .into_response();
        }
    };

    let Some(token) = auth_header.strip_prefix("Bearer ") else {
        return HttpAppError(AppError::Unauthorized(
            "Invalid authorization header format".to_string(),
        ))
        .into_response();
    };

    let user_id = match jwt.verify(token.trim()) {
        Ok(user_id) => user_id,
        Err(e) => {
            tracing::debug!(error = %e, "Token rejected");
            return HttpAppError(e).into_response();
        }
    };

    request
        .extensions_mut()
        .insert(AuthenticatedUser { user_id });

    next.run(request).await
}
