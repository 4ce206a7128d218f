use chrono::Duration;
use tubely_api::auth::JwtAuth;
use uuid::Uuid;

/// Test JWT secret (must satisfy the 32 character minimum).
pub const TEST_JWT_SECRET: &str = "test-jwt-secret-at-least-32-characters-long";

/// Bearer header value for `user_id`
pub fn bearer(jwt: &JwtAuth, user_id: Uuid) -> String {
    let token = jwt
        .issue(user_id, Duration::hours(1))
        .expect("Failed to issue test token");
    format!("Bearer {}", token)
}
