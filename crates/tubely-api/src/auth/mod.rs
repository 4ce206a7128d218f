pub mod jwt;
pub mod middleware;
pub mod models;

pub use jwt::{JwtAuth, TOKEN_ISSUER};
pub use middleware::auth_middleware;
pub use models::{AuthenticatedUser, JwtClaims};
