use axum::{extract::Extension, response::Json};

use crate::middleware::AuthUser;
use crate::models::User;

/// GET /api/auth/me - The user behind the bearer token
///
/// `require_session` has already fetched it from the backend.
pub async fn me(Extension(caller): Extension<AuthUser>) -> Json<User> {
    Json(caller.user)
}
