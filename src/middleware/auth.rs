use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::auth::{evaluate, Access, AuthSnapshot};
use crate::error::ApiError;
use crate::models::{Role, User};
use crate::server::AppState;

/// Authenticated caller resolved from the bearer token
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user: User,
    pub token: String,
}

impl AuthUser {
    /// Fails with 403 unless the caller holds one of `allowed`
    pub fn require(&self, allowed: &[Role]) -> Result<(), ApiError> {
        match evaluate(allowed, &AuthSnapshot::signed_in(self.user.clone())) {
            Access::Authorized => Ok(()),
            _ => {
                let names: Vec<&str> = allowed.iter().map(Role::as_str).collect();
                Err(ApiError::forbidden(format!("{} role required", names.join(" or "))))
            }
        }
    }
}

/// Resolves the bearer token to a user via the backend's `/auth/me` and
/// injects `AuthUser` into the request
pub async fn require_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&headers).map_err(ApiError::unauthorized)?;

    let user = state.backend.me(&token).await.map_err(ApiError::from)?;
    tracing::debug!(username = %user.username, role = %user.role, "session resolved");

    request.extensions_mut().insert(AuthUser { user, token });
    Ok(next.run(request).await)
}

/// Extract bearer token from Authorization header
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty bearer token".to_string());
        }
        Ok(token.trim().to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}
