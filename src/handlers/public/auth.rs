use axum::{
    extract::{rejection::JsonRejection, State},
    http::Method,
    response::{Json, Response},
};
use serde_json::Value;

use crate::error::ApiError;
use crate::handlers::proxy::{forward, json_body};
use crate::models::{Credentials, Registration};
use crate::server::AppState;

/// POST /api/auth/login - Exchange username and password for a token
///
/// Expected Input:
/// ```json
/// { "username": "ana", "password": "secret" }
/// ```
///
/// Relays the backend's `{ token, user }` response.
pub async fn login(State(state): State<AppState>, payload: Result<Json<Value>, JsonRejection>) -> Result<Response, ApiError> {
    let body = json_body(payload)?;
    let credentials: Credentials = serde_json::from_value(body.clone())
        .map_err(|_| ApiError::bad_request("Username and password are required"))?;
    if credentials.username.trim().is_empty() || credentials.password.is_empty() {
        return Err(ApiError::bad_request("Username and password are required"));
    }

    forward(&state, Method::POST, &["auth", "login"], None, None, Some(&body)).await
}

/// POST /api/auth/register - Create a new user account
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let body = json_body(payload)?;
    let registration: Registration = serde_json::from_value(body.clone())
        .map_err(|_| ApiError::bad_request("Username, email and password are required"))?;
    if registration.username.trim().is_empty()
        || registration.email.trim().is_empty()
        || registration.password.is_empty()
    {
        return Err(ApiError::bad_request("Username, email and password are required"));
    }

    forward(&state, Method::POST, &["auth", "register"], None, None, Some(&body)).await
}
