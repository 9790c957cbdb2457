use axum::{
    extract::rejection::JsonRejection,
    http::{Method, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde_json::Value;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::models::Role;
use crate::server::AppState;

/// Forwards one call to the backend and relays its status and body
pub async fn forward(
    state: &AppState,
    method: Method,
    segments: &[&str],
    query: Option<&str>,
    token: Option<&str>,
    body: Option<&Value>,
) -> Result<Response, ApiError> {
    let (status, value) = state.backend.send_raw(method, segments, query, token, body).await?;

    if status == StatusCode::NO_CONTENT || value.is_null() {
        return Ok(status.into_response());
    }
    Ok((status, Json(value)).into_response())
}

/// Unwraps a JSON body, turning a malformed one into a normalized 400
pub fn json_body(payload: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::invalid_json(rejection.body_text()))
}

/// Role check for mutating routes, audit-logged when enabled
pub fn authorize(state: &AppState, caller: &AuthUser, allowed: &[Role], action: &str) -> Result<(), ApiError> {
    let result = caller.require(allowed);
    if state.audit_logging {
        match &result {
            Ok(()) => tracing::info!(username = %caller.user.username, action, "audit: allowed"),
            Err(_) => tracing::warn!(
                username = %caller.user.username,
                role = %caller.user.role,
                action,
                "audit: denied"
            ),
        }
    }
    result
}
