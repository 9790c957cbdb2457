use axum::{
    extract::{rejection::JsonRejection, Extension, Path, RawQuery, State},
    http::Method,
    response::{Json, Response},
};
use serde_json::Value;

use crate::error::ApiError;
use crate::handlers::proxy::{authorize, forward, json_body};
use crate::middleware::AuthUser;
use crate::models::{delete_failure_message, CategoryDraft, Role};
use crate::server::AppState;

/// GET /api/categories
pub async fn list(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    RawQuery(query): RawQuery,
) -> Result<Response, ApiError> {
    forward(&state, Method::GET, &["categories"], query.as_deref(), Some(&caller.token), None).await
}

/// GET /api/categories/:id
pub async fn show(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    forward(&state, Method::GET, &["categories", &id], None, Some(&caller.token), None).await
}

/// POST /api/categories - Admin only
pub async fn create(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    authorize(&state, &caller, &[Role::Admin], "category.create")?;
    let body = prepared_draft(json_body(payload)?)?;

    forward(&state, Method::POST, &["categories"], None, Some(&caller.token), Some(&body)).await
}

/// PUT /api/categories/:id - Admin only
pub async fn update(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    authorize(&state, &caller, &[Role::Admin], "category.update")?;
    let body = prepared_draft(json_body(payload)?)?;

    forward(&state, Method::PUT, &["categories", &id], None, Some(&caller.token), Some(&body)).await
}

/// DELETE /api/categories/:id - Admin only
///
/// 404 and 409 from the backend come back with messages a person can act on.
pub async fn delete(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    authorize(&state, &caller, &[Role::Admin], "category.delete")?;

    forward(&state, Method::DELETE, &["categories", &id], None, Some(&caller.token), None)
        .await
        .map_err(|err| match delete_failure_message(err.status_code()) {
            Some(message) if err.status_code() == 404 => ApiError::not_found(message),
            Some(message) => ApiError::conflict(message),
            None => err,
        })
}

fn prepared_draft(body: Value) -> Result<Value, ApiError> {
    let draft: CategoryDraft =
        serde_json::from_value(body).map_err(|e| ApiError::bad_request(format!("Invalid category: {}", e)))?;
    draft.validate()?;

    serde_json::to_value(draft).map_err(|e| ApiError::internal_server_error(format!("Failed to encode category: {}", e)))
}
