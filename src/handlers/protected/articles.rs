use axum::{
    extract::{rejection::JsonRejection, Extension, Path, RawQuery, State},
    http::Method,
    response::{Json, Response},
};
use serde_json::Value;

use crate::error::ApiError;
use crate::handlers::proxy::{authorize, forward, json_body};
use crate::middleware::AuthUser;
use crate::models::{ArticleDraft, Role};
use crate::server::AppState;

/// GET /api/articles - List articles; query string is forwarded as-is
pub async fn list(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    RawQuery(query): RawQuery,
) -> Result<Response, ApiError> {
    forward(&state, Method::GET, &["articles"], query.as_deref(), Some(&caller.token), None).await
}

/// GET /api/articles/:id
pub async fn show(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    forward(&state, Method::GET, &["articles", &id], None, Some(&caller.token), None).await
}

/// POST /api/articles - Admin only
pub async fn create(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    authorize(&state, &caller, &[Role::Admin], "article.create")?;
    let body = prepared_draft(json_body(payload)?)?;

    forward(&state, Method::POST, &["articles"], None, Some(&caller.token), Some(&body)).await
}

/// PUT /api/articles/:id - Admin only
pub async fn update(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    authorize(&state, &caller, &[Role::Admin], "article.update")?;
    let body = prepared_draft(json_body(payload)?)?;

    forward(&state, Method::PUT, &["articles", &id], None, Some(&caller.token), Some(&body)).await
}

/// DELETE /api/articles/:id - Admin only
pub async fn delete(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    authorize(&state, &caller, &[Role::Admin], "article.delete")?;

    forward(&state, Method::DELETE, &["articles", &id], None, Some(&caller.token), None).await
}

/// Validates the body as an article draft and fills in a missing excerpt
fn prepared_draft(body: Value) -> Result<Value, ApiError> {
    let draft: ArticleDraft =
        serde_json::from_value(body).map_err(|e| ApiError::bad_request(format!("Invalid article: {}", e)))?;
    draft.validate()?;

    serde_json::to_value(draft.with_derived_excerpt())
        .map_err(|e| ApiError::internal_server_error(format!("Failed to encode article: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn draft_gets_excerpt_and_camel_case_keys() {
        let body = prepared_draft(json!({
            "title": "Hello",
            "content": "Short body",
            "categoryId": "2"
        }))
        .unwrap();

        assert_eq!(body["excerpt"], "Short body");
        assert_eq!(body["categoryId"], "2");
    }

    #[test]
    fn incomplete_draft_is_a_validation_error() {
        let err = prepared_draft(json!({ "title": "Hello" })).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(err.to_json()["fields"].get("content").is_some());
    }
}
