use std::time::Duration;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, StatusCode},
    middleware::from_fn_with_state,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::api::{ApiClient, ClientError};
use crate::config::{AppConfig, SecurityConfig};
use crate::handlers::{protected, public};
use crate::middleware::require_session;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub backend: ApiClient,
    pub audit_logging: bool,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(backend: ApiClient) -> Self {
        Self {
            backend,
            audit_logging: false,
            started_at: Utc::now(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ClientError> {
        let backend = ApiClient::with_timeout(
            &config.backend.base_url,
            Duration::from_secs(config.backend.timeout_secs),
        )?;
        Ok(Self {
            audit_logging: config.security.enable_audit_logging,
            ..Self::new(backend)
        })
    }
}

/// Full router: public routes, token-protected routes and global layers
pub fn app(state: AppState, config: &AppConfig) -> Router {
    let mut router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_public_routes())
        // Protected
        .merge(protected_routes(state.clone()))
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes));

    if config.security.enable_cors {
        router = router.layer(cors_layer(&config.security));
    }
    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }
    router
}

fn auth_public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/login", post(public::auth::login))
        .route("/api/auth/register", post(public::auth::register))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use protected::{articles, auth, categories};

    Router::new()
        .route("/api/auth/me", get(auth::me))
        .route("/api/articles", get(articles::list).post(articles::create))
        .route(
            "/api/articles/:id",
            get(articles::show).put(articles::update).delete(articles::delete),
        )
        .route("/api/categories", get(categories::list).post(categories::create))
        .route(
            "/api/categories/:id",
            get(categories::show).put(categories::update).delete(categories::delete),
        )
        .route_layer(from_fn_with_state(state, require_session))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if security.cors_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

/// Binds the configured address and serves until the process exits
pub async fn serve(config: &AppConfig) -> anyhow::Result<()> {
    let state = AppState::from_config(config)?;
    tracing::info!(backend = %state.backend.base_url(), "proxying to backend");

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", bind_addr, e))?;

    tracing::info!("Blog portal listening on http://{}", bind_addr);
    axum::serve(listener, app(state, config)).await?;
    Ok(())
}

async fn root(State(state): State<AppState>) -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");
    let backend = if crate::is_production!() {
        Value::Null
    } else {
        json!(state.backend.base_url().as_str())
    };

    Json(json!({
        "name": "Blog Portal",
        "version": version,
        "backend": backend,
        "started_at": state.started_at,
        "endpoints": {
            "health": "/health (public)",
            "auth": "/api/auth/login, /api/auth/register (public), /api/auth/me (token)",
            "articles": "/api/articles[/:id] (read: any role, write: Admin)",
            "categories": "/api/categories[/:id] (read: any role, write: Admin)",
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = Utc::now();

    match state.backend.health().await {
        // Any HTTP answer means the backend is up, even one without /health
        Ok(_) => (StatusCode::OK, Json(json!({ "status": "ok", "timestamp": now, "backend": "ok" }))),
        Err(e) if e.status().is_some() => {
            (StatusCode::OK, Json(json!({ "status": "ok", "timestamp": now, "backend": "ok" })))
        }
        Err(e) => {
            tracing::warn!("backend health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "error": "backend unavailable"
                })),
            )
        }
    }
}
