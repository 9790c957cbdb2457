#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};

use blog_portal::api::ApiClient;
use blog_portal::config::AppConfig;
use blog_portal::server::{app, AppState};

pub const ADMIN_TOKEN: &str = "admin-token";
pub const USER_TOKEN: &str = "user-token";
/// Issued by login but rejected everywhere else, like a session revoked server-side
pub const REVOKED_TOKEN: &str = "revoked-token";

pub const ARTICLE_COUNT: usize = 12;

/// What the fake backend saw, for asserting on forwarded requests
#[derive(Clone, Default)]
pub struct Recorded {
    pub authorization: Arc<Mutex<Vec<String>>>,
    pub queries: Arc<Mutex<Vec<String>>>,
    pub bodies: Arc<Mutex<Vec<Value>>>,
}

impl Recorded {
    pub fn authorization(&self) -> Vec<String> {
        self.authorization.lock().unwrap().clone()
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    pub fn last_body(&self) -> Option<Value> {
        self.bodies.lock().unwrap().last().cloned()
    }
}

/// A fake REST backend plus the portal proxying to it, both on free ports
pub struct TestEnv {
    pub backend_url: String,
    pub base_url: String,
    pub recorded: Recorded,
}

impl TestEnv {
    pub async fn start() -> Result<Self> {
        let recorded = Recorded::default();

        let backend_addr = bind_addr()?;
        let backend = fake_backend(recorded.clone());
        spawn(backend_addr, backend).await?;
        let backend_url = format!("http://{}", backend_addr);

        let portal_addr = bind_addr()?;
        let client = ApiClient::new(&backend_url)?;
        let portal = app(AppState::new(client), &AppConfig::development());
        spawn(portal_addr, portal).await?;
        let base_url = format!("http://{}", portal_addr);

        let env = Self {
            backend_url,
            base_url,
            recorded,
        };
        env.wait_ready(Duration::from_secs(10)).await?;
        Ok(env)
    }

    /// Base URL the portal exposes its API routes under
    pub fn api_url(&self) -> String {
        format!("{}/api", self.base_url)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            if let Ok(resp) = client.get(self.url("/health")).send().await {
                if resp.status() == reqwest::StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("portal did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

fn bind_addr() -> Result<SocketAddr> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    Ok(SocketAddr::from(([127, 0, 0, 1], port)))
}

async fn spawn(addr: SocketAddr, router: Router) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok(())
}

pub fn admin() -> Value {
    json!({ "id": 1, "username": "ana", "role": "Admin", "email": "ana@example.com" })
}

pub fn reader() -> Value {
    json!({ "id": 2, "username": "bob", "role": "User" })
}

pub fn articles() -> Vec<Value> {
    (1..=ARTICLE_COUNT)
        .map(|i| {
            let (title, category) = if i % 3 == 0 {
                (format!("Rust tip #{}", i), 2)
            } else {
                (format!("Travel diary {}", i), 1)
            };
            json!({
                "id": i,
                "title": title,
                "content": format!("Body of article {}", i),
                "excerpt": format!("Excerpt {}", i),
                "categoryId": category,
                "userId": 1,
                "createdAt": "2024-03-01T10:00:00Z",
                "updatedAt": "2024-03-01T10:00:00Z"
            })
        })
        .collect()
}

pub fn categories() -> Vec<Value> {
    vec![
        json!({ "id": 1, "name": "Travel", "userId": 1 }),
        json!({ "id": 2, "name": "Programming", "userId": 1 }),
        json!({ "id": 3, "name": "Empty shelf", "userId": 1 }),
    ]
}

fn fake_backend(recorded: Recorded) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(json!({ "status": "ok" })) }))
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/me", get(me))
        .route("/articles", get(list_articles).post(create_article))
        .route(
            "/articles/:id",
            get(show_article).put(update_article).delete(delete_article),
        )
        .route("/categories", get(list_categories))
        .route("/categories/:id", axum::routing::delete(delete_category))
        .with_state(recorded)
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

/// Resolves the caller the way a real backend would, recording the header
fn caller(recorded: &Recorded, headers: &HeaderMap) -> Result<Value, Response> {
    let header = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    recorded.authorization.lock().unwrap().push(header.clone());

    match header.strip_prefix("Bearer ") {
        Some(ADMIN_TOKEN) => Ok(admin()),
        Some(USER_TOKEN) => Ok(reader()),
        _ => Err(error(StatusCode::UNAUTHORIZED, "Invalid or expired token")),
    }
}

fn require_admin(user: &Value) -> Result<(), Response> {
    if user["role"] == "Admin" {
        Ok(())
    } else {
        Err(error(StatusCode::FORBIDDEN, "Forbidden"))
    }
}

async fn login(Json(body): Json<Value>) -> Response {
    let password_ok = body["password"] == "secret";
    match (body["username"].as_str(), password_ok) {
        (Some("ana"), true) => Json(json!({ "token": ADMIN_TOKEN, "user": admin() })).into_response(),
        (Some("bob"), true) => Json(json!({ "access_token": USER_TOKEN, "user": reader() })).into_response(),
        (Some("eve"), true) => Json(json!({
            "token": REVOKED_TOKEN,
            "user": { "id": 3, "username": "eve", "role": "User" }
        }))
        .into_response(),
        _ => error(StatusCode::UNAUTHORIZED, "Invalid credentials"),
    }
}

async fn register(Json(body): Json<Value>) -> Response {
    match body["username"].as_str() {
        Some("ana") => error(StatusCode::CONFLICT, "Username already taken"),
        Some(username) => (
            StatusCode::CREATED,
            Json(json!({ "id": 10, "username": username, "role": "User" })),
        )
            .into_response(),
        None => error(StatusCode::BAD_REQUEST, "username is required"),
    }
}

async fn me(State(recorded): State<Recorded>, headers: HeaderMap) -> Response {
    match caller(&recorded, &headers) {
        // Wrapped the way some backends answer /auth/me
        Ok(user) => Json(json!({ "user": user })).into_response(),
        Err(response) => response,
    }
}

async fn list_articles(
    State(recorded): State<Recorded>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Err(response) = caller(&recorded, &headers) {
        return response;
    }
    let mut pairs: Vec<String> = query.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
    pairs.sort();
    recorded.queries.lock().unwrap().push(pairs.join("&"));

    Json(Value::Array(articles())).into_response()
}

async fn show_article(State(recorded): State<Recorded>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    if let Err(response) = caller(&recorded, &headers) {
        return response;
    }
    match articles().into_iter().find(|a| a["id"].to_string() == id) {
        Some(article) => Json(article).into_response(),
        None => error(StatusCode::NOT_FOUND, "Article not found"),
    }
}

async fn create_article(State(recorded): State<Recorded>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    let user = match caller(&recorded, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    if let Err(response) = require_admin(&user) {
        return response;
    }
    recorded.bodies.lock().unwrap().push(body.clone());

    let mut article = body;
    article["id"] = json!(100);
    article["userId"] = user["id"].clone();
    (StatusCode::CREATED, Json(article)).into_response()
}

async fn update_article(
    State(recorded): State<Recorded>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let user = match caller(&recorded, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    if let Err(response) = require_admin(&user) {
        return response;
    }
    recorded.bodies.lock().unwrap().push(body.clone());

    let mut article = body;
    article["id"] = json!(id);
    Json(article).into_response()
}

async fn delete_article(State(recorded): State<Recorded>, headers: HeaderMap, Path(_id): Path<String>) -> Response {
    match caller(&recorded, &headers) {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(response) => response,
    }
}

/// Paginated envelope, two categories per page
async fn list_categories(
    State(recorded): State<Recorded>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Err(response) = caller(&recorded, &headers) {
        return response;
    }
    let page: usize = query.get("page").and_then(|p| p.parse().ok()).unwrap_or(1).max(1);
    let all = categories();
    let data: Vec<Value> = all.iter().skip((page - 1) * 2).take(2).cloned().collect();

    Json(json!({
        "data": data,
        "page": page,
        "total": all.len(),
        "totalPages": 2
    }))
    .into_response()
}

async fn delete_category(State(recorded): State<Recorded>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    if let Err(response) = caller(&recorded, &headers) {
        return response;
    }
    match id.as_str() {
        "1" | "2" => error(StatusCode::CONFLICT, "update or delete violates foreign key constraint"),
        "3" => StatusCode::NO_CONTENT.into_response(),
        _ => error(StatusCode::NOT_FOUND, "no rows"),
    }
}
