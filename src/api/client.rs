use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use super::error::{extract_error_message, ClientError};
use crate::filter::{Listing, Page};
use crate::models::{
    delete_failure_message, Article, ArticleDraft, AuthResponse, Category, CategoryDraft, Credentials, Registration,
    User,
};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Upper bound on pages followed when collecting a whole collection
const MAX_PAGES: usize = 1000;

/// HTTP client for the portal REST contract.
///
/// Points either at the remote backend or at the portal's own `/api` routes;
/// both speak the same paths.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url).map_err(|e| ClientError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(base_url.to_string()));
        }

        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Appends path segments to the base URL, percent-encoding each one
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Sends one request and returns status plus JSON body on success.
    ///
    /// Non-2xx responses become a `ClientError` carrying the upstream status
    /// and the message found in the body.
    pub async fn send_raw(
        &self,
        method: Method,
        segments: &[&str],
        query: Option<&str>,
        token: Option<&str>,
        body: Option<&Value>,
    ) -> Result<(StatusCode, Value), ClientError> {
        let mut url = self.endpoint(segments)?;
        url.set_query(query.filter(|q| !q.is_empty()));

        tracing::debug!(%method, %url, authenticated = token.is_some(), "sending request");

        let mut request = self.http.request(method.clone(), url.clone());
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!(%method, %url, "request failed: {}", e);
            ClientError::Transport(e)
        })?;

        let status = response.status();
        let bytes = response.bytes().await?;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            match serde_json::from_slice::<Value>(&bytes) {
                Ok(value) => value,
                Err(_) if !status.is_success() => Value::String(String::from_utf8_lossy(&bytes).into_owned()),
                Err(e) => return Err(ClientError::Decode(e.to_string())),
            }
        };

        if status.is_success() {
            return Ok((status, value));
        }

        let message = extract_error_message(&value)
            .or_else(|| value.as_str().filter(|s| !s.trim().is_empty()).map(str::to_string))
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string());
        tracing::warn!(%method, %url, status = status.as_u16(), "request rejected: {}", message);
        Err(ClientError::from_status(status.as_u16(), message))
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        query: Option<&str>,
        token: Option<&str>,
        body: Option<&Value>,
    ) -> Result<T, ClientError> {
        let (_, value) = self.send_raw(method, segments, query, token, body).await?;
        serde_json::from_value(value).map_err(|e| ClientError::Decode(e.to_string()))
    }

    async fn send_body<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        token: Option<&str>,
        body: &B,
    ) -> Result<T, ClientError> {
        let body = serde_json::to_value(body).map_err(|e| ClientError::Decode(e.to_string()))?;
        self.send(method, segments, None, token, Some(&body)).await
    }

    // Auth

    pub async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ClientError> {
        self.send_body(Method::POST, &["auth", "login"], None, credentials).await
    }

    pub async fn register(&self, registration: &Registration) -> Result<Value, ClientError> {
        self.send_body(Method::POST, &["auth", "register"], None, registration).await
    }

    pub async fn me(&self, token: &str) -> Result<User, ClientError> {
        let value: Value = self.send(Method::GET, &["auth", "me"], None, Some(token), None).await?;
        // Some backends wrap the user as `{ user: {...} }`
        let user = match value.get("user") {
            Some(inner) if inner.is_object() => inner.clone(),
            _ => value,
        };
        serde_json::from_value(user).map_err(|e| ClientError::Decode(e.to_string()))
    }

    // Collections

    /// One listing request, normalized into a `Page`
    pub async fn list_page<T: DeserializeOwned>(
        &self,
        collection: &str,
        token: &str,
        query: Option<&str>,
    ) -> Result<Page<T>, ClientError> {
        let listing: Listing<T> = self.send(Method::GET, &[collection], query, Some(token), None).await?;
        Ok(Page::from(listing))
    }

    /// Fetches an entire collection, following envelope pages when the
    /// backend paginates
    pub async fn list_all<T: DeserializeOwned>(&self, collection: &str, token: &str) -> Result<Vec<T>, ClientError> {
        let mut page = self.list_page::<T>(collection, token, None).await?;
        let mut items = std::mem::take(&mut page.data);

        let mut fetched = 1;
        while page.has_next() && fetched < MAX_PAGES {
            let next = page.page + 1;
            let query = format!("page={}", next);
            page = self.list_page(collection, token, Some(&query)).await?;
            if page.page != next || page.data.is_empty() {
                break;
            }
            items.append(&mut page.data);
            fetched += 1;
        }

        tracing::debug!(collection, count = items.len(), pages = fetched, "collection loaded");
        Ok(items)
    }

    pub async fn list_articles(&self, token: &str) -> Result<Vec<Article>, ClientError> {
        self.list_all("articles", token).await
    }

    pub async fn get_article(&self, token: &str, id: &str) -> Result<Article, ClientError> {
        self.send(Method::GET, &["articles", id], None, Some(token), None).await
    }

    pub async fn create_article(&self, token: &str, draft: &ArticleDraft) -> Result<Article, ClientError> {
        draft.validate()?;
        let draft = draft.clone().with_derived_excerpt();
        self.send_body(Method::POST, &["articles"], Some(token), &draft).await
    }

    pub async fn update_article(&self, token: &str, id: &str, draft: &ArticleDraft) -> Result<Article, ClientError> {
        draft.validate()?;
        let draft = draft.clone().with_derived_excerpt();
        self.send_body(Method::PUT, &["articles", id], Some(token), &draft).await
    }

    pub async fn delete_article(&self, token: &str, id: &str) -> Result<(), ClientError> {
        self.send_raw(Method::DELETE, &["articles", id], None, Some(token), None)
            .await
            .map(|_| ())
    }

    pub async fn list_categories(&self, token: &str) -> Result<Vec<Category>, ClientError> {
        self.list_all("categories", token).await
    }

    pub async fn get_category(&self, token: &str, id: &str) -> Result<Category, ClientError> {
        self.send(Method::GET, &["categories", id], None, Some(token), None).await
    }

    pub async fn create_category(&self, token: &str, draft: &CategoryDraft) -> Result<Category, ClientError> {
        draft.validate()?;
        self.send_body(Method::POST, &["categories"], Some(token), draft).await
    }

    pub async fn update_category(&self, token: &str, id: &str, draft: &CategoryDraft) -> Result<Category, ClientError> {
        draft.validate()?;
        self.send_body(Method::PUT, &["categories", id], Some(token), draft).await
    }

    pub async fn delete_category(&self, token: &str, id: &str) -> Result<(), ClientError> {
        match self.send_raw(Method::DELETE, &["categories", id], None, Some(token), None).await {
            Ok(_) => Ok(()),
            Err(err) => {
                let message = err.status().and_then(delete_failure_message);
                Err(match (err, message) {
                    (ClientError::NotFound(_), Some(msg)) => ClientError::NotFound(msg.to_string()),
                    (ClientError::Conflict(_), Some(msg)) => ClientError::Conflict(msg.to_string()),
                    (err, _) => err,
                })
            }
        }
    }

    /// `GET /health` relative to the host root
    pub async fn health(&self) -> Result<Value, ClientError> {
        let mut url = self.base_url.clone();
        url.set_path("/health");
        url.set_query(None);
        let response = self.http.get(url).send().await?;
        let status = response.status();
        let value = response.json::<Value>().await.unwrap_or(Value::Null);
        if status.is_success() {
            Ok(value)
        } else {
            let message = extract_error_message(&value).unwrap_or_else(|| status.to_string());
            Err(ClientError::from_status(status.as_u16(), message))
        }
    }
}
