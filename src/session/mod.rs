//! Client-side authentication session.
//!
//! A `Session` owns the bearer token and cached user, persists both under
//! fixed keys in a `SessionStore`, and tears everything down on logout or on
//! the first 401 from an authenticated call.

pub mod backend;
pub mod store;

pub use backend::{AuthBackend, LogRedirect, LoginRedirect};
pub use store::{FileStore, MemoryStore, SessionStore, StorageError, TOKEN_KEY, USER_KEY};

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;

use crate::api::{ClientError, LatestOnly};
use crate::auth::{token_expired, AuthSnapshot};
use crate::models::{Credentials, Registration, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Unauthenticated,
    Initializing,
    Authenticated,
    Expiring,
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("not logged in")]
    NotAuthenticated,

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl SessionError {
    pub fn user_message(&self) -> String {
        match self {
            SessionError::NotAuthenticated => "You are not logged in.".to_string(),
            SessionError::Client(err) => err.user_message(),
            SessionError::Storage(_) => "Could not save your session locally.".to_string(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        match self {
            SessionError::NotAuthenticated => true,
            SessionError::Client(err) => err.is_unauthorized(),
            SessionError::Storage(_) => false,
        }
    }
}

#[derive(Debug)]
struct Inner {
    state: SessionState,
    token: Option<String>,
}

pub struct Session {
    store: Arc<dyn SessionStore>,
    backend: Arc<dyn AuthBackend>,
    redirect: Arc<dyn LoginRedirect>,
    inner: RwLock<Inner>,
    user: LatestOnly<User>,
    redirect_armed: AtomicBool,
}

impl Session {
    pub fn new(
        store: Arc<dyn SessionStore>,
        backend: Arc<dyn AuthBackend>,
        redirect: Arc<dyn LoginRedirect>,
    ) -> Self {
        Self {
            store,
            backend,
            redirect,
            inner: RwLock::new(Inner {
                state: SessionState::Unauthenticated,
                token: None,
            }),
            user: LatestOnly::new(),
            redirect_armed: AtomicBool::new(true),
        }
    }

    pub fn state(&self) -> SessionState {
        self.read().state
    }

    pub fn token(&self) -> Option<String> {
        self.read().token.clone()
    }

    pub fn user(&self) -> Option<User> {
        match self.state() {
            SessionState::Authenticated => self.user.get(),
            _ => None,
        }
    }

    /// What the RBAC guard sees
    pub fn snapshot(&self) -> AuthSnapshot {
        AuthSnapshot {
            loading: self.state() == SessionState::Initializing,
            user: self.user(),
        }
    }

    /// Restores a persisted session by validating its token with the backend.
    ///
    /// Any failure clears the persisted credentials.
    pub async fn initialize(&self) -> Result<SessionState, SessionError> {
        let Some(token) = self.store.get(TOKEN_KEY) else {
            self.set_state(SessionState::Unauthenticated);
            return Ok(SessionState::Unauthenticated);
        };

        if token_expired(&token, Utc::now()) {
            tracing::info!("persisted token has expired");
            self.clear_credentials();
            return Ok(SessionState::Unauthenticated);
        }

        {
            let mut inner = self.write();
            inner.state = SessionState::Initializing;
            inner.token = Some(token.clone());
        }

        let ticket = self.user.begin();
        match self.backend.current_user(&token).await {
            Ok(user) => {
                if self.token().as_deref() != Some(token.as_str()) {
                    tracing::debug!("session changed while validating, dropping result");
                    return Ok(self.state());
                }
                self.persist_user(&user)?;
                self.user.apply(ticket, user);
                self.set_state(SessionState::Authenticated);
                self.redirect_armed.store(true, Ordering::SeqCst);
                Ok(SessionState::Authenticated)
            }
            Err(e) => {
                tracing::warn!("persisted session rejected: {}", e);
                self.clear_credentials();
                Ok(SessionState::Unauthenticated)
            }
        }
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<User, SessionError> {
        let ticket = self.user.begin();
        let response = self.backend.login(credentials).await?;

        self.store.set(TOKEN_KEY, &response.token)?;
        self.persist_user(&response.user)?;

        {
            let mut inner = self.write();
            inner.state = SessionState::Authenticated;
            inner.token = Some(response.token);
        }
        self.user.apply(ticket, response.user.clone());
        self.redirect_armed.store(true, Ordering::SeqCst);

        tracing::info!(username = %response.user.username, role = %response.user.role, "logged in");
        Ok(response.user)
    }

    /// Creates the account, then logs in with the same credentials
    pub async fn register(&self, registration: &Registration) -> Result<User, SessionError> {
        self.backend.register(registration).await?;
        tracing::info!(username = %registration.username, "registered");
        self.login(&registration.credentials()).await
    }

    /// Ends the session locally. Needs no network call to succeed.
    pub fn logout(&self) {
        self.clear_credentials();
        tracing::info!("logged out");
    }

    /// Re-fetches the current user. A response superseded by a later refresh
    /// or by a logout is dropped.
    pub async fn refresh(&self) -> Result<User, SessionError> {
        let token = self.token().ok_or(SessionError::NotAuthenticated)?;
        let ticket = self.user.begin();

        match self.backend.current_user(&token).await {
            Ok(user) => {
                if self.token().as_deref() == Some(token.as_str()) && self.user.apply(ticket, user.clone()) {
                    self.persist_user(&user)?;
                }
                Ok(user)
            }
            Err(e) if e.is_unauthorized() => {
                self.expire_token(&token);
                Err(e.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Runs an authenticated call with the current token.
    ///
    /// A 401 ends the session; 403 and every other failure leave it alone.
    pub async fn authorized<T, F, Fut>(&self, call: F) -> Result<T, SessionError>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        let token = self.token().ok_or(SessionError::NotAuthenticated)?;

        if token_expired(&token, Utc::now()) {
            self.expire();
            return Err(ClientError::Unauthorized("token expired".to_string()).into());
        }

        match call(token.clone()).await {
            Err(e) if e.is_unauthorized() => {
                self.expire_token(&token);
                Err(e.into())
            }
            other => other.map_err(SessionError::from),
        }
    }

    /// Tears the session down after an authorization failure and sends the
    /// user to login. Returns whether this call fired the redirect; it fires
    /// once until the next successful login.
    ///
    /// The state reads `Expiring` while the redirect runs and
    /// `Unauthenticated` once it returns.
    pub fn expire(&self) -> bool {
        self.drop_credentials(SessionState::Expiring);

        let fired = self
            .redirect_armed
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if fired {
            tracing::warn!("authorization rejected, redirecting to login");
            self.redirect.redirect_to_login();
        }

        let mut inner = self.write();
        if inner.state == SessionState::Expiring {
            inner.state = SessionState::Unauthenticated;
        }
        fired
    }

    /// Expires the session only if `token` is still the current one. A 401
    /// for a token replaced by logout or a later login is ignored.
    fn expire_token(&self, token: &str) -> bool {
        if self.token().as_deref() != Some(token) {
            tracing::debug!("ignoring 401 for a superseded token");
            return false;
        }
        self.expire()
    }

    fn clear_credentials(&self) {
        self.drop_credentials(SessionState::Unauthenticated);
    }

    fn drop_credentials(&self, state: SessionState) {
        {
            let mut inner = self.write();
            inner.token = None;
            inner.state = state;
        }
        self.user.clear();

        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(e) = self.store.remove(key) {
                tracing::error!(key, "failed to clear persisted credential: {}", e);
            }
        }
    }

    fn persist_user(&self, user: &User) -> Result<(), SessionError> {
        let json = serde_json::to_string(user).map_err(StorageError::from)?;
        self.store.set(USER_KEY, &json)?;
        Ok(())
    }

    /// The user cached by the last login, without contacting the backend
    pub fn cached_user(&self) -> Option<User> {
        self.store
            .get(USER_KEY)
            .and_then(|json| serde_json::from_str(&json).ok())
    }

    fn set_state(&self, state: SessionState) {
        self.write().state = state;
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}
