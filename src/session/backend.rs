use async_trait::async_trait;

use crate::api::{ApiClient, ClientError};
use crate::models::{AuthResponse, Credentials, Registration, User};

/// The auth endpoints a session depends on
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ClientError>;

    async fn register(&self, registration: &Registration) -> Result<(), ClientError>;

    async fn current_user(&self, token: &str) -> Result<User, ClientError>;
}

#[async_trait]
impl AuthBackend for ApiClient {
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ClientError> {
        ApiClient::login(self, credentials).await
    }

    async fn register(&self, registration: &Registration) -> Result<(), ClientError> {
        ApiClient::register(self, registration).await.map(|_| ())
    }

    async fn current_user(&self, token: &str) -> Result<User, ClientError> {
        self.me(token).await
    }
}

/// Sends the user back to the login entry point
pub trait LoginRedirect: Send + Sync {
    fn redirect_to_login(&self);
}

/// Redirect that only logs; used where there is nowhere to navigate
#[derive(Debug, Default)]
pub struct LogRedirect;

impl LoginRedirect for LogRedirect {
    fn redirect_to_login(&self) {
        tracing::info!("session ended, login required");
    }
}
