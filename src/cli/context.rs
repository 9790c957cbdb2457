use std::sync::Arc;

use anyhow::anyhow;

use crate::api::ApiClient;
use crate::auth::{Guard, Rendered};
use crate::cli::config::{get_config_dir, load_cli_config};
use crate::cli::OutputFormat;
use crate::models::User;
use crate::session::{FileStore, LoginRedirect, Session, SessionError};

/// Tells the person at the terminal to log in again
#[derive(Debug, Default)]
pub struct TerminalRedirect;

impl LoginRedirect for TerminalRedirect {
    fn redirect_to_login(&self) {
        eprintln!("Session expired. Log in again with `portal auth login <username>`.");
    }
}

/// Everything a command needs: the API client, a restored session and the
/// output format
pub struct CliContext {
    pub client: Arc<ApiClient>,
    pub session: Arc<Session>,
    pub output: OutputFormat,
}

impl CliContext {
    /// Builds the client from saved settings and restores the persisted session
    pub async fn load(output: OutputFormat) -> anyhow::Result<Self> {
        let settings = load_cli_config()?;
        let client = Arc::new(ApiClient::new(&settings.effective_api_url())?);
        let store = Arc::new(FileStore::in_dir(&get_config_dir()?));
        let session = Arc::new(Session::new(store, client.clone(), Arc::new(TerminalRedirect)));

        session.initialize().await?;

        Ok(Self {
            client,
            session,
            output,
        })
    }

    /// Runs the RBAC guard against the current session
    pub fn require(&self, guard: &Guard) -> anyhow::Result<User> {
        match guard.render(&self.session.snapshot(), User::clone) {
            Rendered::Content(user) => Ok(user),
            Rendered::Loading => Err(anyhow!("Session is still being restored, try again")),
            Rendered::Redirect(_) => Err(anyhow!("Not logged in. Run `portal auth login <username>` first.")),
            Rendered::Denied(message) => Err(anyhow!(message)),
        }
    }
}

/// Single user-visible line for a failed call; the detail goes to the log
pub fn user_facing(err: SessionError) -> anyhow::Error {
    tracing::debug!("command failed: {:?}", err);
    anyhow!(err.user_message())
}
