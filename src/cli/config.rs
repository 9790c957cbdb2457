use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::ApiClient;

const DEFAULT_API_URL: &str = "http://localhost:3000/api";
const SETTINGS_FILE: &str = "cli.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    Up,
    Down,
    Unknown,
}

/// Where the CLI sends requests, plus the result of the last ping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    pub api_url: String,
    pub updated_at: DateTime<Utc>,
    pub last_ping: Option<DateTime<Utc>>,
    pub status: ServerStatus,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            updated_at: Utc::now(),
            last_ping: None,
            status: ServerStatus::Unknown,
        }
    }
}

impl CliConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Self::default()
        }
    }

    pub fn update_ping(&mut self, status: ServerStatus) {
        self.last_ping = Some(Utc::now());
        self.status = status;
    }

    /// `PORTAL_API_URL` wins over the saved URL
    pub fn effective_api_url(&self) -> String {
        std::env::var("PORTAL_API_URL").unwrap_or_else(|_| self.api_url.clone())
    }
}

pub fn get_config_dir() -> anyhow::Result<PathBuf> {
    let config_dir = if let Ok(custom_dir) = std::env::var("PORTAL_CLI_CONFIG_DIR") {
        PathBuf::from(custom_dir)
    } else {
        let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
        PathBuf::from(home).join(".config").join("blog-portal").join("cli")
    };

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

pub fn load_cli_config() -> anyhow::Result<CliConfig> {
    let config_dir = get_config_dir()?;
    let settings_file = config_dir.join(SETTINGS_FILE);

    if !settings_file.exists() {
        return Ok(CliConfig::default());
    }

    let content = fs::read_to_string(settings_file)?;
    let config: CliConfig = serde_json::from_str(&content)?;
    Ok(config)
}

pub fn save_cli_config(config: &CliConfig) -> anyhow::Result<()> {
    let config_dir = get_config_dir()?;
    let settings_file = config_dir.join(SETTINGS_FILE);

    let content = serde_json::to_string_pretty(config)?;
    fs::write(settings_file, content)?;
    Ok(())
}

pub async fn ping_server(api_url: &str) -> ServerStatus {
    let Ok(client) = ApiClient::with_timeout(api_url, std::time::Duration::from_secs(5)) else {
        return ServerStatus::Down;
    };

    match client.health().await {
        Ok(_) => ServerStatus::Up,
        Err(e) => {
            tracing::debug!("ping failed: {}", e);
            ServerStatus::Down
        }
    }
}
