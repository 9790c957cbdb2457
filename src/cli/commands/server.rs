use clap::Subcommand;
use serde_json::json;

use crate::cli::config::{load_cli_config, ping_server, save_cli_config, CliConfig, ServerStatus};
use crate::cli::utils::{output_item, output_success};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum ServerCommands {
    #[command(about = "Set the portal API URL (e.g. http://localhost:3000/api)")]
    Set {
        #[arg(help = "Portal API URL")]
        url: String,
    },

    #[command(about = "Show the portal API URL in use")]
    Show,

    #[command(about = "Check that the portal API is reachable")]
    Ping,
}

pub async fn handle(cmd: ServerCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ServerCommands::Set { url } => {
            let url = url.trim_end_matches('/').to_string();
            url::Url::parse(&url).map_err(|e| anyhow::anyhow!("Invalid URL '{}': {}", url, e))?;

            save_cli_config(&CliConfig::new(url.clone()))?;
            output_success(
                &output_format,
                &format!("API URL set to {}", url),
                Some(json!({ "api_url": url })),
            )
        }
        ServerCommands::Show => {
            let config = load_cli_config()?;
            let effective = config.effective_api_url();
            output_item(
                &output_format,
                &json!({
                    "api_url": effective,
                    "saved_api_url": config.api_url,
                    "status": config.status,
                    "last_ping": config.last_ping,
                }),
                |_| {
                    let last_ping = config
                        .last_ping
                        .map(|t| t.to_rfc3339())
                        .unwrap_or_else(|| "never".to_string());
                    format!("API URL: {}\nLast ping: {} ({:?})", effective, last_ping, config.status)
                },
            )
        }
        ServerCommands::Ping => {
            let mut config = load_cli_config()?;
            let url = config.effective_api_url();
            let status = ping_server(&url).await;
            config.update_ping(status.clone());
            save_cli_config(&config)?;

            match status {
                ServerStatus::Up => output_success(
                    &output_format,
                    &format!("{} is up", url),
                    Some(json!({ "status": "up" })),
                ),
                _ => Err(anyhow::anyhow!("{} is not reachable", url)),
            }
        }
    }
}
