use clap::Subcommand;
use serde_json::json;

use crate::cli::context::{user_facing, CliContext};
use crate::cli::utils::{output_item, output_success, resolve_password};
use crate::cli::OutputFormat;
use crate::models::{Credentials, Registration, User};

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Login to the portal")]
    Login {
        #[arg(help = "Username")]
        username: String,
        #[arg(long, help = "Password (will prompt if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Logout and forget the stored session")]
    Logout,

    #[command(about = "Show current authentication status")]
    Status,

    #[command(about = "Fetch current user information from the server")]
    Whoami,

    #[command(about = "Register a new user and log in")]
    Register {
        #[arg(help = "Username")]
        username: String,
        #[arg(help = "Email")]
        email: String,
        #[arg(long, help = "Password (will prompt if not provided)")]
        password: Option<String>,
    },
}

pub async fn handle(cmd: AuthCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let ctx = CliContext::load(output_format).await?;

    match cmd {
        AuthCommands::Login { username, password } => {
            let credentials = Credentials {
                username,
                password: resolve_password(password)?,
            };
            let user = ctx.session.login(&credentials).await.map_err(user_facing)?;
            output_success(
                &ctx.output,
                &format!("Logged in as {} ({})", user.username, user.role),
                Some(json!({ "user": user })),
            )
        }
        AuthCommands::Logout => {
            ctx.session.logout();
            output_success(&ctx.output, "Logged out", None)
        }
        AuthCommands::Status => {
            let state = ctx.session.state();
            let user = ctx.session.user();
            output_item(&ctx.output, &json!({ "state": state, "user": user }), |_| match &user {
                Some(user) => format!("Logged in as {} ({})", user.username, user.role),
                None => "Not logged in".to_string(),
            })
        }
        AuthCommands::Whoami => {
            let user = ctx.session.refresh().await.map_err(user_facing)?;
            output_item(&ctx.output, &user, describe_user)
        }
        AuthCommands::Register {
            username,
            email,
            password,
        } => {
            let registration = Registration {
                username,
                email,
                password: resolve_password(password)?,
            };
            let user = ctx.session.register(&registration).await.map_err(user_facing)?;
            output_success(
                &ctx.output,
                &format!("Registered and logged in as {}", user.username),
                Some(json!({ "user": user })),
            )
        }
    }
}

fn describe_user(user: &User) -> String {
    let mut lines = vec![
        format!("ID: {}", user.id),
        format!("Username: {}", user.username),
        format!("Role: {}", user.role),
    ];
    if let Some(email) = &user.email {
        lines.push(format!("Email: {}", email));
    }
    lines.join("\n")
}
