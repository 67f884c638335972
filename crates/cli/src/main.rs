//! AG's Healthy Food CLI - database migrations and admin accounts.
//!
//! # Usage
//!
//! ```bash
//! # Apply pending migrations
//! agfood migrate
//!
//! # Create an admin (password read from AGFOOD_ADMIN_PASSWORD)
//! AGFOOD_ADMIN_PASSWORD=... agfood admin create -e owner@aghealthyfood.in
//!
//! # Force a new password for an existing admin
//! AGFOOD_ADMIN_PASSWORD=... agfood admin reset-password -e owner@aghealthyfood.in
//! ```
//!
//! # Environment Variables
//!
//! - `AGFOOD_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use secrecy::SecretString;

mod commands;

#[derive(Parser)]
#[command(name = "agfood")]
#[command(author, version, about = "AG's Healthy Food CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage admin accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin account
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Password for the account
        #[arg(long, env = "AGFOOD_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Replace an admin's password
    ResetPassword {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// New password
        #[arg(long, env = "AGFOOD_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create { email, password } => {
                commands::admin::create(&email, &SecretString::from(password)).await?;
            }
            AdminAction::ResetPassword { email, password } => {
                commands::admin::reset_password(&email, &SecretString::from(password)).await?;
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }
}
