//! Database migration command.
//!
//! Applies every pending migration from `crates/api/migrations`. Run this
//! before starting a new server build.

use super::{CommandError, connect};

/// Apply pending migrations.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the connection fails,
/// or a migration fails to apply.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../api/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
