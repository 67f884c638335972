//! Admin account commands.
//!
//! Passwords are hashed by the same service the API uses for login, so an
//! account created here can sign in to the console immediately.

use agfood_api::services::AdminAuthService;
use secrecy::{ExposeSecret, SecretString};

use super::{CommandError, connect};

/// Create a new admin account.
///
/// # Errors
///
/// Returns `CommandError::Auth` if the email is invalid, the password is too
/// short, or the email is already registered.
pub async fn create(email: &str, password: &SecretString) -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Creating admin: {email}");
    let admin = AdminAuthService::new(&pool)
        .create_admin(email, password.expose_secret())
        .await?;

    tracing::info!("Admin {} created with ID {}", admin.email, admin.id);
    Ok(())
}

/// Replace the password of an existing admin.
///
/// # Errors
///
/// Returns `CommandError::Auth` if no admin has this email or the password
/// is too short.
pub async fn reset_password(email: &str, password: &SecretString) -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Resetting password for admin: {email}");
    let admin = AdminAuthService::new(&pool)
        .reset_password(email, password.expose_secret())
        .await?;

    tracing::info!("Password updated for admin {}", admin.id);
    Ok(())
}
