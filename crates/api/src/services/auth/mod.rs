//! Admin authentication service.
//!
//! Password login with Argon2id hashes, password changes, and seeding of the
//! initial admin account.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;

use agfood_core::{AdminId, Email};

use crate::db::{AdminRepository, RepositoryError};
use crate::models::Admin;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// What [`AdminAuthService::seed_admin`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// No admin had the seed email, so one was created.
    Created,
    /// The admin already existed and was left untouched.
    AlreadyPresent,
}

/// Admin authentication service.
pub struct AdminAuthService<'a> {
    admins: AdminRepository<'a>,
}

impl<'a> AdminAuthService<'a> {
    /// Create a new admin authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            admins: AdminRepository::new(pool),
        }
    }

    /// Login with email and password.
    ///
    /// A malformed email is reported the same way as an unknown one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<Admin, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (admin, password_hash) = self
            .admins
            .get_with_hash_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(admin)
    }

    /// Change the password of a logged-in admin.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword` if the new password is too short.
    /// Returns `AuthError::IncorrectOldPassword` if `old_password` is wrong.
    /// Returns `AuthError::AdminNotFound` if the admin was deleted meanwhile.
    pub async fn change_password(
        &self,
        id: AdminId,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        validate_password(new_password)?;

        let (_, password_hash) = self
            .admins
            .get_with_hash_by_id(id)
            .await?
            .ok_or(AuthError::AdminNotFound)?;

        verify_password(old_password, &password_hash)
            .map_err(|_| AuthError::IncorrectOldPassword)?;

        let new_hash = hash_password(new_password)?;
        self.admins
            .update_password(id, &new_hash)
            .await
            .map_err(not_found_as_missing_admin)
    }

    /// Create a new admin account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::AdminAlreadyExists` if the email is already registered.
    pub async fn create_admin(&self, email: &str, password: &str) -> Result<Admin, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        self.admins
            .create(&email, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::AdminAlreadyExists,
                other => AuthError::Repository(other),
            })
    }

    /// Overwrite an admin's password without knowing the old one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::AdminNotFound` if no admin has this email.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    pub async fn reset_password(&self, email: &str, new_password: &str) -> Result<Admin, AuthError> {
        let email = Email::parse(email)?;
        validate_password(new_password)?;

        let (admin, _) = self
            .admins
            .get_with_hash_by_email(&email)
            .await?
            .ok_or(AuthError::AdminNotFound)?;

        let new_hash = hash_password(new_password)?;
        self.admins
            .update_password(admin.id, &new_hash)
            .await
            .map_err(not_found_as_missing_admin)?;

        Ok(admin)
    }

    /// Make sure the configured admin exists.
    ///
    /// An existing admin keeps their current password, so a password changed
    /// through the console survives restarts.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` or `AuthError::WeakPassword` for bad
    /// seed credentials, and repository errors as-is.
    pub async fn seed_admin(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<SeedOutcome, AuthError> {
        let parsed = Email::parse(email)?;
        if self.admins.get_with_hash_by_email(&parsed).await?.is_some() {
            return Ok(SeedOutcome::AlreadyPresent);
        }

        match self.create_admin(email, password.expose_secret()).await {
            Ok(_) => Ok(SeedOutcome::Created),
            // Another instance seeded concurrently
            Err(AuthError::AdminAlreadyExists) => Ok(SeedOutcome::AlreadyPresent),
            Err(e) => Err(e),
        }
    }
}

fn not_found_as_missing_admin(e: RepositoryError) -> AuthError {
    match e {
        RepositoryError::NotFound => AuthError::AdminNotFound,
        other => AuthError::Repository(other),
    }
}

// =============================================================================
// Password Helpers
// =============================================================================

/// Validate password requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters long"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("millet-bowl-42").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("millet-bowl-42", &hash).is_ok());
        assert!(matches!(
            verify_password("millet-bowl-43", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same-password").unwrap();
        let b = hash_password("same-password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(matches!(
            verify_password("anything", "not-a-phc-string"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_validate_password_length() {
        assert!(validate_password("1234567").is_err());
        assert!(validate_password("12345678").is_ok());
        // Counted in characters, not bytes
        assert!(validate_password("₹₹₹₹₹₹₹").is_err());
    }
}
