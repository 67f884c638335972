//! Database operations for the platform `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `customer` - Contact records from the contact form and checkout
//! - `product` - Catalog with price tiers and availability
//! - `customer_order` - Placed orders with embedded line items (JSONB)
//! - `offer` - Storefront announcements
//! - `admin` - Admin credentials (Argon2 hashes)
//! - `tower_sessions.session` - Admin session storage
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p agfood-cli -- migrate
//! ```

pub mod admins;
pub mod customers;
pub mod offers;
pub mod orders;
pub mod products;
pub mod stats;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use admins::AdminRepository;
pub use customers::CustomerRepository;
pub use offers::OfferRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use stats::DashboardStats;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email, referenced row).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map unique and foreign key violations to `Conflict`, everything else
    /// to `Database`.
    pub(crate) fn from_constraint(e: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && (db_err.is_unique_violation() || db_err.is_foreign_key_violation())
        {
            return Self::Conflict(what.to_string());
        }
        Self::Database(e)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
