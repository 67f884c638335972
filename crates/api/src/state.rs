//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ApiConfig;
use crate::services::{EmailError, EmailService, MediaClient, MediaError};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    pool: PgPool,
    media: MediaClient,
    mailer: Option<EmailService>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// The mailer is optional: when the `SendGrid` settings are incomplete the
    /// server still starts, and the notification endpoint reports which
    /// variable is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the media client cannot be built.
    pub fn new(config: ApiConfig, pool: PgPool) -> Result<Self, MediaError> {
        let media = MediaClient::new(&config.media)?;

        let mailer = match EmailService::new(&config.email, &config.business_name) {
            Ok(mailer) => Some(mailer),
            Err(EmailError::NotConfigured(var)) => {
                tracing::info!(missing = var, "Email notifications disabled");
                None
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to set up email service");
                None
            }
        };

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                media,
                mailer,
            }),
        })
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the Cloudinary client.
    #[must_use]
    pub fn media(&self) -> &MediaClient {
        &self.inner.media
    }

    /// The owner-notification mailer, if email is configured.
    #[must_use]
    pub fn mailer(&self) -> Option<&EmailService> {
        self.inner.mailer.as_ref()
    }
}
