//! Authentication extractor for admin-only handlers.
//!
//! The session maps its id to a [`CurrentAdmin`]; this extractor resolves that
//! mapping against the admin table on every request.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::db::AdminRepository;
use crate::error::{AppError, set_sentry_user};
use crate::models::{Admin, CurrentAdmin, session_keys};
use crate::state::AppState;

/// Message for requests without an admin session.
pub const NOT_LOGGED_IN: &str = "Unauthorized, please login";

/// Message for sessions whose admin has since been deleted.
pub const ADMIN_GONE: &str = "Unauthorized, admin not found";

/// Extractor that requires an authenticated admin.
///
/// Rejects with 401 when there is no session. When the session names an admin
/// that no longer exists, the session is flushed before rejecting.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAdmin(admin): RequireAdmin) -> impl IntoResponse {
///     format!("Hello, {}!", admin.email)
/// }
/// ```
pub struct RequireAdmin(pub Admin);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Set by SessionManagerLayer
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized(NOT_LOGGED_IN.into()))?;

        let current: CurrentAdmin = session
            .get(session_keys::CURRENT_ADMIN)
            .await
            .ok()
            .flatten()
            .ok_or_else(|| AppError::Unauthorized(NOT_LOGGED_IN.into()))?;

        let Some(admin) = AdminRepository::new(state.pool())
            .get_by_id(current.id)
            .await?
        else {
            tracing::warn!(admin_id = %current.id, "session references deleted admin");
            if let Err(e) = session.flush().await {
                tracing::error!(error = %e, "failed to flush stale admin session");
            }
            return Err(AppError::Unauthorized(ADMIN_GONE.into()));
        };

        set_sentry_user(admin.id.as_i32(), Some(admin.email.as_str()));

        Ok(Self(admin))
    }
}

/// Store the logged-in admin in the session.
///
/// The session id is cycled first so a pre-login id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_ADMIN, admin).await
}

/// Destroy the session entirely (logout).
///
/// # Errors
///
/// Returns an error if the session store cannot delete the record.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
