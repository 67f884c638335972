//! Admin session and account handlers.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::{
    db::DashboardStats,
    error::{AppError, clear_sentry_user},
    extract::ApiJson,
    middleware::{RequireAdmin, clear_current_admin, set_current_admin},
    models::CurrentAdmin,
    services::AdminAuthService,
    state::AppState,
};

use super::MessageResponse;

/// Build the admin router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/login", post(login))
        .route("/admin/logout", post(logout))
        .route("/admin/change-password", put(change_password))
        .route("/admin/dashboard-stats", get(dashboard_stats))
}

/// Login form.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: &'static str,
    pub admin: CurrentAdmin,
}

/// Password change form.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: Option<String>,
    pub new_password: Option<String>,
    pub confirm_password: Option<String>,
}

fn present(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.is_empty())
}

/// Start an admin session.
#[instrument(skip(state, session, req))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let (Some(email), Some(password)) = (
        present(req.email.as_ref()).map(str::trim),
        present(req.password.as_ref()),
    ) else {
        return Err(AppError::BadRequest(
            "Email and password are required".into(),
        ));
    };

    let admin = match AdminAuthService::new(state.pool()).login(email, password).await {
        Ok(admin) => admin,
        Err(e) => {
            tracing::warn!(error = %e, "Admin login failed");
            return Err(e.into());
        }
    };

    let current = CurrentAdmin::from(&admin);
    set_current_admin(&session, &current)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;

    tracing::info!(admin_id = %admin.id, "Admin logged in");

    Ok(Json(LoginResponse {
        message: "Login successful",
        admin: current,
    }))
}

/// End the admin session.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Json<MessageResponse>, AppError> {
    clear_current_admin(&session)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    clear_sentry_user();

    Ok(Json(MessageResponse::new("Logout successful")))
}

/// Change the logged-in admin's password.
#[instrument(skip(admin, state, req), fields(admin_id = %admin.id))]
pub async fn change_password(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let (Some(old), Some(new), Some(confirm)) = (
        present(req.old_password.as_ref()),
        present(req.new_password.as_ref()),
        present(req.confirm_password.as_ref()),
    ) else {
        return Err(AppError::BadRequest("All fields are required".into()));
    };

    if new != confirm {
        return Err(AppError::BadRequest("New passwords do not match".into()));
    }

    AdminAuthService::new(state.pool())
        .change_password(admin.id, old, new)
        .await?;

    tracing::info!("Admin password changed");

    Ok(Json(MessageResponse::new("Password changed successfully")))
}

/// Counts for the console dashboard.
#[instrument(skip(_admin, state))]
pub async fn dashboard_stats(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<DashboardStats>, AppError> {
    Ok(Json(DashboardStats::load(state.pool()).await?))
}
