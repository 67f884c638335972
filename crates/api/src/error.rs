//! Unified error handling for the API.
//!
//! Every handler returns `Result<_, AppError>`. Errors render as JSON
//! `{"message": ..., "details"?: ...}` so the storefront and admin console can
//! show them in a dialog.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::catalog::AvailabilityError;
use crate::services::checkout::QuoteError;
use crate::services::email::EmailError;
use crate::services::media::MediaError;
use crate::services::notification::NotificationError;
use crate::services::payments::PaymentError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Media storage rejected an upload or release.
    #[error("Media storage error: {0}")]
    Media(#[from] MediaError),

    /// Email provider failed to accept a message.
    #[error("Email error: {0}")]
    Email(#[from] EmailError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller is not authenticated (or the signature did not verify).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Bad request with structured details, e.g. which fields are missing.
    #[error("Bad request: {message}")]
    Invalid { message: String, details: Value },

    /// A credential for an external service is not configured.
    #[error("{message}: {details}")]
    Configuration { message: String, details: String },

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Configuration error naming the missing environment variable.
    #[must_use]
    pub fn missing_config(message: &str, var: &str) -> Self {
        Self::Configuration {
            message: message.to_string(),
            details: format!("{var} is not configured"),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Database(_)
            | Self::Media(_)
            | Self::Email(_)
            | Self::Configuration { .. }
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) | Self::Invalid { .. } => StatusCode::BAD_REQUEST,
        }
    }

    /// Body sent to the client.
    fn body(&self) -> ErrorBody {
        match self {
            // Don't expose internal error details to clients
            Self::Database(_) | Self::Internal(_) => ErrorBody::new("Internal server error"),
            Self::Media(e) => ErrorBody::new("Image storage error").with_details(e.to_string()),
            Self::Email(e) => ErrorBody::new("Failed to send email").with_details(e.to_string()),
            Self::Configuration { message, details } => {
                ErrorBody::new(message).with_details(details.clone())
            }
            Self::NotFound(message) | Self::Unauthorized(message) | Self::BadRequest(message) => {
                ErrorBody::new(message)
            }
            Self::Invalid { message, details } => ErrorBody {
                message: message.clone(),
                details: Some(details.clone()),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl ErrorBody {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: None,
        }
    }

    fn with_details(mut self, details: String) -> Self {
        self.details = Some(Value::String(details));
        self
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Log server errors with Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "API request error"
            );
        }

        (status, Json(self.body())).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => Self::Unauthorized("Invalid credentials".into()),
            AuthError::IncorrectOldPassword => {
                Self::Unauthorized("Old password is incorrect".into())
            }
            AuthError::AdminNotFound => Self::Unauthorized("Unauthorized, admin not found".into()),
            AuthError::AdminAlreadyExists => Self::BadRequest("Admin already exists".into()),
            AuthError::InvalidEmail(e) => Self::BadRequest(format!("Invalid email: {e}")),
            AuthError::WeakPassword(message) => Self::BadRequest(message),
            AuthError::Repository(e) => Self::Database(e),
            AuthError::PasswordHash => Self::Internal("password hashing failed".into()),
        }
    }
}

impl From<NotificationError> for AppError {
    fn from(err: NotificationError) -> Self {
        match err {
            NotificationError::IncompleteCustomer(missing) => Self::Invalid {
                message: "Customer information incomplete".into(),
                details: serde_json::json!({ "missing": missing }),
            },
            NotificationError::Template(e) => Self::Internal(format!("template error: {e}")),
        }
    }
}

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::NotConfigured => {
                Self::missing_config("Payment configuration error", "PAYMENT_WEBHOOK_SECRET")
            }
            PaymentError::MissingHeader(header) => {
                Self::BadRequest(format!("Missing {header} header"))
            }
            PaymentError::InvalidSignature(reason) => Self::Unauthorized(reason),
            PaymentError::AmountMismatch { expected, .. } => {
                Self::BadRequest(format!("Amount does not match order total of {expected}"))
            }
        }
    }
}

impl From<QuoteError> for AppError {
    fn from(err: QuoteError) -> Self {
        match err {
            QuoteError::UnknownProduct(_) => Self::NotFound(err.to_string()),
            QuoteError::EmptyCart | QuoteError::ZeroQuantity(_) => Self::BadRequest(err.to_string()),
        }
    }
}

impl From<AvailabilityError> for AppError {
    fn from(err: AvailabilityError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

/// Set the Sentry user context from an admin ID.
pub fn set_sentry_user(admin_id: i32, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(admin_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("Order not found".to_string());
        assert_eq!(err.to_string(), "Not found: Order not found");

        let err = AppError::missing_config("Email configuration error", "OWNER_EMAIL");
        assert_eq!(
            err.to_string(),
            "Email configuration error: OWNER_EMAIL is not configured"
        );
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::missing_config("Email configuration error", "X")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_not_found_body_is_bare_message() {
        let (status, body) = body_json(AppError::NotFound("Order not found".into())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, serde_json::json!({"message": "Order not found"}));
    }

    #[tokio::test]
    async fn test_configuration_body_names_variable() {
        let err = AppError::missing_config("Email configuration error", "SENDGRID_API_KEY");
        let (_, body) = body_json(err).await;
        assert_eq!(body["message"], "Email configuration error");
        assert_eq!(body["details"], "SENDGRID_API_KEY is not configured");
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let err = AppError::Internal("connection refused at 10.0.0.5".into());
        let (_, body) = body_json(err).await;
        assert_eq!(body, serde_json::json!({"message": "Internal server error"}));
    }

    #[tokio::test]
    async fn test_auth_errors_map_to_unauthorized() {
        let (status, body) = body_json(AuthError::InvalidCredentials.into()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid credentials");

        let (status, body) = body_json(AuthError::IncorrectOldPassword.into()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Old password is incorrect");
    }

    #[tokio::test]
    async fn test_incomplete_customer_lists_missing_fields() {
        let err = NotificationError::IncompleteCustomer(vec!["name", "address"]);
        let (status, body) = body_json(err.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Customer information incomplete");
        assert_eq!(body["details"]["missing"], serde_json::json!(["name", "address"]));
    }

    #[tokio::test]
    async fn test_payment_errors() {
        let (status, body) = body_json(PaymentError::NotConfigured.into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["details"], "PAYMENT_WEBHOOK_SECRET is not configured");

        let err = PaymentError::InvalidSignature("Signature mismatch".into());
        let (status, _) = body_json(err.into()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = body_json(PaymentError::MissingHeader("X-Payment-Signature").into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
