//! Customer route handlers.
//!
//! The contact form creates customers publicly; listing and deletion are
//! admin-only.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::{delete, get},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use agfood_core::{Email, Phone};

use crate::{
    db::{CustomerRepository, RepositoryError},
    error::AppError,
    extract::{ApiJson, CustomerIdPath, IdPath},
    middleware::RequireAdmin,
    models::{Customer, NewCustomer},
    state::AppState,
};

use super::{MessageResponse, or_not_found};

/// Build the customers router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/customers", get(list).post(create))
        .route("/customers/{id}", delete(remove))
}

/// Contact form submission.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
    pub address: Option<String>,
    pub wants_offers: Option<bool>,
}

/// Response for a created customer.
#[derive(Debug, Serialize)]
pub struct CreatedCustomer {
    pub message: &'static str,
    pub customer: Customer,
}

/// Query parameters for the customer list.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Keep only the newest record per phone number.
    #[serde(default)]
    pub unique: bool,
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Validate a contact form submission.
///
/// The email is only kept when the visitor opts in to offers.
///
/// # Errors
///
/// Returns `AppError::BadRequest` with the first failing rule.
pub fn validate_customer(req: &CreateCustomerRequest) -> Result<NewCustomer, AppError> {
    let (Some(name), Some(phone)) = (
        non_blank(req.name.as_deref()),
        non_blank(req.phone.as_deref()),
    ) else {
        return Err(AppError::BadRequest("Name and phone are required".into()));
    };

    let phone = Phone::parse(&phone)
        .map_err(|_| AppError::BadRequest("Phone number must be exactly 10 digits".into()))?;

    let wants_offers = req.wants_offers.unwrap_or(false);
    let email = if wants_offers {
        let raw = non_blank(req.email.as_deref()).ok_or_else(|| {
            AppError::BadRequest("Email is required when opting in for offers.".into())
        })?;
        Some(Email::parse(&raw).map_err(|_| {
            AppError::BadRequest("Please enter a valid email address".into())
        })?)
    } else {
        None
    };

    Ok(NewCustomer {
        name,
        phone,
        email,
        message: non_blank(req.message.as_deref()),
        address: non_blank(req.address.as_deref()),
        wants_offers,
    })
}

/// List customers, newest first.
#[instrument(skip(_admin, state))]
pub async fn list(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Customer>>, AppError> {
    let repo = CustomerRepository::new(state.pool());
    let customers = if query.unique {
        repo.list_unique_by_phone().await?
    } else {
        repo.list().await?
    };
    Ok(Json(customers))
}

/// Create a customer from the contact form.
#[instrument(skip(state, req))]
pub async fn create(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<CreatedCustomer>), AppError> {
    let new_customer = validate_customer(&req)?;
    let customer = CustomerRepository::new(state.pool())
        .create(&new_customer)
        .await?;

    tracing::info!(customer_id = %customer.id, "Customer created");

    Ok((
        StatusCode::CREATED,
        Json(CreatedCustomer {
            message: "Customer created successfully",
            customer,
        }),
    ))
}

/// Delete a customer that has no orders.
#[instrument(skip(_admin, state))]
pub async fn remove(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    IdPath(id, _): CustomerIdPath,
) -> Result<Json<MessageResponse>, AppError> {
    const HAS_ORDERS: &str =
        "Cannot delete customer with existing orders. Delete their orders first.";

    let repo = CustomerRepository::new(state.pool());

    if repo.get_by_id(id).await?.is_none() {
        return Err(AppError::NotFound("Customer not found".into()));
    }
    if repo.count_orders(id).await? > 0 {
        return Err(AppError::BadRequest(HAS_ORDERS.into()));
    }

    // An order placed between the count and the delete trips the foreign key
    repo.delete(id).await.map_err(|e| match e {
        RepositoryError::Conflict(_) => AppError::BadRequest(HAS_ORDERS.into()),
        other => or_not_found("Customer not found")(other),
    })?;

    tracing::info!(customer_id = %id, "Customer deleted");

    Ok(Json(MessageResponse::new("Customer deleted successfully")))
}
