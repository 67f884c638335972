//! Payment handlers.
//!
//! `initiate` hands the storefront a UPI deep link for a placed order. The
//! gateway reports the outcome to `callback`, which only trusts requests
//! signed with `PAYMENT_WEBHOOK_SECRET`; the storefront cannot mark an order
//! paid.

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::post,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use agfood_core::{OrderId, PaymentStatus};

use crate::{
    db::OrderRepository,
    error::AppError,
    extract::ApiJson,
    services::{
        PaymentError, UpiLinks, payment_links,
        payments::{SIGNATURE_HEADER, TIMESTAMP_HEADER, check_amount, verify_signature},
    },
    state::AppState,
};

use super::or_not_found;

const NOT_FOUND: &str = "Order not found";

/// Build the payments router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/payments/initiate", post(initiate))
        .route("/payments/callback", post(callback))
}

/// Body of `POST /payments/initiate`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateRequest {
    pub order_id: Option<OrderId>,
    pub amount: Option<f64>,
}

/// Payment links for an order.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateResponse {
    pub message: &'static str,
    pub order_id: OrderId,
    pub amount: i32,
    pub transaction_id: String,
    #[serde(flatten)]
    pub links: UpiLinks,
}

/// Gateway callback body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackPayload {
    pub order_id: OrderId,
    pub transaction_id: String,
    pub status: String,
}

/// Acknowledgement of a recorded callback.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackResponse {
    pub message: &'static str,
    pub order_id: OrderId,
    pub payment_status: PaymentStatus,
}

/// Mark an order's payment as initiated and return its UPI links.
#[instrument(skip(state, req))]
pub async fn initiate(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<InitiateRequest>,
) -> Result<Json<InitiateResponse>, AppError> {
    let order_id = req
        .order_id
        .ok_or_else(|| AppError::BadRequest("orderId is required".into()))?;

    let repo = OrderRepository::new(state.pool());
    let order = repo
        .get_by_id(order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.into()))?;

    check_amount(order.total_price, req.amount)?;

    if order.payment_status == PaymentStatus::Completed {
        return Err(AppError::BadRequest("Order is already paid".into()));
    }

    let order = repo
        .update_payment(order_id, PaymentStatus::Initiated, None)
        .await
        .map_err(or_not_found(NOT_FOUND))?;

    let config = state.config();
    let links = payment_links(
        &config.payments.payee_id,
        &config.business_name,
        order.total_price,
        order.id,
    );

    tracing::info!(order_id = %order.id, amount = order.total_price, "Payment initiated");

    Ok(Json(InitiateResponse {
        message: "Payment initiated",
        order_id: order.id,
        amount: order.total_price,
        transaction_id: order.transaction_id,
        links,
    }))
}

fn header<'h>(headers: &'h HeaderMap, name: &str, display: &'static str) -> Result<&'h str, PaymentError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or(PaymentError::MissingHeader(display))
}

/// Record a signed payment outcome from the gateway.
#[instrument(skip(state, headers, body))]
pub async fn callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<CallbackResponse>, AppError> {
    let secret = state
        .config()
        .payments
        .webhook_secret
        .as_ref()
        .ok_or(PaymentError::NotConfigured)?;

    let timestamp = header(&headers, TIMESTAMP_HEADER, "X-Payment-Timestamp")?;
    let signature = header(&headers, SIGNATURE_HEADER, "X-Payment-Signature")?;

    if let Err(e) = verify_signature(secret, timestamp, &body, signature, Utc::now().timestamp()) {
        tracing::warn!(error = %e, "Rejected payment callback");
        return Err(e.into());
    }

    let payload: CallbackPayload = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid callback body: {e}")))?;

    let status = payload
        .status
        .parse::<PaymentStatus>()
        .ok()
        .filter(|s| s.is_settled())
        .ok_or_else(|| {
            AppError::BadRequest("status must be one of: completed, failed, cancelled".into())
        })?;

    let order = OrderRepository::new(state.pool())
        .update_payment(payload.order_id, status, Some(&payload.transaction_id))
        .await
        .map_err(or_not_found(NOT_FOUND))?;

    tracing::info!(
        order_id = %order.id,
        payment_status = %status,
        transaction_id = %payload.transaction_id,
        "Payment callback recorded"
    );

    Ok(Json(CallbackResponse {
        message: "Payment status recorded",
        order_id: order.id,
        payment_status: order.payment_status,
    }))
}
