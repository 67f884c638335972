//! Order route handlers.
//!
//! Placement is public (the storefront checkout). Everything else is
//! admin-only except `send-email`, which the storefront triggers once the
//! customer has paid.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get, patch, post},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use agfood_core::{
    DeliveryPoint, Email, OrderId, OrderStatus, PaymentStatus, Phone, PlanType, ProductId,
};

use crate::{
    db::OrderRepository,
    error::AppError,
    extract::{ApiJson, IdPath, OrderIdPath},
    middleware::RequireAdmin,
    models::{NewCustomer, NewOrder, Order, OrderLine, OrderWithCustomer},
    services::render_order_notification,
    state::AppState,
};

use super::{MessageResponse, or_not_found};

const NOT_FOUND: &str = "Order not found";
const DEFAULT_PAYMENT_METHOD: &str = "upi";

/// Build the orders router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list).post(place))
        .route("/orders/{id}", delete(remove))
        .route("/orders/{id}/status", patch(update_status))
        .route("/orders/{id}/payment-status", patch(update_payment_status))
        .route("/orders/{id}/send-email", post(send_email))
}

/// A cart line as sent by the storefront.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemRequest {
    pub product_id: Option<ProductId>,
    pub product_name: Option<String>,
    pub pack_name: Option<String>,
    pub quantity: Option<u32>,
    pub price: Option<f64>,
    #[serde(default)]
    pub order_type: PlanType,
}

/// Checkout submission.
///
/// A client-sent `deliveryCharge` is ignored; the charge follows from the
/// delivery point.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub wants_offers: Option<bool>,
    pub products: Option<Vec<LineItemRequest>>,
    pub total_price: Option<f64>,
    pub transaction_id: Option<String>,
    pub delivery_point: Option<String>,
    pub payment_method: Option<String>,
    pub payment_status: Option<String>,
}

/// Response carrying an order and a status message.
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub message: String,
    pub order: Order,
}

/// Body of `PATCH /orders/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: Option<String>,
}

/// Body of `PATCH /orders/{id}/payment-status`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatusRequest {
    pub payment_status: Option<String>,
}

/// Response of a sent owner notification.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailSentResponse {
    pub message: &'static str,
    pub order_id: OrderId,
    pub customer_name: String,
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError::BadRequest(message.into())
}

/// Round a non-negative amount to whole rupees.
#[allow(clippy::cast_possible_truncation)]
fn whole_rupees(amount: f64) -> Option<i32> {
    let rounded = amount.round();
    (amount.is_finite() && (0.0..=f64::from(i32::MAX)).contains(&rounded))
        .then_some(rounded as i32)
}

fn order_lines(items: &[LineItemRequest]) -> Result<Vec<OrderLine>, AppError> {
    const INVALID_LINE: &str =
        "Each product needs a productName, a quantity of at least 1 and a non-negative price";

    items
        .iter()
        .map(|item| {
            let product_name = non_blank(item.product_name.as_deref());
            let quantity = item.quantity.filter(|q| *q >= 1);
            let price = item.price.and_then(whole_rupees);

            match (product_name, quantity, price) {
                (Some(product_name), Some(quantity), Some(price)) => Ok(OrderLine {
                    product_id: item.product_id,
                    product_name,
                    pack_name: non_blank(item.pack_name.as_deref()),
                    quantity,
                    price,
                    order_type: item.order_type,
                }),
                _ => Err(bad_request(INVALID_LINE)),
            }
        })
        .collect()
}

/// Validate a checkout submission into the rows to insert.
///
/// `now_millis` seeds the default transaction id.
///
/// # Errors
///
/// Returns `AppError::BadRequest` with the first failing rule.
pub fn validate_placement(
    req: &PlaceOrderRequest,
    now_millis: i64,
) -> Result<(NewCustomer, NewOrder), AppError> {
    let name = non_blank(req.name.as_deref());
    let phone = non_blank(req.phone.as_deref());
    let address = non_blank(req.address.as_deref());
    let delivery_point = non_blank(req.delivery_point.as_deref());
    let products = req.products.as_deref().filter(|p| !p.is_empty());
    let total = req.total_price.filter(|t| t.is_finite() && *t > 0.0);

    let (Some(name), Some(phone), Some(products), Some(total), Some(address), Some(delivery_point)) =
        (name, phone, products, total, address, delivery_point)
    else {
        return Err(bad_request(
            "All required fields must be filled: name, phone, products, totalPrice, address, deliveryPoint",
        ));
    };

    let wants_offers = req.wants_offers.unwrap_or(false);
    let email = non_blank(req.email.as_deref());
    if wants_offers && email.is_none() {
        return Err(bad_request("Email is required if customer wants offers details"));
    }

    let phone =
        Phone::parse(&phone).map_err(|_| bad_request("Phone number must be exactly 10 digits"))?;

    let delivery_point: DeliveryPoint = delivery_point.parse().map_err(|_| {
        bad_request(format!(
            "Invalid delivery point. Must be one of: {}",
            DeliveryPoint::allowed_values()
        ))
    })?;

    let lines = order_lines(products)?;

    let email = email
        .map(|e| Email::parse(&e))
        .transpose()
        .map_err(|_| bad_request("Please enter a valid email address"))?;

    let total_price =
        whole_rupees(total).ok_or_else(|| bad_request("totalPrice is out of range"))?;

    let payment_status = match non_blank(req.payment_status.as_deref()) {
        None => PaymentStatus::default(),
        Some(raw) => raw
            .parse::<PaymentStatus>()
            .ok()
            .filter(|s| s.is_client_settable())
            .ok_or_else(|| bad_request("Payment status can only be confirmed by the payment provider"))?,
    };

    let customer = NewCustomer {
        name,
        phone,
        email,
        message: None,
        address: Some(address.clone()),
        wants_offers,
    };

    let order = NewOrder {
        products: lines,
        total_price,
        delivery_address: address,
        delivery_point,
        delivery_charge: delivery_point.delivery_charge(),
        payment_method: non_blank(req.payment_method.as_deref())
            .unwrap_or_else(|| DEFAULT_PAYMENT_METHOD.to_string()),
        payment_status,
        transaction_id: non_blank(req.transaction_id.as_deref())
            .unwrap_or_else(|| format!("TXN_{now_millis}")),
    };

    Ok((customer, order))
}

/// Place an order, creating its customer in the same transaction.
#[instrument(skip(state, req))]
pub async fn place(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), AppError> {
    let (customer, order) = validate_placement(&req, Utc::now().timestamp_millis())?;

    let (customer, order) = OrderRepository::new(state.pool())
        .place(&customer, &order)
        .await?;

    tracing::info!(
        order_id = %order.id,
        customer_id = %customer.id,
        total = order.total_price,
        "Order placed"
    );

    Ok((
        StatusCode::CREATED,
        Json(OrderResponse {
            message: "Order placed successfully".into(),
            order,
        }),
    ))
}

/// List every order with its customer, newest first.
#[instrument(skip(_admin, state))]
pub async fn list(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<OrderWithCustomer>>, AppError> {
    Ok(Json(
        OrderRepository::new(state.pool())
            .list_with_customers()
            .await?,
    ))
}

/// Set the fulfillment status.
#[instrument(skip(_admin, state, req))]
pub async fn update_status(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    IdPath(id, _): OrderIdPath,
    ApiJson(req): ApiJson<StatusRequest>,
) -> Result<Json<OrderResponse>, AppError> {
    let status: OrderStatus = req
        .status
        .as_deref()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| {
            let allowed: Vec<&str> = OrderStatus::ALL.iter().map(|s| s.as_str()).collect();
            bad_request(format!("Invalid status. Must be one of: {}", allowed.join(", ")))
        })?;

    let order = OrderRepository::new(state.pool())
        .update_status(id, status)
        .await
        .map_err(or_not_found(NOT_FOUND))?;

    tracing::info!(order_id = %id, status = %status, "Order status updated");

    Ok(Json(OrderResponse {
        message: format!("Order status updated to '{status}' successfully"),
        order,
    }))
}

/// Set the payment status from the admin console.
#[instrument(skip(_admin, state, req))]
pub async fn update_payment_status(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    IdPath(id, _): OrderIdPath,
    ApiJson(req): ApiJson<PaymentStatusRequest>,
) -> Result<Json<OrderResponse>, AppError> {
    let status: PaymentStatus = req
        .payment_status
        .as_deref()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| {
            let allowed: Vec<&str> = PaymentStatus::ALL.iter().map(|s| s.as_str()).collect();
            bad_request(format!(
                "Invalid payment status. Must be one of: {}",
                allowed.join(", ")
            ))
        })?;

    let order = OrderRepository::new(state.pool())
        .update_payment(id, status, None)
        .await
        .map_err(or_not_found(NOT_FOUND))?;

    tracing::info!(order_id = %id, payment_status = %status, "Payment status updated");

    Ok(Json(OrderResponse {
        message: format!("Payment status updated to '{status}'"),
        order,
    }))
}

/// Email the owner a summary of the order.
#[instrument(skip(state))]
pub async fn send_email(
    State(state): State<AppState>,
    IdPath(id, _): OrderIdPath,
) -> Result<Json<EmailSentResponse>, AppError> {
    let entry = OrderRepository::new(state.pool())
        .get_with_customer(id)
        .await?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.into()))?;

    let rendered = render_order_notification(&entry, &state.config().business_name)?;

    if let Some(var) = state.config().email.first_missing() {
        return Err(AppError::missing_config("Email configuration error", var));
    }
    let mailer = state
        .mailer()
        .ok_or_else(|| AppError::Internal("email service failed to initialise".into()))?;

    mailer.send_to_owner(&rendered).await?;

    tracing::info!(order_id = %id, "Order notification sent");

    Ok(Json(EmailSentResponse {
        message: "Order email sent successfully",
        order_id: id,
        customer_name: entry.customer.name,
    }))
}

/// Delete an order.
#[instrument(skip(_admin, state))]
pub async fn remove(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    IdPath(id, _): OrderIdPath,
) -> Result<Json<MessageResponse>, AppError> {
    OrderRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(or_not_found(NOT_FOUND))?;

    tracing::info!(order_id = %id, "Order deleted");

    Ok(Json(MessageResponse::new("Order deleted successfully")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const NOW: i64 = 1_767_225_600_000;

    fn asha() -> PlaceOrderRequest {
        PlaceOrderRequest {
            name: Some("Asha".into()),
            phone: Some("9876543210".into()),
            address: Some("12 Palm St".into()),
            delivery_point: Some("home_delivery".into()),
            total_price: Some(300.0),
            products: Some(vec![LineItemRequest {
                product_id: Some(ProductId::new(3)),
                product_name: Some("Millet Bowl".into()),
                pack_name: Some("Regular".into()),
                quantity: Some(2),
                price: Some(150.0),
                order_type: PlanType::SingleOrder,
            }]),
            ..Default::default()
        }
    }

    fn rejection(req: &PlaceOrderRequest) -> String {
        match validate_placement(req, NOW) {
            Err(AppError::BadRequest(m)) => m,
            other => panic!("expected BadRequest, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_placement_applies_defaults() {
        let (customer, order) = validate_placement(&asha(), NOW).unwrap();

        assert_eq!(customer.name, "Asha");
        assert_eq!(customer.address.as_deref(), Some("12 Palm St"));
        assert_eq!(order.total_price, 300);
        assert_eq!(order.delivery_point, DeliveryPoint::HomeDelivery);
        assert_eq!(order.delivery_charge, 10);
        assert_eq!(order.payment_method, "upi");
        assert_eq!(order.payment_status, PaymentStatus::Initiated);
        assert_eq!(order.transaction_id, format!("TXN_{NOW}"));
        assert_eq!(order.products[0].order_type, PlanType::SingleOrder);
        assert_eq!(order.products[0].pack_name.as_deref(), Some("Regular"));
        assert_eq!(order.products[0].product_id, Some(ProductId::new(3)));
    }

    #[test]
    fn test_total_is_rounded_and_pickup_is_free() {
        let mut req = asha();
        req.total_price = Some(299.6);
        req.delivery_point = Some("point_b".into());

        let (_, order) = validate_placement(&req, NOW).unwrap();
        assert_eq!(order.total_price, 300);
        assert_eq!(order.delivery_charge, 0);
    }

    #[test]
    fn test_missing_fields_rejected_first() {
        const MISSING: &str = "All required fields must be filled: name, phone, products, totalPrice, address, deliveryPoint";

        let mut req = asha();
        req.products = Some(vec![]);
        // Bad phone is reported after the missing fields
        req.phone = Some("123".into());
        assert_eq!(rejection(&req), MISSING);

        let mut req = asha();
        req.total_price = Some(0.0);
        assert_eq!(rejection(&req), MISSING);

        let mut req = asha();
        req.address = Some("   ".into());
        assert_eq!(rejection(&req), MISSING);
    }

    #[test]
    fn test_rule_order() {
        let mut req = asha();
        req.wants_offers = Some(true);
        req.phone = Some("123".into());
        assert_eq!(
            rejection(&req),
            "Email is required if customer wants offers details"
        );

        let mut req = asha();
        req.phone = Some("123".into());
        req.delivery_point = Some("moon".into());
        assert_eq!(rejection(&req), "Phone number must be exactly 10 digits");

        let mut req = asha();
        req.delivery_point = Some("moon".into());
        assert_eq!(
            rejection(&req),
            "Invalid delivery point. Must be one of: point_a, point_b, point_c, home_delivery"
        );
    }

    #[test]
    fn test_line_items_validated() {
        let mut req = asha();
        req.products = Some(vec![LineItemRequest {
            product_name: Some("Millet Bowl".into()),
            quantity: Some(0),
            price: Some(150.0),
            order_type: PlanType::SingleOrder,
            ..Default::default()
        }]);
        assert!(rejection(&req).starts_with("Each product needs"));

        let mut req = asha();
        req.products = Some(vec![LineItemRequest {
            product_name: Some("Millet Bowl".into()),
            quantity: Some(1),
            price: Some(-1.0),
            order_type: PlanType::SingleOrder,
            ..Default::default()
        }]);
        assert!(rejection(&req).starts_with("Each product needs"));
    }

    #[test]
    fn test_client_cannot_settle_payment() {
        let mut req = asha();
        req.payment_status = Some("completed".into());
        assert_eq!(
            rejection(&req),
            "Payment status can only be confirmed by the payment provider"
        );

        req.payment_status = Some("pending".into());
        let (_, order) = validate_placement(&req, NOW).unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Pending);
    }

    #[test]
    fn test_whole_rupees_bounds() {
        assert_eq!(whole_rupees(149.5), Some(150));
        assert_eq!(whole_rupees(-0.4), Some(0));
        assert_eq!(whole_rupees(-1.0), None);
        assert_eq!(whole_rupees(f64::NAN), None);
        assert_eq!(whole_rupees(1e12), None);
    }
}
