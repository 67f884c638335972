//! Order model.
//!
//! An order owns its line items; they are stored as JSONB on the order row
//! rather than normalized, so later catalog edits never rewrite history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use agfood_core::{
    CustomerId, DeliveryPoint, OrderId, OrderStatus, PaymentStatus, PlanType, ProductId,
};

use super::Customer;

/// One line of an order, as captured at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    /// Catalog product the line was picked from. Lines written before
    /// products were tracked have none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
    pub product_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pack_name: Option<String>,
    pub quantity: u32,
    /// Unit price in rupees.
    pub price: i32,
    #[serde(default)]
    pub order_type: PlanType,
}

impl OrderLine {
    /// Quantity times unit price.
    #[must_use]
    pub fn line_total(&self) -> i64 {
        i64::from(self.quantity) * i64::from(self.price)
    }

    /// Product name with its pack, e.g. `Millet Bowl (Regular)`.
    #[must_use]
    pub fn display_name(&self) -> String {
        match &self.pack_name {
            Some(pack) => format!("{} ({pack})", self.product_name),
            None => self.product_name.clone(),
        }
    }
}

/// A placed order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub products: Vec<OrderLine>,
    pub total_price: i32,
    pub delivery_address: String,
    pub delivery_point: DeliveryPoint,
    pub delivery_charge: i32,
    pub status: OrderStatus,
    pub payment_method: String,
    pub payment_status: PaymentStatus,
    pub transaction_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An order with its customer embedded, as the admin console lists them.
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithCustomer {
    #[serde(flatten)]
    pub order: Order,
    pub customer: Customer,
}

/// A validated order ready to insert. The customer id is filled in by the
/// repository once the customer row exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub products: Vec<OrderLine>,
    pub total_price: i32,
    pub delivery_address: String,
    pub delivery_point: DeliveryPoint,
    pub delivery_charge: i32,
    pub payment_method: String,
    pub payment_status: PaymentStatus,
    pub transaction_id: String,
}
