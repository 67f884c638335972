//! Status and classification enums for orders.
//!
//! Wire names match what the storefront and admin console send, including the
//! space-separated fulfillment labels (`"order taken"`).

use serde::{Deserialize, Serialize};

/// Order fulfillment status.
///
/// Any transition between the three values is accepted; the admin console
/// only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(type_name = "order_status"))]
pub enum OrderStatus {
    #[default]
    #[serde(rename = "order taken")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "order taken"))]
    Taken,
    #[serde(rename = "order shipped")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "order shipped"))]
    Shipped,
    #[serde(rename = "order delivered")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "order delivered"))]
    Delivered,
}

impl OrderStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [Self; 3] = [Self::Taken, Self::Shipped, Self::Delivered];

    /// Wire label for this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Taken => "order taken",
            Self::Shipped => "order shipped",
            Self::Delivered => "order delivered",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("invalid order status: {s}"))
    }
}

/// Payment status of an order.
///
/// Stored as text. `Pending` and `Initiated` are set at checkout; the terminal
/// values arrive through the verified payment callback or an admin update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    #[default]
    Initiated,
    Completed,
    Failed,
    Cancelled,
}

impl PaymentStatus {
    /// All payment statuses.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Initiated,
        Self::Completed,
        Self::Failed,
        Self::Cancelled,
    ];

    /// Wire label for this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Initiated => "initiated",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether a customer may report this status while placing an order.
    ///
    /// Settled states come only from the payment provider or an admin.
    #[must_use]
    pub const fn is_client_settable(self) -> bool {
        matches!(self, Self::Pending | Self::Initiated)
    }

    /// Whether this is a terminal outcome reported by the payment provider.
    #[must_use]
    pub const fn is_settled(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("invalid payment status: {s}"))
    }
}

/// Where an order is handed over to the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "delivery_point", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryPoint {
    PointA,
    PointB,
    PointC,
    HomeDelivery,
}

impl DeliveryPoint {
    /// All delivery points.
    pub const ALL: [Self; 4] = [
        Self::PointA,
        Self::PointB,
        Self::PointC,
        Self::HomeDelivery,
    ];

    /// Charge for home delivery, in rupees.
    pub const HOME_DELIVERY_CHARGE: i32 = 10;

    /// Wire value for this delivery point.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PointA => "point_a",
            Self::PointB => "point_b",
            Self::PointC => "point_c",
            Self::HomeDelivery => "home_delivery",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::PointA => "Point A",
            Self::PointB => "Point B",
            Self::PointC => "Point C",
            Self::HomeDelivery => "Home Delivery",
        }
    }

    /// Delivery charge in rupees. Pickup points are free.
    #[must_use]
    pub const fn delivery_charge(self) -> i32 {
        match self {
            Self::HomeDelivery => Self::HOME_DELIVERY_CHARGE,
            Self::PointA | Self::PointB | Self::PointC => 0,
        }
    }

    /// Comma-separated list of wire values, for validation messages.
    #[must_use]
    pub fn allowed_values() -> String {
        Self::ALL
            .iter()
            .map(|p| p.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for DeliveryPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DeliveryPoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|point| point.as_str() == s)
            .ok_or_else(|| format!("invalid delivery point: {s}"))
    }
}

/// Purchase cadence of an order line, selecting a product's price tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum PlanType {
    #[default]
    SingleOrder,
    WeeklySubscription,
    MonthlySubscription,
}

impl PlanType {
    /// Label used in notifications.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::SingleOrder => "Single Order",
            Self::WeeklySubscription => "Weekly Plan",
            Self::MonthlySubscription => "Monthly Plan",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_wire_labels() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Taken).unwrap(),
            "\"order taken\""
        );
        let status: OrderStatus = serde_json::from_str("\"order delivered\"").unwrap();
        assert_eq!(status, OrderStatus::Delivered);
        assert_eq!(OrderStatus::default(), OrderStatus::Taken);
    }

    #[test]
    fn test_order_status_from_str_rejects_unknown() {
        assert_eq!(
            "order shipped".parse::<OrderStatus>(),
            Ok(OrderStatus::Shipped)
        );
        assert!("shipped".parse::<OrderStatus>().is_err());
        assert!("Order Taken".parse::<OrderStatus>().is_err());
        assert!("".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_payment_status_client_settable() {
        assert_eq!(PaymentStatus::default(), PaymentStatus::Initiated);
        assert!(PaymentStatus::Pending.is_client_settable());
        assert!(PaymentStatus::Initiated.is_client_settable());
        assert!(!PaymentStatus::Completed.is_client_settable());
        assert!(PaymentStatus::Cancelled.is_settled());
        assert!(!PaymentStatus::Pending.is_settled());
    }

    #[test]
    fn test_payment_status_roundtrip_strings() {
        for status in PaymentStatus::ALL {
            assert_eq!(status.as_str().parse::<PaymentStatus>(), Ok(status));
        }
        assert!("paid".parse::<PaymentStatus>().is_err());
    }

    #[test]
    fn test_delivery_charge() {
        assert_eq!(DeliveryPoint::PointA.delivery_charge(), 0);
        assert_eq!(DeliveryPoint::PointB.delivery_charge(), 0);
        assert_eq!(DeliveryPoint::PointC.delivery_charge(), 0);
        assert_eq!(DeliveryPoint::HomeDelivery.delivery_charge(), 10);
    }

    #[test]
    fn test_delivery_point_wire_values() {
        let point: DeliveryPoint = serde_json::from_str("\"home_delivery\"").unwrap();
        assert_eq!(point, DeliveryPoint::HomeDelivery);
        assert!("point_d".parse::<DeliveryPoint>().is_err());
        assert_eq!(
            DeliveryPoint::allowed_values(),
            "point_a, point_b, point_c, home_delivery"
        );
    }

    #[test]
    fn test_plan_type_wire_and_labels() {
        let plan: PlanType = serde_json::from_str("\"weeklySubscription\"").unwrap();
        assert_eq!(plan, PlanType::WeeklySubscription);
        assert_eq!(plan.label(), "Weekly Plan");
        assert_eq!(PlanType::MonthlySubscription.label(), "Monthly Plan");
        assert_eq!(PlanType::default().label(), "Single Order");
    }
}
