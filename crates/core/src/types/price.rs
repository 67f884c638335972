//! Product price tiers.
//!
//! Prices are whole rupees. Each product carries one price per [`PlanType`].

use serde::{Deserialize, Serialize};

use super::status::PlanType;

/// The three price tiers of a product, in rupees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceTiers {
    pub single_order: i32,
    pub weekly_subscription: i32,
    pub monthly_subscription: i32,
}

impl PriceTiers {
    /// Price for the given plan.
    #[must_use]
    pub const fn price_for(&self, plan: PlanType) -> i32 {
        match plan {
            PlanType::SingleOrder => self.single_order,
            PlanType::WeeklySubscription => self.weekly_subscription,
            PlanType::MonthlySubscription => self.monthly_subscription,
        }
    }

    /// Whether every tier is non-negative.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.single_order >= 0 && self.weekly_subscription >= 0 && self.monthly_subscription >= 0
    }
}

/// Format a rupee amount for display, e.g. `₹300`.
#[must_use]
pub fn format_rupees(amount: i32) -> String {
    format!("\u{20b9}{amount}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_for_plan() {
        let tiers = PriceTiers {
            single_order: 150,
            weekly_subscription: 900,
            monthly_subscription: 3200,
        };
        assert_eq!(tiers.price_for(PlanType::SingleOrder), 150);
        assert_eq!(tiers.price_for(PlanType::WeeklySubscription), 900);
        assert_eq!(tiers.price_for(PlanType::MonthlySubscription), 3200);
    }

    #[test]
    fn test_is_valid_rejects_negative_tier() {
        assert!(PriceTiers::default().is_valid());
        let tiers = PriceTiers {
            single_order: 10,
            weekly_subscription: -1,
            monthly_subscription: 10,
        };
        assert!(!tiers.is_valid());
    }

    #[test]
    fn test_format_rupees() {
        assert_eq!(format_rupees(300), "₹300");
    }
}
