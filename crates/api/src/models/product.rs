//! Catalog product model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use agfood_core::{PriceTiers, ProductId};

/// A catalog product.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub product_name: String,
    pub pack_name: String,
    pub weight: String,
    pub protein_intake: String,
    /// Weekday names the product is cooked on, e.g. `["Monday", "Friday"]`.
    pub available_day: Vec<String>,
    /// Free-text slot note such as "Morning & Evening".
    pub available_time: String,
    #[serde(flatten)]
    pub prices: PriceTiers,
    pub image_path: String,
    pub ingredients: Vec<String>,
    pub discounts: Vec<String>,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated product ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    pub product_name: String,
    pub pack_name: String,
    pub weight: String,
    pub protein_intake: String,
    pub available_day: Vec<String>,
    pub available_time: String,
    pub prices: PriceTiers,
    pub image_path: String,
    pub ingredients: Vec<String>,
    pub discounts: Vec<String>,
    pub description: String,
}

/// A partial product update. `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductChanges {
    pub product_name: Option<String>,
    pub pack_name: Option<String>,
    pub weight: Option<String>,
    pub protein_intake: Option<String>,
    pub available_day: Option<Vec<String>>,
    pub available_time: Option<String>,
    pub single_order: Option<i32>,
    pub weekly_subscription: Option<i32>,
    pub monthly_subscription: Option<i32>,
    pub image_path: Option<String>,
    pub ingredients: Option<Vec<String>>,
    pub discounts: Option<Vec<String>>,
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_serializes_flat_price_tiers() {
        let now = Utc::now();
        let product = Product {
            id: ProductId::new(3),
            product_name: "Millet Bowl".into(),
            pack_name: "Regular".into(),
            weight: "350g".into(),
            protein_intake: "18g".into(),
            available_day: vec!["Monday".into()],
            available_time: "Morning".into(),
            prices: PriceTiers {
                single_order: 150,
                weekly_subscription: 900,
                monthly_subscription: 3200,
            },
            image_path: "https://res.cloudinary.com/demo/image/upload/v1/ag/products/bowl.jpg"
                .into(),
            ingredients: vec![],
            discounts: vec![],
            description: String::new(),
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(&product).unwrap_or_default();
        assert_eq!(json["singleOrder"], 150);
        assert_eq!(json["monthlySubscription"], 3200);
        assert_eq!(json["availableDay"][0], "Monday");
        assert!(json.get("prices").is_none());
    }
}
