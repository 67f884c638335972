//! Checkout price quotes.
//!
//! The storefront asks for a quote before opening the UPI link so that the
//! amount comes from catalog prices, not from the browser.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use agfood_core::{DeliveryPoint, PlanType, ProductId};

use crate::models::Product;

/// Errors building a quote.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuoteError {
    #[error("Cart is empty")]
    EmptyCart,
    #[error("Quantity must be at least 1 for product {0}")]
    ZeroQuantity(ProductId),
    #[error("Product {0} not found")]
    UnknownProduct(ProductId),
}

/// One cart entry sent by the storefront.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteItem {
    pub product_id: ProductId,
    pub quantity: u32,
    #[serde(default)]
    pub order_type: PlanType,
}

/// A priced cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub order_type: PlanType,
    pub unit_price: i32,
    pub line_total: i64,
}

/// A priced cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub lines: Vec<QuoteLine>,
    pub subtotal: i64,
    pub delivery_charge: i32,
    pub total: i64,
}

/// Price `items` against `catalog` and add the delivery charge.
///
/// # Errors
///
/// Returns `QuoteError` for an empty cart, a zero quantity or a product
/// missing from `catalog`.
pub fn build_quote(
    items: &[QuoteItem],
    catalog: &HashMap<ProductId, Product>,
    delivery_point: DeliveryPoint,
) -> Result<Quote, QuoteError> {
    if items.is_empty() {
        return Err(QuoteError::EmptyCart);
    }

    let mut lines = Vec::with_capacity(items.len());
    for item in items {
        if item.quantity == 0 {
            return Err(QuoteError::ZeroQuantity(item.product_id));
        }
        let product = catalog
            .get(&item.product_id)
            .ok_or(QuoteError::UnknownProduct(item.product_id))?;
        let unit_price = product.prices.price_for(item.order_type);

        lines.push(QuoteLine {
            product_id: item.product_id,
            product_name: product.product_name.clone(),
            quantity: item.quantity,
            order_type: item.order_type,
            unit_price,
            line_total: i64::from(item.quantity) * i64::from(unit_price),
        });
    }

    let subtotal = lines.iter().map(|l| l.line_total).sum::<i64>();
    let delivery_charge = delivery_point.delivery_charge();

    Ok(Quote {
        lines,
        subtotal,
        delivery_charge,
        total: subtotal + i64::from(delivery_charge),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use agfood_core::PriceTiers;

    use super::*;

    fn catalog() -> HashMap<ProductId, Product> {
        let now = Utc::now();
        let bowl = Product {
            id: ProductId::new(1),
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
            image_path: String::new(),
            ingredients: vec![],
            discounts: vec![],
            description: String::new(),
            created_at: now,
            updated_at: now,
        };
        HashMap::from([(bowl.id, bowl)])
    }

    fn item(id: i32, quantity: u32, order_type: PlanType) -> QuoteItem {
        QuoteItem {
            product_id: ProductId::new(id),
            quantity,
            order_type,
        }
    }

    #[test]
    fn test_quote_uses_plan_tier_and_home_delivery_charge() {
        let quote = build_quote(
            &[
                item(1, 2, PlanType::SingleOrder),
                item(1, 1, PlanType::WeeklySubscription),
            ],
            &catalog(),
            DeliveryPoint::HomeDelivery,
        )
        .unwrap();

        assert_eq!(quote.lines[0].line_total, 300);
        assert_eq!(quote.lines[1].unit_price, 900);
        assert_eq!(quote.subtotal, 1200);
        assert_eq!(quote.delivery_charge, 10);
        assert_eq!(quote.total, 1210);
    }

    #[test]
    fn test_pickup_point_is_free() {
        let quote = build_quote(
            &[item(1, 1, PlanType::MonthlySubscription)],
            &catalog(),
            DeliveryPoint::PointB,
        )
        .unwrap();
        assert_eq!(quote.total, 3200);
    }

    #[test]
    fn test_quote_errors() {
        assert_eq!(
            build_quote(&[], &catalog(), DeliveryPoint::PointA),
            Err(QuoteError::EmptyCart)
        );
        assert_eq!(
            build_quote(&[item(1, 0, PlanType::SingleOrder)], &catalog(), DeliveryPoint::PointA),
            Err(QuoteError::ZeroQuantity(ProductId::new(1)))
        );
        assert_eq!(
            build_quote(&[item(9, 1, PlanType::SingleOrder)], &catalog(), DeliveryPoint::PointA),
            Err(QuoteError::UnknownProduct(ProductId::new(9)))
        );
    }
}
