//! Checkout quote handler.

use std::collections::HashMap;

use axum::{Json, Router, extract::State, routing::post};
use serde::Deserialize;
use tracing::instrument;

use agfood_core::{DeliveryPoint, ProductId};

use crate::{
    db::ProductRepository,
    error::AppError,
    extract::ApiJson,
    services::{Quote, QuoteError, QuoteItem, build_quote},
    state::AppState,
};

/// Build the checkout router.
pub fn router() -> Router<AppState> {
    Router::new().route("/checkout/quote", post(quote))
}

/// Cart sent for pricing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    #[serde(default)]
    pub items: Vec<QuoteItem>,
    pub delivery_point: Option<String>,
}

/// Parse a delivery point with the same message order placement uses.
fn delivery_point(raw: Option<&str>) -> Result<DeliveryPoint, AppError> {
    raw.map(str::trim)
        .and_then(|p| p.parse().ok())
        .ok_or_else(|| {
            AppError::BadRequest(format!(
                "Invalid delivery point. Must be one of: {}",
                DeliveryPoint::allowed_values()
            ))
        })
}

/// Price a cart from catalog prices.
#[instrument(skip(state, req), fields(items = req.items.len()))]
pub async fn quote(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<QuoteRequest>,
) -> Result<Json<Quote>, AppError> {
    let point = delivery_point(req.delivery_point.as_deref())?;
    if req.items.is_empty() {
        return Err(QuoteError::EmptyCart.into());
    }

    let mut ids: Vec<ProductId> = req.items.iter().map(|i| i.product_id).collect();
    ids.sort_unstable();
    ids.dedup();

    let catalog: HashMap<ProductId, _> = ProductRepository::new(state.pool())
        .get_many(&ids)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    Ok(Json(build_quote(&req.items, &catalog, point)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_point_parsing() {
        assert!(matches!(
            delivery_point(Some(" point_c ")),
            Ok(DeliveryPoint::PointC)
        ));
        assert!(delivery_point(Some("rooftop")).is_err());
        assert!(delivery_point(None).is_err());
    }
}
