//! Storefront availability of catalog products.
//!
//! Availability is judged on the store's wall clock, not the server's, so a
//! server in UTC still shows the Monday morning menu at 07:00 IST.

use chrono::{DateTime, Datelike, FixedOffset, Timelike, Utc, Weekday};
use thiserror::Error;

use agfood_core::{TimeSlot, is_available, parse_weekday};

use crate::models::Product;

/// Errors in an availability query.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AvailabilityError {
    #[error("Invalid day: {0}")]
    InvalidDay(String),
    #[error("Invalid time: {0}. Use an hour (0-23) or HH:MM")]
    InvalidTime(String),
}

/// The moment a storefront visitor is browsing at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreMoment {
    pub day: Weekday,
    pub slot: Option<TimeSlot>,
}

impl StoreMoment {
    /// Current store-local weekday and slot.
    #[must_use]
    pub fn at(now: DateTime<Utc>, offset: FixedOffset) -> Self {
        let local = now.with_timezone(&offset);
        Self {
            day: local.weekday(),
            slot: TimeSlot::at_hour(local.hour()),
        }
    }

    /// Resolve optional `day`/`time` overrides against the current moment.
    ///
    /// # Errors
    ///
    /// Returns `AvailabilityError` for an unknown weekday or malformed time.
    pub fn resolve(
        now: DateTime<Utc>,
        offset: FixedOffset,
        day: Option<&str>,
        time: Option<&str>,
    ) -> Result<Self, AvailabilityError> {
        let mut moment = Self::at(now, offset);

        if let Some(day) = day.filter(|d| !d.trim().is_empty()) {
            moment.day = parse_weekday(day).map_err(|_| AvailabilityError::InvalidDay(day.into()))?;
        }
        if let Some(time) = time.filter(|t| !t.trim().is_empty()) {
            moment.slot = TimeSlot::at_hour(parse_hour(time)?);
        }

        Ok(moment)
    }
}

/// Parse `"17"` or `"17:30"` into an hour of the day.
fn parse_hour(time: &str) -> Result<u32, AvailabilityError> {
    let invalid = || AvailabilityError::InvalidTime(time.to_string());
    let trimmed = time.trim();
    let hour_part = trimmed.split_once(':').map_or(trimmed, |(h, _)| h);
    let hour: u32 = hour_part.parse().map_err(|_| invalid())?;
    if hour > 23 {
        return Err(invalid());
    }
    Ok(hour)
}

/// Keep only the products visible at `moment`.
#[must_use]
pub fn available_products(products: Vec<Product>, moment: StoreMoment) -> Vec<Product> {
    products
        .into_iter()
        .filter(|p| is_available(&p.available_day, &p.available_time, moment.day, moment.slot))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use agfood_core::{PriceTiers, ProductId};

    use super::*;

    fn ist() -> FixedOffset {
        FixedOffset::east_opt(330 * 60).unwrap()
    }

    fn product(id: i32, days: &[&str], time: &str) -> Product {
        let now = Utc::now();
        Product {
            id: ProductId::new(id),
            product_name: format!("Product {id}"),
            pack_name: "Regular".into(),
            weight: "300g".into(),
            protein_intake: String::new(),
            available_day: days.iter().map(|d| (*d).to_string()).collect(),
            available_time: time.into(),
            prices: PriceTiers::default(),
            image_path: String::new(),
            ingredients: vec![],
            discounts: vec![],
            description: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_store_moment_uses_store_offset() {
        // Monday 02:00 UTC is Monday 07:30 IST
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 2, 0, 0).unwrap();
        let moment = StoreMoment::at(now, ist());
        assert_eq!(moment.day, Weekday::Mon);
        assert_eq!(moment.slot, Some(TimeSlot::Morning));

        // Sunday 20:00 UTC is already Monday 01:30 IST
        let now = Utc.with_ymd_and_hms(2026, 1, 4, 20, 0, 0).unwrap();
        let moment = StoreMoment::at(now, ist());
        assert_eq!(moment.day, Weekday::Mon);
        assert_eq!(moment.slot, None);
    }

    #[test]
    fn test_resolve_overrides() {
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 2, 0, 0).unwrap();
        let moment = StoreMoment::resolve(now, ist(), Some("friday"), Some("17:15")).unwrap();
        assert_eq!(moment.day, Weekday::Fri);
        assert_eq!(moment.slot, Some(TimeSlot::Evening));

        let moment = StoreMoment::resolve(now, ist(), None, Some("12")).unwrap();
        assert_eq!(moment.day, Weekday::Mon);
        assert_eq!(moment.slot, None);
    }

    #[test]
    fn test_resolve_rejects_garbage() {
        let now = Utc::now();
        assert!(matches!(
            StoreMoment::resolve(now, ist(), Some("Funday"), None),
            Err(AvailabilityError::InvalidDay(_))
        ));
        assert!(matches!(
            StoreMoment::resolve(now, ist(), None, Some("25")),
            Err(AvailabilityError::InvalidTime(_))
        ));
        assert!(matches!(
            StoreMoment::resolve(now, ist(), None, Some("noon")),
            Err(AvailabilityError::InvalidTime(_))
        ));
    }

    #[test]
    fn test_available_products_filters_by_day_and_slot() {
        let products = vec![
            product(1, &["Monday"], "Morning"),
            product(2, &["Monday"], "Evening"),
            product(3, &["Tuesday"], "Morning & Evening"),
        ];
        let moment = StoreMoment {
            day: Weekday::Mon,
            slot: Some(TimeSlot::Morning),
        };
        let ids: Vec<i32> = available_products(products, moment)
            .iter()
            .map(|p| p.id.as_i32())
            .collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn test_half_past_nine_is_past_the_morning_slot() {
        let products = vec![
            product(1, &["Monday"], "Morning"),
            product(2, &["Monday"], "Evening"),
        ];
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 2, 0, 0).unwrap();
        let moment = StoreMoment::resolve(now, ist(), Some("monday"), Some("09:30")).unwrap();
        assert_eq!(moment.slot, None);

        let ids: Vec<i32> = available_products(products, moment)
            .iter()
            .map(|p| p.id.as_i32())
            .collect();
        assert_eq!(ids, vec![1, 2]);
    }
}
