//! Storefront availability rules.
//!
//! A product lists the weekdays it is cooked on and a free-text time note
//! such as "Morning & Evening". The storefront shows a product when today is
//! one of its days and, during a delivery slot, when its note mentions that
//! slot.

use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// Error returned for a string that is not an English weekday name.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid weekday: {0}")]
pub struct WeekdayError(pub String);

/// Parse a weekday name, case-insensitively.
///
/// Accepts full names and the usual three-letter abbreviations.
///
/// # Errors
///
/// Returns `WeekdayError` for anything else.
pub fn parse_weekday(s: &str) -> Result<Weekday, WeekdayError> {
    s.trim()
        .parse::<Weekday>()
        .map_err(|_| WeekdayError(s.to_owned()))
}

/// Full English name of a weekday, e.g. `"Monday"`.
#[must_use]
pub const fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Delivery slot of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeSlot {
    /// 07:00 to 08:59 store-local time.
    Morning,
    /// 16:00 to 17:59 store-local time.
    Evening,
}

impl TimeSlot {
    /// The slot containing `hour` (0-23), if any.
    #[must_use]
    pub const fn at_hour(hour: u32) -> Option<Self> {
        match hour {
            7..=8 => Some(Self::Morning),
            16..=17 => Some(Self::Evening),
            _ => None,
        }
    }

    /// Keyword a product's time note must contain to be shown in this slot.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Evening => "evening",
        }
    }
}

/// Whether a product is visible on `day` during `slot`.
///
/// `available_days` are compared case-insensitively. Outside a slot only the
/// day matters.
#[must_use]
pub fn is_available(
    available_days: &[String],
    available_time: &str,
    day: Weekday,
    slot: Option<TimeSlot>,
) -> bool {
    let name = weekday_name(day);
    let on_day = available_days
        .iter()
        .any(|d| d.trim().eq_ignore_ascii_case(name));

    if !on_day {
        return false;
    }

    slot.is_none_or(|slot| available_time.to_lowercase().contains(slot.keyword()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn days(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_parse_weekday_case_insensitive() {
        assert_eq!(parse_weekday("monday").unwrap(), Weekday::Mon);
        assert_eq!(parse_weekday("FRIDAY").unwrap(), Weekday::Fri);
        assert_eq!(parse_weekday("Sat").unwrap(), Weekday::Sat);
        assert!(parse_weekday("Funday").is_err());
        assert!(parse_weekday("").is_err());
    }

    #[test]
    fn test_weekday_name() {
        assert_eq!(weekday_name(Weekday::Wed), "Wednesday");
        assert_eq!(weekday_name(Weekday::Sun), "Sunday");
    }

    #[test]
    fn test_time_slot_boundaries() {
        assert_eq!(TimeSlot::at_hour(6), None);
        assert_eq!(TimeSlot::at_hour(7), Some(TimeSlot::Morning));
        assert_eq!(TimeSlot::at_hour(8), Some(TimeSlot::Morning));
        assert_eq!(TimeSlot::at_hour(9), None);
        assert_eq!(TimeSlot::at_hour(15), None);
        assert_eq!(TimeSlot::at_hour(16), Some(TimeSlot::Evening));
        assert_eq!(TimeSlot::at_hour(17), Some(TimeSlot::Evening));
        assert_eq!(TimeSlot::at_hour(18), None);
    }

    #[test]
    fn test_available_requires_matching_day() {
        let d = days(&["Monday", "friday"]);
        assert!(is_available(&d, "Morning", Weekday::Mon, None));
        assert!(is_available(&d, "Morning", Weekday::Fri, None));
        assert!(!is_available(&d, "Morning", Weekday::Tue, None));
    }

    #[test]
    fn test_available_slot_requires_keyword() {
        let d = days(&["Monday"]);
        assert!(is_available(
            &d,
            "Morning & Evening",
            Weekday::Mon,
            Some(TimeSlot::Evening)
        ));
        assert!(!is_available(
            &d,
            "Morning only",
            Weekday::Mon,
            Some(TimeSlot::Evening)
        ));
        assert!(is_available(
            &d,
            "MORNING",
            Weekday::Mon,
            Some(TimeSlot::Morning)
        ));
    }

    #[test]
    fn test_empty_days_never_available() {
        assert!(!is_available(&[], "Morning", Weekday::Mon, None));
    }

    #[test]
    fn test_slot_ends_before_the_hour_after() {
        let d = days(&["Monday"]);
        // 09:xx and 18:xx are outside both slots, so only the day matters.
        assert!(is_available(&d, "Evening", Weekday::Mon, TimeSlot::at_hour(9)));
        assert!(is_available(&d, "Morning", Weekday::Mon, TimeSlot::at_hour(18)));
        assert!(!is_available(&d, "Evening", Weekday::Mon, TimeSlot::at_hour(8)));
    }
}
