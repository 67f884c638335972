//! Core types for the ordering platform.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod phone;
pub mod price;
pub mod schedule;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use phone::{Phone, PhoneError};
pub use price::{PriceTiers, format_rupees};
pub use schedule::{TimeSlot, WeekdayError, is_available, parse_weekday, weekday_name};
pub use status::*;
