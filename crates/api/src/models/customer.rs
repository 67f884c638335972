//! Customer model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use agfood_core::{CustomerId, Email, Phone};

/// A contact record, created by the contact form or at order placement.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub phone: Phone,
    pub email: Option<Email>,
    pub message: Option<String>,
    pub address: Option<String>,
    pub wants_offers: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated customer ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCustomer {
    pub name: String,
    pub phone: Phone,
    pub email: Option<Email>,
    pub message: Option<String>,
    pub address: Option<String>,
    pub wants_offers: bool,
}

impl Customer {
    /// Names of the fields a notification email cannot do without.
    #[must_use]
    pub fn missing_contact_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.name.trim().is_empty() {
            missing.push("name");
        }
        if self.phone.as_str().is_empty() {
            missing.push("phone");
        }
        if self.address.as_deref().is_none_or(|a| a.trim().is_empty()) {
            missing.push("address");
        }
        missing
    }
}
