//! Session-related types for admin authentication.
//!
//! The session store maps a signed session id to these values; nothing else
//! about the admin lives in the cookie.

use serde::{Deserialize, Serialize};

use agfood_core::{AdminId, Email};

/// Session-stored admin identity.
///
/// Minimal data stored in the session to identify the logged-in admin. The
/// `RequireAdmin` extractor re-reads the admin row on every request, so a
/// deleted admin is locked out immediately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentAdmin {
    /// Admin's database ID.
    pub id: AdminId,
    /// Admin's email address.
    pub email: Email,
}

/// Session keys for admin authentication data.
pub mod keys {
    /// Key for storing the current logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";
}
