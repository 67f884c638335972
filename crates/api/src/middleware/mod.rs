//! HTTP middleware stack for the API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, HTTP transaction)
//! 2. `TraceLayer` (request tracing)
//! 3. CORS (storefront/console origin, with credentials)
//! 4. Session layer (tower-sessions with `PostgreSQL` store)
//! 5. Security headers (`/api` routes only)
//!
//! Admin-only handlers take the [`RequireAdmin`] extractor.

pub mod auth;
pub mod security_headers;
pub mod session;

pub use auth::{RequireAdmin, clear_current_admin, set_current_admin};
pub use security_headers::security_headers_middleware;
pub use session::{SESSION_COOKIE_NAME, create_session_layer};
