//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Admin login, password changes and seeding (Argon2)
//! - `catalog` - Storefront availability by weekday and time slot
//! - `checkout` - Server-side price quotes
//! - `email` - Email delivery via the `SendGrid` SMTP relay
//! - `media` - Cloudinary image storage
//! - `notification` - Owner notification rendering
//! - `payments` - UPI links and signed payment callbacks

pub mod auth;
pub mod catalog;
pub mod checkout;
pub mod email;
pub mod media;
pub mod notification;
pub mod payments;

pub use auth::{AdminAuthService, AuthError, SeedOutcome};
pub use catalog::{AvailabilityError, StoreMoment, available_products};
pub use checkout::{Quote, QuoteError, QuoteItem, build_quote};
pub use email::{EmailError, EmailService};
pub use media::{ImageUpload, MediaClient, MediaError, MediaFolder};
pub use notification::{NotificationError, RenderedEmail, render_order_notification};
pub use payments::{PaymentError, UpiLinks, payment_links};
