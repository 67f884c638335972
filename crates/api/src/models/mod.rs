//! Domain models.
//!
//! Models serialize with camelCase keys, which is the JSON shape the
//! storefront and admin console consume.

pub mod admin;
pub mod customer;
pub mod offer;
pub mod order;
pub mod product;
pub mod session;

pub use admin::Admin;
pub use customer::{Customer, NewCustomer};
pub use offer::{NewOffer, Offer};
pub use order::{NewOrder, Order, OrderLine, OrderWithCustomer};
pub use product::{Product, ProductChanges, ProductDraft};
pub use session::{CurrentAdmin, keys as session_keys};
