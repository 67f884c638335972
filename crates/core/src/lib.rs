//! AG's Healthy Food Core - Shared types library.
//!
//! This crate provides the domain types used across all components:
//! - `api` - REST API server for the storefront and admin console
//! - `cli` - Command-line tools for migrations and admin management
//!
//! # Architecture
//!
//! The core crate contains only types and pure rules - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and easy to test.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, contact details, order/payment statuses, price
//!   tiers and storefront availability rules

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
