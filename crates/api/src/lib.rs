//! AG's Healthy Food API library.
//!
//! The REST API behind the storefront and the admin console, as a library so
//! the router can be driven in tests and the CLI can reuse the repositories
//! and auth service.
//!
//! # Security
//!
//! - Admin endpoints are gated by a signed, server-side session
//! - Payment outcomes are only accepted from HMAC-signed gateway callbacks
//! - Database and internal errors never reach clients in detail

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
