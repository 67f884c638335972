//! End-to-end tests for the AG's Healthy Food API.
//!
//! Every test talks to a running server over HTTP and is `#[ignore]`d by
//! default.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the server against a scratch database
//! cargo run -p agfood-api
//!
//! # Run the ignored tests
//! cargo test -p agfood-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `AGFOOD_TEST_BASE_URL` - server root (default `http://localhost:5000`)
//! - `ADMIN_EMAIL` / `ADMIN_PASSWORD` - the seeded admin
//! - `AGFOOD_DATABASE_URL` (or `DATABASE_URL`) - the server's database, used
//!   to create and remove throwaway admin accounts

#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use agfood_api::services::AdminAuthService;
use reqwest::{Client, StatusCode};
use secrecy::SecretString;
use serde_json::{Value, json};
use sqlx::PgPool;

/// Base URL of the API under test, including the `/api` prefix.
#[must_use]
pub fn api_url(path: &str) -> String {
    let base = std::env::var("AGFOOD_TEST_BASE_URL")
        .unwrap_or_else(|_| "http://localhost:5000".to_string());
    format!("{}/api{path}", base.trim_end_matches('/'))
}

/// A client that keeps the session cookie between requests.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// Post a login and return the response status.
pub async fn login(client: &Client, email: &str, password: &str) -> StatusCode {
    client
        .post(api_url("/admin/login"))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to log in")
        .status()
}

/// A client already logged in as the seeded admin.
pub async fn admin_client() -> Client {
    let client = client();
    let email = std::env::var("ADMIN_EMAIL").expect("ADMIN_EMAIL must be set");
    let password = std::env::var("ADMIN_PASSWORD").expect("ADMIN_PASSWORD must be set");

    assert_eq!(
        login(&client, &email, &password).await,
        StatusCode::OK,
        "admin login failed"
    );
    client
}

/// Connect to the server's database.
pub async fn db_pool() -> PgPool {
    let url = std::env::var("AGFOOD_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("AGFOOD_DATABASE_URL must be set");
    agfood_api::db::create_pool(&SecretString::from(url))
        .await
        .expect("Failed to connect to database")
}

/// An admin account created for one test and removed by [`Self::remove`].
pub struct ThrowawayAdmin {
    pub email: String,
    pub password: String,
}

impl ThrowawayAdmin {
    /// Create a fresh admin with a unique email.
    pub async fn create(pool: &PgPool) -> Self {
        let email = format!("admin-{}@test.aghealthyfood.in", unique_phone());
        let password = "initial-pass-123".to_string();
        AdminAuthService::new(pool)
            .create_admin(&email, &password)
            .await
            .expect("Failed to create admin");
        Self { email, password }
    }

    /// Delete the account directly, leaving any of its sessions behind.
    pub async fn remove(&self, pool: &PgPool) {
        sqlx::query("DELETE FROM admin WHERE email = $1")
            .bind(&self.email)
            .execute(pool)
            .await
            .expect("Failed to delete admin");
    }
}

/// Read a JSON body, panicking with the raw text when it is not JSON.
pub async fn body(resp: reqwest::Response) -> Value {
    let text = resp.text().await.expect("Failed to read response");
    serde_json::from_str(&text).unwrap_or_else(|_| panic!("Response was not JSON: {text}"))
}

/// Fetch the admin dashboard counters.
pub async fn dashboard_stats(admin: &Client) -> Value {
    let resp = admin
        .get(api_url("/admin/dashboard-stats"))
        .send()
        .await
        .expect("Failed to fetch stats");
    assert_eq!(resp.status(), StatusCode::OK);
    body(resp).await
}

/// A placement request that passes validation.
#[must_use]
pub fn valid_order(phone: &str) -> Value {
    json!({
        "name": "Asha",
        "phone": phone,
        "products": [{ "productName": "Millet Bowl", "quantity": 2, "price": 150 }],
        "totalPrice": 300,
        "address": "12 Palm St",
        "deliveryPoint": "home_delivery"
    })
}

/// Place an order, returning the `order` object from the response.
pub async fn place_order(client: &Client, request: &Value) -> Value {
    let resp = client
        .post(api_url("/orders"))
        .json(request)
        .send()
        .await
        .expect("Failed to place order");
    assert_eq!(resp.status(), StatusCode::CREATED);
    body(resp).await["order"].clone()
}

/// A 10-digit phone number unlikely to collide between test runs.
#[must_use]
pub fn unique_phone() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock before epoch")
        .subsec_nanos();
    format!("9{:09}", nanos % 1_000_000_000)
}
