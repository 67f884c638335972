//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                          - Liveness
//! GET    /health/ready                    - Readiness (database ping)
//!
//! # Customers
//! POST   /api/customers                   - Contact form
//! GET    /api/customers[?unique=true]     - List (admin)
//! DELETE /api/customers/{id}              - Delete without orders (admin)
//!
//! # Products
//! GET    /api/products                    - List
//! GET    /api/products/available          - Visible now, or at ?day=&time=
//! GET    /api/products/{id}               - Detail
//! POST   /api/products                    - Create, multipart (admin)
//! PUT    /api/products/{id}               - Partial update, multipart (admin)
//! DELETE /api/products/{id}               - Delete (admin)
//!
//! # Orders
//! POST   /api/orders                      - Place
//! GET    /api/orders                      - List with customers (admin)
//! PATCH  /api/orders/{id}/status          - Fulfillment status (admin)
//! PATCH  /api/orders/{id}/payment-status  - Payment status (admin)
//! POST   /api/orders/{id}/send-email      - Owner notification
//! DELETE /api/orders/{id}                 - Delete (admin)
//!
//! # Checkout & payments
//! POST   /api/checkout/quote              - Price a cart
//! POST   /api/payments/initiate           - UPI links for an order
//! POST   /api/payments/callback           - Signed gateway callback
//!
//! # Offers
//! GET    /api/offers                      - List
//! GET    /api/offers/active               - Currently running
//! POST   /api/offers                      - Create, multipart (admin)
//! PATCH  /api/offers/{id}/status          - Toggle (admin)
//! DELETE /api/offers/{id}                 - Delete (admin)
//!
//! # Admin
//! POST   /api/admin/login                 - Start session
//! POST   /api/admin/logout                - End session
//! PUT    /api/admin/change-password       - Change password (admin)
//! GET    /api/admin/dashboard-stats       - Counts (admin)
//! ```

pub mod admin;
pub mod checkout;
pub mod customers;
pub mod form;
pub mod offers;
pub mod orders;
pub mod payments;
pub mod products;

use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, Method, StatusCode, header::CONTENT_TYPE},
    middleware::from_fn,
    routing::get,
};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};

use crate::{
    config::ApiConfig,
    db::RepositoryError,
    error::AppError,
    middleware::{create_session_layer, security_headers_middleware},
    state::AppState,
};

/// Largest accepted request body, sized for product images.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// A bare `{"message": ...}` response.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

impl MessageResponse {
    #[must_use]
    pub const fn new(message: &'static str) -> Self {
        Self { message }
    }
}

/// Map a missing row to a 404 with `message`; other repository errors pass through.
pub(crate) fn or_not_found(message: &'static str) -> impl FnOnce(RepositoryError) -> AppError {
    move |e| match e {
        RepositoryError::NotFound => AppError::NotFound(message.into()),
        other => AppError::Database(other),
    }
}

/// Build the `/api` router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(customers::router())
        .merge(products::router())
        .merge(orders::router())
        .merge(checkout::router())
        .merge(payments::router())
        .merge(offers::router())
        .merge(admin::router())
}

fn cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(60 * 60));

    match HeaderValue::from_str(&config.frontend_origin) {
        Ok(origin) => cors.allow_origin(origin),
        Err(e) => {
            tracing::warn!(error = %e, "Invalid frontend origin, CORS disabled");
            cors
        }
    }
}

/// Build the complete application: health checks, `/api`, sessions, CORS and
/// the optional SPA fallback.
///
/// Tracing and Sentry layers are added by the binary.
pub fn app(state: AppState) -> Router {
    let config = state.config();
    let session_layer = create_session_layer(state.pool(), config);
    let cors = cors_layer(config);

    let mut router = Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest(
            "/api",
            api_routes().layer(from_fn(security_headers_middleware)),
        );

    // Client-side routes fall through to index.html
    if let Some(dir) = &config.static_dir {
        router = router
            .fallback_service(ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html"))));
    }

    router
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(session_layer)
        .layer(cors)
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, Response},
    };
    use chrono::Utc;
    use secrecy::SecretString;
    use serde_json::{Value, json};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::services::payments::compute_signature;

    /// App over a pool that never connects; every request tested here must
    /// be answered before touching the database.
    fn test_app() -> Router {
        let config = ApiConfig::for_tests();
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/agfood_test")
            .unwrap();
        app(AppState::new(config, pool).unwrap())
    }

    fn json_request(method: Method, uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn read_json(response: Response<Body>) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn send(request: Request<Body>) -> (StatusCode, Value) {
        let response = test_app().oneshot(request).await.unwrap();
        let status = response.status();
        (status, read_json(response).await)
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_admin_routes_require_session() {
        for (method, uri) in [
            (Method::GET, "/api/customers"),
            (Method::DELETE, "/api/customers/1"),
            (Method::GET, "/api/orders"),
            (Method::DELETE, "/api/orders/1"),
            (Method::DELETE, "/api/products/1"),
            (Method::DELETE, "/api/offers/1"),
            (Method::GET, "/api/admin/dashboard-stats"),
        ] {
            let request = Request::builder()
                .method(method.clone())
                .uri(uri)
                .body(Body::empty())
                .unwrap();
            let (status, body) = send(request).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
            assert_eq!(body["message"], "Unauthorized, please login");
        }

        let (status, _) = send(json_request(
            Method::PATCH,
            "/api/orders/5/status",
            &json!({"status": "order shipped"}),
        ))
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_api_responses_carry_security_headers() {
        let response = test_app()
            .oneshot(Request::get("/api/orders").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let headers = response.headers();
        assert_eq!(headers["x-frame-options"], "DENY");
        assert_eq!(headers["cache-control"], "no-store");
    }

    #[tokio::test]
    async fn test_customer_validation() {
        let (status, body) = send(json_request(
            Method::POST,
            "/api/customers",
            &json!({"name": "Asha", "phone": "12345"}),
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Phone number must be exactly 10 digits");

        let (status, body) = send(json_request(
            Method::POST,
            "/api/customers",
            &json!({"name": "Asha", "phone": "9876543210", "wantsOffers": true, "email": ""}),
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Email is required when opting in for offers.");
    }

    #[tokio::test]
    async fn test_order_placement_validation() {
        let (status, body) = send(json_request(
            Method::POST,
            "/api/orders",
            &json!({"name": "Asha", "phone": "9876543210"}),
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["message"],
            "All required fields must be filled: name, phone, products, totalPrice, address, deliveryPoint"
        );

        let (status, body) = send(json_request(
            Method::POST,
            "/api/orders",
            &json!({
                "name": "Asha",
                "phone": "9876543210",
                "products": [{"productName": "Millet Bowl", "quantity": 2, "price": 150}],
                "totalPrice": 300,
                "address": "12 Palm St",
                "deliveryPoint": "rooftop"
            }),
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().starts_with("Invalid delivery point"));
    }

    #[tokio::test]
    async fn test_malformed_json_is_json_400() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/orders")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn test_product_show_rejects_non_numeric_id() {
        let request = Request::get("/api/products/abc").body(Body::empty()).unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid product ID");
    }

    #[tokio::test]
    async fn test_send_email_rejects_non_numeric_id() {
        let request = Request::post("/api/orders/abc/send-email")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid order ID");
    }

    #[tokio::test]
    async fn test_login_requires_both_fields() {
        let (status, body) = send(json_request(
            Method::POST,
            "/api/admin/login",
            &json!({"email": "owner@aghealthyfood.in"}),
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Email and password are required");
    }

    #[tokio::test]
    async fn test_availability_rejects_unknown_day() {
        let request = Request::get("/api/products/available?day=Funday")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid day: Funday");
    }

    #[tokio::test]
    async fn test_quote_rejects_empty_cart_and_bad_point() {
        let (status, body) = send(json_request(
            Method::POST,
            "/api/checkout/quote",
            &json!({"items": [], "deliveryPoint": "point_a"}),
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Cart is empty");

        let (status, _) = send(json_request(
            Method::POST,
            "/api/checkout/quote",
            &json!({"items": [{"productId": 1, "quantity": 1}], "deliveryPoint": "moon"}),
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_initiate_requires_order_id() {
        let (status, body) =
            send(json_request(Method::POST, "/api/payments/initiate", &json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "orderId is required");
    }

    #[tokio::test]
    async fn test_callback_requires_headers() {
        let (status, body) = send(json_request(
            Method::POST,
            "/api/payments/callback",
            &json!({"orderId": 1, "transactionId": "T1", "status": "completed"}),
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Missing X-Payment-Timestamp header");
    }

    #[tokio::test]
    async fn test_callback_rejects_bad_signatures() {
        let body = json!({"orderId": 1, "transactionId": "T1", "status": "completed"}).to_string();
        let now = Utc::now().timestamp().to_string();

        // Signed with the wrong secret
        let wrong = compute_signature(&SecretString::from("not-the-secret"), &now, body.as_bytes()).unwrap();
        let request = Request::post("/api/payments/callback")
            .header(CONTENT_TYPE, "application/json")
            .header("x-payment-timestamp", &now)
            .header("x-payment-signature", wrong)
            .body(Body::from(body.clone()))
            .unwrap();
        let (status, _) = send(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        // Correct secret, stale timestamp
        let config = ApiConfig::for_tests();
        let secret = config.payments.webhook_secret.unwrap();
        let stale = (Utc::now().timestamp() - 3600).to_string();
        let signature = compute_signature(&secret, &stale, body.as_bytes()).unwrap();
        let request = Request::post("/api/payments/callback")
            .header(CONTENT_TYPE, "application/json")
            .header("x-payment-timestamp", &stale)
            .header("x-payment-signature", signature)
            .body(Body::from(body))
            .unwrap();
        let (status, _) = send(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
