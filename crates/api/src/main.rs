//! AG's Healthy Food API server.
//!
//! Serves the REST API under `/api` on port 5000 (and, when
//! `AGFOOD_STATIC_DIR` is set, the built storefront and admin SPA).
//!
//! # Architecture
//!
//! - Axum web framework
//! - `PostgreSQL` via sqlx for catalog, customers, orders, offers and admins
//! - tower-sessions for admin sessions
//! - Cloudinary for images, `SendGrid` SMTP for owner notifications
//!
//! Migrations are NOT run on startup. Run them with `agfood migrate`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use axum_server::Handle;
use axum_server::tls_rustls::RustlsConfig;
use secrecy::ExposeSecret;
use sentry::integrations::tracing as sentry_tracing;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use agfood_api::{
    config::ApiConfig,
    db,
    routes,
    services::{AdminAuthService, SeedOutcome},
    state::AppState,
};

/// How long in-flight TLS connections get to finish after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// Start Sentry when a DSN is configured. The guard flushes on drop.
fn init_sentry(config: &ApiConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_deref()?;

    let options = sentry::ClientOptions {
        release: sentry::release_name!(),
        environment: config.sentry_environment.clone().map(Into::into),
        sample_rate: config.sentry_sample_rate,
        traces_sample_rate: config.sentry_traces_sample_rate,
        attach_stacktrace: true,
        // Customer phone numbers and addresses stay out of Sentry
        send_default_pii: false,
        ..Default::default()
    };
    let guard = sentry::init((dsn, options));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Warnings and errors become Sentry events, info and debug lines become
/// breadcrumbs.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    let level = *metadata.level();
    if level <= tracing::Level::WARN {
        sentry_tracing::EventFilter::Event
    } else if level <= tracing::Level::DEBUG {
        sentry_tracing::EventFilter::Breadcrumb
    } else {
        sentry_tracing::EventFilter::Ignore
    }
}

/// Install the global subscriber. `AGFOOD_LOG_FORMAT=json` switches to
/// one JSON object per line for log shippers.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("agfood_api=info,tower_http=debug"));

    let json = std::env::var("AGFOOD_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json().flatten_event(true)))
        .with((!json).then(fmt::layer))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

/// Request spans carry the method and URI, then the final status and latency.
fn record_request_span(request: &Request<Body>) -> Span {
    tracing::info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri(),
        status = tracing::field::Empty,
        latency_ms = tracing::field::Empty,
    )
}

fn record_response(response: &Response<Body>, latency: Duration, span: &Span) {
    span.record("status", response.status().as_u16());
    span.record(
        "latency_ms",
        u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
    );
    DefaultOnResponse::default().on_response(response, latency, span);
}

#[tokio::main]
async fn main() {
    // ring must be the process-wide provider before axum-server or reqwest touch TLS
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let config = ApiConfig::from_env().expect("Failed to load configuration");

    // Sentry goes first so the tracing layer has a client to report to
    let _sentry_guard = init_sentry(&config);
    init_tracing();

    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");
    tracing::info!("Database pool created");

    seed_admin(&pool, &config).await;

    let state = AppState::new(config.clone(), pool).expect("Failed to create application state");

    let app = routes::app(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(record_request_span)
                .on_response(record_response),
        )
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    let addr = config.socket_addr();
    match &config.tls {
        Some(tls) => {
            let rustls_config = RustlsConfig::from_pem(
                tls.cert_pem.as_bytes().to_vec(),
                tls.key_pem.expose_secret().as_bytes().to_vec(),
            )
            .await
            .expect("Failed to load TLS certificates");

            let handle = Handle::new();
            tokio::spawn({
                let handle = handle.clone();
                async move {
                    shutdown_signal().await;
                    handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
                }
            });

            tracing::info!(%addr, "agfood-api listening (https)");
            axum_server::bind_rustls(addr, rustls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await
                .expect("Server error");
        }
        None => {
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .expect("Failed to bind to address");

            tracing::info!(%addr, "agfood-api listening (http)");
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await
                .expect("Server error");
        }
    }
}

/// Make sure the configured owner account exists. Failure is logged and the
/// server still starts.
async fn seed_admin(pool: &sqlx::PgPool, config: &ApiConfig) {
    let seed = &config.admin_seed;
    match AdminAuthService::new(pool)
        .seed_admin(&seed.email, &seed.password)
        .await
    {
        Ok(SeedOutcome::Created) => tracing::info!(email = %seed.email, "Seeded admin account"),
        Ok(SeedOutcome::AlreadyPresent) => tracing::debug!("Admin account already present"),
        Err(e) => tracing::error!(error = %e, "Failed to seed admin account"),
    }
}

/// Resolve on Ctrl+C or SIGTERM. A handler that fails to install never fires.
async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Ctrl+C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => {},
        () = terminate => {},
    }

    tracing::info!("Shutting down, draining connections");
}
