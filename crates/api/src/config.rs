//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `AGFOOD_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `AGFOOD_SESSION_SECRET` - Session cookie signing secret (min 32 chars, high entropy)
//! - `ADMIN_EMAIL` - Seed admin email address
//! - `ADMIN_PASSWORD` - Seed admin password
//! - `CLOUDINARY_CLOUD_NAME` - Media storage cloud name
//! - `CLOUDINARY_API_KEY` - Media storage API key
//! - `CLOUDINARY_API_SECRET` - Media storage API secret
//! - `UPI_PAYEE_ID` - UPI virtual payment address that receives payments
//!
//! ## Optional
//! - `AGFOOD_HOST` - Bind address (default: 0.0.0.0)
//! - `AGFOOD_PORT` - Listen port (default: 5000)
//! - `AGFOOD_BASE_URL` - Public URL of the API (default: `http://localhost:5000`)
//! - `AGFOOD_FRONTEND_ORIGIN` - Origin allowed by CORS (default: `http://localhost:5173`)
//! - `AGFOOD_STATIC_DIR` - Directory of the built single-page app to serve
//! - `AGFOOD_STORE_UTC_OFFSET_MINUTES` - Store clock offset from UTC (default: 330)
//! - `BUSINESS_NAME` - Name shown to payers and in emails (default: AG's Healthy Food)
//! - `SENDGRID_API_KEY` - Email provider API key
//! - `SENDGRID_VERIFIED_SENDER` - Verified sender address
//! - `OWNER_EMAIL` - Address that receives order notifications
//! - `SENDGRID_SMTP_HOST` - SMTP relay host (default: smtp.sendgrid.net)
//! - `SENDGRID_SMTP_PORT` - SMTP relay port (default: 587)
//! - `PAYMENT_WEBHOOK_SECRET` - HMAC secret shared with the payment gateway
//! - `SENTRY_DSN` - Sentry error tracking DSN
//!
//! ## Optional (TLS)
//! - `AGFOOD_TLS_CERT` - PEM-encoded certificate chain
//! - `AGFOOD_TLS_KEY` - PEM-encoded private key

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use chrono::FixedOffset;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_BUSINESS_NAME: &str = "AG's Healthy Food";
const DEFAULT_SMTP_HOST: &str = "smtp.sendgrid.net";
/// India Standard Time.
const DEFAULT_UTC_OFFSET_MINUTES: i32 = 330;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the API
    pub base_url: Url,
    /// Origin of the storefront/admin single-page app
    pub frontend_origin: String,
    /// Built single-page app to serve as a fallback (optional)
    pub static_dir: Option<PathBuf>,
    /// Session cookie signing secret
    pub session_secret: SecretString,
    /// Business name shown to payers and in notification emails
    pub business_name: String,
    /// Offset of the store's wall clock from UTC
    pub store_offset: FixedOffset,
    /// Admin account seeded at startup
    pub admin_seed: AdminSeedConfig,
    /// Media storage credentials
    pub media: MediaConfig,
    /// Email provider settings, checked when a notification is sent
    pub email: EmailConfig,
    /// UPI payment settings
    pub payments: PaymentConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
    /// TLS configuration for HTTPS (optional)
    pub tls: Option<TlsConfig>,
}

/// Admin credentials seeded at startup.
#[derive(Clone)]
pub struct AdminSeedConfig {
    pub email: String,
    pub password: SecretString,
}

impl std::fmt::Debug for AdminSeedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSeedConfig")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Cloudinary media storage configuration.
///
/// Implements `Debug` manually to redact the API secret.
#[derive(Clone)]
pub struct MediaConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: SecretString,
}

impl std::fmt::Debug for MediaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .finish()
    }
}

/// Email provider configuration.
///
/// Every credential is optional at startup. The notification endpoint checks
/// them in declaration order and reports the first one that is missing.
#[derive(Clone)]
pub struct EmailConfig {
    /// `SendGrid` API key, also the SMTP relay password
    pub api_key: Option<SecretString>,
    /// Verified sender address (From header)
    pub verified_sender: Option<String>,
    /// Address that receives order notifications
    pub owner_email: Option<String>,
    /// SMTP relay hostname
    pub smtp_host: String,
    /// SMTP relay port
    pub smtp_port: u16,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("verified_sender", &self.verified_sender)
            .field("owner_email", &self.owner_email)
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .finish()
    }
}

impl EmailConfig {
    /// Name of the first missing credential, if any.
    #[must_use]
    pub fn first_missing(&self) -> Option<&'static str> {
        if self.api_key.is_none() {
            Some("SENDGRID_API_KEY")
        } else if self.verified_sender.is_none() {
            Some("SENDGRID_VERIFIED_SENDER")
        } else if self.owner_email.is_none() {
            Some("OWNER_EMAIL")
        } else {
            None
        }
    }

    fn from_env() -> Result<Self, ConfigError> {
        let smtp_port = get_env_or_default("SENDGRID_SMTP_PORT", "587")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("SENDGRID_SMTP_PORT".to_string(), e.to_string())
            })?;

        Ok(Self {
            api_key: get_optional_env("SENDGRID_API_KEY").map(SecretString::from),
            verified_sender: get_optional_env("SENDGRID_VERIFIED_SENDER"),
            owner_email: get_optional_env("OWNER_EMAIL"),
            smtp_host: get_env_or_default("SENDGRID_SMTP_HOST", DEFAULT_SMTP_HOST),
            smtp_port,
        })
    }
}

/// UPI payment configuration.
#[derive(Clone)]
pub struct PaymentConfig {
    /// UPI virtual payment address of the business
    pub payee_id: String,
    /// Shared secret for verifying payment gateway callbacks
    pub webhook_secret: Option<SecretString>,
}

impl std::fmt::Debug for PaymentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentConfig")
            .field("payee_id", &self.payee_id)
            .field(
                "webhook_secret",
                &self.webhook_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl PaymentConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let webhook_secret = match get_optional_env("PAYMENT_WEBHOOK_SECRET") {
            Some(value) => {
                validate_secret_strength(&value, "PAYMENT_WEBHOOK_SECRET")?;
                Some(SecretString::from(value))
            }
            None => None,
        };

        Ok(Self {
            payee_id: get_required_env("UPI_PAYEE_ID")?,
            webhook_secret,
        })
    }
}

/// TLS configuration for HTTPS.
#[derive(Clone)]
pub struct TlsConfig {
    /// PEM-encoded certificate chain
    pub cert_pem: String,
    /// PEM-encoded private key
    pub key_pem: SecretString,
}

impl std::fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConfig")
            .field("cert_pem", &"[CERTIFICATE]")
            .field("key_pem", &"[REDACTED]")
            .finish()
    }
}

impl TlsConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let cert_pem = get_optional_env("AGFOOD_TLS_CERT");
        let key_pem = get_optional_env("AGFOOD_TLS_KEY");

        match (cert_pem, key_pem) {
            (Some(cert), Some(key)) => Ok(Some(Self {
                cert_pem: cert,
                key_pem: SecretString::from(key),
            })),
            (None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "AGFOOD_TLS_*".to_string(),
                "Both AGFOOD_TLS_CERT and AGFOOD_TLS_KEY must be set together".to_string(),
            )),
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("AGFOOD_DATABASE_URL")?;
        let host = get_env_or_default("AGFOOD_HOST", "0.0.0.0")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("AGFOOD_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("AGFOOD_PORT", "5000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("AGFOOD_PORT".to_string(), e.to_string()))?;
        let base_url = Url::parse(&get_env_or_default("AGFOOD_BASE_URL", "http://localhost:5000"))
            .map_err(|e| {
                ConfigError::InvalidEnvVar("AGFOOD_BASE_URL".to_string(), e.to_string())
            })?;
        let frontend_origin = get_env_or_default("AGFOOD_FRONTEND_ORIGIN", "http://localhost:5173");
        Url::parse(&frontend_origin).map_err(|e| {
            ConfigError::InvalidEnvVar("AGFOOD_FRONTEND_ORIGIN".to_string(), e.to_string())
        })?;
        let static_dir = get_optional_env("AGFOOD_STATIC_DIR").map(PathBuf::from);

        let session_secret = get_validated_secret("AGFOOD_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "AGFOOD_SESSION_SECRET")?;

        let offset_minutes = get_optional_env("AGFOOD_STORE_UTC_OFFSET_MINUTES")
            .map_or(Ok(DEFAULT_UTC_OFFSET_MINUTES), |s| s.parse::<i32>())
            .map_err(|e| {
                ConfigError::InvalidEnvVar(
                    "AGFOOD_STORE_UTC_OFFSET_MINUTES".to_string(),
                    e.to_string(),
                )
            })?;
        let store_offset = parse_utc_offset(offset_minutes)?;

        let admin_seed = AdminSeedConfig {
            email: get_required_env("ADMIN_EMAIL")?,
            password: get_required_secret("ADMIN_PASSWORD")?,
        };
        let media = MediaConfig {
            cloud_name: get_required_env("CLOUDINARY_CLOUD_NAME")?,
            api_key: get_required_env("CLOUDINARY_API_KEY")?,
            api_secret: get_required_secret("CLOUDINARY_API_SECRET")?,
        };
        let email = EmailConfig::from_env()?;
        let payments = PaymentConfig::from_env()?;

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.1);
        let tls = TlsConfig::from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            frontend_origin,
            static_dir,
            session_secret,
            business_name: get_env_or_default("BUSINESS_NAME", DEFAULT_BUSINESS_NAME),
            store_offset,
            admin_seed,
            media,
            email,
            payments,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
            tls,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the API is served over HTTPS (controls the `Secure` cookie flag).
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.scheme() == "https"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
impl ApiConfig {
    /// Configuration for in-process router tests. Nothing here reaches the network.
    pub(crate) fn for_tests() -> Self {
        Self {
            database_url: SecretString::from("postgres://localhost/agfood_test"),
            host: IpAddr::from([127, 0, 0, 1]),
            port: 5000,
            base_url: Url::parse("http://localhost:5000").unwrap(),
            frontend_origin: "http://localhost:5173".to_string(),
            static_dir: None,
            session_secret: SecretString::from("kP9#vL2$wQ7!xR4@mN8^tY3&zB6*cD1%"),
            business_name: DEFAULT_BUSINESS_NAME.to_string(),
            store_offset: FixedOffset::east_opt(DEFAULT_UTC_OFFSET_MINUTES * 60).unwrap(),
            admin_seed: AdminSeedConfig {
                email: "owner@aghealthyfood.in".to_string(),
                password: SecretString::from("seed-password"),
            },
            media: MediaConfig {
                cloud_name: "agfood-test".to_string(),
                api_key: "123456789".to_string(),
                api_secret: SecretString::from("cloudinary-test-secret"),
            },
            email: EmailConfig {
                api_key: None,
                verified_sender: None,
                owner_email: None,
                smtp_host: DEFAULT_SMTP_HOST.to_string(),
                smtp_port: 587,
            },
            payments: PaymentConfig {
                payee_id: "aghealthyfood@upi".to_string(),
                webhook_secret: Some(SecretString::from("whsec-test-9f8e7d6c5b4a")),
            },
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
            tls: None,
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Build a UTC offset from minutes east of Greenwich.
fn parse_utc_offset(minutes: i32) -> Result<FixedOffset, ConfigError> {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| {
            ConfigError::InvalidEnvVar(
                "AGFOOD_STORE_UTC_OFFSET_MINUTES".to_string(),
                format!("{minutes} is not a valid UTC offset"),
            )
        })
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_bounds() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
        assert!(shannon_entropy("aB3$xY9!mK2@nL5#") > 3.3);
    }

    #[test]
    fn test_validate_secret_strength_rejects_placeholders() {
        for candidate in ["your-session-key", "changeme123", "my-secret-value"] {
            let err = validate_secret_strength(candidate, "TEST_VAR").unwrap_err();
            assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
        }
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("abababababababababababababababab", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        assert!(validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR").is_ok());
    }

    #[test]
    fn test_validate_session_secret_length() {
        let short = SecretString::from("short");
        assert!(validate_session_secret(&short, "AGFOOD_SESSION_SECRET").is_err());
        let ok = SecretString::from("a".repeat(32));
        assert!(validate_session_secret(&ok, "AGFOOD_SESSION_SECRET").is_ok());
    }

    #[test]
    fn test_parse_utc_offset() {
        assert_eq!(parse_utc_offset(330).unwrap().local_minus_utc(), 19_800);
        assert_eq!(parse_utc_offset(-300).unwrap().local_minus_utc(), -18_000);
        assert!(parse_utc_offset(24 * 60).is_err());
    }

    #[test]
    fn test_email_first_missing_order() {
        let mut email = ApiConfig::for_tests().email;
        assert_eq!(email.first_missing(), Some("SENDGRID_API_KEY"));

        email.api_key = Some(SecretString::from("SG.key"));
        assert_eq!(email.first_missing(), Some("SENDGRID_VERIFIED_SENDER"));

        email.verified_sender = Some("orders@aghealthyfood.in".to_string());
        assert_eq!(email.first_missing(), Some("OWNER_EMAIL"));

        email.owner_email = Some("owner@aghealthyfood.in".to_string());
        assert_eq!(email.first_missing(), None);
    }

    #[test]
    fn test_socket_addr_and_secure_flag() {
        let mut config = ApiConfig::for_tests();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:5000");
        assert!(!config.is_secure());

        config.base_url = Url::parse("https://api.aghealthyfood.in").unwrap();
        assert!(config.is_secure());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = ApiConfig::for_tests();
        let debug_output = format!("{:?}", config.media);
        assert!(debug_output.contains("agfood-test"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("cloudinary-test-secret"));

        let debug_output = format!("{:?}", config.payments);
        assert!(debug_output.contains("aghealthyfood@upi"));
        assert!(!debug_output.contains("whsec-test"));

        let debug_output = format!("{:?}", config.admin_seed);
        assert!(!debug_output.contains("seed-password"));
    }
}
