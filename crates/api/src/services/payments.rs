//! UPI payment handoff and verified gateway callbacks.
//!
//! The storefront opens a UPI deep link built here. The payment outcome is
//! only trusted when the gateway posts it back with a valid signature:
//!
//! ```text
//! X-Payment-Timestamp: <unix seconds>
//! X-Payment-Signature: v1=<hex HMAC-SHA256(secret, "v1:<timestamp>:<raw body>")>
//! ```

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use sha2::Sha256;
use thiserror::Error;

use agfood_core::OrderId;

/// Header carrying the signing timestamp.
pub const TIMESTAMP_HEADER: &str = "x-payment-timestamp";

/// Header carrying the versioned signature.
pub const SIGNATURE_HEADER: &str = "x-payment-signature";

/// Maximum age (and clock skew) of a signed callback, in seconds.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

const SIGNATURE_VERSION: &str = "v1";

/// Errors that can occur while handling a payment.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The webhook secret is not configured.
    #[error("PAYMENT_WEBHOOK_SECRET is not configured")]
    NotConfigured,

    /// A signature header is absent.
    #[error("missing {0} header")]
    MissingHeader(&'static str),

    /// The signature or timestamp did not verify.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// The amount sent by the client differs from the stored order total.
    #[error("amount {got} does not match order total {expected}")]
    AmountMismatch { expected: i32, got: f64 },
}

/// Deep links that open a UPI app with the payment pre-filled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpiLinks {
    /// `upi://` intent for Android and desktop handlers.
    pub upi_link: String,
    /// Web fallback for platforms that block custom schemes.
    pub web_link: String,
}

/// Build the UPI links for paying `amount` rupees towards an order.
#[must_use]
pub fn payment_links(payee_id: &str, payee_name: &str, amount: i32, order_id: OrderId) -> UpiLinks {
    let query = format!(
        "pa={payee_id}&pn={}&am={amount}.00&cu=INR&tn=Order_{order_id}",
        urlencoding::encode(payee_name)
    );

    UpiLinks {
        upi_link: format!("upi://pay?{query}"),
        web_link: format!("https://pay.google.com/upi/pay?{query}"),
    }
}

/// Check a client-supplied amount against the stored order total.
///
/// # Errors
///
/// Returns `PaymentError::AmountMismatch` unless `amount` rounds to `expected`.
#[allow(clippy::cast_possible_truncation)]
pub fn check_amount(expected: i32, amount: Option<f64>) -> Result<(), PaymentError> {
    match amount {
        Some(got) if !got.is_finite() || got.round() as i64 != i64::from(expected) => {
            Err(PaymentError::AmountMismatch { expected, got })
        }
        _ => Ok(()),
    }
}

/// Compute the signature header value for a callback body.
///
/// # Errors
///
/// Returns `PaymentError::InvalidSignature` if the secret cannot key an HMAC.
pub fn compute_signature(
    secret: &SecretString,
    timestamp: &str,
    body: &[u8],
) -> Result<String, PaymentError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.expose_secret().as_bytes())
        .map_err(|e| PaymentError::InvalidSignature(e.to_string()))?;

    mac.update(SIGNATURE_VERSION.as_bytes());
    mac.update(b":");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(body);

    Ok(format!(
        "{SIGNATURE_VERSION}={}",
        hex::encode(mac.finalize().into_bytes())
    ))
}

/// Verify a gateway callback.
///
/// `now` is the current unix time in seconds.
///
/// # Errors
///
/// Returns `PaymentError::InvalidSignature` when the timestamp is malformed
/// or outside the tolerance window, or the signature does not match.
pub fn verify_signature(
    secret: &SecretString,
    timestamp: &str,
    body: &[u8],
    signature: &str,
    now: i64,
) -> Result<(), PaymentError> {
    // Replay window
    let ts: i64 = timestamp
        .trim()
        .parse()
        .map_err(|_| PaymentError::InvalidSignature("Invalid timestamp".to_string()))?;

    if now.abs_diff(ts) > SIGNATURE_TOLERANCE_SECS.unsigned_abs() {
        return Err(PaymentError::InvalidSignature(
            "Request timestamp outside tolerance".to_string(),
        ));
    }

    let expected = compute_signature(secret, timestamp.trim(), body)?;

    if !constant_time_compare(&expected, signature.trim()) {
        return Err(PaymentError::InvalidSignature(
            "Signature mismatch".to_string(),
        ));
    }

    tracing::debug!("Payment callback signature verified");

    Ok(())
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const NOW: i64 = 1_767_225_600;

    fn secret() -> SecretString {
        SecretString::from("whsec-test-9f8e7d6c5b4a")
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("hello", "hello"));
        assert!(!constant_time_compare("hello", "world"));
        assert!(!constant_time_compare("hello", "hell"));
    }

    #[test]
    fn test_signature_verification_valid() {
        let body = br#"{"orderId":5,"transactionId":"T1","status":"completed"}"#;
        let ts = NOW.to_string();
        let sig = compute_signature(&secret(), &ts, body).unwrap();

        assert!(sig.starts_with("v1="));
        assert!(verify_signature(&secret(), &ts, body, &sig, NOW).is_ok());
        // Within tolerance on either side
        assert!(verify_signature(&secret(), &ts, body, &sig, NOW + 300).is_ok());
        assert!(verify_signature(&secret(), &ts, body, &sig, NOW - 300).is_ok());
    }

    #[test]
    fn test_signature_verification_tampered_body() {
        let ts = NOW.to_string();
        let sig = compute_signature(&secret(), &ts, br#"{"orderId":5}"#).unwrap();
        let result = verify_signature(&secret(), &ts, br#"{"orderId":6}"#, &sig, NOW);
        assert!(matches!(result, Err(PaymentError::InvalidSignature(_))));
    }

    #[test]
    fn test_signature_verification_stale_timestamp() {
        let ts = NOW.to_string();
        let sig = compute_signature(&secret(), &ts, b"{}").unwrap();
        let result = verify_signature(&secret(), &ts, b"{}", &sig, NOW + 301);
        assert!(matches!(result, Err(PaymentError::InvalidSignature(_))));
    }

    #[test]
    fn test_signature_verification_wrong_secret() {
        let ts = NOW.to_string();
        let sig = compute_signature(&SecretString::from("another-secret"), &ts, b"{}").unwrap();
        assert!(verify_signature(&secret(), &ts, b"{}", &sig, NOW).is_err());
    }

    #[test]
    fn test_signature_verification_bad_timestamp() {
        assert!(verify_signature(&secret(), "yesterday", b"{}", "v1=00", NOW).is_err());
    }

    #[test]
    fn test_signature_verification_extreme_timestamps() {
        for ts in ["-9223372036854775000", "9223372036854775807", "-9223372036854775808"] {
            let result = verify_signature(&secret(), ts, b"{}", "v1=00", NOW);
            assert!(matches!(result, Err(PaymentError::InvalidSignature(_))), "{ts}");
        }
    }

    #[test]
    fn test_payment_links() {
        let links = payment_links("aghealthyfood@upi", "AG's Healthy Food", 310, OrderId::new(42));
        assert_eq!(
            links.upi_link,
            "upi://pay?pa=aghealthyfood@upi&pn=AG%27s%20Healthy%20Food&am=310.00&cu=INR&tn=Order_42"
        );
        assert!(links.web_link.starts_with("https://pay.google.com/upi/pay?pa=aghealthyfood@upi&"));
        assert!(links.web_link.ends_with("&tn=Order_42"));
    }

    #[test]
    fn test_check_amount() {
        assert!(check_amount(310, None).is_ok());
        assert!(check_amount(310, Some(310.0)).is_ok());
        assert!(check_amount(310, Some(309.6)).is_ok());
        assert!(check_amount(310, Some(300.0)).is_err());
        assert!(check_amount(310, Some(f64::NAN)).is_err());
    }
}
