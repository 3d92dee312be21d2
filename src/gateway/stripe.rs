use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};

type HmacSha256 = Hmac<Sha256>;

/// Reject webhook signatures older than this to limit replay windows.
const SIGNATURE_MAX_AGE_SECS: u64 = 300;

/// Webhook events we act on. `data.object.id` is the payment intent id for
/// `payment_intent.*` events; for `charge.*` events the intent id is on
/// `payment_intent` instead.
#[derive(Deserialize, Debug)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookData,
}

#[derive(Deserialize, Debug)]
pub struct WebhookData {
    pub object: WebhookObject,
}

#[derive(Deserialize, Debug)]
pub struct WebhookObject {
    pub id: String,
    pub payment_intent: Option<String>,
}

impl WebhookEvent {
    /// The transaction id this event refers to, matching `payments.transaction_id`.
    pub fn transaction_id(&self) -> &str {
        self.data
            .object
            .payment_intent
            .as_deref()
            .unwrap_or(&self.data.object.id)
    }
}

/// Verify a `Stripe-Signature` header (`t=<unix-ts>,v1=<hex hmac>`) against
/// the shared endpoint secret. The signed payload is `"{t}.{body}"`.
pub fn verify_signature(payload: &[u8], sig_header: &str, secret: &str) -> Result<(), String> {
    let mut timestamp: Option<u64> = None;
    let mut provided: Option<&str> = None;

    for part in sig_header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => {
                timestamp = Some(value.parse().map_err(|_| "Invalid timestamp".to_string())?)
            }
            Some(("v1", value)) => provided = Some(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or_else(|| "Missing timestamp".to_string())?;
    let provided = provided.ok_or_else(|| "Missing v1 signature".to_string())?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| "Invalid webhook secret".to_string())?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    let expected = hex::encode(mac.finalize().into_bytes());

    if !constant_time_eq(provided.as_bytes(), expected.as_bytes()) {
        return Err("Invalid signature".to_string());
    }

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs();
    if now.saturating_sub(timestamp) > SIGNATURE_MAX_AGE_SECS {
        return Err("Signature timestamp outside tolerance".to_string());
    }

    Ok(())
}

/// Build a signature header for a payload. Exists for tests and local tools.
pub fn sign_payload(payload: &[u8], timestamp: u64, secret: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time byte comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
    }

    #[test]
    fn valid_signature_round_trip() {
        let payload = br#"{"type":"payment_intent.succeeded"}"#;
        let header = sign_payload(payload, now(), "whsec_test");
        assert!(verify_signature(payload, &header, "whsec_test").is_ok());
    }

    #[test]
    fn tampered_payload_rejected() {
        let header = sign_payload(b"original", now(), "whsec_test");
        let result = verify_signature(b"tampered", &header, "whsec_test");
        assert!(result.is_err());
    }

    #[test]
    fn wrong_secret_rejected() {
        let header = sign_payload(b"payload", now(), "whsec_test");
        assert!(verify_signature(b"payload", &header, "whsec_other").is_err());
    }

    #[test]
    fn stale_timestamp_rejected() {
        let header = sign_payload(b"payload", now() - 3600, "whsec_test");
        let result = verify_signature(b"payload", &header, "whsec_test");
        assert_eq!(
            result.unwrap_err(),
            "Signature timestamp outside tolerance".to_string()
        );
    }

    #[test]
    fn malformed_header_rejected() {
        assert!(verify_signature(b"payload", "v1=deadbeef", "whsec_test").is_err());
        assert!(verify_signature(b"payload", "t=123", "whsec_test").is_err());
        assert!(verify_signature(b"payload", "", "whsec_test").is_err());
    }

    #[test]
    fn charge_event_uses_payment_intent_id() {
        let event: WebhookEvent = serde_json::from_str(
            r#"{"type":"charge.refunded","data":{"object":{"id":"ch_1","payment_intent":"pi_9"}}}"#,
        )
        .unwrap();
        assert_eq!(event.transaction_id(), "pi_9");

        let event: WebhookEvent = serde_json::from_str(
            r#"{"type":"payment_intent.succeeded","data":{"object":{"id":"pi_9","payment_intent":null}}}"#,
        )
        .unwrap();
        assert_eq!(event.transaction_id(), "pi_9");
    }
}
