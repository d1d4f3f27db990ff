//! Stripe webhook support (no SDK dependency)
//!
//! Signature verification and the price → tier mapping used by
//! subscription events.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use shared::models::SubscriptionTier;
use std::collections::HashMap;

/// Maximum age of a signed webhook, in seconds
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Stripe Price ID → tier
#[derive(Debug, Clone, Default)]
pub struct PriceTierMap {
    prices: HashMap<String, SubscriptionTier>,
}

impl PriceTierMap {
    pub fn new(professional: Option<&str>, premium: Option<&str>) -> Self {
        let mut prices = HashMap::new();
        if let Some(id) = professional {
            prices.insert(id.to_string(), SubscriptionTier::Professional);
        }
        if let Some(id) = premium {
            prices.insert(id.to_string(), SubscriptionTier::Premium);
        }
        Self { prices }
    }

    pub fn tier_for_price(&self, price_id: &str) -> Option<SubscriptionTier> {
        self.prices.get(price_id).copied()
    }
}

/// Compute the hex `v1` signature for `{timestamp}.{payload}`
pub fn compute_signature(payload: &[u8], timestamp: i64, secret: &str) -> Result<String, &'static str> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map_err(|_| "HMAC key error")?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verify Stripe webhook signature (HMAC-SHA256)
pub fn verify_webhook_signature(
    payload: &[u8],
    sig_header: &str,
    secret: &str,
    now: i64,
) -> Result<(), &'static str> {
    let mut timestamp = "";
    let mut signatures = Vec::new();
    for part in sig_header.split(',') {
        if let Some(t) = part.trim().strip_prefix("t=") {
            timestamp = t;
        } else if let Some(v) = part.trim().strip_prefix("v1=") {
            signatures.push(v);
        }
    }

    if timestamp.is_empty() || signatures.is_empty() {
        return Err("Invalid Stripe-Signature header");
    }

    let ts: i64 = timestamp.parse().map_err(|_| "Invalid timestamp")?;

    // Any v1 entry may match during secret rotation
    let matched = signatures.iter().any(|sig| {
        let Ok(sig_bytes) = hex::decode(sig) else {
            return false;
        };
        let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(secret.as_bytes()) else {
            return false;
        };
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);
        mac.verify_slice(&sig_bytes).is_ok()
    });
    if !matched {
        return Err("Webhook signature mismatch");
    }

    // Reject events older than 5 minutes to prevent replay attacks
    if (now - ts).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err("Webhook timestamp too old");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test";

    fn header(payload: &[u8], ts: i64) -> String {
        format!("t={ts},v1={}", compute_signature(payload, ts, SECRET).unwrap())
    }

    #[test]
    fn test_valid_signature() {
        let payload = br#"{"id":"evt_1"}"#;
        let now = 1_700_000_000;
        assert!(verify_webhook_signature(payload, &header(payload, now), SECRET, now).is_ok());
    }

    #[test]
    fn test_tampered_payload() {
        let now = 1_700_000_000;
        let sig = header(br#"{"id":"evt_1"}"#, now);
        assert_eq!(
            verify_webhook_signature(br#"{"id":"evt_2"}"#, &sig, SECRET, now),
            Err("Webhook signature mismatch")
        );
    }

    #[test]
    fn test_stale_timestamp() {
        let payload = b"{}";
        let ts = 1_700_000_000;
        assert_eq!(
            verify_webhook_signature(payload, &header(payload, ts), SECRET, ts + 301),
            Err("Webhook timestamp too old")
        );
        assert!(verify_webhook_signature(payload, &header(payload, ts), SECRET, ts + 300).is_ok());
    }

    #[test]
    fn test_malformed_header() {
        assert_eq!(
            verify_webhook_signature(b"{}", "v1=abc", SECRET, 0),
            Err("Invalid Stripe-Signature header")
        );
        assert_eq!(
            verify_webhook_signature(b"{}", "t=x,v1=abc", SECRET, 0),
            Err("Invalid timestamp")
        );
    }

    #[test]
    fn test_rotated_secret_second_signature() {
        let payload = b"{}";
        let ts = 1_700_000_000;
        let good = compute_signature(payload, ts, SECRET).unwrap();
        let sig = format!("t={ts},v1=deadbeef,v1={good}");
        assert!(verify_webhook_signature(payload, &sig, SECRET, ts).is_ok());
    }

    #[test]
    fn test_price_tier_map() {
        let map = PriceTierMap::new(Some("price_pro"), Some("price_prem"));
        assert_eq!(map.tier_for_price("price_pro"), Some(SubscriptionTier::Professional));
        assert_eq!(map.tier_for_price("price_prem"), Some(SubscriptionTier::Premium));
        assert_eq!(map.tier_for_price("price_other"), None);
        assert_eq!(PriceTierMap::default().tier_for_price("price_pro"), None);
    }
}
