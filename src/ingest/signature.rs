//! Webhook Signature Verification
//!
//! Platforms sign the raw request body with HMAC-SHA256 and send the hex
//! digest in a per-platform header. Verification runs over the exact bytes
//! received, before any JSON parsing.

use ring::hmac;

/// Constant-time check of a hex HMAC-SHA256 signature against the raw body.
pub fn verify(secret: &str, raw_body: &[u8], signature_hex: &str) -> bool {
    let Ok(signature) = hex::decode(signature_hex.trim()) else {
        return false;
    };
    let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
    hmac::verify(&key, raw_body, &signature).is_ok()
}

/// Hex HMAC-SHA256 of a body, used by tests and by outbound callbacks.
pub fn sign(secret: &str, raw_body: &[u8]) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
    hex::encode(hmac::sign(&key, raw_body).as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let sig = sign("topsecret", b"{\"order_id\":\"X\"}");
        assert!(verify("topsecret", b"{\"order_id\":\"X\"}", &sig));
    }

    #[test]
    fn test_wrong_secret_fails() {
        let sig = sign("topsecret", b"body");
        assert!(!verify("othersecret", b"body", &sig));
    }

    #[test]
    fn test_tampered_body_fails() {
        let sig = sign("topsecret", b"body");
        assert!(!verify("topsecret", b"tampered", &sig));
    }

    #[test]
    fn test_garbage_signature_fails() {
        assert!(!verify("topsecret", b"body", "not-hex"));
        assert!(!verify("topsecret", b"body", ""));
    }

    #[test]
    fn test_whitespace_tolerated() {
        let sig = sign("topsecret", b"body");
        assert!(verify("topsecret", b"body", &format!(" {sig}\n")));
    }
}
