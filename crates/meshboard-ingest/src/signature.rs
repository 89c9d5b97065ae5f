//! HMAC-SHA256 payload signatures, hex-encoded.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Computes the hex HMAC-SHA256 signature of `body` under `secret`.
pub fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Verifies a supplied hex signature against `body` in constant time.
///
/// An optional `sha256=` prefix is tolerated. Malformed hex, truncated
/// signatures, and length mismatches are all plain rejections rather
/// than errors.
pub fn verify(secret: &str, body: &[u8], supplied: &str) -> bool {
    let supplied = supplied.strip_prefix("sha256=").unwrap_or(supplied);
    let Ok(signature) = hex::decode(supplied) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&signature).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_then_verify_round_trips() {
        let body = br#"{"action":"serverConnect","nodename":"PC-1"}"#;
        let sig = sign("topsecret", body);
        assert_eq!(sig.len(), 64);
        assert!(verify("topsecret", body, &sig));
        assert!(verify("topsecret", body, &format!("sha256={sig}")));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let body = b"payload";
        let sig = sign("secret-a", body);
        assert!(!verify("secret-b", body, &sig));
    }

    #[test]
    fn truncated_or_corrupted_signature_is_rejected() {
        let body = b"payload";
        let sig = sign("secret", body);
        assert!(!verify("secret", body, &sig[..32]));
        assert!(!verify("secret", body, "zz-not-hex"));
        assert!(!verify("secret", body, ""));
        let mut corrupted = sig.into_bytes();
        corrupted[0] = if corrupted[0] == b'0' { b'1' } else { b'0' };
        assert!(!verify("secret", body, std::str::from_utf8(&corrupted).unwrap()));
    }

    #[test]
    fn different_body_is_rejected() {
        let sig = sign("secret", b"payload-one");
        assert!(!verify("secret", b"payload-two", &sig));
    }
}
