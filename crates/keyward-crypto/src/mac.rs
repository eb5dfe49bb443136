//! Generic message authentication with HMAC-SHA256

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 output length in bytes
pub const MAC_LEN: usize = 32;

/// Raw HMAC-SHA256 of `data` under `key`.
pub fn sign(data: &[u8], key: &[u8]) -> [u8; MAC_LEN] {
    let Ok(mut mac) = HmacSha256::new_from_slice(key) else {
        unreachable!("HMAC-SHA256 accepts any key size");
    };
    mac.update(data);
    let result = mac.finalize().into_bytes();

    let mut out = [0u8; MAC_LEN];
    out.copy_from_slice(&result);
    out
}

/// Hex-encoded HMAC-SHA256 of `data` under `key`.
pub fn compute_mac(data: &[u8], key: &[u8]) -> String {
    hex::encode(sign(data, key))
}

/// Check a hex-encoded HMAC-SHA256 signature.
///
/// The comparison is constant-time. A signature that is not hex, or not
/// [`MAC_LEN`] bytes long, is rejected immediately; its length is not secret.
pub fn verify_mac(data: &[u8], signature: &str, key: &[u8]) -> bool {
    let Ok(signature) = hex::decode(signature) else {
        return false;
    };
    if signature.len() != MAC_LEN {
        return false;
    }

    let Ok(mut mac) = HmacSha256::new_from_slice(key) else {
        unreachable!("HMAC-SHA256 accepts any key size");
    };
    mac.update(data);
    mac.verify_slice(&signature).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc4231_case_2() {
        // RFC 4231 test case 2: key = "Jefe"
        let mac = compute_mac(b"what do ya want for nothing?", b"Jefe");
        assert_eq!(mac, "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843");
    }

    #[test]
    fn compute_is_deterministic() {
        assert_eq!(compute_mac(b"data", b"key"), compute_mac(b"data", b"key"));
    }

    #[test]
    fn verify_accepts_own_signature() {
        let signature = compute_mac(b"payload", b"key");
        assert!(verify_mac(b"payload", &signature, b"key"));
    }

    #[test]
    fn verify_accepts_upper_case_hex() {
        let signature = compute_mac(b"payload", b"key").to_uppercase();
        assert!(verify_mac(b"payload", &signature, b"key"));
    }

    #[test]
    fn verify_rejects_wrong_key_or_data() {
        let signature = compute_mac(b"payload", b"key");

        assert!(!verify_mac(b"payload", &signature, b"other key"));
        assert!(!verify_mac(b"payload!", &signature, b"key"));
    }

    #[test]
    fn verify_rejects_malformed_signatures() {
        let signature = compute_mac(b"payload", b"key");

        assert!(!verify_mac(b"payload", "", b"key"));
        assert!(!verify_mac(b"payload", "not hex", b"key"));
        assert!(!verify_mac(b"payload", &signature[..62], b"key"));
        assert!(!verify_mac(b"payload", &format!("{signature}00"), b"key"));
    }

    #[test]
    fn empty_key_and_data_are_allowed() {
        let signature = compute_mac(b"", b"");
        assert_eq!(signature.len(), MAC_LEN * 2);
        assert!(verify_mac(b"", &signature, b""));
    }
}
