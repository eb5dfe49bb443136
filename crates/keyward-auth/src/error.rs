//! Error types for keyward services.
//!
//! Construction paths (hashing, encryption, issuing tokens and sessions)
//! return [`AuthError`]. Verification paths never surface an error to the
//! caller: [`TokenError`] and [`SessionError`] record *why* an input was
//! rejected for logging, and the public verify functions collapse them to
//! `None`.

use keyward_crypto::CryptoError;
use thiserror::Error;

/// Errors from operations that create credentials, tokens or ciphertexts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Underlying primitive failed (RNG, KDF, cipher)
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Claims or session payload could not be serialized
    #[error("serialization failed: {reason}")]
    Serialization {
        /// Reason reported by the serializer
        reason: String,
    },

    /// Configuration is unusable (empty secret, out-of-range cost)
    #[error("configuration error: {reason}")]
    Config {
        /// What is wrong with the configuration
        reason: String,
    },
}

impl AuthError {
    /// Returns true if this error indicates a broken environment or
    /// configuration rather than bad input.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Crypto(err) => err.is_fatal(),
            Self::Config { .. } => true,
            Self::Serialization { .. } => false,
        }
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization { reason: err.to_string() }
    }
}

/// Reasons a compact token is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Wrong segment count, bad base64url, or payload is not a JSON object
    #[error("malformed token: {reason}")]
    Malformed {
        /// What could not be parsed
        reason: String,
    },

    /// Header names an algorithm other than HS256
    #[error("unsupported algorithm: {alg}")]
    UnsupportedAlgorithm {
        /// Algorithm named in the header
        alg: String,
    },

    /// Recomputed signature does not match the signature segment
    #[error("signature mismatch")]
    BadSignature,

    /// `exp` is at or before the current time
    #[error("token expired at {exp}, now {now}")]
    Expired {
        /// Expiry from the payload (Unix seconds)
        exp: u64,
        /// Time of the check (Unix seconds)
        now: u64,
    },
}

impl TokenError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed { reason: reason.into() }
    }

    /// Returns true if the token was authentic but has expired.
    pub fn is_expired(&self) -> bool {
        matches!(self, Self::Expired { .. })
    }
}

/// Reasons a session token is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Token is not an encoded envelope
    #[error("session token is not a valid envelope")]
    Encoding,

    /// Envelope did not authenticate under the process secret
    #[error("session token could not be decrypted")]
    Decryption,

    /// Decrypted payload is not a session object
    #[error("malformed session payload: {reason}")]
    Malformed {
        /// What could not be parsed
        reason: String,
    },

    /// Session is older than the allowed maximum age
    #[error("session stale: age {age_ms}ms exceeds {max_age_ms}ms")]
    Stale {
        /// Age of the session at the time of the check
        age_ms: u64,
        /// Maximum allowed age
        max_age_ms: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crypto_fatality_is_preserved() {
        let entropy = AuthError::from(CryptoError::Entropy { reason: "x".to_string() });
        let decrypt = AuthError::from(CryptoError::Decryption { reason: "x".to_string() });

        assert!(entropy.is_fatal());
        assert!(!decrypt.is_fatal());
    }

    #[test]
    fn config_errors_are_fatal() {
        assert!(AuthError::Config { reason: "empty secret".to_string() }.is_fatal());
    }

    #[test]
    fn only_expired_reports_expired() {
        assert!(TokenError::Expired { exp: 10, now: 11 }.is_expired());
        assert!(!TokenError::BadSignature.is_expired());
        assert!(!TokenError::malformed("x").is_expired());
    }

    #[test]
    fn error_display() {
        let err = SessionError::Stale { age_ms: 1001, max_age_ms: 1000 };
        assert_eq!(err.to_string(), "session stale: age 1001ms exceeds 1000ms");

        let err = TokenError::Expired { exp: 100, now: 101 };
        assert_eq!(err.to_string(), "token expired at 100, now 101");
    }
}
