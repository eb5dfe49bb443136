//! Error types for keyward cryptographic operations

use thiserror::Error;

/// Errors from keyward cryptographic operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// The secure random source could not produce bytes
    #[error("entropy source failed: {reason}")]
    Entropy {
        /// Reason reported by the random source
        reason: String,
    },

    /// Password hash derivation failed or was given unusable parameters
    #[error("password hashing failed: {reason}")]
    Hashing {
        /// Reason for the hashing failure
        reason: String,
    },

    /// The cipher refused to seal the plaintext
    #[error("encryption failed: {reason}")]
    Encryption {
        /// Reason for the encryption failure
        reason: String,
    },

    /// Envelope could not be opened (authentication tag mismatch, wrong key,
    /// malformed fields)
    #[error("decryption failed: {reason}")]
    Decryption {
        /// Reason for decryption failure
        reason: String,
    },

    /// Input could not be serialized into its canonical form
    #[error("serialization failed: {reason}")]
    Serialization {
        /// Reason for the serialization failure
        reason: String,
    },
}

impl CryptoError {
    /// Returns true if this error is fatal (unrecoverable)
    ///
    /// Fatal errors indicate a broken environment (RNG, KDF, cipher) and must
    /// abort the calling operation. Decryption and serialization failures are
    /// caused by the input and the caller may treat them as "not usable".
    pub fn is_fatal(&self) -> bool {
        match self {
            // Environment problems - fatal
            Self::Entropy { .. } => true,
            Self::Hashing { .. } => true,
            Self::Encryption { .. } => true,

            // Bad or tampered input - recoverable
            Self::Decryption { .. } => false,
            Self::Serialization { .. } => false,
        }
    }

    pub(crate) fn decryption(reason: impl Into<String>) -> Self {
        Self::Decryption { reason: reason.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entropy_failure_is_fatal() {
        let err = CryptoError::Entropy { reason: "device unavailable".to_string() };
        assert!(err.is_fatal());
    }

    #[test]
    fn hashing_failure_is_fatal() {
        let err = CryptoError::Hashing { reason: "rounds out of range".to_string() };
        assert!(err.is_fatal());
    }

    #[test]
    fn decryption_failure_is_not_fatal() {
        let err = CryptoError::decryption("authentication failed");
        assert!(!err.is_fatal());
    }

    #[test]
    fn error_display() {
        let err = CryptoError::decryption("authentication failed");
        assert_eq!(err.to_string(), "decryption failed: authentication failed");
    }
}
