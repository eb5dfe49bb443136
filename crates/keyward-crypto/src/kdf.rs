//! Symmetric key derivation from the process secret using HKDF

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroize;

/// Length of a derived symmetric key in bytes
pub const DERIVED_KEY_LEN: usize = 32;

/// Fixed HKDF salt for field-encryption keys
const FIELD_KEY_SALT: &[u8] = b"keyward:field-encryption:salt:v1";

/// HKDF info label for field-encryption keys
const FIELD_KEY_LABEL: &[u8] = b"keyward:field-encryption:v1";

/// A 32-byte symmetric key derived from the process secret.
///
/// Derived on demand for a single encryption or decryption call and zeroized
/// when dropped.
pub struct DerivedKey {
    key: [u8; DERIVED_KEY_LEN],
}

impl DerivedKey {
    /// Wrap raw key bytes.
    pub fn from_bytes(key: [u8; DERIVED_KEY_LEN]) -> Self {
        Self { key }
    }

    /// Raw key bytes for the AEAD.
    pub fn as_bytes(&self) -> &[u8; DERIVED_KEY_LEN] {
        &self.key
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DerivedKey(..)")
    }
}

impl Drop for DerivedKey {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

/// Derive the field-encryption key from the process secret.
///
/// # Security
///
/// - Deterministic: the same secret always yields the same key
/// - Domain-separated: the fixed salt and label keep this key distinct from
///   any other use of the secret (token signing, HMAC)
pub fn derive_key(secret: &[u8]) -> DerivedKey {
    let hkdf = Hkdf::<Sha256>::new(Some(FIELD_KEY_SALT), secret);

    let mut key = [0u8; DERIVED_KEY_LEN];
    let Ok(()) = hkdf.expand(FIELD_KEY_LABEL, &mut key) else {
        unreachable!("32 bytes is a valid HKDF-SHA256 output length");
    };

    DerivedKey { key }
}
