//! Field encryption using AES-256-GCM with a 16-byte nonce
//!
//! All functions are pure - the nonce must be provided by the caller. This
//! enables deterministic testing; production callers draw it from
//! [`crate::Environment::random_array`] on every call.

use aes_gcm::{
    AesGcm, Tag,
    aead::{AeadInPlace, KeyInit, consts::U16, generic_array::GenericArray},
    aes::Aes256,
};
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use crate::{error::CryptoError, kdf::DerivedKey};

/// Nonce size in bytes
pub const NONCE_LEN: usize = 16;

/// GCM authentication tag size in bytes
pub const TAG_LEN: usize = 16;

/// AES-256-GCM instantiated with a 128-bit nonce
type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// Output of a single encryption call, every field lower-case hex.
///
/// Consumed whole by [`open`]; changing any field independently makes
/// decryption fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedEnvelope {
    /// Ciphertext (same length as the plaintext)
    pub ciphertext: String,
    /// The 16-byte nonce
    pub nonce: String,
    /// The 16-byte GCM authentication tag
    pub tag: String,
}

impl EncryptedEnvelope {
    /// Pack the envelope into one opaque string: standard base64 of its JSON
    /// form.
    pub fn to_opaque(&self) -> Result<String, CryptoError> {
        let json = serde_json::to_vec(self)
            .map_err(|e| CryptoError::Serialization { reason: e.to_string() })?;
        Ok(STANDARD.encode(json))
    }

    /// Unpack an envelope produced by [`EncryptedEnvelope::to_opaque`].
    ///
    /// # Errors
    ///
    /// - `Decryption`: not base64, or not an envelope
    pub fn from_opaque(opaque: &str) -> Result<Self, CryptoError> {
        let json = STANDARD
            .decode(opaque.trim())
            .map_err(|_| CryptoError::decryption("opaque envelope is not base64"))?;
        serde_json::from_slice(&json)
            .map_err(|_| CryptoError::decryption("opaque envelope is not a valid envelope"))
    }
}

/// Encrypt `plaintext` under `key` with the given nonce.
///
/// # Security
///
/// - The nonce MUST be unique per call under a given key; callers must draw
///   it from a secure random source every time
/// - Authenticated encryption: any change to ciphertext, nonce, or tag is
///   detected by [`open`]
///
/// # Errors
///
/// - `Encryption`: plaintext exceeds the GCM length limit
pub fn seal(
    plaintext: &[u8],
    key: &DerivedKey,
    nonce: &[u8; NONCE_LEN],
) -> Result<EncryptedEnvelope, CryptoError> {
    let cipher = Aes256Gcm16::new(GenericArray::from_slice(key.as_bytes()));

    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(GenericArray::from_slice(nonce), b"", &mut buffer)
        .map_err(|_| CryptoError::Encryption { reason: "AES-GCM refused plaintext".to_string() })?;

    Ok(EncryptedEnvelope {
        ciphertext: hex::encode(&buffer),
        nonce: hex::encode(nonce),
        tag: hex::encode(tag),
    })
}

/// Decrypt an envelope under `key`.
///
/// Returns the plaintext only if the tag authenticates; no partial output is
/// ever returned.
///
/// # Errors
///
/// - `Decryption`: malformed hex, wrong nonce/tag length, wrong key, or
///   tampered data
pub fn open(envelope: &EncryptedEnvelope, key: &DerivedKey) -> Result<Vec<u8>, CryptoError> {
    let nonce = decode_fixed::<NONCE_LEN>(&envelope.nonce, "nonce")?;
    let tag_bytes = decode_fixed::<TAG_LEN>(&envelope.tag, "tag")?;
    let mut buffer = hex::decode(&envelope.ciphertext)
        .map_err(|_| CryptoError::decryption("ciphertext is not hex"))?;

    let cipher = Aes256Gcm16::new(GenericArray::from_slice(key.as_bytes()));
    let tag = Tag::<U16>::clone_from_slice(&tag_bytes);

    cipher
        .decrypt_in_place_detached(GenericArray::from_slice(&nonce), b"", &mut buffer, &tag)
        .map_err(|_| CryptoError::decryption("authentication failed"))?;

    Ok(buffer)
}

/// Decode a hex field that must be exactly `N` bytes.
fn decode_fixed<const N: usize>(field: &str, name: &str) -> Result<[u8; N], CryptoError> {
    let mut out = [0u8; N];
    hex::decode_to_slice(field, &mut out)
        .map_err(|_| CryptoError::decryption(format!("{name} must be {N} hex-encoded bytes")))?;
    Ok(out)
}
