//! Keyward Cryptographic Primitives
//!
//! Leaf building blocks for keyward's authentication layer. Every primitive is
//! a pure function of its inputs: salts and nonces are supplied by the
//! caller, and the only ambient resources (wall clock, secure RNG) are
//! reached through [`Environment`].
//!
//! # Key Lifecycle
//!
//! ```text
//! Process Secret
//!        │
//!        ├──▶ HKDF-SHA256 (fixed salt + label) → DerivedKey (per call)
//!        │           │
//!        │           ▼
//!        │    AES-256-GCM (fresh 16-byte nonce) → EncryptedEnvelope
//!        │
//!        └──▶ HMAC-SHA256 → token signatures, generic MACs
//!
//! Password (+ pepper)
//!        │
//!        ▼
//! PBKDF2-HMAC-SHA512 (fresh 16-byte salt, 2^rounds iterations)
//!        │
//!        ▼
//! $pbkdf2$<iterations>$<base64(salt || hash)>
//! ```
//!
//! Derived keys are recomputed for every encryption call and zeroized on
//! drop; nothing is cached between calls.
//!
//! # Security
//!
//! Confidentiality and integrity:
//! - AES-256-GCM authenticates ciphertext, nonce and tag together
//! - Failed authentication tag -> `Decryption` error, never partial plaintext
//!
//! Comparison:
//! - Password hashes, MACs and checksums are compared in constant time
//!
//! Fail closed:
//! - Verification functions return `bool` and never panic on malformed input
//! - Construction functions return `Result`; an error there means the
//!   environment is broken (see [`CryptoError::is_fatal`])

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod checksum;
pub mod encryption;
pub mod env;
pub mod error;
pub mod kdf;
pub mod mac;
pub mod password;
pub mod random;

pub use checksum::{checksum, checksum_bytes, verify_checksum};
pub use encryption::{EncryptedEnvelope, NONCE_LEN, TAG_LEN, open, seal};
#[cfg(any(test, feature = "test-utils"))]
pub use env::SimEnv;
pub use env::{Environment, SystemEnv};
pub use error::CryptoError;
pub use kdf::{DERIVED_KEY_LEN, DerivedKey, derive_key};
pub use mac::{compute_mac, verify_mac};
pub use password::{
    DEFAULT_ROUNDS, HashOptions, MAX_ROUNDS, PasswordHash, SALT_LEN, hash_password, needs_rehash,
    verify_password,
};
pub use random::{numeric_code, random_bytes_hex, secure_id, temporary_password};
