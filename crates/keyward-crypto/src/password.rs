//! Salted, iterated password hashing with PBKDF2-HMAC-SHA512
//!
//! Encoded format:
//!
//! ```text
//! $pbkdf2$<iterations>$<base64(salt || hash)>
//!          2^rounds        16 B    64 B
//! ```
//!
//! The iteration count is stored in the string, so hashes created under an
//! older `rounds` policy keep verifying after the policy is raised. Use
//! [`needs_rehash`] to find them.

use base64::{Engine, engine::general_purpose::STANDARD};
use hmac::Hmac;
use sha2::Sha512;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::error::CryptoError;

/// Scheme tag in the encoded hash
pub const SCHEME: &str = "pbkdf2";

/// Salt length in bytes
pub const SALT_LEN: usize = 16;

/// Derived hash length in bytes
pub const HASH_LEN: usize = 64;

/// Default cost exponent (2^12 = 4096 iterations)
pub const DEFAULT_ROUNDS: u32 = 12;

/// Largest accepted cost exponent (2^24 iterations)
pub const MAX_ROUNDS: u32 = 24;

/// Largest iteration count accepted from an encoded hash
const MAX_ITERATIONS: u32 = 1 << MAX_ROUNDS;

/// Options for [`hash_password`].
#[derive(Clone, Copy)]
pub struct HashOptions<'a> {
    /// Cost exponent; the KDF runs `2^rounds` iterations
    pub rounds: u32,
    /// Secondary secret appended to the password before hashing
    pub pepper: &'a str,
}

impl Default for HashOptions<'_> {
    fn default() -> Self {
        Self { rounds: DEFAULT_ROUNDS, pepper: "" }
    }
}

impl std::fmt::Debug for HashOptions<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashOptions")
            .field("rounds", &self.rounds)
            .field("pepper", &"<redacted>")
            .finish()
    }
}

/// An encoded password hash: `$pbkdf2$<iterations>$<base64(salt || hash)>`.
///
/// Immutable once created. Compared against candidates with
/// [`verify_password`], never decoded back to a password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// The encoded string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the encoded string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PasswordHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<PasswordHash> for String {
    fn from(hash: PasswordHash) -> Self {
        hash.0
    }
}

/// Hash a password with a caller-provided salt.
///
/// The salt MUST come from a cryptographically secure source and MUST be
/// fresh for every call.
///
/// # Errors
///
/// - `Hashing`: `rounds` exceeds [`MAX_ROUNDS`] or the KDF rejected its input
pub fn hash_password(
    password: &str,
    options: &HashOptions<'_>,
    salt: &[u8; SALT_LEN],
) -> Result<PasswordHash, CryptoError> {
    if options.rounds > MAX_ROUNDS {
        return Err(CryptoError::Hashing {
            reason: format!("rounds {} exceeds maximum {MAX_ROUNDS}", options.rounds),
        });
    }
    let iterations = 1u32 << options.rounds;

    let hash = derive(password, options.pepper, salt, iterations)?;

    let mut blob = Zeroizing::new(Vec::with_capacity(SALT_LEN + HASH_LEN));
    blob.extend_from_slice(salt);
    blob.extend_from_slice(hash.as_slice());

    Ok(PasswordHash(format!("${SCHEME}${iterations}${}", STANDARD.encode(blob.as_slice()))))
}

/// Check a candidate password against an encoded hash.
///
/// Never fails: a malformed hash, unknown scheme, or KDF error all yield
/// `false`. The stored and recomputed hashes are compared in constant time.
pub fn verify_password(password: &str, encoded: &str, pepper: &str) -> bool {
    let parsed = match ParsedHash::parse(encoded) {
        Ok(parsed) => parsed,
        Err(reason) => {
            tracing::debug!(reason, "password hash rejected");
            return false;
        },
    };

    let Ok(candidate) = derive(password, pepper, &parsed.salt, parsed.iterations) else {
        tracing::debug!("password hash recomputation failed");
        return false;
    };

    candidate.as_slice().ct_eq(parsed.hash.as_slice()).into()
}

/// Whether an encoded hash was produced under a different cost than `rounds`.
///
/// Malformed hashes also report `true`; they can never verify and should be
/// replaced on the next successful login or reset.
pub fn needs_rehash(encoded: &str, rounds: u32) -> bool {
    match ParsedHash::parse(encoded) {
        Ok(parsed) => rounds > MAX_ROUNDS || parsed.iterations != 1u32 << rounds,
        Err(_) => true,
    }
}

/// Decoded components of an encoded hash.
struct ParsedHash {
    iterations: u32,
    salt: [u8; SALT_LEN],
    hash: Zeroizing<Vec<u8>>,
}

impl ParsedHash {
    fn parse(encoded: &str) -> Result<Self, &'static str> {
        let segments: Vec<&str> = encoded.split('$').collect();
        let [leading, scheme, iterations, blob] = segments.as_slice() else {
            return Err("wrong segment count");
        };
        if !leading.is_empty() {
            return Err("missing leading separator");
        }
        if *scheme != SCHEME {
            return Err("unknown scheme");
        }

        let iterations: u32 = iterations.parse().map_err(|_| "invalid iteration count")?;
        if iterations == 0 || iterations > MAX_ITERATIONS {
            return Err("iteration count out of range");
        }

        let blob = Zeroizing::new(STANDARD.decode(blob).map_err(|_| "invalid base64")?);
        if blob.len() != SALT_LEN + HASH_LEN {
            return Err("wrong blob length");
        }

        let mut salt = [0u8; SALT_LEN];
        salt.copy_from_slice(&blob[..SALT_LEN]);
        let hash = Zeroizing::new(blob[SALT_LEN..].to_vec());

        Ok(Self { iterations, salt, hash })
    }
}

/// Run PBKDF2-HMAC-SHA512 over `password || pepper`.
fn derive(
    password: &str,
    pepper: &str,
    salt: &[u8],
    iterations: u32,
) -> Result<Zeroizing<[u8; HASH_LEN]>, CryptoError> {
    let mut input = Zeroizing::new(String::with_capacity(password.len() + pepper.len()));
    input.push_str(password);
    input.push_str(pepper);

    let mut out = Zeroizing::new([0u8; HASH_LEN]);
    pbkdf2::pbkdf2::<Hmac<Sha512>>(input.as_bytes(), salt, iterations, out.as_mut_slice())
        .map_err(|e| CryptoError::Hashing { reason: e.to_string() })?;

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SALT: [u8; SALT_LEN] = [0x5A; SALT_LEN];

    fn fast() -> HashOptions<'static> {
        HashOptions { rounds: 4, pepper: "" }
    }

    #[test]
    fn hash_has_expected_shape() {
        let hash = hash_password("Sup3r$ecret", &fast(), &SALT).unwrap();
        let segments: Vec<&str> = hash.as_str().split('$').collect();

        assert_eq!(segments.len(), 4);
        assert_eq!(segments[0], "");
        assert_eq!(segments[1], "pbkdf2");
        assert_eq!(segments[2], "16");

        let blob = STANDARD.decode(segments[3]).unwrap();
        assert_eq!(blob.len(), SALT_LEN + HASH_LEN);
        assert_eq!(&blob[..SALT_LEN], &SALT);
    }

    #[test]
    fn default_rounds_encode_4096_iterations() {
        let options = HashOptions::default();
        assert_eq!(options.rounds, 12);

        let hash = hash_password("pw", &options, &SALT).unwrap();
        assert!(hash.as_str().starts_with("$pbkdf2$4096$"));
    }

    #[test]
    fn hash_is_deterministic_for_fixed_salt() {
        let hash1 = hash_password("password", &fast(), &SALT).unwrap();
        let hash2 = hash_password("password", &fast(), &SALT).unwrap();
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn different_salts_produce_different_hashes() {
        let hash1 = hash_password("password", &fast(), &[0x01; SALT_LEN]).unwrap();
        let hash2 = hash_password("password", &fast(), &[0x02; SALT_LEN]).unwrap();
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn verify_accepts_correct_password() {
        let hash = hash_password("Sup3r$ecret", &fast(), &SALT).unwrap();
        assert!(verify_password("Sup3r$ecret", hash.as_str(), ""));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let hash = hash_password("Sup3r$ecret", &fast(), &SALT).unwrap();
        assert!(!verify_password("wrong", hash.as_str(), ""));
    }

    #[test]
    fn pepper_must_match() {
        let options = HashOptions { rounds: 4, pepper: "pepper" };
        let hash = hash_password("password", &options, &SALT).unwrap();

        assert!(verify_password("password", hash.as_str(), "pepper"));
        assert!(!verify_password("password", hash.as_str(), ""));
        assert!(!verify_password("password", hash.as_str(), "other"));
    }

    #[test]
    fn rounds_above_maximum_are_rejected() {
        let options = HashOptions { rounds: MAX_ROUNDS + 1, pepper: "" };
        let result = hash_password("password", &options, &SALT);

        assert!(matches!(result, Err(CryptoError::Hashing { .. })));
    }

    #[test]
    fn zero_rounds_is_one_iteration() {
        let options = HashOptions { rounds: 0, pepper: "" };
        let hash = hash_password("password", &options, &SALT).unwrap();

        assert!(hash.as_str().starts_with("$pbkdf2$1$"));
        assert!(verify_password("password", hash.as_str(), ""));
    }

    #[test]
    fn malformed_hashes_verify_false() {
        let valid = hash_password("password", &fast(), &SALT).unwrap();
        let blob = valid.as_str().rsplit('$').next().unwrap();

        let malformed = [
            String::new(),
            "not a hash".to_string(),
            format!("$bcrypt$16${blob}"),
            format!("$pbkdf2$16${blob}$extra"),
            format!("pbkdf2$16${blob}$"),
            format!("x$pbkdf2$16${blob}"),
            format!("$pbkdf2$abc${blob}"),
            format!("$pbkdf2$0${blob}"),
            format!("$pbkdf2$-1${blob}"),
            format!("$pbkdf2$4294967295${blob}"),
            "$pbkdf2$16$!!!not-base64!!!".to_string(),
            format!("$pbkdf2$16${}", STANDARD.encode([0u8; SALT_LEN + HASH_LEN - 1])),
            format!("$pbkdf2$16${}", STANDARD.encode([0u8; SALT_LEN])),
        ];

        for encoded in &malformed {
            assert!(!verify_password("password", encoded, ""), "accepted {encoded:?}");
        }
    }

    #[test]
    fn tampered_hash_byte_fails() {
        let hash = hash_password("password", &fast(), &SALT).unwrap();
        let blob = hash.as_str().rsplit('$').next().unwrap();
        let mut bytes = STANDARD.decode(blob).unwrap();
        bytes[SALT_LEN + 3] ^= 0x01;
        let tampered = format!("$pbkdf2$16${}", STANDARD.encode(&bytes));

        assert!(!verify_password("password", &tampered, ""));
    }

    #[test]
    fn needs_rehash_tracks_rounds() {
        let hash = hash_password("password", &fast(), &SALT).unwrap();

        assert!(!needs_rehash(hash.as_str(), 4));
        assert!(needs_rehash(hash.as_str(), 5));
        assert!(needs_rehash(hash.as_str(), MAX_ROUNDS + 1));
        assert!(needs_rehash("garbage", 4));
    }

    #[test]
    fn debug_redacts_pepper() {
        let options = HashOptions { rounds: 4, pepper: "very-secret-pepper" };
        let debug = format!("{options:?}");
        assert!(!debug.contains("very-secret-pepper"));
    }
}
