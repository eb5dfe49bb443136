//! The `Keyward` service facade.
//!
//! Owns the configuration and the environment, and exposes every operation
//! as a method. Construction paths return `Result`; verification paths return
//! `bool` or `Option` and log the rejection reason at `debug`.

use std::time::Duration;

use keyward_crypto::{
    CryptoError, EncryptedEnvelope, Environment, HashOptions, NONCE_LEN, PasswordHash, SALT_LEN,
    SystemEnv, derive_key, open, password, random, seal,
};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{
    config::AuthConfig,
    error::{AuthError, TokenError},
    session::{self, SessionData},
    token::{self, Claims, TokenOptions},
};

/// Per-call password hashing options.
#[derive(Clone, Copy, Default)]
pub struct PasswordOptions<'a> {
    /// Cost exponent; `None` uses the configured rounds
    pub rounds: Option<u32>,
    /// Application-wide pepper appended to the password before hashing
    pub pepper: &'a str,
}

impl std::fmt::Debug for PasswordOptions<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordOptions")
            .field("rounds", &self.rounds)
            .field("pepper", &"<redacted>")
            .finish()
    }
}

/// Authentication service bound to one process secret.
pub struct Keyward<E: Environment = SystemEnv> {
    /// Secret and policies
    config: AuthConfig,

    /// Wall clock and secure randomness
    env: E,
}

impl Keyward<SystemEnv> {
    /// Service using the OS clock and CSPRNG.
    ///
    /// # Errors
    ///
    /// - `Config`: the configuration is invalid
    pub fn new(config: AuthConfig) -> Result<Self, AuthError> {
        Self::with_env(config, SystemEnv::new())
    }
}

impl<E: Environment> Keyward<E> {
    /// Service using the given environment.
    ///
    /// # Errors
    ///
    /// - `Config`: the configuration is invalid
    pub fn with_env(config: AuthConfig, env: E) -> Result<Self, AuthError> {
        config.validate()?;
        Ok(Self { config, env })
    }

    /// Active configuration.
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Environment used for time and randomness.
    pub fn env(&self) -> &E {
        &self.env
    }

    fn secret(&self) -> &[u8] {
        self.config.secret.as_bytes()
    }

    // Passwords

    /// Hash a password with a fresh salt.
    ///
    /// # Errors
    ///
    /// - `Crypto(Hashing)`: the random source failed, or `rounds` is out of
    ///   range
    pub fn hash_password(
        &self,
        password: &str,
        options: &PasswordOptions<'_>,
    ) -> Result<PasswordHash, AuthError> {
        let salt: [u8; SALT_LEN] = self.env.random_array().map_err(|e| CryptoError::Hashing {
            reason: format!("salt generation failed: {e}"),
        })?;
        let options = HashOptions {
            rounds: options.rounds.unwrap_or(self.config.password.rounds),
            pepper: options.pepper,
        };
        Ok(password::hash_password(password, &options, &salt)?)
    }

    /// Check a password against a stored hash. Malformed hashes verify false.
    pub fn verify_password(&self, password: &str, encoded: &str, pepper: &str) -> bool {
        password::verify_password(password, encoded, pepper)
    }

    /// Whether a stored hash should be recomputed under the current policy.
    pub fn needs_rehash(&self, encoded: &str) -> bool {
        password::needs_rehash(encoded, self.config.password.rounds)
    }

    // Tokens

    /// Issue a signed token carrying `claims`.
    ///
    /// # Errors
    ///
    /// - `Serialization`: the claims could not be encoded
    pub fn generate_token(
        &self,
        claims: Claims,
        options: &TokenOptions,
    ) -> Result<String, AuthError> {
        token::issue(claims, options, &self.config.token, self.secret(), self.env.wall_clock_secs())
    }

    /// Verify a token. Any failure, including expiry, yields `None`.
    pub fn verify_token(&self, token: &str) -> Option<Claims> {
        match self.validate_token(token) {
            Ok(claims) => Some(claims),
            Err(err) => {
                tracing::debug!(%err, "token rejected");
                None
            },
        }
    }

    /// Verify a token, keeping the rejection reason.
    pub fn validate_token(&self, token: &str) -> Result<Claims, TokenError> {
        token::decode(token, self.secret(), self.env.wall_clock_secs())
    }

    /// Read a token's claims without verifying it.
    ///
    /// The result is attacker-controlled; never use it for authorization.
    pub fn decode_token_unsafe(&self, token: &str) -> Option<Claims> {
        token::decode_unverified(token)
    }

    // Field encryption

    /// Encrypt a string under a key derived from the process secret.
    ///
    /// # Errors
    ///
    /// - `Entropy`: nonce generation failed
    /// - `Encryption`: the cipher refused the plaintext
    pub fn encrypt(&self, plaintext: &str) -> Result<EncryptedEnvelope, CryptoError> {
        let nonce: [u8; NONCE_LEN] = self.env.random_array()?;
        seal(plaintext.as_bytes(), &derive_key(self.secret()), &nonce)
    }

    /// Decrypt an envelope produced by [`Keyward::encrypt`].
    ///
    /// # Errors
    ///
    /// - `Decryption`: tampered, wrong key, malformed, or not UTF-8
    pub fn decrypt(&self, envelope: &EncryptedEnvelope) -> Result<String, CryptoError> {
        let plaintext = open(envelope, &derive_key(self.secret()))?;
        String::from_utf8(plaintext)
            .map_err(|_| CryptoError::Decryption { reason: "plaintext is not UTF-8".to_string() })
    }

    /// Encrypt into a single opaque string.
    ///
    /// # Errors
    ///
    /// See [`Keyward::encrypt`].
    pub fn encrypt_opaque(&self, plaintext: &str) -> Result<String, CryptoError> {
        self.encrypt(plaintext)?.to_opaque()
    }

    /// Decrypt a string produced by [`Keyward::encrypt_opaque`].
    ///
    /// # Errors
    ///
    /// See [`Keyward::decrypt`].
    pub fn decrypt_opaque(&self, opaque: &str) -> Result<String, CryptoError> {
        self.decrypt(&EncryptedEnvelope::from_opaque(opaque)?)
    }

    // Sessions

    /// Create an encrypted session token for `user_id`.
    ///
    /// # Errors
    ///
    /// - `Crypto`: randomness or encryption failed
    /// - `Serialization`: `extra` could not be encoded
    pub fn create_session_token(
        &self,
        user_id: u64,
        extra: Map<String, Value>,
    ) -> Result<String, AuthError> {
        session::create_session(self.secret(), user_id, extra, &self.env)
    }

    /// Open a session token. `None` if it does not decrypt or is older than
    /// `max_age` (default from config).
    pub fn validate_session_token(
        &self,
        token: &str,
        max_age: Option<Duration>,
    ) -> Option<SessionData> {
        let max_age = max_age.unwrap_or(self.config.session.max_age);
        match session::open_session(self.secret(), token, max_age, self.env.wall_clock_millis()) {
            Ok(data) => Some(data),
            Err(err) => {
                tracing::debug!(%err, "session rejected");
                None
            },
        }
    }

    /// Replace a valid session with a new one for the same user and metadata.
    ///
    /// Returns `Ok(None)` if the session is not valid.
    ///
    /// # Errors
    ///
    /// See [`Keyward::create_session_token`].
    pub fn refresh_session_token(
        &self,
        token: &str,
        max_age: Option<Duration>,
    ) -> Result<Option<String>, AuthError> {
        match self.validate_session_token(token, max_age) {
            Some(data) => self.create_session_token(data.user_id, data.extra).map(Some),
            None => Ok(None),
        }
    }

    // Message authentication

    /// Hex HMAC-SHA256 of `data`, keyed with `key` or the process secret.
    pub fn hmac(&self, data: &[u8], key: Option<&[u8]>) -> String {
        keyward_crypto::compute_mac(data, key.unwrap_or(self.secret()))
    }

    /// Check a hex HMAC-SHA256 signature in constant time.
    pub fn verify_hmac(&self, data: &[u8], signature: &str, key: Option<&[u8]>) -> bool {
        keyward_crypto::verify_mac(data, signature, key.unwrap_or(self.secret()))
    }

    // Integrity

    /// SHA-256 checksum of a string or canonical JSON value.
    ///
    /// # Errors
    ///
    /// - `Serialization`: `data` could not be serialized
    pub fn checksum<T: Serialize + ?Sized>(&self, data: &T) -> Result<String, CryptoError> {
        keyward_crypto::checksum(data)
    }

    /// Compare against an expected checksum in constant time.
    pub fn verify_checksum<T: Serialize + ?Sized>(&self, data: &T, expected: &str) -> bool {
        keyward_crypto::verify_checksum(data, expected)
    }

    // Random identifiers

    /// Hex id from `bytes` random bytes (default 16).
    ///
    /// # Errors
    ///
    /// - `Entropy`: the random source failed
    pub fn random_id(&self, bytes: Option<usize>) -> Result<String, CryptoError> {
        random::secure_id(&self.env, bytes.unwrap_or(random::DEFAULT_ID_BYTES))
    }

    /// Numeric verification code (default 6 digits).
    ///
    /// # Errors
    ///
    /// - `Entropy`: the random source failed
    pub fn verification_code(&self, length: Option<usize>) -> Result<String, CryptoError> {
        random::numeric_code(&self.env, length.unwrap_or(random::DEFAULT_CODE_LEN))
    }

    /// Temporary password (default 12 characters).
    ///
    /// # Errors
    ///
    /// - `Entropy`: the random source failed
    pub fn temporary_password(&self, length: Option<usize>) -> Result<String, CryptoError> {
        random::temporary_password(&self.env, length.unwrap_or(random::DEFAULT_TEMP_PASSWORD_LEN))
    }
}

#[cfg(test)]
mod tests {
    use keyward_crypto::SimEnv;
    use serde_json::json;

    use super::*;
    use crate::config::Secret;

    fn service(seed: u64) -> Keyward<SimEnv> {
        let mut config = AuthConfig::new(Secret::new("unit-test-secret").unwrap());
        config.password.rounds = 4;
        Keyward::with_env(config, SimEnv::seeded(seed)).unwrap()
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = AuthConfig::new(Secret::new("s").unwrap());
        config.password.rounds = 99;

        assert!(matches!(
            Keyward::with_env(config, SimEnv::seeded(0)),
            Err(AuthError::Config { .. })
        ));
    }

    #[test]
    fn password_uses_configured_rounds() {
        let kw = service(1);
        let hash = kw.hash_password("pw", &PasswordOptions::default()).unwrap();

        assert!(hash.as_str().starts_with("$pbkdf2$16$"));
        assert!(kw.verify_password("pw", hash.as_str(), ""));
        assert!(!kw.needs_rehash(hash.as_str()));
    }

    #[test]
    fn password_rounds_override() {
        let kw = service(2);
        let options = PasswordOptions { rounds: Some(3), pepper: "pep" };
        let hash = kw.hash_password("pw", &options).unwrap();

        assert!(hash.as_str().starts_with("$pbkdf2$8$"));
        assert!(kw.verify_password("pw", hash.as_str(), "pep"));
        assert!(!kw.verify_password("pw", hash.as_str(), ""));
        assert!(kw.needs_rehash(hash.as_str()));
    }

    #[test]
    fn out_of_range_rounds_is_hashing_error() {
        let kw = service(3);
        let options = PasswordOptions { rounds: Some(25), pepper: "" };

        assert!(matches!(
            kw.hash_password("pw", &options),
            Err(AuthError::Crypto(CryptoError::Hashing { .. }))
        ));
    }

    #[test]
    fn token_expires_with_clock() {
        let kw = service(4);
        let options = TokenOptions::default().expires_in("1s");
        let token = kw.generate_token(Claims::new().with("sub", 1), &options).unwrap();

        assert!(kw.verify_token(&token).is_some());
        kw.env().advance(Duration::from_secs(1));
        assert!(kw.verify_token(&token).is_none());
        assert!(kw.validate_token(&token).unwrap_err().is_expired());
    }

    #[test]
    fn decode_unsafe_reads_expired_tokens() {
        let kw = service(5);
        let options = TokenOptions::default().expires_in("1s");
        let token = kw.generate_token(Claims::new().with("sub", 9), &options).unwrap();
        kw.env().advance(Duration::from_secs(10));

        assert_eq!(kw.decode_token_unsafe(&token).unwrap().get("sub"), Some(&json!(9)));
    }

    #[test]
    fn encrypt_round_trip_and_fresh_nonces() {
        let kw = service(6);
        let a = kw.encrypt("4111 1111 1111 1111").unwrap();
        let b = kw.encrypt("4111 1111 1111 1111").unwrap();

        assert_ne!(a.nonce, b.nonce);
        assert_eq!(kw.decrypt(&a).unwrap(), "4111 1111 1111 1111");

        let opaque = kw.encrypt_opaque("pii").unwrap();
        assert_eq!(kw.decrypt_opaque(&opaque).unwrap(), "pii");
        assert!(kw.decrypt_opaque("garbage").is_err());
    }

    #[test]
    fn session_default_max_age_from_config() {
        let kw = service(7);
        let token = kw.create_session_token(3, Map::new()).unwrap();

        kw.env().advance(Duration::from_secs(24 * 60 * 60));
        assert!(kw.validate_session_token(&token, None).is_some());
        kw.env().advance(Duration::from_millis(1));
        assert!(kw.validate_session_token(&token, None).is_none());
    }

    #[test]
    fn refresh_issues_new_envelope() {
        let kw = service(8);
        let mut extra = Map::new();
        extra.insert("device".to_string(), json!("laptop"));
        let token = kw.create_session_token(5, extra).unwrap();

        kw.env().advance(Duration::from_secs(30));
        let refreshed = kw.refresh_session_token(&token, None).unwrap().unwrap();
        assert_ne!(refreshed, token);

        let data = kw.validate_session_token(&refreshed, Some(Duration::ZERO)).unwrap();
        assert_eq!(data.user_id, 5);
        assert_eq!(data.timestamp, kw.env().wall_clock_millis());
        assert_eq!(data.extra.get("device"), Some(&json!("laptop")));

        assert_eq!(kw.refresh_session_token("junk", None).unwrap(), None);
    }

    #[test]
    fn hmac_defaults_to_secret() {
        let kw = service(9);
        let default_sig = kw.hmac(b"payload", None);

        assert_eq!(default_sig, keyward_crypto::compute_mac(b"payload", b"unit-test-secret"));
        assert!(kw.verify_hmac(b"payload", &default_sig, None));
        assert!(!kw.verify_hmac(b"payload", &default_sig, Some(b"other".as_slice())));
        assert_ne!(kw.hmac(b"payload", Some(b"other".as_slice())), default_sig);
    }

    #[test]
    fn random_helpers_use_defaults() {
        let kw = service(10);

        assert_eq!(kw.random_id(None).unwrap().len(), 32);
        assert_eq!(kw.random_id(Some(4)).unwrap().len(), 8);
        assert_eq!(kw.verification_code(None).unwrap().len(), 6);
        assert_eq!(kw.temporary_password(None).unwrap().len(), 12);
    }

    #[test]
    fn checksum_delegates() {
        let kw = service(11);
        let sum = kw.checksum(&json!({"b": 1, "a": 2})).unwrap();

        assert!(kw.verify_checksum(&json!({"a": 2, "b": 1}), &sum));
        assert!(!kw.verify_checksum(&json!({"a": 3, "b": 1}), &sum));
    }
}
