//! Service configuration.
//!
//! The process secret and the cost/expiry policies are fixed at construction
//! and injected into [`crate::Keyward`]; nothing is read from ambient global
//! state.

use std::time::Duration;

use keyward_crypto::{DEFAULT_ROUNDS, MAX_ROUNDS};
use zeroize::Zeroizing;

use crate::{duration::DEFAULT_EXPIRY, error::AuthError};

/// Default issuer written into tokens
pub const DEFAULT_ISSUER: &str = "keyward";

/// Default audience written into tokens
pub const DEFAULT_AUDIENCE: &str = "keyward-clients";

/// Default maximum session age (24 hours)
pub const DEFAULT_SESSION_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// The long-lived process secret.
///
/// All keyed operations derive from it. Never printed by `Debug` and
/// zeroized on drop.
#[derive(Clone)]
pub struct Secret(Zeroizing<String>);

impl Secret {
    /// Wrap a secret string.
    ///
    /// # Errors
    ///
    /// - `Config`: the secret is empty
    pub fn new(value: impl Into<String>) -> Result<Self, AuthError> {
        let value = Zeroizing::new(value.into());
        if value.is_empty() {
            return Err(AuthError::Config { reason: "secret must not be empty".to_string() });
        }
        Ok(Self(value))
    }

    /// Secret bytes, for keying primitives.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

/// Password hashing policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordConfig {
    /// Cost exponent used when a hash call does not specify one
    /// (`2^rounds` iterations)
    pub rounds: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self { rounds: DEFAULT_ROUNDS }
    }
}

/// Defaults applied when issuing compact tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenConfig {
    /// Lifetime used when issue options omit `expires_in`
    pub expires_in: Duration,
    /// `iss` claim used when issue options omit it
    pub issuer: String,
    /// `aud` claim used when issue options omit it
    pub audience: String,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            expires_in: DEFAULT_EXPIRY,
            issuer: DEFAULT_ISSUER.to_string(),
            audience: DEFAULT_AUDIENCE.to_string(),
        }
    }
}

/// Session packaging policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Maximum age used when validation does not specify one
    pub max_age: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { max_age: DEFAULT_SESSION_MAX_AGE }
    }
}

/// Complete service configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Process secret
    pub secret: Secret,
    /// Password hashing policy
    pub password: PasswordConfig,
    /// Token issuing defaults
    pub token: TokenConfig,
    /// Session validation policy
    pub session: SessionConfig,
}

impl AuthConfig {
    /// Configuration with the given secret and default policies.
    pub fn new(secret: Secret) -> Self {
        Self {
            secret,
            password: PasswordConfig::default(),
            token: TokenConfig::default(),
            session: SessionConfig::default(),
        }
    }

    /// Check that the policies are usable.
    ///
    /// # Errors
    ///
    /// - `Config`: `rounds` above the supported maximum
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.password.rounds > MAX_ROUNDS {
            return Err(AuthError::Config {
                reason: format!(
                    "password rounds {} exceeds maximum {MAX_ROUNDS}",
                    self.password.rounds
                ),
            });
        }
        Ok(())
    }
}
