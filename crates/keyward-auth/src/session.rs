//! Session tokens: an encrypted envelope around
//! `{ userId, timestamp, randomNonce, ...extra }`.
//!
//! A session is never mutated in place. Refreshing one means opening it and
//! creating a new envelope with a new timestamp and nonce.

use std::time::Duration;

use keyward_crypto::{
    EncryptedEnvelope, Environment, NONCE_LEN, derive_key, open, random::DEFAULT_ID_BYTES, seal,
    secure_id,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AuthError, SessionError};

/// Payload keys owned by the session layer. Same-named keys in `extra` are
/// dropped.
pub const RESERVED_SESSION_KEYS: [&str; 3] = ["userId", "timestamp", "randomNonce"];

/// Decrypted session payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    /// Owner of the session
    pub user_id: u64,
    /// Creation time (Unix milliseconds)
    pub timestamp: u64,
    /// Random id distinguishing sessions created in the same millisecond
    pub random_nonce: String,
    /// Caller-supplied metadata
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SessionData {
    /// Age at `now_ms`; zero if the timestamp is in the future.
    pub fn age_millis(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.timestamp)
    }
}

/// Create a session token for `user_id` at the environment's current time.
///
/// `userId`, `timestamp` and `randomNonce` take precedence over same-named
/// keys in `extra`; those keys are dropped rather than overriding the
/// session fields.
///
/// # Errors
///
/// - `Crypto`: the random source or the cipher failed
/// - `Serialization`: the payload could not be encoded
pub fn create_session<E: Environment>(
    secret: &[u8],
    user_id: u64,
    mut extra: Map<String, Value>,
    env: &E,
) -> Result<String, AuthError> {
    for key in RESERVED_SESSION_KEYS {
        extra.remove(key);
    }

    let data = SessionData {
        user_id,
        timestamp: env.wall_clock_millis(),
        random_nonce: secure_id(env, DEFAULT_ID_BYTES)?,
        extra,
    };
    let plaintext = serde_json::to_vec(&data)?;

    let key = derive_key(secret);
    let nonce: [u8; NONCE_LEN] = env.random_array()?;
    let envelope = seal(&plaintext, &key, &nonce)?;
    Ok(envelope.to_opaque()?)
}

/// Open a session token and check its age.
///
/// # Errors
///
/// - `Encoding`: not a base64 envelope
/// - `Decryption`: does not authenticate under `secret`
/// - `Malformed`: decrypted payload is not a session object
/// - `Stale`: `now_ms - timestamp > max_age`
pub fn open_session(
    secret: &[u8],
    token: &str,
    max_age: Duration,
    now_ms: u64,
) -> Result<SessionData, SessionError> {
    let envelope = EncryptedEnvelope::from_opaque(token).map_err(|_| SessionError::Encoding)?;
    let plaintext = open(&envelope, &derive_key(secret)).map_err(|_| SessionError::Decryption)?;
    let data: SessionData = serde_json::from_slice(&plaintext)
        .map_err(|e| SessionError::Malformed { reason: e.to_string() })?;

    let age_ms = data.age_millis(now_ms);
    let max_age_ms = u64::try_from(max_age.as_millis()).unwrap_or(u64::MAX);
    if age_ms > max_age_ms {
        return Err(SessionError::Stale { age_ms, max_age_ms });
    }

    Ok(data)
}
