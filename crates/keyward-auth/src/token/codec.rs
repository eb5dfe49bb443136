//! HS256 compact token encoding.
//!
//! Wire format: `b64url(header) . b64url(payload) . b64url(signature)`, no
//! padding, where the signature is HMAC-SHA256 over `header.payload` keyed
//! with the process secret.
//!
//! Decode order is fixed: signature first, then header, then payload, then
//! expiry. Nothing in an unauthenticated header or payload is interpreted
//! before the signature has been checked.

use std::time::Duration;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use keyward_crypto::mac;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use subtle::ConstantTimeEq;

use super::claims::{AUD, Claims, EXP, IAT, ISS};
use crate::{
    config::TokenConfig,
    duration::parse_duration_lenient,
    error::{AuthError, TokenError},
};

/// The only supported signing algorithm
pub const ALGORITHM: &str = "HS256";

/// Token type written into the header
pub const TOKEN_TYPE: &str = "JWT";

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    #[serde(default)]
    typ: String,
}

impl Header {
    fn hs256() -> Self {
        Self { alg: ALGORITHM.to_string(), typ: TOKEN_TYPE.to_string() }
    }
}

/// Per-call overrides for [`issue`]; unset fields fall back to
/// [`TokenConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenOptions {
    /// Token lifetime
    pub expires_in: Option<Duration>,
    /// `aud` claim
    pub audience: Option<String>,
    /// `iss` claim
    pub issuer: Option<String>,
}

impl TokenOptions {
    /// Set the lifetime from a compact duration string (`"30m"`, `"7d"`).
    ///
    /// Unrecognized strings fall back to 24 hours.
    #[must_use]
    pub fn expires_in(mut self, duration: &str) -> Self {
        self.expires_in = Some(parse_duration_lenient(duration));
        self
    }

    /// Set the lifetime directly.
    #[must_use]
    pub fn expires_after(mut self, duration: Duration) -> Self {
        self.expires_in = Some(duration);
        self
    }

    /// Set the audience.
    #[must_use]
    pub fn audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// Set the issuer.
    #[must_use]
    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }
}

/// Sign `claims` into a compact token.
///
/// `iat`, `exp`, `aud` and `iss` are always set here and override any
/// caller-supplied values. `exp` saturates rather than overflowing.
///
/// # Errors
///
/// - `Serialization`: header or claims could not be encoded
pub fn issue(
    claims: Claims,
    options: &TokenOptions,
    config: &TokenConfig,
    secret: &[u8],
    now_secs: u64,
) -> Result<String, AuthError> {
    let expires_in = options.expires_in.unwrap_or(config.expires_in);
    let audience = options.audience.clone().unwrap_or_else(|| config.audience.clone());
    let issuer = options.issuer.clone().unwrap_or_else(|| config.issuer.clone());

    let mut claims = claims;
    claims.insert(IAT, now_secs);
    claims.insert(EXP, now_secs.saturating_add(expires_in.as_secs()));
    claims.insert(AUD, audience);
    claims.insert(ISS, issuer);

    let header = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&Header::hs256())?);
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
    let signing_input = format!("{header}.{payload}");
    let signature = URL_SAFE_NO_PAD.encode(mac::sign(signing_input.as_bytes(), secret));

    Ok(format!("{signing_input}.{signature}"))
}

/// Verify a token and return its claims.
///
/// A token without `exp` never expires. A numeric `exp` (integer or float)
/// is compared as a number.
///
/// # Errors
///
/// - `Malformed`: not three segments, bad base64url, header or payload not
///   JSON, payload not an object, or `exp` present but not a number
/// - `BadSignature`: signature does not match under `secret`
/// - `UnsupportedAlgorithm`: header `alg` is not HS256
/// - `Expired`: `now_secs >= exp`
pub fn decode(token: &str, secret: &[u8], now_secs: u64) -> Result<Claims, TokenError> {
    let (header, payload, signature) = split(token)?;

    let signing_input = &token[..header.len() + 1 + payload.len()];
    let expected = URL_SAFE_NO_PAD.encode(mac::sign(signing_input.as_bytes(), secret));
    if !bool::from(expected.as_bytes().ct_eq(signature.as_bytes())) {
        return Err(TokenError::BadSignature);
    }

    let header: Header = decode_segment(header, "header")?;
    if header.alg != ALGORITHM {
        return Err(TokenError::UnsupportedAlgorithm { alg: header.alg });
    }

    let claims = decode_claims(payload)?;
    if let Some(value) = claims.get(EXP) {
        let exp = value.as_f64().ok_or_else(|| TokenError::malformed("exp is not a number"))?;
        if now_secs as f64 >= exp {
            return Err(TokenError::Expired { exp: exp as u64, now: now_secs });
        }
    }

    Ok(claims)
}

/// Read the payload without checking the signature or expiry.
///
/// The result is attacker-controlled and MUST NOT be used for authorization
/// decisions. Returns `None` if the token is not structurally a token or the
/// payload is not a JSON object.
pub fn decode_unverified(token: &str) -> Option<Claims> {
    let (_, payload, _) = split(token).ok()?;
    decode_claims(payload).ok()
}

fn split(token: &str) -> Result<(&str, &str, &str), TokenError> {
    let mut segments = token.split('.');
    match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(header), Some(payload), Some(signature), None) => Ok((header, payload, signature)),
        _ => Err(TokenError::malformed("expected three segments")),
    }
}

fn decode_segment<T: for<'de> Deserialize<'de>>(
    segment: &str,
    name: &str,
) -> Result<T, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| TokenError::malformed(format!("{name} is not base64url")))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| TokenError::malformed(format!("{name} is not valid JSON: {e}")))
}

fn decode_claims(payload: &str) -> Result<Claims, TokenError> {
    match decode_segment::<Value>(payload, "payload")? {
        Value::Object(map) => Ok(Claims::from(map)),
        _ => Err(TokenError::malformed("payload is not a JSON object")),
    }
}
