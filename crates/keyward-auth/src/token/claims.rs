//! Token claims: an arbitrary JSON object plus reserved timing/metadata keys

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Issued-at claim (Unix seconds)
pub const IAT: &str = "iat";
/// Expiry claim (Unix seconds)
pub const EXP: &str = "exp";
/// Audience claim
pub const AUD: &str = "aud";
/// Issuer claim
pub const ISS: &str = "iss";

/// Claims set by the codec at issuance; caller-supplied values for these keys
/// are overwritten.
pub const RESERVED_CLAIMS: [&str; 4] = [IAT, EXP, AUD, ISS];

/// JSON object carried in a token payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(Map<String, Value>);

impl Claims {
    /// Empty claim set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a claim, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Look up a claim.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Remove a claim.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Whether a claim is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of claims.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no claims.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Issued-at time, if present and numeric.
    pub fn iat(&self) -> Option<u64> {
        self.get(IAT).and_then(Value::as_u64)
    }

    /// Expiry time, if present and numeric.
    pub fn exp(&self) -> Option<u64> {
        self.get(EXP).and_then(Value::as_u64)
    }

    /// Audience, if present and a string.
    pub fn aud(&self) -> Option<&str> {
        self.get(AUD).and_then(Value::as_str)
    }

    /// Issuer, if present and a string.
    pub fn iss(&self) -> Option<&str> {
        self.get(ISS).and_then(Value::as_str)
    }

    /// Borrow the underlying JSON object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consume into the underlying JSON object.
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Claims {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Claims> for Value {
    fn from(claims: Claims) -> Self {
        Value::Object(claims.0)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn builder_and_accessors() {
        let claims = Claims::new()
            .with("userId", 42)
            .with(IAT, 100u64)
            .with(EXP, 200u64)
            .with(AUD, "clients")
            .with(ISS, "keyward");

        assert_eq!(claims.len(), 5);
        assert_eq!(claims.get("userId"), Some(&json!(42)));
        assert_eq!(claims.iat(), Some(100));
        assert_eq!(claims.exp(), Some(200));
        assert_eq!(claims.aud(), Some("clients"));
        assert_eq!(claims.iss(), Some("keyward"));
    }

    #[test]
    fn non_numeric_timestamps_read_as_none() {
        let claims = Claims::new().with(EXP, "tomorrow").with(IAT, -5);
        assert_eq!(claims.exp(), None);
        assert_eq!(claims.iat(), None);
    }

    #[test]
    fn serializes_as_plain_object() {
        let claims = Claims::new().with("role", "admin");
        assert_eq!(serde_json::to_string(&claims).unwrap(), r#"{"role":"admin"}"#);
    }

    #[test]
    fn only_objects_deserialize() {
        assert!(serde_json::from_str::<Claims>(r#"{"a":1}"#).is_ok());
        assert!(serde_json::from_str::<Claims>("[1,2]").is_err());
        assert!(serde_json::from_str::<Claims>("\"str\"").is_err());
    }
}
