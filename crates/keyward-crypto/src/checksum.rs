//! Integrity checksums over canonically serialized data
//!
//! Strings are hashed as-is. Anything else is serialized to JSON with object
//! keys in sorted order, so structurally equal inputs always produce the
//! same digest. Checksums detect tampering; they provide no secrecy.

use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::CryptoError;

/// SHA-256 digest length in bytes
pub const CHECKSUM_LEN: usize = 32;

/// Hex SHA-256 digest of raw bytes.
pub fn checksum_bytes(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Hex SHA-256 digest of the canonical form of `data`.
///
/// # Errors
///
/// - `Serialization`: `data` cannot be represented as JSON (e.g. a map with
///   non-string keys)
pub fn checksum<T: Serialize + ?Sized>(data: &T) -> Result<String, CryptoError> {
    let canonical = canonicalize(data)?;
    Ok(checksum_bytes(canonical.as_bytes()))
}

/// Check `data` against an expected hex digest in constant time.
///
/// Returns `false` for a malformed expected digest or unserializable data.
pub fn verify_checksum<T: Serialize + ?Sized>(data: &T, expected: &str) -> bool {
    let Ok(canonical) = canonicalize(data) else {
        return false;
    };
    let mut expected_bytes = [0u8; CHECKSUM_LEN];
    if hex::decode_to_slice(expected, &mut expected_bytes).is_err() {
        return false;
    }

    let actual = Sha256::digest(canonical.as_bytes());
    actual.as_slice().ct_eq(&expected_bytes).into()
}

/// Canonical string form: strings verbatim, everything else as sorted-key
/// JSON.
fn canonicalize<T: Serialize + ?Sized>(data: &T) -> Result<String, CryptoError> {
    let value = serde_json::to_value(data)
        .map_err(|e| CryptoError::Serialization { reason: e.to_string() })?;

    match value {
        Value::String(s) => Ok(s),
        other => Ok(sort_keys(other).to_string()),
    }
}

/// Rebuild every object with its keys inserted in sorted order.
///
/// `serde_json::Map` only sorts when the `preserve_order` feature is off, and
/// any crate in the build graph can turn it on. Inserting in sorted order
/// gives the same output under either map implementation.
fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            let sorted: Map<String, Value> =
                entries.into_iter().map(|(k, v)| (k, sort_keys(v))).collect();
            Value::Object(sorted)
        },
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};

    use serde_json::json;

    use super::*;

    #[test]
    fn sha256_of_abc() {
        assert_eq!(
            checksum_bytes(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn strings_are_hashed_verbatim() {
        assert_eq!(checksum("abc").unwrap(), checksum_bytes(b"abc"));
        assert_eq!(checksum(&"abc".to_string()).unwrap(), checksum_bytes(b"abc"));
    }

    #[test]
    fn structures_are_hashed_as_json() {
        let data = json!({"id": 7, "name": "otter"});
        assert_eq!(checksum(&data).unwrap(), checksum_bytes(br#"{"id":7,"name":"otter"}"#));
    }

    #[test]
    fn key_order_does_not_matter() {
        let mut a = HashMap::new();
        a.insert("zeta", 1);
        a.insert("alpha", 2);
        a.insert("mid", 3);

        let b: BTreeMap<_, _> = a.iter().map(|(k, v)| (*k, *v)).collect();

        assert_eq!(checksum(&a).unwrap(), checksum(&b).unwrap());
    }

    #[test]
    fn nested_objects_and_arrays_are_sorted() {
        let nested = json!({"z": [{"b": 1, "a": 2}], "a": {"y": 0, "x": {"d": 1, "c": 2}}});
        let value = sort_keys(nested);

        assert_eq!(
            value.to_string(),
            r#"{"a":{"x":{"c":2,"d":1},"y":0},"z":[{"a":2,"b":1}]}"#
        );
        assert_eq!(
            checksum(&json!({"z": [{"b": 1, "a": 2}], "a": 1})).unwrap(),
            checksum_bytes(br#"{"a":1,"z":[{"a":2,"b":1}]}"#)
        );
    }

    #[test]
    fn different_data_different_checksums() {
        assert_ne!(checksum(&json!({"a": 1})).unwrap(), checksum(&json!({"a": 2})).unwrap());
    }

    #[test]
    fn verify_accepts_matching_digest() {
        let data = json!(["x", 1, true]);
        let digest = checksum(&data).unwrap();

        assert!(verify_checksum(&data, &digest));
        assert!(verify_checksum(&data, &digest.to_uppercase()));
    }

    #[test]
    fn verify_rejects_mismatch_and_malformed() {
        let digest = checksum("payload").unwrap();

        assert!(!verify_checksum("payload!", &digest));
        assert!(!verify_checksum("payload", "not hex"));
        assert!(!verify_checksum("payload", &digest[..10]));
        assert!(!verify_checksum("payload", ""));
    }

    #[test]
    fn unserializable_data_is_an_error() {
        let mut map = HashMap::new();
        map.insert(vec![1u8], 1);

        assert!(matches!(checksum(&map), Err(CryptoError::Serialization { .. })));
        assert!(!verify_checksum(&map, &checksum_bytes(b"")));
    }
}
