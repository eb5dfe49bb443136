//! Fuzz target for session::open_session
//!
//! Session tokens arrive from clients. This fuzzer checks:
//! - Non-base64 and non-envelope input is rejected without panicking
//! - Envelopes with wrong-length or non-hex fields are rejected
//! - Nothing opens without the secret
//!
//! The fuzzer should NEVER panic and NEVER return session data.

#![no_main]

use std::time::Duration;

use arbitrary::Arbitrary;
use keyward_auth::session::open_session;
use keyward_crypto::EncryptedEnvelope;
use libfuzzer_sys::fuzz_target;

const SECRET: &[u8] = b"fuzz-secret";

#[derive(Debug, Arbitrary)]
struct Input {
    raw: String,
    ciphertext: Vec<u8>,
    nonce: Vec<u8>,
    tag: Vec<u8>,
    max_age_ms: u64,
    now_ms: u64,
}

fuzz_target!(|input: Input| {
    let max_age = Duration::from_millis(input.max_age_ms);
    assert!(open_session(SECRET, &input.raw, max_age, input.now_ms).is_err());

    let envelope = EncryptedEnvelope {
        ciphertext: hex::encode(&input.ciphertext),
        nonce: hex::encode(&input.nonce),
        tag: hex::encode(&input.tag),
    };
    if let Ok(token) = envelope.to_opaque() {
        assert!(open_session(SECRET, &token, max_age, input.now_ms).is_err());
    }
});
