//! Fuzz target for encryption::open
//!
//! Seals a fuzzer-chosen plaintext, then applies a fuzzer-chosen mutation to
//! one field. Checks:
//! - Any change to ciphertext, nonce or tag is detected
//! - Unmodified envelopes always round-trip
//!
//! The fuzzer should NEVER panic and NEVER return altered plaintext.

#![no_main]

use arbitrary::Arbitrary;
use keyward_crypto::{EncryptedEnvelope, NONCE_LEN, derive_key, open, seal};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Field {
    Ciphertext,
    Nonce,
    Tag,
}

#[derive(Debug, Arbitrary)]
struct Input {
    plaintext: Vec<u8>,
    nonce: [u8; NONCE_LEN],
    field: Field,
    index: usize,
    mask: u8,
}

fn flip(hex_field: &str, index: usize, mask: u8) -> Option<String> {
    let mut bytes = hex::decode(hex_field).ok()?;
    if bytes.is_empty() {
        return None;
    }
    let index = index % bytes.len();
    bytes[index] ^= mask;
    Some(hex::encode(bytes))
}

fuzz_target!(|input: Input| {
    let key = derive_key(b"fuzz-secret");
    let Ok(envelope) = seal(&input.plaintext, &key, &input.nonce) else {
        return;
    };
    assert_eq!(open(&envelope, &key).ok(), Some(input.plaintext.clone()));

    if input.mask == 0 {
        return;
    }
    let mut tampered: EncryptedEnvelope = envelope.clone();
    let target = match input.field {
        Field::Ciphertext => &mut tampered.ciphertext,
        Field::Nonce => &mut tampered.nonce,
        Field::Tag => &mut tampered.tag,
    };
    let Some(flipped) = flip(target, input.index, input.mask) else {
        return;
    };
    *target = flipped;

    assert!(open(&tampered, &key).is_err());
});
