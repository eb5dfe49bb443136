//! Fuzz target for verify_password and needs_rehash
//!
//! Stored hashes come from a database and may be corrupted. This fuzzer
//! checks:
//! - Malformed `$scheme$iterations$blob` strings never panic
//! - Huge or zero iteration counts fail closed instead of hanging
//!
//! The fuzzer should NEVER panic.

#![no_main]

use arbitrary::Arbitrary;
use keyward_crypto::{needs_rehash, verify_password};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    password: String,
    pepper: String,
    iterations: u32,
    blob: String,
    raw: String,
    rounds: u32,
}

fuzz_target!(|input: Input| {
    let _ = verify_password(&input.password, &input.raw, &input.pepper);
    let _ = needs_rehash(&input.raw, input.rounds);

    // Keep iteration counts small so each run stays fast; large ones are
    // rejected before hashing
    let iterations =
        if input.iterations > 1 << 24 { input.iterations } else { input.iterations % 64 };
    let shaped = format!("$pbkdf2${iterations}${}", input.blob);
    let _ = verify_password(&input.password, &shaped, &input.pepper);
});
