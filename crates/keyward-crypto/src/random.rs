//! Random identifiers, verification codes and temporary passwords
//!
//! Everything draws from [`Environment::random_bytes`], which is the OS
//! CSPRNG in production. Characters are picked by rejection sampling so each
//! symbol of an alphabet is equally likely.

use crate::{env::Environment, error::CryptoError};

/// Default number of random bytes in an identifier (32 hex characters)
pub const DEFAULT_ID_BYTES: usize = 16;

/// Default number of digits in a verification code
pub const DEFAULT_CODE_LEN: usize = 6;

/// Default length of a temporary password
pub const DEFAULT_TEMP_PASSWORD_LEN: usize = 12;

const DIGITS: &[u8] = b"0123456789";

const PASSWORD_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*";

/// `n` random bytes, hex-encoded (`2 * n` characters).
pub fn random_bytes_hex<E: Environment>(env: &E, n: usize) -> Result<String, CryptoError> {
    let mut bytes = vec![0u8; n];
    env.random_bytes(&mut bytes)?;
    Ok(hex::encode(bytes))
}

/// Random hex identifier built from `n` bytes.
pub fn secure_id<E: Environment>(env: &E, n: usize) -> Result<String, CryptoError> {
    random_bytes_hex(env, n)
}

/// Numeric verification code of `length` digits. Leading zeros are kept.
pub fn numeric_code<E: Environment>(env: &E, length: usize) -> Result<String, CryptoError> {
    sample(env, DIGITS, length)
}

/// Temporary password of `length` characters from a mixed alphabet of upper
/// and lower case letters, digits and symbols.
pub fn temporary_password<E: Environment>(env: &E, length: usize) -> Result<String, CryptoError> {
    sample(env, PASSWORD_ALPHABET, length)
}

/// Pick `length` symbols uniformly from `alphabet`.
fn sample<E: Environment>(
    env: &E,
    alphabet: &[u8],
    length: usize,
) -> Result<String, CryptoError> {
    debug_assert!(!alphabet.is_empty() && alphabet.len() <= 256);

    // Largest multiple of the alphabet size that fits in a byte; bytes at or
    // above it are rejected to keep the distribution uniform.
    let limit = 256 - (256 % alphabet.len());

    let mut out = String::with_capacity(length);
    let mut buffer = [0u8; 64];
    while out.len() < length {
        env.random_bytes(&mut buffer)?;
        for &byte in &buffer {
            if out.len() == length {
                break;
            }
            let byte = usize::from(byte);
            if byte < limit {
                out.push(char::from(alphabet[byte % alphabet.len()]));
            }
        }
    }

    Ok(out)
}
