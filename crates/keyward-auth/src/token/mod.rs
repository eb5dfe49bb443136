//! Compact signed tokens (HS256).

pub mod claims;
pub mod codec;

pub use claims::{Claims, RESERVED_CLAIMS};
pub use codec::{ALGORITHM, TokenOptions, decode, decode_unverified, issue};
