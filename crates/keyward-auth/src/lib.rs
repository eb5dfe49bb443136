//! Keyward Authentication Services
//!
//! Password hashing, compact signed tokens, field encryption and encrypted
//! session tokens, all keyed from a single process secret held in
//! [`AuthConfig`] and served through the [`Keyward`] facade.
//!
//! # Architecture
//!
//! ```text
//! AuthConfig (Secret + policies)      Environment (clock + CSPRNG)
//!          │                                   │
//!          └──────────────┬────────────────────┘
//!                         ▼
//!                     Keyward<E>
//!          ┌───────────┬──┴────────┬────────────┐
//!          ▼           ▼           ▼            ▼
//!      passwords    token::     session::   hmac/checksum/
//!      (PBKDF2)     (HS256)     (AES-GCM)   random ids
//! ```
//!
//! # Failure Model
//!
//! Construction paths (`hash_password`, `encrypt`, `generate_token`,
//! `create_session_token`) return [`AuthError`]; an error there means the
//! environment or configuration is broken.
//!
//! Verification paths (`verify_password`, `verify_token`,
//! `validate_session_token`, `verify_hmac`, `verify_checksum`) never return
//! an error. Malformed, forged, expired and stale inputs all collapse to
//! `false`/`None`, with the reason logged at `debug`.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod duration;
pub mod error;
pub mod service;
pub mod session;
pub mod token;

pub use config::{AuthConfig, PasswordConfig, Secret, SessionConfig, TokenConfig};
pub use duration::{DEFAULT_EXPIRY, parse_duration, parse_duration_lenient};
pub use error::{AuthError, SessionError, TokenError};
pub use service::{Keyward, PasswordOptions};
pub use session::SessionData;
pub use token::{Claims, TokenOptions};
