//! Keyward operator CLI.
//!
//! # Usage
//!
//! ```bash
//! # Hash and verify a password
//! keyward hash-password 'Sup3r$ecret'
//! keyward verify-password 'Sup3r$ecret' '$pbkdf2$4096$...'
//!
//! # Keyed operations read the process secret from the environment
//! export KEYWARD_SECRET=...
//! keyward issue-token '{"userId":42}' --expires-in 1h
//! keyward verify-token eyJhbGciOi...
//! keyward create-session 7 --extra '{"device":"laptop"}'
//! ```
//!
//! Verify-style commands exit with status 1 when the input is rejected and 2
//! on usage or environment errors.

use std::{
    error::Error,
    io::{self, Write},
    process::ExitCode,
};

use clap::{Parser, Subcommand};
use keyward_auth::{
    AuthConfig, Claims, Keyward, Secret, TokenOptions,
    config::{DEFAULT_AUDIENCE, DEFAULT_ISSUER},
    parse_duration,
};
use keyward_crypto::{
    DEFAULT_ROUNDS, Environment, HashOptions, SALT_LEN, SystemEnv, random, verify_password,
};
use serde_json::{Map, Value};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Keyward authentication toolkit
#[derive(Parser, Debug)]
#[command(name = "keyward")]
#[command(about = "Password hashing, signed tokens and encrypted sessions")]
#[command(version)]
struct Args {
    /// Process secret for keyed operations
    #[arg(long, env = "KEYWARD_SECRET", hide_env_values = true)]
    secret: Option<String>,

    /// Password cost exponent (2^rounds iterations)
    #[arg(long, env = "KEYWARD_PASSWORD_ROUNDS", default_value_t = DEFAULT_ROUNDS)]
    rounds: u32,

    /// Default token issuer
    #[arg(long, env = "KEYWARD_ISSUER", default_value = DEFAULT_ISSUER)]
    issuer: String,

    /// Default token audience
    #[arg(long, env = "KEYWARD_AUDIENCE", default_value = DEFAULT_AUDIENCE)]
    audience: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Hash a password with a fresh salt
    HashPassword {
        /// Password to hash
        password: String,
        /// Application-wide pepper
        #[arg(long, default_value = "")]
        pepper: String,
    },

    /// Check a password against a stored hash
    VerifyPassword {
        /// Candidate password
        password: String,
        /// Stored `$pbkdf2$...` hash
        hash: String,
        /// Pepper used when hashing
        #[arg(long, default_value = "")]
        pepper: String,
    },

    /// Issue a signed token
    IssueToken {
        /// Claims as a JSON object
        #[arg(default_value = "{}")]
        claims: String,
        /// Lifetime (`45s`, `30m`, `24h`, `7d`)
        #[arg(long)]
        expires_in: Option<String>,
        /// `aud` claim for this token
        #[arg(long)]
        audience: Option<String>,
        /// `iss` claim for this token
        #[arg(long)]
        issuer: Option<String>,
    },

    /// Verify a token and print its claims
    VerifyToken {
        /// Compact token
        token: String,
    },

    /// Print a token's claims WITHOUT verifying it
    DecodeToken {
        /// Compact token
        token: String,
    },

    /// Encrypt a string into an opaque envelope
    Encrypt {
        /// Plaintext
        plaintext: String,
    },

    /// Decrypt an opaque envelope
    Decrypt {
        /// Output of `encrypt`
        envelope: String,
    },

    /// Create an encrypted session token
    CreateSession {
        /// Session owner
        user_id: u64,
        /// Extra metadata as a JSON object
        #[arg(long, default_value = "{}")]
        extra: String,
    },

    /// Validate a session token and print its payload
    ValidateSession {
        /// Session token
        token: String,
        /// Maximum age (`30m`, `24h`, ...)
        #[arg(long)]
        max_age: Option<String>,
    },

    /// Compute a hex HMAC-SHA256
    Hmac {
        /// Message
        data: String,
        /// Key; defaults to the process secret
        #[arg(long)]
        key: Option<String>,
    },

    /// Check a hex HMAC-SHA256
    VerifyHmac {
        /// Message
        data: String,
        /// Expected signature (hex)
        signature: String,
        /// Key; defaults to the process secret
        #[arg(long)]
        key: Option<String>,
    },

    /// Compute a SHA-256 checksum
    Checksum {
        /// Data to checksum
        data: String,
        /// Parse `data` as JSON and checksum its canonical form
        #[arg(long)]
        json: bool,
    },

    /// Check a SHA-256 checksum
    VerifyChecksum {
        /// Data to check
        data: String,
        /// Expected checksum (hex)
        expected: String,
        /// Parse `data` as JSON and checksum its canonical form
        #[arg(long)]
        json: bool,
    },

    /// Print a random hex identifier
    RandomId {
        /// Number of random bytes
        #[arg(long, default_value_t = random::DEFAULT_ID_BYTES)]
        bytes: usize,
    },

    /// Print a numeric verification code
    Code {
        /// Number of digits
        #[arg(long, default_value_t = random::DEFAULT_CODE_LEN)]
        length: usize,
    },

    /// Print a temporary password
    TempPassword {
        /// Number of characters
        #[arg(long, default_value_t = random::DEFAULT_TEMP_PASSWORD_LEN)]
        length: usize,
    },
}

impl Args {
    /// Build the service from the global arguments.
    fn keyward(&self) -> Result<Keyward, Box<dyn Error>> {
        let secret = self.secret.clone().ok_or("missing --secret or KEYWARD_SECRET")?;
        let mut config = AuthConfig::new(Secret::new(secret)?);
        config.password.rounds = self.rounds;
        config.token.issuer.clone_from(&self.issuer);
        config.token.audience.clone_from(&self.audience);
        Ok(Keyward::new(config)?)
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer().with_writer(io::stderr)).with(filter).init();

    let mut stdout = io::stdout().lock();
    match run(&args, &mut stdout) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            let _ = writeln!(io::stderr(), "error: {err}");
            ExitCode::from(2)
        },
    }
}

/// Execute one command, writing results to `out`.
///
/// Returns `Ok(false)` when a verify-style command rejects its input.
fn run(args: &Args, out: &mut impl Write) -> Result<bool, Box<dyn Error>> {
    match &args.command {
        Command::HashPassword { password, pepper } => {
            let salt: [u8; SALT_LEN] = SystemEnv::new().random_array()?;
            let options = HashOptions { rounds: args.rounds, pepper };
            let hash = keyward_crypto::hash_password(password, &options, &salt)?;
            writeln!(out, "{hash}")?;
        },
        Command::VerifyPassword { password, hash, pepper } => {
            return verdict(out, verify_password(password, hash, pepper));
        },
        Command::IssueToken { claims, expires_in, audience, issuer } => {
            let claims: Claims = serde_json::from_str(claims)?;
            let mut options = TokenOptions::default();
            if let Some(expires_in) = expires_in {
                options = options.expires_in(expires_in);
            }
            options.audience.clone_from(audience);
            options.issuer.clone_from(issuer);
            writeln!(out, "{}", args.keyward()?.generate_token(claims, &options)?)?;
        },
        Command::VerifyToken { token } => match args.keyward()?.verify_token(token) {
            Some(claims) => writeln!(out, "{}", serde_json::to_string(&claims)?)?,
            None => return verdict(out, false),
        },
        Command::DecodeToken { token } => {
            let Some(claims) = keyward_auth::token::decode_unverified(token) else {
                return verdict(out, false);
            };
            writeln!(out, "{}", serde_json::to_string(&claims)?)?;
        },
        Command::Encrypt { plaintext } => {
            writeln!(out, "{}", args.keyward()?.encrypt_opaque(plaintext)?)?;
        },
        Command::Decrypt { envelope } => match args.keyward()?.decrypt_opaque(envelope) {
            Ok(plaintext) => writeln!(out, "{plaintext}")?,
            Err(err) => {
                tracing::debug!(%err, "envelope rejected");
                return verdict(out, false);
            },
        },
        Command::CreateSession { user_id, extra } => {
            let extra: Map<String, Value> = serde_json::from_str(extra)?;
            writeln!(out, "{}", args.keyward()?.create_session_token(*user_id, extra)?)?;
        },
        Command::ValidateSession { token, max_age } => {
            let max_age = match max_age {
                Some(input) => Some(parse_duration(input).ok_or("invalid --max-age")?),
                None => None,
            };
            match args.keyward()?.validate_session_token(token, max_age) {
                Some(data) => writeln!(out, "{}", serde_json::to_string(&data)?)?,
                None => return verdict(out, false),
            }
        },
        Command::Hmac { data, key } => {
            let key = key.as_deref().map(str::as_bytes);
            writeln!(out, "{}", args.keyward()?.hmac(data.as_bytes(), key))?;
        },
        Command::VerifyHmac { data, signature, key } => {
            let key = key.as_deref().map(str::as_bytes);
            return verdict(out, args.keyward()?.verify_hmac(data.as_bytes(), signature, key));
        },
        Command::Checksum { data, json } => {
            let sum = if *json {
                keyward_crypto::checksum(&serde_json::from_str::<Value>(data)?)?
            } else {
                keyward_crypto::checksum(data.as_str())?
            };
            writeln!(out, "{sum}")?;
        },
        Command::VerifyChecksum { data, expected, json } => {
            let ok = if *json {
                keyward_crypto::verify_checksum(&serde_json::from_str::<Value>(data)?, expected)
            } else {
                keyward_crypto::verify_checksum(data.as_str(), expected)
            };
            return verdict(out, ok);
        },
        Command::RandomId { bytes } => {
            writeln!(out, "{}", random::secure_id(&SystemEnv::new(), *bytes)?)?;
        },
        Command::Code { length } => {
            writeln!(out, "{}", random::numeric_code(&SystemEnv::new(), *length)?)?;
        },
        Command::TempPassword { length } => {
            writeln!(out, "{}", random::temporary_password(&SystemEnv::new(), *length)?)?;
        },
    }
    Ok(true)
}

fn verdict(out: &mut impl Write, ok: bool) -> Result<bool, Box<dyn Error>> {
    writeln!(out, "{}", if ok { "valid" } else { "invalid" })?;
    Ok(ok)
}
