//! Environment abstraction for time and randomness.
//!
//! Every keyed operation is a pure function of its inputs; the only ambient
//! resources are the wall clock and the secure random source. Routing both
//! through [`Environment`] lets production use the OS while tests use a
//! seeded RNG and a clock that only moves when told to.

use crate::error::CryptoError;

/// Abstract environment providing wall-clock time and secure randomness.
///
/// # Safety
///
/// Implementations MUST guarantee:
///
/// - `random_bytes()` uses cryptographically secure entropy in production
/// - `random_bytes()` is safe to call concurrently from many threads
/// - `wall_clock_millis()` is Unix time in milliseconds
pub trait Environment: Clone + Send + Sync + 'static {
    /// Fills the provided buffer with random bytes.
    ///
    /// # Errors
    ///
    /// - `Entropy`: the underlying random source failed
    fn random_bytes(&self, buffer: &mut [u8]) -> Result<(), CryptoError>;

    /// Current Unix time in milliseconds.
    fn wall_clock_millis(&self) -> u64;

    /// Current Unix time in whole seconds.
    fn wall_clock_secs(&self) -> u64 {
        self.wall_clock_millis() / 1000
    }

    /// Fills a fixed-size array with random bytes.
    fn random_array<const N: usize>(&self) -> Result<[u8; N], CryptoError> {
        let mut bytes = [0u8; N];
        self.random_bytes(&mut bytes)?;
        Ok(bytes)
    }
}

/// Production environment using system time and the OS CSPRNG.
///
/// # Security
///
/// The RNG is getrandom, which provides OS-level cryptographic randomness
/// (e.g., `getrandom(2)` or /dev/urandom on Linux, `BCryptGenRandom` on
/// Windows) and is documented as safe for concurrent use. Unlike a server
/// that cannot run without entropy, a failure here is surfaced as
/// [`CryptoError::Entropy`] so the calling operation aborts cleanly.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    fn random_bytes(&self, buffer: &mut [u8]) -> Result<(), CryptoError> {
        getrandom::fill(buffer).map_err(|e| CryptoError::Entropy { reason: e.to_string() })
    }

    #[allow(clippy::disallowed_methods)]
    #[allow(clippy::expect_used)]
    fn wall_clock_millis(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("invariant: system clock is after Unix epoch (1970-01-01)")
            .as_millis() as u64
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use sim::SimEnv;

#[cfg(any(test, feature = "test-utils"))]
mod sim {
    use std::{
        sync::{
            Arc, Mutex, PoisonError,
            atomic::{AtomicU64, Ordering},
        },
        time::Duration,
    };

    use rand::{RngCore, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    use super::Environment;
    use crate::error::CryptoError;

    /// Deterministic environment for tests.
    ///
    /// Randomness comes from a seeded ChaCha20 stream and the clock only moves
    /// through [`SimEnv::advance`] / [`SimEnv::set_millis`]. Clones share the
    /// same RNG and clock.
    #[derive(Clone)]
    pub struct SimEnv {
        rng: Arc<Mutex<ChaCha20Rng>>,
        clock_millis: Arc<AtomicU64>,
    }

    impl SimEnv {
        /// Start time used by [`SimEnv::seeded`]: 2024-01-01T00:00:00Z.
        pub const DEFAULT_START_MILLIS: u64 = 1_704_067_200_000;

        /// Create an environment with the given RNG seed and the default
        /// start time.
        pub fn seeded(seed: u64) -> Self {
            Self::seeded_at(seed, Self::DEFAULT_START_MILLIS)
        }

        /// Create an environment with the given RNG seed and start time.
        pub fn seeded_at(seed: u64, start_millis: u64) -> Self {
            Self {
                rng: Arc::new(Mutex::new(ChaCha20Rng::seed_from_u64(seed))),
                clock_millis: Arc::new(AtomicU64::new(start_millis)),
            }
        }

        /// Move the clock forward.
        pub fn advance(&self, by: Duration) {
            self.clock_millis.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
        }

        /// Set the clock to an absolute Unix time in milliseconds.
        pub fn set_millis(&self, millis: u64) {
            self.clock_millis.store(millis, Ordering::SeqCst);
        }
    }

    impl Environment for SimEnv {
        fn random_bytes(&self, buffer: &mut [u8]) -> Result<(), CryptoError> {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            rng.fill_bytes(buffer);
            Ok(())
        }

        fn wall_clock_millis(&self) -> u64 {
            self.clock_millis.load(Ordering::SeqCst)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn system_env_random_bytes_are_random() {
        let env = SystemEnv::new();

        let bytes1: [u8; 32] = env.random_array().unwrap();
        let bytes2: [u8; 32] = env.random_array().unwrap();

        // Extremely unlikely to be equal if random
        assert_ne!(bytes1, bytes2, "Random bytes should differ");
    }

    #[test]
    fn system_env_clock_is_after_2020() {
        let env = SystemEnv::new();
        assert!(env.wall_clock_secs() > 1_600_000_000);
        assert_eq!(env.wall_clock_secs(), env.wall_clock_millis() / 1000);
    }

    #[test]
    fn sim_env_same_seed_same_bytes() {
        let a = SimEnv::seeded(7);
        let b = SimEnv::seeded(7);

        let bytes_a: [u8; 16] = a.random_array().unwrap();
        let bytes_b: [u8; 16] = b.random_array().unwrap();

        assert_eq!(bytes_a, bytes_b);
    }

    #[test]
    fn sim_env_clock_moves_only_when_advanced() {
        let env = SimEnv::seeded(0);
        let start = env.wall_clock_millis();
        assert_eq!(env.wall_clock_millis(), start);

        env.advance(Duration::from_millis(1500));
        assert_eq!(env.wall_clock_millis(), start + 1500);

        env.set_millis(42_000);
        assert_eq!(env.wall_clock_secs(), 42);
    }

    #[test]
    fn sim_env_clones_share_clock() {
        let env = SimEnv::seeded(0);
        let clone = env.clone();

        env.advance(Duration::from_secs(5));
        assert_eq!(clone.wall_clock_millis(), env.wall_clock_millis());
    }
}
