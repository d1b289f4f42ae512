//! Production Environment implementation using system time and RNG.
//!
//! `SystemEnv` is the production implementation of the Environment trait:
//! ledger timestamps come from the system clock and randomness (handle
//! nonces, sealing keys) from the OS. Behavior is non-deterministic; tests
//! use the seeded simulation environment instead.

use ghostnet_core::Environment;

/// Production environment using system time and cryptographic RNG.
///
/// # Security
///
/// The RNG uses getrandom which provides OS-level cryptographic randomness
/// (e.g., /dev/urandom on Linux, `BCryptGenRandom` on Windows). Suitable for
/// nonces, ephemeral keys and coprocessor secrets.
///
/// # Panics
///
/// Panics if the OS RNG fails. A node without functioning cryptographic
/// randomness cannot seal keys safely. RNG failure is extremely rare
/// (indicates OS-level issues).
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer)
            .expect("invariant: OS RNG failure is unrecoverable - node cannot operate securely");
    }

    #[allow(clippy::expect_used)]
    fn wall_clock_secs(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("invariant: system clock is after Unix epoch (1970-01-01)")
            .as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_env_clock_is_recent() {
        // 2023-11-14
        assert!(SystemEnv::new().wall_clock_secs() > 1_700_000_000);
    }

    #[test]
    fn system_env_clock_does_not_go_backwards() {
        let env = SystemEnv::new();
        let t1 = env.wall_clock_secs();
        let t2 = env.wall_clock_secs();
        assert!(t2 >= t1);
    }

    #[test]
    fn system_env_random_bytes_are_random() {
        let env = SystemEnv::new();

        let mut bytes1 = [0u8; 32];
        let mut bytes2 = [0u8; 32];

        env.random_bytes(&mut bytes1);
        env.random_bytes(&mut bytes2);

        // Extremely unlikely to be equal if random
        assert_ne!(bytes1, bytes2, "Random bytes should differ");
    }
}
