//! Retry policy for restart cycles that fail to bootstrap.

use std::time::Duration;

use kh_domain::config::ReconnectConfig;

/// Jittered exponential back-off between bootstrap attempts.
#[derive(Debug, Clone)]
pub struct ReconnectBackoff {
    pub initial_delay: Duration,
    /// Cap applied before jitter.
    pub max_delay: Duration,
    pub backoff_factor: f64,
    /// Failed attempts tolerated before the linker goes idle.
    /// `0` means unlimited retries.
    pub max_attempts: u32,
}

impl Default for ReconnectBackoff {
    fn default() -> Self {
        Self::from(&ReconnectConfig::default())
    }
}

impl From<&ReconnectConfig> for ReconnectBackoff {
    fn from(cfg: &ReconnectConfig) -> Self {
        Self {
            initial_delay: Duration::from_millis(cfg.initial_delay_ms),
            max_delay: Duration::from_millis(cfg.max_delay_ms),
            backoff_factor: cfg.backoff_factor,
            max_attempts: cfg.max_attempts,
        }
    }
}

impl ReconnectBackoff {
    /// No delay and unlimited attempts.
    pub fn immediate() -> Self {
        Self {
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_factor: 1.0,
            max_attempts: 0,
        }
    }

    /// Delay before retry number `attempt` (0-indexed).
    ///
    /// Half of the exponential ceiling is fixed and the other half is
    /// spread per attempt, so the delay never exceeds `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let half = self.ceiling(attempt) / 2;
        half + half.mul_f64(spread(attempt))
    }

    /// Whether `failures` consecutive failed attempts exhaust the policy.
    pub fn should_give_up(&self, failures: u32) -> bool {
        self.max_attempts > 0 && failures >= self.max_attempts
    }

    fn ceiling(&self, attempt: u32) -> Duration {
        let exp = i32::try_from(attempt).unwrap_or(i32::MAX);
        let grown = self.initial_delay.as_secs_f64() * self.backoff_factor.max(1.0).powi(exp);
        Duration::try_from_secs_f64(grown)
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }
}

/// Deterministic fraction in [0, 1) mixed from the attempt number.
fn spread(attempt: u32) -> f64 {
    let mut x = u64::from(attempt).wrapping_add(0x9E37_79B9_7F4A_7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^= x >> 31;
    (x >> 11) as f64 / (1u64 << 53) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_from_config() {
        let cfg = ReconnectConfig {
            initial_delay_ms: 250,
            max_delay_ms: 4_000,
            backoff_factor: 3.0,
            max_attempts: 7,
        };
        let b = ReconnectBackoff::from(&cfg);
        assert_eq!(b.initial_delay, Duration::from_millis(250));
        assert_eq!(b.max_delay, Duration::from_secs(4));
        assert_eq!(b.max_attempts, 7);
    }

    #[test]
    fn delay_grows_then_caps() {
        let b = ReconnectBackoff {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_factor: 2.0,
            max_attempts: 0,
        };
        assert!(b.delay_for_attempt(1) > b.delay_for_attempt(0));
        assert!(b.delay_for_attempt(2) > b.delay_for_attempt(1));
        for attempt in [10, 40, u32::MAX] {
            let d = b.delay_for_attempt(attempt);
            assert!(d >= Duration::from_secs(15) && d <= Duration::from_secs(30));
        }
    }

    #[test]
    fn each_delay_stays_within_its_ceiling() {
        let b = ReconnectBackoff::default();
        for attempt in 0..6 {
            let ceiling = Duration::from_secs(1 << attempt);
            let d = b.delay_for_attempt(attempt);
            assert!(d >= ceiling / 2 && d <= ceiling, "attempt {attempt}: {d:?}");
        }
    }

    #[test]
    fn immediate_never_waits() {
        let b = ReconnectBackoff::immediate();
        for attempt in 0..5 {
            assert_eq!(b.delay_for_attempt(attempt), Duration::ZERO);
        }
        assert!(!b.should_give_up(u32::MAX));
    }

    #[test]
    fn limited_policy_gives_up() {
        let b = ReconnectBackoff {
            max_attempts: 3,
            ..Default::default()
        };
        assert!(!b.should_give_up(2));
        assert!(b.should_give_up(3));
    }
}
