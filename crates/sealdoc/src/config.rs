//! Protocol configuration.

use std::time::Duration;

/// Configuration for the document protocol.
#[derive(Debug, Clone)]
pub struct ProtocolConfig {
    /// Deadline for each ledger call.
    pub ledger_timeout: Duration,
    /// Deadline for each storage upload or fetch.
    pub storage_timeout: Duration,
    /// Retry behaviour for reads and storage transfers.
    pub retry: RetryPolicy,
    /// Check fetched ciphertext against the ledger digest before decrypting.
    pub verify_digest_on_retrieve: bool,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            ledger_timeout: Duration::from_secs(30),
            storage_timeout: Duration::from_secs(60),
            retry: RetryPolicy::default(),
            verify_digest_on_retrieve: true,
        }
    }
}

/// Exponential backoff for transient failures.
///
/// Applied to ledger reads and storage transfers only. Ledger writes are
/// never retried automatically: a resubmitted `registerDocument` would
/// create a second document.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first. 1 disables retries.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_backoff: Duration,
    /// Upper bound on any single delay.
    pub max_backoff: Duration,
    /// Growth factor between delays.
    pub multiplier: u32,
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = self
            .multiplier
            .checked_pow(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.initial_backoff
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(5),
            multiplier: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_backoff_grows_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_millis(200));
        assert_eq!(policy.backoff(2), Duration::from_millis(400));
        assert_eq!(policy.backoff(3), Duration::from_millis(800));
        assert_eq!(policy.backoff(10), Duration::from_secs(5));
        assert_eq!(policy.backoff(64), Duration::from_secs(5));
    }

    #[test]
    fn test_defaults() {
        let config = ProtocolConfig::default();
        assert_eq!(config.ledger_timeout, Duration::from_secs(30));
        assert_eq!(config.storage_timeout, Duration::from_secs(60));
        assert_eq!(config.retry.max_attempts, 3);
        assert!(config.verify_digest_on_retrieve);
        assert_eq!(RetryPolicy::none().max_attempts, 1);
    }

    proptest! {
        #[test]
        fn backoff_never_exceeds_cap(attempt in 0u32..200, initial_ms in 0u64..10_000, multiplier in 0u32..16) {
            let policy = RetryPolicy {
                initial_backoff: Duration::from_millis(initial_ms),
                multiplier,
                ..RetryPolicy::default()
            };
            prop_assert!(policy.backoff(attempt) <= policy.max_backoff);
        }

        #[test]
        fn backoff_is_monotone(attempt in 1u32..100) {
            let policy = RetryPolicy::default();
            prop_assert!(policy.backoff(attempt) <= policy.backoff(attempt + 1));
        }
    }
}
