//! Retry policy for upstream calls.

use std::time::Duration;

use backoff::ExponentialBackoff;

use crate::config::Config;
use crate::error::ConfigError;

// == Retry Policy ==
/// Bounds on how long a single fetch may keep the upstream busy.
///
/// The delay before retry `n` (zero-based) is `base_delay * 2^n`, capped
/// at `max_delay`. No jitter is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per fetch, first try included
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Timeout applied to each attempt on its own
    pub attempt_timeout: Duration,
}

impl RetryPolicy {
    pub fn new(
        max_attempts: u32,
        base_delay: Duration,
        max_delay: Duration,
        attempt_timeout: Duration,
    ) -> Result<Self, ConfigError> {
        if max_attempts == 0 {
            return Err(ConfigError::Invalid {
                field: "max_attempts",
                reason: "must be greater than zero".to_string(),
            });
        }
        if attempt_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                field: "attempt_timeout",
                reason: "must be greater than zero".to_string(),
            });
        }
        if max_delay < base_delay {
            return Err(ConfigError::Invalid {
                field: "max_delay",
                reason: "must be at least the base delay".to_string(),
            });
        }
        Ok(Self {
            max_attempts,
            base_delay,
            max_delay,
            attempt_timeout,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.backoff_base_ms),
            Duration::from_millis(config.backoff_max_ms),
            config.api_timeout(),
        )
    }

    /// Delay schedule for one fetch. Never runs out; the attempt count
    /// bounds the loop.
    pub fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            current_interval: self.base_delay,
            initial_interval: self.base_delay,
            randomization_factor: 0.0,
            multiplier: 2.0,
            max_interval: self.max_delay,
            max_elapsed_time: None,
            ..Default::default()
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            attempt_timeout: Duration::from_secs(30),
        }
    }
}
