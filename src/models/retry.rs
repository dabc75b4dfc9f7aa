use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const MIN_ATTEMPTS: u32 = 1;
pub const MAX_ATTEMPTS: u32 = 5;
pub const MIN_BASE_DELAY_MS: u64 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 10_000,
            jitter: true,
        }
    }
}

impl RetryConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_ATTEMPTS..=MAX_ATTEMPTS).contains(&self.max_attempts) {
            return Err(ConfigError::InvalidRetryPolicy(format!(
                "max_attempts must be between {} and {}, got {}",
                MIN_ATTEMPTS, MAX_ATTEMPTS, self.max_attempts
            )));
        }

        if self.base_delay_ms < MIN_BASE_DELAY_MS {
            return Err(ConfigError::InvalidRetryPolicy(format!(
                "base_delay_ms must be at least {}, got {}",
                MIN_BASE_DELAY_MS, self.base_delay_ms
            )));
        }

        if self.max_delay_ms < self.base_delay_ms {
            return Err(ConfigError::InvalidRetryPolicy(format!(
                "max_delay_ms ({}) must not be below base_delay_ms ({})",
                self.max_delay_ms, self.base_delay_ms
            )));
        }

        Ok(())
    }
}
