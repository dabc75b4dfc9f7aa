use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Cumulative failed attempts after which an exhausted call opens the breaker.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;

/// How long an open breaker rejects calls before closing again.
pub const DEFAULT_RESET_WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CircuitState {
    Closed,
    Open,
}

impl CircuitState {
    pub fn as_str(&self) -> &str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub reset_window: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            reset_window: DEFAULT_RESET_WINDOW,
        }
    }
}
