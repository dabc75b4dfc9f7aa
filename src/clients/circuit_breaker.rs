use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::models::circuit_breaker::{CircuitBreakerConfig, CircuitState};

/// Failure counter and open/closed state for a single provider.
///
/// Owned by one `RetryManager`; never shared between providers.
#[derive(Debug)]
pub struct CircuitBreaker {
    service_name: String,
    config: CircuitBreakerConfig,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
}

impl CircuitBreaker {
    pub fn new(service_name: String, config: CircuitBreakerConfig) -> Self {
        debug!(service = %service_name, "Circuit breaker initialized");

        Self {
            service_name,
            config,
            consecutive_failures: 0,
            opened_at: None,
        }
    }

    /// Returns whether a call may proceed. An open breaker whose reset window
    /// has elapsed closes and clears its failure counter here.
    pub fn allow_request(&mut self) -> bool {
        let Some(opened_at) = self.opened_at else {
            return true;
        };

        if opened_at.elapsed() >= self.config.reset_window {
            info!(service = %self.service_name, "Circuit breaker reset window elapsed, closing");
            self.opened_at = None;
            self.consecutive_failures = 0;
            return true;
        }

        warn!(service = %self.service_name, "Circuit breaker is open, rejecting request");
        false
    }

    pub fn record_success(&mut self) {
        if self.consecutive_failures > 0 {
            debug!(
                service = %self.service_name,
                failures = self.consecutive_failures,
                "Circuit breaker failure count cleared"
            );
        }
        self.consecutive_failures = 0;
    }

    pub fn record_failure(&mut self) -> u32 {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        debug!(
            service = %self.service_name,
            failures = self.consecutive_failures,
            threshold = self.config.failure_threshold,
            "Circuit breaker failure recorded"
        );
        self.consecutive_failures
    }

    /// Opens the breaker if the failure threshold has been reached. Called once
    /// a call has exhausted its attempts.
    pub fn trip_if_exhausted(&mut self) -> bool {
        if self.consecutive_failures < self.config.failure_threshold || self.opened_at.is_some() {
            return false;
        }

        self.opened_at = Some(Instant::now());
        warn!(
            service = %self.service_name,
            failures = self.consecutive_failures,
            reset_window_secs = self.config.reset_window.as_secs(),
            "Circuit breaker opened due to consecutive failures"
        );
        true
    }

    pub fn state(&self) -> CircuitState {
        match self.opened_at {
            Some(opened_at) if opened_at.elapsed() < self.config.reset_window => CircuitState::Open,
            _ => CircuitState::Closed,
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }
}
