use std::{
    future::Future,
    sync::{Mutex, MutexGuard},
};

use anyhow::{Error, Result};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::{
    clients::circuit_breaker::CircuitBreaker,
    error::DeliveryError,
    models::{
        circuit_breaker::{CircuitBreakerConfig, CircuitState},
        retry::RetryConfig,
    },
    utils::backoff_delay,
};

/// Runs an operation with bounded retries, exponential backoff and a circuit
/// breaker. One instance per provider.
#[derive(Debug)]
pub struct RetryManager {
    name: String,
    config: RetryConfig,
    circuit_breaker: Mutex<CircuitBreaker>,
}

impl RetryManager {
    pub fn new(name: impl Into<String>, config: RetryConfig) -> Self {
        let name = name.into();

        Self {
            circuit_breaker: Mutex::new(CircuitBreaker::new(
                name.clone(),
                CircuitBreakerConfig::default(),
            )),
            name,
            config,
        }
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.breaker().state()
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.breaker().consecutive_failures()
    }

    fn breaker(&self) -> MutexGuard<'_, CircuitBreaker> {
        // The breaker holds plain counters, so a poisoned lock is still usable.
        self.circuit_breaker
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub async fn execute<F, Fut, T>(&self, operation: F) -> Result<T, Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        self.execute_with_retry(operation, |_, _| {}).await
    }

    /// Invokes `operation` at most `max_attempts` times, never while the
    /// breaker is open. `on_retry` receives the 1-based attempt number and
    /// the error of every failed attempt.
    pub async fn execute_with_retry<F, Fut, T, R>(
        &self,
        mut operation: F,
        mut on_retry: R,
    ) -> Result<T, Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
        R: FnMut(u32, &Error),
    {
        if !self.breaker().allow_request() {
            return Err(DeliveryError::CircuitOpen {
                provider: self.name.clone(),
            }
            .into());
        }

        let mut attempt_index = 0;

        loop {
            match operation().await {
                Ok(result) => {
                    self.breaker().record_success();
                    if attempt_index > 0 {
                        info!(
                            service = %self.name,
                            attempt = attempt_index + 1,
                            max_attempts = self.config.max_attempts,
                            "Retry succeeded"
                        );
                    }
                    return Ok(result);
                }
                Err(e) => {
                    self.breaker().record_failure();
                    on_retry(attempt_index + 1, &e);

                    if attempt_index + 1 >= self.config.max_attempts {
                        warn!(
                            service = %self.name,
                            max_attempts = self.config.max_attempts,
                            error = %e,
                            "Retry failed after exhausting all attempts"
                        );
                        self.breaker().trip_if_exhausted();
                        return Err(e);
                    }

                    let delay = backoff_delay(&self.config, attempt_index);
                    debug!(
                        service = %self.name,
                        attempt = attempt_index + 1,
                        max_attempts = self.config.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retry attempt failed, backing off"
                    );

                    sleep(delay).await;
                    attempt_index += 1;
                }
            }
        }
    }
}
