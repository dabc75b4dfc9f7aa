use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::circuit_breaker::CircuitState;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub timestamp: DateTime<Utc>,
    pub providers: HashMap<String, ProviderHealth>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderHealth {
    pub status: HealthStatus,
    pub circuit_breaker: CircuitState,
    pub consecutive_failures: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProviderHealth {
    pub fn from_circuit(state: CircuitState, consecutive_failures: u32) -> Self {
        match state {
            CircuitState::Closed => Self {
                status: HealthStatus::Healthy,
                circuit_breaker: state,
                consecutive_failures,
                error: None,
            },
            CircuitState::Open => Self {
                status: HealthStatus::Unhealthy,
                circuit_breaker: state,
                consecutive_failures,
                error: Some("Circuit breaker open, deliveries suspended".to_string()),
            },
        }
    }
}
