use std::{collections::HashMap, sync::Arc};

use chrono::Utc;
use tracing::debug;

use crate::{
    clients::NotificationProvider,
    models::health::{HealthReport, HealthStatus, ProviderHealth},
};

pub struct HealthChecker;

impl HealthChecker {
    pub fn check_all(providers: &[Arc<dyn NotificationProvider>]) -> HealthReport {
        let mut checks = HashMap::new();

        for provider in providers {
            let state = provider.circuit_state();
            let failures = provider.consecutive_failures();
            debug!(
                provider = provider.name(),
                circuit_state = state.as_str(),
                failures,
                "Circuit breaker state checked"
            );

            checks.insert(
                provider.name().to_string(),
                ProviderHealth::from_circuit(state, failures),
            );
        }

        HealthReport {
            status: Self::determine_overall_status(&checks),
            timestamp: Utc::now(),
            providers: checks,
        }
    }

    fn determine_overall_status(checks: &HashMap<String, ProviderHealth>) -> HealthStatus {
        let unhealthy = checks
            .values()
            .filter(|health| health.status == HealthStatus::Unhealthy)
            .count();

        if unhealthy == 0 {
            HealthStatus::Healthy
        } else if unhealthy < checks.len() {
            HealthStatus::Degraded
        } else {
            HealthStatus::Unhealthy
        }
    }
}
