use std::fmt::{Display, Formatter, Result};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Sent,
    Failed,
    CircuitOpen,
}

impl Display for DeliveryStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            DeliveryStatus::Sent => write!(f, "sent"),
            DeliveryStatus::Failed => write!(f, "failed"),
            DeliveryStatus::CircuitOpen => write!(f, "circuit_open"),
        }
    }
}

/// Result of handing one notification to one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryOutcome {
    pub provider: String,
    pub status: DeliveryStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeliveryOutcome {
    pub fn sent(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            status: DeliveryStatus::Sent,
            error: None,
        }
    }

    pub fn failed(provider: impl Into<String>, status: DeliveryStatus, error: String) -> Self {
        Self {
            provider: provider.into(),
            status,
            error: Some(error),
        }
    }

    pub fn is_sent(&self) -> bool {
        self.status == DeliveryStatus::Sent
    }
}
