use std::{
    backtrace::{Backtrace, BacktraceStatus},
    fmt::{Display, Formatter},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use uuid::Uuid;

/// Serialized metadata above this size is replaced by a truncation marker.
pub const MAX_METADATA_BYTES: usize = 10_240;

pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    #[default]
    Info,
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// Where the notification was raised from, when the host knows it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationContext {
    pub environment: Option<String>,
    pub url: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub message: String,
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Notification {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            UNKNOWN_ERROR_MESSAGE.to_string()
        } else {
            message
        };

        Self {
            id: Uuid::new_v4(),
            message,
            severity,
            timestamp: Utc::now(),
            stack: None,
            metadata: None,
            environment: None,
            url: None,
            user_agent: None,
        }
    }

    pub fn with_stack(mut self, stack: Option<String>) -> Self {
        self.stack = stack;
        self
    }

    pub fn with_metadata(mut self, metadata: Option<Map<String, Value>>) -> Self {
        self.metadata = metadata.map(bound_metadata);
        self
    }

    pub fn with_context(mut self, context: &NotificationContext) -> Self {
        self.environment = context.environment.clone();
        self.url = context.url.clone();
        self.user_agent = context.user_agent.clone();
        self
    }

    pub fn timestamp_iso(&self) -> String {
        self.timestamp
            .to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
    }
}

fn bound_metadata(metadata: Map<String, Value>) -> Map<String, Value> {
    let size = serde_json::to_string(&metadata)
        .map(|s| s.len())
        .unwrap_or(0);

    if size <= MAX_METADATA_BYTES {
        return metadata;
    }

    let mut truncated = Map::new();
    truncated.insert("_truncated".to_string(), json!(true));
    truncated.insert("_originalSize".to_string(), json!(size));
    truncated
}

/// An error handed to `capture_exception`, normalised into message and stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedError {
    pub message: String,
    pub stack: Option<String>,
}

impl CapturedError {
    /// Builds a synthetic error from a plain message.
    pub fn from_message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack: captured_backtrace(),
        }
    }

    pub fn from_std(error: &(dyn std::error::Error + 'static)) -> Self {
        let mut stack = String::new();
        let mut source = error.source();
        while let Some(cause) = source {
            stack.push_str(&format!("Caused by: {}\n", cause));
            source = cause.source();
        }
        if let Some(backtrace) = captured_backtrace() {
            stack.push_str(&backtrace);
        }

        Self {
            message: error.to_string(),
            stack: (!stack.is_empty()).then(|| stack.trim_end().to_string()),
        }
    }
}

fn captured_backtrace() -> Option<String> {
    let backtrace = Backtrace::capture();
    match backtrace.status() {
        BacktraceStatus::Captured => Some(backtrace.to_string()),
        _ => None,
    }
}

impl From<&str> for CapturedError {
    fn from(message: &str) -> Self {
        Self::from_message(message)
    }
}

impl From<String> for CapturedError {
    fn from(message: String) -> Self {
        Self::from_message(message)
    }
}

impl From<&anyhow::Error> for CapturedError {
    fn from(error: &anyhow::Error) -> Self {
        let stack = error
            .chain()
            .skip(1)
            .map(|cause| format!("Caused by: {}", cause))
            .collect::<Vec<_>>();

        let mut stack = stack.join("\n");
        let backtrace = error.backtrace();
        if backtrace.status() == BacktraceStatus::Captured {
            if !stack.is_empty() {
                stack.push('\n');
            }
            stack.push_str(&backtrace.to_string());
        }

        Self {
            message: error.to_string(),
            stack: (!stack.is_empty()).then_some(stack),
        }
    }
}

impl From<anyhow::Error> for CapturedError {
    fn from(error: anyhow::Error) -> Self {
        Self::from(&error)
    }
}
