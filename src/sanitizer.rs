use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::models::{notification::Notification, sanitization::SanitizationConfig};

pub const REDACTION_MARKER: &str = "[REDACTED]";

fn compile(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .unwrap_or_else(|e| panic!("invalid built-in pattern {}: {}", pattern, e))
}

/// Sensitive values inside free text.
static DEFAULT_VALUE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#"\b(?:password|passwd|pwd)\b["']?\s*[:=]\s*["']?[^\s"',;&})\]]+"#,
        r"\bbearer\s+[a-z0-9\-._~+/]+=*",
        r#"\b(?:token|jwt|api[_-]?key|access[_-]?token|refresh[_-]?token)\b["']?\s*[:=]\s*["']?[^\s"',;&})\]]+"#,
        r"\beyJ[a-z0-9_-]+\.[a-z0-9_-]+\.[a-z0-9_-]+",
        r#"\b(?:secret|client[_-]?secret|private[_-]?key)\b["']?\s*[:=]\s*["']?[^\s"',;&})\]]+"#,
        r"-----BEGIN [A-Z ]*PRIVATE KEY-----[\s\S]*?-----END [A-Z ]*PRIVATE KEY-----",
        r"[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}",
        r"\b(?:\d{4}[- ]?){3}\d{4}\b",
        r"\b\d{3}-\d{2}-\d{4}\b",
    ]
    .iter()
    .map(|pattern| compile(pattern))
    .collect()
});

/// Mapping keys whose whole value is redacted.
static DEFAULT_KEY_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"passw(?:or)?d|^pwd$",
        r"token|bearer|jwt|api[_-]?key|authorization",
        r"secret|private[_-]?key|credential",
    ]
    .iter()
    .map(|pattern| compile(pattern))
    .collect()
});

/// Strips sensitive values out of notification content before transmission.
#[derive(Debug, Clone)]
pub struct DataSanitizer {
    enabled: bool,
    custom_patterns: Vec<Regex>,
    exclude_defaults: bool,
}

impl DataSanitizer {
    pub fn new(config: &SanitizationConfig) -> Self {
        let custom_patterns = config
            .custom_patterns
            .iter()
            .filter_map(|source| {
                match RegexBuilder::new(source).case_insensitive(true).build() {
                    Ok(regex) => Some(regex),
                    Err(e) => {
                        warn!(pattern = %source, error = %e, "Ignoring invalid sanitization pattern");
                        None
                    }
                }
            })
            .collect::<Vec<_>>();

        debug!(
            enabled = config.enabled,
            custom_patterns = custom_patterns.len(),
            exclude_defaults = config.exclude_defaults,
            "Data sanitizer initialized"
        );

        Self {
            enabled: config.enabled,
            custom_patterns,
            exclude_defaults: config.exclude_defaults,
        }
    }

    pub fn sanitize(&self, value: &Value) -> Value {
        if !self.enabled {
            return value.clone();
        }

        match value {
            Value::String(s) => Value::String(self.sanitize_str(s)),
            Value::Array(items) => Value::Array(items.iter().map(|item| self.sanitize(item)).collect()),
            Value::Object(map) => Value::Object(self.sanitize_map(map)),
            other => other.clone(),
        }
    }

    pub fn sanitize_str(&self, text: &str) -> String {
        if !self.enabled {
            return text.to_string();
        }

        let mut result = text.to_string();

        for pattern in &self.custom_patterns {
            result = pattern.replace_all(&result, REDACTION_MARKER).into_owned();
        }

        if !self.exclude_defaults {
            for pattern in DEFAULT_VALUE_PATTERNS.iter() {
                result = pattern.replace_all(&result, REDACTION_MARKER).into_owned();
            }
        }

        result
    }

    pub fn sanitize_map(&self, map: &Map<String, Value>) -> Map<String, Value> {
        if !self.enabled {
            return map.clone();
        }

        map.iter()
            .map(|(key, value)| {
                let value = if self.is_sensitive_key(key) {
                    Value::String(REDACTION_MARKER.to_string())
                } else {
                    self.sanitize(value)
                };
                (key.clone(), value)
            })
            .collect()
    }

    fn is_sensitive_key(&self, key: &str) -> bool {
        if self.custom_patterns.iter().any(|p| p.is_match(key)) {
            return true;
        }

        !self.exclude_defaults && DEFAULT_KEY_PATTERNS.iter().any(|p| p.is_match(key))
    }

    /// Returns a copy of the notification with every free-text field and the
    /// metadata sanitized. Identity, severity and timestamp are left alone.
    pub fn sanitize_notification(&self, notification: &Notification) -> Notification {
        debug!(
            notification_id = %notification.id,
            enabled = self.enabled,
            "Sanitizing notification"
        );

        if !self.enabled {
            return notification.clone();
        }

        let sanitize_opt = |field: &Option<String>| field.as_deref().map(|s| self.sanitize_str(s));

        Notification {
            id: notification.id,
            message: self.sanitize_str(&notification.message),
            severity: notification.severity,
            timestamp: notification.timestamp,
            stack: sanitize_opt(&notification.stack),
            metadata: notification.metadata.as_ref().map(|m| self.sanitize_map(m)),
            environment: sanitize_opt(&notification.environment),
            url: sanitize_opt(&notification.url),
            user_agent: sanitize_opt(&notification.user_agent),
        }
    }
}
