use anyhow::Error;
use serde_json::json;

use crate::models::notification::Notification;

/// Last-resort reporter invoked when a provider gives up on a notification.
pub trait FallbackSink: Send + Sync {
    fn report(&self, provider: &str, notification: &Notification, error: &Error);
}

/// Writes one JSON line per undelivered notification to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleFallback;

impl FallbackSink for ConsoleFallback {
    fn report(&self, provider: &str, notification: &Notification, error: &Error) {
        let entry = json!({
            "level": "error",
            "event": "notification_undelivered",
            "provider": provider,
            "id": notification.id,
            "message": notification.message,
            "severity": notification.severity,
            "timestamp": notification.timestamp_iso(),
            "environment": notification.environment,
            "stack": notification.stack,
            "error": error.to_string(),
        });

        eprintln!("{}", entry);
    }
}
