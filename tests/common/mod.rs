#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicU32, Ordering},
};

use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use error_notifier::{
    clients::{
        fallback::FallbackSink,
        transport::{Transport, TransportResponse},
    },
    config::Config,
    models::notification::Notification,
};
use serde_json::Value;
use tracing::{
    Event, Subscriber,
    field::{Field, Visit},
};
use tracing_subscriber::{Layer, layer::Context};

pub const DISCORD_WEBHOOK: &str = "https://discord.com/api/webhooks/123456/token-abc";
pub const SLACK_WEBHOOK: &str = "https://hooks.slack.com/services/T000/B000/XXXXXXXX";

type Responder = dyn Fn(&str, u32) -> Result<TransportResponse, Error> + Send + Sync;

/// Transport double that records every post and answers through `responder`,
/// which receives the URL and the 0-based call index for that URL's host.
pub struct MockTransport {
    posts: Mutex<Vec<(String, Value)>>,
    discord_calls: AtomicU32,
    slack_calls: AtomicU32,
    responder: Box<Responder>,
}

impl MockTransport {
    pub fn new<F>(responder: F) -> Arc<Self>
    where
        F: Fn(&str, u32) -> Result<TransportResponse, Error> + Send + Sync + 'static,
    {
        Arc::new(Self {
            posts: Mutex::new(Vec::new()),
            discord_calls: AtomicU32::new(0),
            slack_calls: AtomicU32::new(0),
            responder: Box::new(responder),
        })
    }

    /// Discord answers 204, Slack answers `ok`.
    pub fn healthy() -> Arc<Self> {
        Self::new(|url, _| Ok(success_for(url)))
    }

    /// Discord always answers 500, Slack answers `ok`.
    pub fn failing_discord() -> Arc<Self> {
        Self::new(|url, _| {
            if url.contains("discord") {
                Ok(response(500, "internal error"))
            } else {
                Ok(response(200, "ok"))
            }
        })
    }

    pub fn unreachable() -> Arc<Self> {
        Self::new(|_, _| Err(anyhow!("connection refused")))
    }

    pub fn discord_calls(&self) -> u32 {
        self.discord_calls.load(Ordering::SeqCst)
    }

    pub fn slack_calls(&self) -> u32 {
        self.slack_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> u32 {
        self.discord_calls() + self.slack_calls()
    }

    pub fn payloads_to(&self, host_fragment: &str) -> Vec<Value> {
        self.posts
            .lock()
            .unwrap()
            .iter()
            .filter(|(url, _)| url.contains(host_fragment))
            .map(|(_, payload)| payload.clone())
            .collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn post_json(&self, url: &str, payload: &Value) -> Result<TransportResponse, Error> {
        self.posts
            .lock()
            .unwrap()
            .push((url.to_string(), payload.clone()));

        let counter = if url.contains("discord") {
            &self.discord_calls
        } else {
            &self.slack_calls
        };
        let index = counter.fetch_add(1, Ordering::SeqCst);

        (self.responder)(url, index)
    }
}

pub fn response(status: u16, body: &str) -> TransportResponse {
    TransportResponse {
        status,
        body: body.to_string(),
    }
}

pub fn success_for(url: &str) -> TransportResponse {
    if url.contains("discord") {
        response(204, "")
    } else {
        response(200, "ok")
    }
}

/// Fallback sink that keeps what it was handed.
#[derive(Default)]
pub struct RecordingFallback {
    reports: Mutex<Vec<(String, Notification, String)>>,
}

impl RecordingFallback {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reports(&self) -> Vec<(String, Notification, String)> {
        self.reports.lock().unwrap().clone()
    }
}

impl FallbackSink for RecordingFallback {
    fn report(&self, provider: &str, notification: &Notification, error: &Error) {
        self.reports.lock().unwrap().push((
            provider.to_string(),
            notification.clone(),
            error.to_string(),
        ));
    }
}

pub fn test_config() -> Config {
    Config {
        environment: Some("test".to_string()),
        discord_webhook_url: Some(DISCORD_WEBHOOK.to_string()),
        slack_webhook_url: Some(SLACK_WEBHOOK.to_string()),
        max_retry_attempts: 3,
        base_retry_delay_ms: 100,
        max_retry_delay_ms: 1000,
        retry_jitter: false,
        ..Config::default()
    }
}

/// Tracing layer that keeps the message of every event it sees.
#[derive(Clone, Default)]
pub struct EventRecorder {
    messages: Arc<Mutex<Vec<String>>>,
}

impl EventRecorder {
    pub fn count(&self, message: &str) -> usize {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.as_str() == message)
            .count()
    }
}

struct MessageVisitor(Option<String>);

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.0 = Some(value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = Some(format!("{:?}", value));
        }
    }
}

impl<S: Subscriber> Layer<S> for EventRecorder {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor(None);
        event.record(&mut visitor);
        if let Some(message) = visitor.0 {
            self.messages.lock().unwrap().push(message);
        }
    }
}
