use std::time::Duration;

use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::{debug, info};

pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTPS POST primitive used by the providers: send JSON, get status and body back.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_json(&self, url: &str, payload: &Value) -> Result<TransportResponse, Error>;
}

fn build_client(timeout: Duration) -> Result<Client, Error> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))
}

// Webhook URLs carry their token in the path, so request errors lose the URL.
fn redact_url(error: reqwest::Error) -> Error {
    Error::from(error.without_url())
}

async fn read_response(response: reqwest::Response) -> Result<TransportResponse, Error> {
    let status = response.status().as_u16();
    let body = response.text().await.map_err(redact_url)?;
    Ok(TransportResponse { status, body })
}

/// Posts straight to the webhook URL.
pub struct HttpTransport {
    http_client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, Error> {
        info!(timeout_ms = timeout.as_millis() as u64, "HTTP transport initialized");

        Ok(Self {
            http_client: build_client(timeout)?,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_json(&self, url: &str, payload: &Value) -> Result<TransportResponse, Error> {
        debug!("Posting webhook payload directly");

        let response = self
            .http_client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(redact_url)?;
        read_response(response).await
    }
}

/// Posts through a server-side relay that forwards the payload to the webhook.
///
/// The relay receives `{"webhookUrl": ..., "payload": ...}` and is expected to
/// answer with the upstream status and body.
pub struct RelayTransport {
    http_client: Client,
    relay_url: String,
}

impl RelayTransport {
    pub fn new(relay_url: impl Into<String>, timeout: Duration) -> Result<Self, Error> {
        let relay_url = relay_url.into();
        info!(relay_url = %relay_url, "Relay transport initialized");

        Ok(Self {
            http_client: build_client(timeout)?,
            relay_url,
        })
    }
}

#[async_trait]
impl Transport for RelayTransport {
    async fn post_json(&self, url: &str, payload: &Value) -> Result<TransportResponse, Error> {
        debug!(relay_url = %self.relay_url, "Posting webhook payload through relay");

        let envelope = json!({
            "webhookUrl": url,
            "payload": payload,
        });

        let response = self
            .http_client
            .post(&self.relay_url)
            .json(&envelope)
            .send()
            .await
            .map_err(redact_url)?;
        read_response(response).await
    }
}
