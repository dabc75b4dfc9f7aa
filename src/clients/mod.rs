pub mod circuit_breaker;
pub mod discord;
pub mod fallback;
pub mod health;
pub mod retry;
pub mod slack;
pub mod transport;

use std::{sync::Arc, time::Duration};

use anyhow::Error;
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    clients::{
        discord::DiscordProvider,
        fallback::FallbackSink,
        retry::RetryManager,
        slack::SlackProvider,
        transport::{HttpTransport, RelayTransport, Transport, TransportResponse},
    },
    config::Config,
    error::ConfigError,
    models::{
        circuit_breaker::CircuitState, notification::Notification, retry::RetryConfig,
        validation::validate_relay_url,
    },
};

/// A destination that formats and transmits notifications.
#[async_trait]
pub trait NotificationProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Re-checks the provider's static configuration.
    fn validate_config(&self) -> bool;

    /// Delivers one notification, retrying transient failures. Errors only
    /// once retries are exhausted or the circuit breaker is open.
    async fn send(&self, notification: &Notification) -> Result<(), Error>;

    fn circuit_state(&self) -> CircuitState {
        CircuitState::Closed
    }

    fn consecutive_failures(&self) -> u32 {
        0
    }
}

/// Delivery path shared by the webhook providers. Posts through the transport
/// under the provider's retry manager and reports to the fallback sink once
/// the provider gives up.
pub struct WebhookDelivery {
    provider: &'static str,
    webhook_url: String,
    transport: Arc<dyn Transport>,
    fallback: Arc<dyn FallbackSink>,
    retry_manager: RetryManager,
}

impl WebhookDelivery {
    pub fn new(
        provider: &'static str,
        webhook_url: String,
        retry_config: RetryConfig,
        transport: Arc<dyn Transport>,
        fallback: Arc<dyn FallbackSink>,
    ) -> Self {
        Self {
            provider,
            webhook_url,
            transport,
            fallback,
            retry_manager: RetryManager::new(provider, retry_config),
        }
    }

    /// Sends `payload` for `notification`. `accept` decides whether a webhook
    /// response counts as delivered; its errors are retried.
    pub async fn send<P, A>(
        &self,
        notification: &Notification,
        payload: &P,
        accept: A,
    ) -> Result<(), Error>
    where
        P: Serialize,
        A: Fn(TransportResponse) -> Result<(), Error>,
    {
        match self.deliver(payload, &accept).await {
            Ok(()) => {
                info!(
                    provider = self.provider,
                    notification_id = %notification.id,
                    "Notification sent"
                );
                Ok(())
            }
            Err(e) => {
                self.fallback.report(self.provider, notification, &e);
                Err(e)
            }
        }
    }

    async fn deliver<P, A>(&self, payload: &P, accept: &A) -> Result<(), Error>
    where
        P: Serialize,
        A: Fn(TransportResponse) -> Result<(), Error>,
    {
        let payload = serde_json::to_value(payload)?;
        let payload = &payload;
        let transport = self.transport.as_ref();
        let webhook_url = self.webhook_url.as_str();

        self.retry_manager
            .execute_with_retry(
                move || async move {
                    let response = transport.post_json(webhook_url, payload).await?;
                    accept(response)
                },
                |attempt, e| {
                    debug!(
                        provider = self.provider,
                        attempt,
                        error = %e,
                        "Delivery attempt failed"
                    );
                },
            )
            .await
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.retry_manager.circuit_state()
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.retry_manager.consecutive_failures()
    }
}

/// Picks the direct or relayed transport according to the configuration.
pub fn build_transport(config: &Config) -> Result<Arc<dyn Transport>, ConfigError> {
    let timeout = Duration::from_millis(config.request_timeout_ms);

    let transport: Arc<dyn Transport> = match config.relay_url.as_deref() {
        Some(relay_url) if !relay_url.trim().is_empty() => {
            let relay_url = validate_relay_url(relay_url)?;
            Arc::new(
                RelayTransport::new(relay_url.as_str(), timeout)
                    .map_err(|e| ConfigError::HttpClient(e.to_string()))?,
            )
        }
        _ => Arc::new(
            HttpTransport::new(timeout).map_err(|e| ConfigError::HttpClient(e.to_string()))?,
        ),
    };

    Ok(transport)
}

/// Builds every provider the configuration names. Fails on the first invalid
/// provider, and when the logger is enabled but none is configured.
pub fn build_providers(
    config: &Config,
    transport: Arc<dyn Transport>,
    fallback: Arc<dyn FallbackSink>,
) -> Result<Vec<Arc<dyn NotificationProvider>>, ConfigError> {
    let mut providers: Vec<Arc<dyn NotificationProvider>> = Vec::new();

    if let Some(discord_config) = config.discord_config() {
        providers.push(Arc::new(DiscordProvider::new(
            discord_config,
            config.retry_config_for(discord::PROVIDER_NAME),
            Arc::clone(&transport),
            Arc::clone(&fallback),
        )?));
    }

    if let Some(slack_config) = config.slack_config() {
        providers.push(Arc::new(SlackProvider::new(
            slack_config,
            config.retry_config_for(slack::PROVIDER_NAME),
            Arc::clone(&transport),
            Arc::clone(&fallback),
        )?));
    }

    if providers.is_empty() && config.enabled {
        return Err(ConfigError::NoProviders);
    }

    Ok(providers)
}
