use std::sync::Arc;

use anyhow::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    clients::{
        NotificationProvider, WebhookDelivery,
        fallback::FallbackSink,
        transport::{Transport, TransportResponse},
    },
    error::{ConfigError, DeliveryError},
    models::{
        circuit_breaker::CircuitState,
        discord::{DiscordEmbed, DiscordField, DiscordFooter, DiscordPayload},
        notification::{Notification, Severity},
        retry::RetryConfig,
        validation::validate_webhook_url,
    },
    utils::truncate,
};

pub const PROVIDER_NAME: &str = "discord";

const WEBHOOK_HOSTS: &[&str] = &["discord.com", "discordapp.com"];
const WEBHOOK_PATH: &str = "/api/webhooks/";

const MAX_DESCRIPTION_CHARS: usize = 4096;
const MAX_FIELD_CHARS: usize = 1024;
// Room for the code fence around stack and metadata fields.
const MAX_CODE_CHARS: usize = MAX_FIELD_CHARS - 16;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscordConfig {
    pub webhook_url: String,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
}

impl DiscordConfig {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            username: None,
            avatar_url: None,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_webhook_url(
            PROVIDER_NAME,
            Some(&self.webhook_url),
            WEBHOOK_HOSTS,
            WEBHOOK_PATH,
        )
        .map(|_| ())
    }
}

pub struct DiscordProvider {
    config: DiscordConfig,
    delivery: WebhookDelivery,
}

impl DiscordProvider {
    pub fn new(
        config: DiscordConfig,
        retry_config: RetryConfig,
        transport: Arc<dyn Transport>,
        fallback: Arc<dyn FallbackSink>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        retry_config.validate()?;

        info!(
            max_attempts = retry_config.max_attempts,
            username = ?config.username,
            "Discord provider initialized"
        );

        Ok(Self {
            delivery: WebhookDelivery::new(
                PROVIDER_NAME,
                config.webhook_url.clone(),
                retry_config,
                transport,
                fallback,
            ),
            config,
        })
    }

    fn color(severity: Severity) -> u32 {
        match severity {
            Severity::Error => 0xe74c3c,   // Red
            Severity::Warning => 0xf39c12, // Orange
            Severity::Info => 0x3498db,    // Blue
        }
    }

    fn title(notification: &Notification) -> String {
        let label = match notification.severity {
            Severity::Error => "🚨 Error",
            Severity::Warning => "⚠️ Warning",
            Severity::Info => "ℹ️ Info",
        };

        match &notification.environment {
            Some(environment) => format!("{} in {}", label, environment),
            None => label.to_string(),
        }
    }

    fn build_payload(&self, notification: &Notification) -> DiscordPayload {
        let mut fields = vec![
            DiscordField {
                name: "Severity".to_string(),
                value: notification.severity.to_string(),
                inline: true,
            },
            DiscordField {
                name: "Environment".to_string(),
                value: notification
                    .environment
                    .clone()
                    .unwrap_or_else(|| "unknown".to_string()),
                inline: true,
            },
        ];

        if let Some(url) = &notification.url {
            fields.push(DiscordField {
                name: "URL".to_string(),
                value: truncate(url, MAX_FIELD_CHARS),
                inline: false,
            });
        }

        if let Some(user_agent) = &notification.user_agent {
            fields.push(DiscordField {
                name: "User Agent".to_string(),
                value: truncate(user_agent, MAX_FIELD_CHARS),
                inline: false,
            });
        }

        if let Some(stack) = &notification.stack {
            fields.push(DiscordField {
                name: "Stack Trace".to_string(),
                value: format!("```\n{}\n```", truncate(stack, MAX_CODE_CHARS)),
                inline: false,
            });
        }

        if let Some(metadata) = notification.metadata.as_ref().filter(|m| !m.is_empty()) {
            let rendered = serde_json::to_string_pretty(metadata).unwrap_or_default();
            fields.push(DiscordField {
                name: "Metadata".to_string(),
                value: format!("```json\n{}\n```", truncate(&rendered, MAX_CODE_CHARS)),
                inline: false,
            });
        }

        DiscordPayload {
            username: self.config.username.clone(),
            avatar_url: self.config.avatar_url.clone(),
            embeds: vec![DiscordEmbed {
                title: Self::title(notification),
                description: truncate(&notification.message, MAX_DESCRIPTION_CHARS),
                color: Self::color(notification.severity),
                timestamp: notification.timestamp_iso(),
                fields,
                footer: DiscordFooter {
                    text: format!("error-notifier • {}", notification.id),
                },
            }],
        }
    }

    fn accept(response: TransportResponse) -> Result<(), Error> {
        if response.is_success() {
            Ok(())
        } else {
            Err(DeliveryError::Status {
                status: response.status,
                body: response.body,
            }
            .into())
        }
    }
}

#[async_trait]
impl NotificationProvider for DiscordProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn validate_config(&self) -> bool {
        self.config.validate().is_ok()
    }

    async fn send(&self, notification: &Notification) -> Result<(), Error> {
        let payload = self.build_payload(notification);
        self.delivery
            .send(notification, &payload, Self::accept)
            .await
    }

    fn circuit_state(&self) -> CircuitState {
        self.delivery.circuit_state()
    }

    fn consecutive_failures(&self) -> u32 {
        self.delivery.consecutive_failures()
    }
}
