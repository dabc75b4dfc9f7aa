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
        notification::{Notification, Severity},
        retry::RetryConfig,
        slack::{SlackBlock, SlackPayload, SlackText},
        validation::validate_webhook_url,
    },
    utils::truncate,
};

pub const PROVIDER_NAME: &str = "slack";

const WEBHOOK_HOSTS: &[&str] = &["hooks.slack.com"];
const WEBHOOK_PATH: &str = "/services/";

/// Body Slack returns for an accepted incoming-webhook post, compared verbatim.
const ACKNOWLEDGEMENT: &str = "ok";

const MAX_HEADER_CHARS: usize = 150;
const MAX_SECTION_CHARS: usize = 3000;
const MAX_CODE_CHARS: usize = MAX_SECTION_CHARS - 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackConfig {
    pub webhook_url: String,
    pub username: Option<String>,
    pub icon_emoji: Option<String>,
    pub channel: Option<String>,
}

impl SlackConfig {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            username: None,
            icon_emoji: None,
            channel: None,
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

pub struct SlackProvider {
    config: SlackConfig,
    delivery: WebhookDelivery,
}

impl SlackProvider {
    pub fn new(
        config: SlackConfig,
        retry_config: RetryConfig,
        transport: Arc<dyn Transport>,
        fallback: Arc<dyn FallbackSink>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        retry_config.validate()?;

        info!(
            max_attempts = retry_config.max_attempts,
            channel = ?config.channel,
            "Slack provider initialized"
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

    fn header(severity: Severity) -> &'static str {
        match severity {
            Severity::Error => "🚨 Error",
            Severity::Warning => "⚠️ Warning",
            Severity::Info => "ℹ️ Info",
        }
    }

    fn build_payload(&self, notification: &Notification) -> SlackPayload {
        let environment = notification.environment.as_deref().unwrap_or("unknown");

        let mut fields = vec![
            SlackText::markdown(format!("*Severity:*\n{}", notification.severity)),
            SlackText::markdown(format!("*Environment:*\n{}", environment)),
            SlackText::markdown(format!("*Time:*\n{}", notification.timestamp_iso())),
        ];
        if let Some(url) = &notification.url {
            fields.push(SlackText::markdown(format!("*URL:*\n{}", truncate(url, 1900))));
        }

        let mut blocks = vec![
            SlackBlock::Header {
                text: SlackText::plain(truncate(
                    &format!("{} in {}", Self::header(notification.severity), environment),
                    MAX_HEADER_CHARS,
                )),
            },
            SlackBlock::Section {
                text: None,
                fields,
            },
            SlackBlock::Section {
                text: Some(SlackText::markdown(truncate(
                    &notification.message,
                    MAX_SECTION_CHARS,
                ))),
                fields: Vec::new(),
            },
        ];

        if let Some(stack) = &notification.stack {
            blocks.push(SlackBlock::Section {
                text: Some(SlackText::markdown(format!(
                    "*Stack trace:*\n```{}```",
                    truncate(stack, MAX_CODE_CHARS)
                ))),
                fields: Vec::new(),
            });
        }

        if let Some(metadata) = notification.metadata.as_ref().filter(|m| !m.is_empty()) {
            let rendered = serde_json::to_string_pretty(metadata).unwrap_or_default();
            blocks.push(SlackBlock::Section {
                text: Some(SlackText::markdown(format!(
                    "*Metadata:*\n```{}```",
                    truncate(&rendered, MAX_CODE_CHARS)
                ))),
                fields: Vec::new(),
            });
        }

        blocks.push(SlackBlock::Divider);

        let mut context = vec![SlackText::markdown(format!("Notification `{}`", notification.id))];
        if let Some(user_agent) = &notification.user_agent {
            context.push(SlackText::markdown(truncate(user_agent, 300)));
        }
        blocks.push(SlackBlock::Context { elements: context });

        SlackPayload {
            text: format!(
                "[{}] {}",
                notification.severity.to_string().to_uppercase(),
                truncate(&notification.message, MAX_SECTION_CHARS)
            ),
            username: self.config.username.clone(),
            icon_emoji: self.config.icon_emoji.clone(),
            channel: self.config.channel.clone(),
            blocks,
        }
    }

    fn accept(response: TransportResponse) -> Result<(), Error> {
        if !response.is_success() {
            return Err(DeliveryError::Status {
                status: response.status,
                body: response.body,
            }
            .into());
        }

        if response.body != ACKNOWLEDGEMENT {
            return Err(DeliveryError::UnexpectedAcknowledgement {
                body: response.body,
            }
            .into());
        }

        Ok(())
    }
}

#[async_trait]
impl NotificationProvider for SlackProvider {
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
