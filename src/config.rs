use std::env;

use dotenvy::dotenv;
use serde::Deserialize;

use crate::{
    clients::{
        discord::{self, DiscordConfig},
        slack::{self, SlackConfig},
        transport::DEFAULT_TIMEOUT_MS,
    },
    error::ConfigError,
    models::{
        notification::NotificationContext, retry::RetryConfig,
        sanitization::SanitizationConfig,
    },
};

pub const DEFAULT_ENVIRONMENT: &str = "development";

fn default_true() -> bool {
    true
}

fn default_max_retry_attempts() -> u32 {
    RetryConfig::default().max_attempts
}

fn default_base_retry_delay_ms() -> u64 {
    RetryConfig::default().base_delay_ms
}

fn default_max_retry_delay_ms() -> u64 {
    RetryConfig::default().max_delay_ms
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

#[derive(Clone, Deserialize, Debug, PartialEq, Eq)]
pub struct Config {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub environment: Option<String>,

    #[serde(default)]
    pub discord_webhook_url: Option<String>,
    #[serde(default)]
    pub discord_username: Option<String>,
    #[serde(default)]
    pub discord_avatar_url: Option<String>,

    #[serde(default)]
    pub slack_webhook_url: Option<String>,
    #[serde(default)]
    pub slack_username: Option<String>,
    #[serde(default)]
    pub slack_icon_emoji: Option<String>,
    #[serde(default)]
    pub slack_channel: Option<String>,

    #[serde(default)]
    pub relay_url: Option<String>,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    #[serde(default = "default_max_retry_attempts")]
    pub max_retry_attempts: u32,
    #[serde(default = "default_base_retry_delay_ms")]
    pub base_retry_delay_ms: u64,
    #[serde(default = "default_max_retry_delay_ms")]
    pub max_retry_delay_ms: u64,
    #[serde(default = "default_true")]
    pub retry_jitter: bool,
    #[serde(default)]
    pub discord_retry_attempts: Option<u32>,
    #[serde(default)]
    pub slack_retry_attempts: Option<u32>,

    #[serde(default = "default_true")]
    pub sanitize_enabled: bool,
    #[serde(default)]
    pub sanitize_patterns: Vec<String>,
    #[serde(default)]
    pub sanitize_exclude_defaults: bool,

    #[serde(default)]
    pub app_url: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: true,
            environment: None,
            discord_webhook_url: None,
            discord_username: None,
            discord_avatar_url: None,
            slack_webhook_url: None,
            slack_username: None,
            slack_icon_emoji: None,
            slack_channel: None,
            relay_url: None,
            request_timeout_ms: default_request_timeout_ms(),
            max_retry_attempts: default_max_retry_attempts(),
            base_retry_delay_ms: default_base_retry_delay_ms(),
            max_retry_delay_ms: default_max_retry_delay_ms(),
            retry_jitter: true,
            discord_retry_attempts: None,
            slack_retry_attempts: None,
            sanitize_enabled: true,
            sanitize_patterns: Vec::new(),
            sanitize_exclude_defaults: false,
            app_url: None,
            user_agent: None,
        }
    }
}

/// Partial configuration accepted by `ErrorLogger::configure`.
///
/// `None` leaves a field untouched. The nested options on webhook and relay
/// URLs allow clearing them with `Some(None)`.
#[derive(Clone, Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ConfigUpdate {
    pub enabled: Option<bool>,
    pub environment: Option<String>,
    pub discord_webhook_url: Option<Option<String>>,
    pub discord_username: Option<String>,
    pub discord_avatar_url: Option<String>,
    pub slack_webhook_url: Option<Option<String>>,
    pub slack_username: Option<String>,
    pub slack_icon_emoji: Option<String>,
    pub slack_channel: Option<String>,
    pub relay_url: Option<Option<String>>,
    pub request_timeout_ms: Option<u64>,
    pub max_retry_attempts: Option<u32>,
    pub base_retry_delay_ms: Option<u64>,
    pub max_retry_delay_ms: Option<u64>,
    pub retry_jitter: Option<bool>,
    pub sanitize_enabled: Option<bool>,
    pub sanitize_patterns: Option<Vec<String>>,
    pub sanitize_exclude_defaults: Option<bool>,
    pub app_url: Option<String>,
    pub user_agent: Option<String>,
}

/// Returns the first non-empty value produced by `sources`, in order, or
/// `"development"` when none yields one.
pub fn resolve_environment(sources: &[&dyn Fn() -> Option<String>]) -> String {
    sources
        .iter()
        .filter_map(|source| source())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string())
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        dotenv().ok();

        let mut config = envy::from_env::<Self>()
            .map_err(|e| ConfigError::Environment(e.to_string()))?;

        let declared = config.environment.clone();
        config.environment = Some(resolve_environment(&[
            &|| declared.clone(),
            &|| env::var("APP_ENV").ok(),
            &|| env::var("RUST_ENV").ok(),
        ]));

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.retry_config().validate()?;
        self.retry_config_for(discord::PROVIDER_NAME).validate()?;
        self.retry_config_for(slack::PROVIDER_NAME).validate()?;
        Ok(())
    }

    /// Produces a new configuration with `update` applied on top of this one.
    pub fn merged(&self, update: &ConfigUpdate) -> Self {
        let mut next = self.clone();

        if let Some(enabled) = update.enabled {
            next.enabled = enabled;
        }
        if let Some(environment) = &update.environment {
            next.environment = Some(environment.clone());
        }
        if let Some(url) = &update.discord_webhook_url {
            next.discord_webhook_url = url.clone();
        }
        if let Some(username) = &update.discord_username {
            next.discord_username = Some(username.clone());
        }
        if let Some(avatar_url) = &update.discord_avatar_url {
            next.discord_avatar_url = Some(avatar_url.clone());
        }
        if let Some(url) = &update.slack_webhook_url {
            next.slack_webhook_url = url.clone();
        }
        if let Some(username) = &update.slack_username {
            next.slack_username = Some(username.clone());
        }
        if let Some(icon_emoji) = &update.slack_icon_emoji {
            next.slack_icon_emoji = Some(icon_emoji.clone());
        }
        if let Some(channel) = &update.slack_channel {
            next.slack_channel = Some(channel.clone());
        }
        if let Some(relay_url) = &update.relay_url {
            next.relay_url = relay_url.clone();
        }
        if let Some(timeout) = update.request_timeout_ms {
            next.request_timeout_ms = timeout;
        }
        if let Some(attempts) = update.max_retry_attempts {
            next.max_retry_attempts = attempts;
        }
        if let Some(delay) = update.base_retry_delay_ms {
            next.base_retry_delay_ms = delay;
        }
        if let Some(delay) = update.max_retry_delay_ms {
            next.max_retry_delay_ms = delay;
        }
        if let Some(jitter) = update.retry_jitter {
            next.retry_jitter = jitter;
        }
        if let Some(enabled) = update.sanitize_enabled {
            next.sanitize_enabled = enabled;
        }
        if let Some(patterns) = &update.sanitize_patterns {
            next.sanitize_patterns = patterns.clone();
        }
        if let Some(exclude) = update.sanitize_exclude_defaults {
            next.sanitize_exclude_defaults = exclude;
        }
        if let Some(app_url) = &update.app_url {
            next.app_url = Some(app_url.clone());
        }
        if let Some(user_agent) = &update.user_agent {
            next.user_agent = Some(user_agent.clone());
        }

        next
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_retry_attempts,
            base_delay_ms: self.base_retry_delay_ms,
            max_delay_ms: self.max_retry_delay_ms,
            jitter: self.retry_jitter,
        }
    }

    /// The shared retry policy with the provider's attempt override applied.
    pub fn retry_config_for(&self, provider: &str) -> RetryConfig {
        let override_attempts = match provider {
            discord::PROVIDER_NAME => self.discord_retry_attempts,
            slack::PROVIDER_NAME => self.slack_retry_attempts,
            _ => None,
        };

        RetryConfig {
            max_attempts: override_attempts.unwrap_or(self.max_retry_attempts),
            ..self.retry_config()
        }
    }

    pub fn sanitization_config(&self) -> SanitizationConfig {
        SanitizationConfig {
            enabled: self.sanitize_enabled,
            custom_patterns: self
                .sanitize_patterns
                .iter()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect(),
            exclude_defaults: self.sanitize_exclude_defaults,
        }
    }

    pub fn discord_config(&self) -> Option<DiscordConfig> {
        non_empty(&self.discord_webhook_url).map(|webhook_url| DiscordConfig {
            webhook_url,
            username: non_empty(&self.discord_username),
            avatar_url: non_empty(&self.discord_avatar_url),
        })
    }

    pub fn slack_config(&self) -> Option<SlackConfig> {
        non_empty(&self.slack_webhook_url).map(|webhook_url| SlackConfig {
            webhook_url,
            username: non_empty(&self.slack_username),
            icon_emoji: non_empty(&self.slack_icon_emoji),
            channel: non_empty(&self.slack_channel),
        })
    }

    pub fn context(&self) -> NotificationContext {
        NotificationContext {
            environment: non_empty(&self.environment),
            url: non_empty(&self.app_url),
            user_agent: non_empty(&self.user_agent),
        }
    }
}
