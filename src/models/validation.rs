use reqwest::Url;

use crate::error::ConfigError;

/// Checks that a webhook URL is present, uses https, and targets the expected
/// host with the expected path prefix.
pub fn validate_webhook_url(
    provider: &'static str,
    webhook_url: Option<&str>,
    hosts: &[&str],
    path_prefix: &'static str,
) -> Result<Url, ConfigError> {
    let raw = webhook_url
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .ok_or(ConfigError::MissingWebhook { provider })?;

    let url = Url::parse(raw).map_err(|e| ConfigError::MalformedWebhook {
        provider,
        reason: e.to_string(),
    })?;

    if url.scheme() != "https" {
        return Err(ConfigError::InsecureWebhook { provider });
    }

    let host_matches = url
        .host_str()
        .is_some_and(|host| hosts.iter().any(|expected| host.eq_ignore_ascii_case(expected)));

    if !host_matches || !url.path().starts_with(path_prefix) {
        return Err(ConfigError::ForeignWebhook {
            provider,
            expected: path_prefix_description(provider),
        });
    }

    Ok(url)
}

fn path_prefix_description(provider: &'static str) -> &'static str {
    match provider {
        "discord" => "discord.com/api/webhooks",
        "slack" => "hooks.slack.com/services",
        _ => "the provider's webhook endpoint",
    }
}

pub fn validate_relay_url(relay_url: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(relay_url.trim()).map_err(|e| ConfigError::InvalidRelay(e.to_string()))?;

    match url.scheme() {
        "https" | "http" => Ok(url),
        other => Err(ConfigError::InvalidRelay(format!(
            "unsupported scheme '{}'",
            other
        ))),
    }
}
