use error_notifier::{
    config::{Config, ConfigUpdate, DEFAULT_ENVIRONMENT, resolve_environment},
    error::ConfigError,
};
use tokio_test::assert_ok;

use crate::common::{DISCORD_WEBHOOK, SLACK_WEBHOOK, test_config};

/// Test: The first non-empty environment source wins
#[test]
fn test_resolve_environment_order() {
    let env = resolve_environment(&[
        &|| None,
        &|| Some("   ".to_string()),
        &|| Some(" staging ".to_string()),
        &|| Some("production".to_string()),
    ]);
    assert_eq!(env, "staging");

    let env = resolve_environment(&[&|| None, &|| Some(String::new())]);
    assert_eq!(env, DEFAULT_ENVIRONMENT);
    assert_eq!(resolve_environment(&[]), "development");
}

/// Test: Defaults match the documented retry policy and sanitization settings
#[test]
fn test_defaults() {
    let config = Config::default();

    assert!(config.enabled);
    assert_eq!(config.request_timeout_ms, 5000);

    let retry = config.retry_config();
    assert_eq!(retry.max_attempts, 3);
    assert_eq!(retry.base_delay_ms, 1000);
    assert_eq!(retry.max_delay_ms, 10000);
    assert!(retry.jitter);

    let sanitization = config.sanitization_config();
    assert!(sanitization.enabled);
    assert!(sanitization.custom_patterns.is_empty());
    assert!(!sanitization.exclude_defaults);

    assert_ok!(config.validate());
}

/// Test: Merging applies only the fields the update names
#[test]
fn test_merged_applies_partial_update() {
    let config = test_config();
    let update = ConfigUpdate {
        environment: Some("production".to_string()),
        max_retry_attempts: Some(5),
        slack_channel: Some("#alerts".to_string()),
        ..ConfigUpdate::default()
    };

    let merged = config.merged(&update);

    assert_eq!(merged.environment.as_deref(), Some("production"));
    assert_eq!(merged.max_retry_attempts, 5);
    assert_eq!(merged.slack_channel.as_deref(), Some("#alerts"));
    assert_eq!(merged.discord_webhook_url.as_deref(), Some(DISCORD_WEBHOOK));
    assert_eq!(merged.base_retry_delay_ms, config.base_retry_delay_ms);

    assert_eq!(config.merged(&ConfigUpdate::default()), config);
}

/// Test: A nested None clears a webhook or relay
#[test]
fn test_merged_clears_urls() {
    let config = Config {
        relay_url: Some("http://localhost:8080/relay".to_string()),
        ..test_config()
    };

    let merged = config.merged(&ConfigUpdate {
        discord_webhook_url: Some(None),
        relay_url: Some(None),
        ..ConfigUpdate::default()
    });

    assert_eq!(merged.discord_webhook_url, None);
    assert_eq!(merged.relay_url, None);
    assert_eq!(merged.slack_webhook_url.as_deref(), Some(SLACK_WEBHOOK));
    assert!(merged.discord_config().is_none());
}

/// Test: Per-provider attempt overrides only change the attempt count
#[test]
fn test_retry_config_for_provider() {
    let config = Config {
        discord_retry_attempts: Some(5),
        ..test_config()
    };

    let discord = config.retry_config_for("discord");
    assert_eq!(discord.max_attempts, 5);
    assert_eq!(discord.base_delay_ms, 100);

    assert_eq!(config.retry_config_for("slack").max_attempts, 3);
    assert_eq!(config.retry_config_for("unknown"), config.retry_config());
}

/// Test: Out-of-range retry settings fail validation
#[test]
fn test_validate_rejects_bad_retry_policy() {
    let cases = [
        Config {
            max_retry_attempts: 0,
            ..test_config()
        },
        Config {
            max_retry_attempts: 6,
            ..test_config()
        },
        Config {
            base_retry_delay_ms: 50,
            ..test_config()
        },
        Config {
            base_retry_delay_ms: 2000,
            max_retry_delay_ms: 1000,
            ..test_config()
        },
        Config {
            slack_retry_attempts: Some(9),
            ..test_config()
        },
    ];

    for config in cases {
        assert!(
            matches!(config.validate(), Err(ConfigError::InvalidRetryPolicy(_))),
            "{:?} should be rejected",
            config.retry_config_for("slack")
        );
    }
}

/// Test: Blank optional values are treated as absent
#[test]
fn test_blank_values_are_absent() {
    let config = Config {
        discord_webhook_url: Some("   ".to_string()),
        slack_username: Some(String::new()),
        app_url: Some(" ".to_string()),
        ..test_config()
    };

    assert!(config.discord_config().is_none());

    let slack = config.slack_config().unwrap();
    assert_eq!(slack.webhook_url, SLACK_WEBHOOK);
    assert_eq!(slack.username, None);

    let context = config.context();
    assert_eq!(context.environment.as_deref(), Some("test"));
    assert_eq!(context.url, None);
}

/// Test: Custom sanitization patterns are trimmed and empty ones dropped
#[test]
fn test_sanitization_config_patterns() {
    let config = Config {
        sanitize_patterns: vec![" order-\\d+ ".to_string(), "".to_string(), "  ".to_string()],
        sanitize_exclude_defaults: true,
        ..test_config()
    };

    let sanitization = config.sanitization_config();
    assert_eq!(sanitization.custom_patterns, vec!["order-\\d+".to_string()]);
    assert!(sanitization.exclude_defaults);
}

/// Test: Partial updates deserialize with absent fields left as None
#[test]
fn test_config_update_deserializes() {
    let update: ConfigUpdate =
        serde_json::from_str(r#"{"enabled": false, "environment": "qa"}"#).unwrap();

    assert_eq!(update.enabled, Some(false));
    assert_eq!(update.environment.as_deref(), Some("qa"));
    assert_eq!(update.discord_webhook_url, None);
    assert_eq!(update.max_retry_attempts, None);
}
