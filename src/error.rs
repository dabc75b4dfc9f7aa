use thiserror::Error;

/// Misconfiguration detected while building the logger or one of its providers.
///
/// These are raised synchronously at setup and never retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{provider} webhook URL is missing")]
    MissingWebhook { provider: &'static str },

    #[error("{provider} webhook URL is not a valid URL: {reason}")]
    MalformedWebhook {
        provider: &'static str,
        reason: String,
    },

    #[error("{provider} webhook URL must use https")]
    InsecureWebhook { provider: &'static str },

    #[error("{provider} webhook URL does not point at {expected}")]
    ForeignWebhook {
        provider: &'static str,
        expected: &'static str,
    },

    #[error("No notification provider is configured")]
    NoProviders,

    #[error("Invalid retry policy: {0}")]
    InvalidRetryPolicy(String),

    #[error("Failed to create HTTP client: {0}")]
    HttpClient(String),

    #[error("Invalid relay URL: {0}")]
    InvalidRelay(String),

    #[error("Invalid or missing environmental variable: {0}")]
    Environment(String),
}

/// Failure of a single delivery attempt (or of a whole call, for `CircuitOpen`).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("Circuit breaker is open for {provider}")]
    CircuitOpen { provider: String },

    #[error("Webhook returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Webhook returned unexpected acknowledgement: {body}")]
    UnexpectedAcknowledgement { body: String },
}
