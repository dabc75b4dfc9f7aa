use anyhow::{Error, Result};
use error_notifier::{config::Config, logger::ErrorLogger, models::notification::Severity};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .json()
        .init();

    let config = Config::load()?;
    let logger = ErrorLogger::new(config)?;

    let message = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    let message = if message.is_empty() {
        "Error notifier configured and reachable".to_string()
    } else {
        message
    };

    let outcomes = logger.capture_message(message, Severity::Info, None).await;

    for outcome in &outcomes {
        println!("{}", serde_json::to_string(outcome)?);
    }

    if outcomes.is_empty() {
        println!("Notifier is disabled, nothing was sent.");
    }

    Ok(())
}
