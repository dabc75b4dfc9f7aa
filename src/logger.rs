use std::sync::{Arc, RwLock};

use futures_util::future::join_all;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::{
    clients::{
        NotificationProvider, build_providers, build_transport,
        fallback::{ConsoleFallback, FallbackSink},
        health::HealthChecker,
        transport::Transport,
    },
    config::{Config, ConfigUpdate},
    error::{ConfigError, DeliveryError},
    models::{
        health::HealthReport,
        notification::{CapturedError, Notification, Severity},
        status::{DeliveryOutcome, DeliveryStatus},
    },
    sanitizer::DataSanitizer,
};

/// Everything a capture needs, swapped as a unit by `configure`.
struct Runtime {
    config: Config,
    sanitizer: DataSanitizer,
    providers: Vec<Arc<dyn NotificationProvider>>,
}

impl Runtime {
    fn build(
        config: Config,
        transport: Option<&Arc<dyn Transport>>,
        fallback: &Arc<dyn FallbackSink>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let transport = match transport {
            Some(transport) => Arc::clone(transport),
            None => build_transport(&config)?,
        };

        let providers = build_providers(&config, transport, Arc::clone(fallback))?;
        let sanitizer = DataSanitizer::new(&config.sanitization_config());

        Ok(Self {
            config,
            sanitizer,
            providers,
        })
    }
}

/// Captures errors and messages and fans them out to every configured provider.
///
/// Capture methods never fail: delivery problems are logged and reported
/// through the fallback sink, and surface only in the returned outcomes.
pub struct ErrorLogger {
    runtime: RwLock<Arc<Runtime>>,
    transport: Option<Arc<dyn Transport>>,
    fallback: Arc<dyn FallbackSink>,
}

pub struct ErrorLoggerBuilder {
    config: Config,
    transport: Option<Arc<dyn Transport>>,
    fallback: Arc<dyn FallbackSink>,
}

impl ErrorLoggerBuilder {
    /// Uses `transport` for every provider instead of one derived from the config.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn fallback(mut self, fallback: Arc<dyn FallbackSink>) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn build(self) -> Result<ErrorLogger, ConfigError> {
        let runtime = Runtime::build(self.config, self.transport.as_ref(), &self.fallback)?;

        info!(
            enabled = runtime.config.enabled,
            environment = ?runtime.config.environment,
            providers = runtime.providers.len(),
            "Error logger initialized"
        );

        Ok(ErrorLogger {
            runtime: RwLock::new(Arc::new(runtime)),
            transport: self.transport,
            fallback: self.fallback,
        })
    }
}

impl ErrorLogger {
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        Self::builder(config).build()
    }

    pub fn builder(config: Config) -> ErrorLoggerBuilder {
        ErrorLoggerBuilder {
            config,
            transport: None,
            fallback: Arc::new(ConsoleFallback),
        }
    }

    fn snapshot(&self) -> Arc<Runtime> {
        let guard = self
            .runtime
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }

    pub fn config(&self) -> Config {
        self.snapshot().config.clone()
    }

    pub fn is_enabled(&self) -> bool {
        self.snapshot().config.enabled
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.snapshot().providers.iter().map(|p| p.name()).collect()
    }

    /// Merges `update` into the active configuration and rebuilds the
    /// sanitizer and providers. On error the previous configuration stays.
    ///
    /// Captures already in flight keep the configuration they started with.
    pub fn configure(&self, update: ConfigUpdate) -> Result<(), ConfigError> {
        // Held across merge and build so concurrent updates apply in turn.
        let mut guard = self
            .runtime
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let next_config = guard.config.merged(&update);
        let runtime = Runtime::build(next_config, self.transport.as_ref(), &self.fallback)?;

        info!(
            enabled = runtime.config.enabled,
            providers = runtime.providers.len(),
            "Error logger reconfigured"
        );

        *guard = Arc::new(runtime);

        Ok(())
    }

    pub async fn capture_exception(
        &self,
        error: impl Into<CapturedError>,
        metadata: Option<Map<String, Value>>,
    ) -> Vec<DeliveryOutcome> {
        let runtime = self.snapshot();
        if !runtime.config.enabled {
            return Vec::new();
        }

        let error = error.into();
        let notification = Notification::new(error.message, Severity::Error)
            .with_stack(error.stack)
            .with_metadata(metadata)
            .with_context(&runtime.config.context());

        Self::dispatch(&runtime, notification).await
    }

    pub async fn capture_message(
        &self,
        message: impl Into<String>,
        severity: Severity,
        metadata: Option<Map<String, Value>>,
    ) -> Vec<DeliveryOutcome> {
        let runtime = self.snapshot();
        if !runtime.config.enabled {
            return Vec::new();
        }

        let notification = Notification::new(message, severity)
            .with_metadata(metadata)
            .with_context(&runtime.config.context());

        Self::dispatch(&runtime, notification).await
    }

    pub fn health(&self) -> HealthReport {
        HealthChecker::check_all(&self.snapshot().providers)
    }

    async fn dispatch(runtime: &Runtime, notification: Notification) -> Vec<DeliveryOutcome> {
        let notification = runtime.sanitizer.sanitize_notification(&notification);

        debug!(
            notification_id = %notification.id,
            severity = %notification.severity,
            providers = runtime.providers.len(),
            "Dispatching notification"
        );

        let deliveries = runtime.providers.iter().map(|provider| {
            let notification = &notification;
            async move {
                match provider.send(notification).await {
                    Ok(()) => DeliveryOutcome::sent(provider.name()),
                    Err(e) => {
                        let status = match e.downcast_ref::<DeliveryError>() {
                            Some(DeliveryError::CircuitOpen { .. }) => DeliveryStatus::CircuitOpen,
                            _ => DeliveryStatus::Failed,
                        };
                        warn!(
                            provider = provider.name(),
                            notification_id = %notification.id,
                            status = %status,
                            error = %e,
                            "Notification delivery failed"
                        );
                        DeliveryOutcome::failed(provider.name(), status, e.to_string())
                    }
                }
            }
        });

        join_all(deliveries).await
    }
}
