pub mod clients;
pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod sanitizer;
pub mod utils;

pub use config::{Config, ConfigUpdate};
pub use error::{ConfigError, DeliveryError};
pub use logger::ErrorLogger;
pub use models::notification::{CapturedError, Notification, Severity};
