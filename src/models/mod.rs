pub mod circuit_breaker;
pub mod discord;
pub mod health;
pub mod notification;
pub mod retry;
pub mod sanitization;
pub mod slack;
pub mod status;
pub mod validation;
