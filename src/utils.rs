use tokio::time::Duration;

use crate::models::retry::RetryConfig;

pub const JITTER_MIN: f64 = 0.75;
pub const JITTER_MAX: f64 = 1.25;

/// Delay to wait after the failed attempt with index `attempt_index` (0-based):
/// `base * 2^index`, optionally scaled by a factor in `[0.75, 1.25]`, then
/// clamped to `max_delay_ms`.
pub fn backoff_delay(config: &RetryConfig, attempt_index: u32) -> Duration {
    let factor = if config.jitter {
        rand::random_range(JITTER_MIN..=JITTER_MAX)
    } else {
        1.0
    };

    backoff_delay_with_factor(config, attempt_index, factor)
}

pub fn backoff_delay_with_factor(config: &RetryConfig, attempt_index: u32, factor: f64) -> Duration {
    let exponential = config
        .base_delay_ms
        .saturating_mul(2u64.saturating_pow(attempt_index));

    let scaled = (exponential as f64 * factor) as u64;

    Duration::from_millis(std::cmp::min(scaled, config.max_delay_ms))
}

/// Cuts `text` to at most `max_chars` characters, marking the cut with an ellipsis.
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let kept: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}…", kept)
}
