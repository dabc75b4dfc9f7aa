use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanitizationConfig {
    pub enabled: bool,

    /// Extra case-insensitive regex sources, applied before the defaults.
    #[serde(default)]
    pub custom_patterns: Vec<String>,

    #[serde(default)]
    pub exclude_defaults: bool,
}

impl Default for SanitizationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            custom_patterns: Vec::new(),
            exclude_defaults: false,
        }
    }
}
