//! Refresh configuration.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Configuration for refresh operations.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct RefreshConfig {
    /// Report progress only while recursion depth is below this bound, so
    /// deep trees don't flood the progress channel.
    #[builder(default = "3")]
    #[serde(default = "default_progress_depth")]
    pub progress_depth: u32,

    /// Never traverse or add link directories (prevents cycles and
    /// double-counting).
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub skip_link_dirs: bool,

    /// Digit glyphs the logical comparer treats as numeric; the first glyph
    /// is the zero stripped from leading positions. Explicit here rather
    /// than read from ambient locale state.
    #[builder(default = "default_digits()")]
    #[serde(default = "default_digits")]
    pub digits: String,
}

fn default_progress_depth() -> u32 {
    3
}

fn default_true() -> bool {
    true
}

fn default_digits() -> String {
    "0123456789".to_string()
}

impl RefreshConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref digits) = self.digits {
            if digits.is_empty() {
                return Err("Digit set cannot be empty".to_string());
            }
        }
        Ok(())
    }
}

impl RefreshConfig {
    /// Create a new refresh config builder.
    pub fn builder() -> RefreshConfigBuilder {
        RefreshConfigBuilder::default()
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            progress_depth: default_progress_depth(),
            skip_link_dirs: true,
            digits: default_digits(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = RefreshConfig::default();
        assert_eq!(config.progress_depth, 3);
        assert!(config.skip_link_dirs);
        assert_eq!(config.digits, "0123456789");
    }

    #[test]
    fn test_config_builder() {
        let config = RefreshConfig::builder()
            .progress_depth(5u32)
            .skip_link_dirs(false)
            .build()
            .unwrap();

        assert_eq!(config.progress_depth, 5);
        assert!(!config.skip_link_dirs);
        assert_eq!(config.digits, "0123456789");
    }

    #[test]
    fn test_empty_digit_set_rejected() {
        let result = RefreshConfig::builder().digits("").build();
        assert!(result.is_err());
    }
}
