use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to parse TOML: {0}")]
    Parse(String),
    #[error("max_days must not be negative, got {0}")]
    NegativeWindow(i64),
    #[error("Trainer needs window >= threshold >= 1, got window={window}, threshold={threshold}")]
    InvalidTrainer { window: usize, threshold: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Largest day gap allowed between a bank entry and a ledger entry
    /// that have no check number.
    pub max_days: i64,
    /// Ledger entries scanned, newest first, to train the classifier.
    pub history_limit: usize,
    /// Samples considered per payee name.
    pub train_window: usize,
    /// Votes for one category needed before it is assigned automatically.
    pub train_threshold: usize,
    pub auto_categorize: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            max_days: 7,
            history_limit: 2000,
            train_window: 6,
            train_threshold: 3,
            auto_categorize: true,
        }
    }
}

impl ImportConfig {
    pub fn from_toml(toml_content: &str) -> Result<Self, ConfigError> {
        let config: ImportConfig =
            toml::from_str(toml_content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_days < 0 {
            return Err(ConfigError::NegativeWindow(self.max_days));
        }
        if self.train_threshold < 1 || self.train_threshold > self.train_window {
            return Err(ConfigError::InvalidTrainer {
                window: self.train_window,
                threshold: self.train_threshold,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        assert_eq!(ImportConfig::from_toml("").unwrap(), ImportConfig::default());
    }

    #[test]
    fn partial_override() {
        let config = ImportConfig::from_toml("max_days = 3\nauto_categorize = false\n").unwrap();
        assert_eq!(config.max_days, 3);
        assert!(!config.auto_categorize);
        assert_eq!(config.train_window, 6);
    }

    #[test]
    fn rejects_threshold_above_window() {
        let err = ImportConfig::from_toml("train_window = 2\ntrain_threshold = 3\n").unwrap_err();
        assert_eq!(err, ConfigError::InvalidTrainer { window: 2, threshold: 3 });
    }

    #[test]
    fn rejects_zero_threshold_and_negative_window() {
        assert!(matches!(
            ImportConfig::from_toml("train_threshold = 0"),
            Err(ConfigError::InvalidTrainer { .. })
        ));
        assert!(matches!(
            ImportConfig::from_toml("max_days = -1"),
            Err(ConfigError::NegativeWindow(-1))
        ));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        assert!(matches!(
            ImportConfig::from_toml("max_days = \"seven\""),
            Err(ConfigError::Parse(_))
        ));
    }
}
