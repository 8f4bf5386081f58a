//! Configuration management for BranchLedger

use crate::error::ChainError;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Default number of blocks a fork may fall behind the best tip and still be extended.
pub const CUT_OFF_AGE: u64 = 10;

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LedgerConfig {
    #[serde(default = "default_cut_off_age")]
    pub cut_off_age: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            cut_off_age: default_cut_off_age(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

impl Config {
    pub fn from_toml_str(config_str: &str) -> Result<Self, ChainError> {
        let config: Config = toml::from_str(config_str)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ChainError> {
        if self.ledger.cut_off_age == 0 {
            return Err(ChainError::ConfigError(
                "ledger.cut_off_age must be at least 1".to_string(),
            ));
        }
        if self.logging.level.trim().is_empty() {
            return Err(ChainError::ConfigError(
                "logging.level must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Loads the configuration at `path`, falling back to defaults when the file
/// is missing or empty.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ChainError> {
    let config_str = match fs::read_to_string(path.as_ref()) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };
    if config_str.trim().is_empty() {
        return Ok(Config::default());
    }
    Config::from_toml_str(&config_str)
}

fn default_cut_off_age() -> u64 {
    CUT_OFF_AGE
}

fn default_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.ledger.cut_off_age, 10);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[ledger]\ncut_off_age = 4").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.ledger.cut_off_age, 4);
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_zero_cut_off_age_rejected() {
        let err = Config::from_toml_str("[ledger]\ncut_off_age = 0").unwrap_err();
        assert!(matches!(err, ChainError::ConfigError(_)));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let err = Config::from_toml_str("[ledger\ncut_off_age = ").unwrap_err();
        assert!(err.to_string().starts_with("Configuration error:"));
    }

    #[test]
    fn test_logging_section() {
        let config = Config::from_toml_str("[logging]\nlevel = \"debug\"\njson = true").unwrap();
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
        assert_eq!(config.ledger.cut_off_age, CUT_OFF_AGE);
    }
}
