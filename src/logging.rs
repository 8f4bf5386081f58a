//! Tracing subscriber setup for binaries

use crate::config::LoggingConfig;
use crate::error::ChainError;
use tracing_subscriber::EnvFilter;

/// Builds the event filter: `RUST_LOG` when set, the configured level otherwise.
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter, ChainError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => level_filter(config),
    }
}

/// The filter for the configured level alone.
pub fn level_filter(config: &LoggingConfig) -> Result<EnvFilter, ChainError> {
    EnvFilter::try_new(&config.level).map_err(|e| {
        ChainError::ConfigError(format!("Invalid log level '{}': {}", config.level, e))
    })
}

/// Installs the global subscriber. Fails if one is already installed.
pub fn init(config: &LoggingConfig) -> Result<(), ChainError> {
    let filter = env_filter(config)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| ChainError::ConfigError(format!("Failed to install logger: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails() {
        let config = LoggingConfig {
            level: "warn".to_string(),
            json: false,
        };
        // Another test may have installed a subscriber first; either way the
        // second call must fail.
        let _ = init(&config);
        assert!(init(&config).is_err());
    }

    #[test]
    fn test_level_parses() {
        let config = LoggingConfig {
            level: "branchledger=debug,warn".to_string(),
            json: false,
        };
        let filter = level_filter(&config).unwrap();
        assert!(filter.to_string().contains("branchledger=debug"));
    }

    #[test]
    fn test_bad_level_rejected() {
        let config = LoggingConfig {
            level: "branchledger=loud".to_string(),
            json: false,
        };
        let err = level_filter(&config).unwrap_err();
        assert!(err.to_string().contains("Invalid log level"));
    }
}
