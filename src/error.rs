//! Error types for BranchLedger

use thiserror::Error;

/// Reasons a block, transaction or configuration was refused.
///
/// The ledger's public surface reports block and transaction verdicts as plain
/// booleans; these variants carry the reason so it can be logged or inspected
/// through the `try_` entry points.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("Block does not declare a parent hash")]
    MissingParent,
    #[error("Unknown parent block: {0}")]
    UnknownParent(String),
    #[error("Block already exists")]
    BlockAlreadyExists,
    #[error(
        "Stale fork: candidate height {height} is at or below {max_height} - {cut_off_age}"
    )]
    StaleFork {
        height: u64,
        max_height: u64,
        cut_off_age: u64,
    },
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),
    #[error("UTXO not found: {0}")]
    UtxoNotFound(String),
    #[error("Double spend detected: {0}")]
    DoubleSpend(String),
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),
    #[error("Negative value {value} at output {index}")]
    NegativeOutput { index: usize, value: i64 },
    #[error("Outputs ({outputs}) exceed inputs ({inputs})")]
    InsufficientInputValue { inputs: i128, outputs: i128 },
    #[error("Cryptographic error: {0}")]
    CryptoError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("IO error: {0}")]
    IoError(String),
}

impl From<std::io::Error> for ChainError {
    fn from(err: std::io::Error) -> Self {
        ChainError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for ChainError {
    fn from(err: serde_json::Error) -> Self {
        ChainError::SerializationError(err.to_string())
    }
}

impl From<toml::de::Error> for ChainError {
    fn from(err: toml::de::Error) -> Self {
        ChainError::ConfigError(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ChainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_fork_message() {
        let err = ChainError::StaleFork {
            height: 2,
            max_height: 12,
            cut_off_age: 10,
        };
        assert_eq!(
            err.to_string(),
            "Stale fork: candidate height 2 is at or below 12 - 10"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: ChainError = io.into();
        assert!(matches!(err, ChainError::IoError(_)));
        assert!(err.to_string().starts_with("IO error:"));
    }
}
