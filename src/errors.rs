use std::time::Duration;

use thiserror::Error;

/// Error type for top SQL reporter operations.
///
/// Registration and plain lookups never fail; only the blocking waits and
/// input parsing produce errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TopSqlError {
    #[error("timed out after {waited:?} waiting for collect count {target} (observed {observed})")]
    Timeout {
        waited: Duration,
        target: u64,
        observed: u64,
    },
    #[error("invalid digest: {0}")]
    InvalidDigest(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for TopSqlError {
    fn from(err: serde_json::Error) -> Self {
        TopSqlError::Serialization(err.to_string())
    }
}

impl TopSqlError {
    pub fn timeout(waited: Duration, target: u64, observed: u64) -> Self {
        TopSqlError::Timeout {
            waited,
            target,
            observed,
        }
    }

    pub fn invalid_digest<T: Into<String>>(msg: T) -> Self {
        TopSqlError::InvalidDigest(msg.into())
    }

    pub fn invalid_config<T: Into<String>>(msg: T) -> Self {
        TopSqlError::InvalidConfig(msg.into())
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, TopSqlError::Timeout { .. })
    }
}

pub type Result<T> = std::result::Result<T, TopSqlError>;
