//! Configuration error types

use thiserror::Error;

/// Result type alias for configuration loading.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Configuration-specific error types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// One or more environment variables were missing or malformed.
    #[error("invalid configuration keys: {}", keys.join(", "))]
    InvalidKeys {
        /// Every offending variable name, in the order they were checked.
        keys: Vec<String>,
    },
}
