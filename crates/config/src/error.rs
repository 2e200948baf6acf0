//! Configuration error types

use std::io;
use thiserror::Error;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file
    #[error("failed to read config file '{path}': {source}")]
    IoError {
        /// Path to the file
        path: String,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// A setting that only makes sense together with another one
    #[error("'{field}' requires '{requires}' to be set")]
    MissingDependency {
        /// The setting that was given
        field: &'static str,
        /// The setting it depends on
        requires: &'static str,
    },

    /// Validation error - invalid value
    #[error("invalid {field}: {message}")]
    InvalidValue {
        /// Field name
        field: &'static str,
        /// Error message
        message: String,
    },
}

impl ConfigError {
    /// Create a MissingDependency error
    pub fn missing_dependency(field: &'static str, requires: &'static str) -> Self {
        Self::MissingDependency { field, requires }
    }

    /// Create an InvalidValue error
    pub fn invalid_value(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            message: message.into(),
        }
    }
}
