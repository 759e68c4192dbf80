//! Configuration error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required configuration file is missing
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// The merged sources do not deserialize into `Settings`
    #[error("Invalid configuration: {0}")]
    Deserialize(String),

    #[error("Invalid value for {field}: {message}")]
    ValidationError { field: String, message: String },

    #[error("Unknown environment '{0}', expected development, test, staging or production")]
    UnknownEnvironment(String),

    /// Both a config directory and a single config file were requested
    #[error("Conflicting configuration sources: {0}")]
    ConflictingSources(String),

    #[error(transparent)]
    Source(#[from] config::ConfigError),
}

impl ConfigError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn file_not_found(path: impl Into<String>) -> Self {
        ConfigError::FileNotFound(path.into())
    }

    pub fn conflicting_sources(message: impl Into<String>) -> Self {
        ConfigError::ConflictingSources(message.into())
    }
}
