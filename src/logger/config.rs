//! Configuration types for the logger

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::logger::error::LoggerError;

/// Main logger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggerConfig {
    pub console: ConsoleConfig,
    pub file: FileConfig,
    /// Level name or `EnvFilter` directive
    pub level: String,
}

impl LoggerConfig {
    /// Create a new logger configuration with validation
    pub fn new(console: ConsoleConfig, file: FileConfig, level: String) -> Result<Self, LoggerError> {
        let config = Self {
            console,
            file,
            level,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), LoggerError> {
        self.env_filter()?;

        if self.file.enabled && self.file.path.as_os_str().is_empty() {
            return Err(LoggerError::config("File path cannot be empty"));
        }

        if !self.console.enabled && !self.file.enabled {
            return Err(LoggerError::config(
                "At least one output (console or file) must be enabled",
            ));
        }

        Ok(())
    }

    /// Build the filter for the configured level.
    pub fn env_filter(&self) -> Result<EnvFilter, LoggerError> {
        parse_filter(&self.level)
    }
}

pub(crate) fn parse_filter(level: &str) -> Result<EnvFilter, LoggerError> {
    if level.trim().is_empty() {
        return Err(LoggerError::config("Log level cannot be empty"));
    }
    EnvFilter::try_new(level)
        .map_err(|e| LoggerError::config(format!("Invalid log level '{}': {}", level, e)))
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            console: ConsoleConfig::default(),
            file: FileConfig::default(),
            level: "info".to_string(),
        }
    }
}

/// Console output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleConfig {
    pub enabled: bool,
    /// ANSI colours; only applied when stdout is a terminal
    pub colored: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            colored: true,
        }
    }
}

/// File output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    pub enabled: bool,
    pub path: PathBuf,
    pub append: bool,
    pub format: LogFormat,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: PathBuf::from("logs/octobullet.log"),
            append: true,
            format: LogFormat::Json,
        }
    }
}

/// Log line format for file output
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Full,
    Compact,
    #[default]
    Json,
}

impl FromStr for LogFormat {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full" => Ok(LogFormat::Full),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            _ => Err(LoggerError::format(format!(
                "Invalid log format '{}'. Valid formats are: full, compact, json",
                s
            ))),
        }
    }
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Full => "full",
            LogFormat::Compact => "compact",
            LogFormat::Json => "json",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(LoggerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_filter_directives_are_accepted() {
        let config = LoggerConfig {
            level: "octobullet=debug,tower_http=warn".to_string(),
            ..LoggerConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_level_is_rejected() {
        let config = LoggerConfig {
            level: " ".to_string(),
            ..LoggerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_both_outputs_disabled() {
        let mut console = ConsoleConfig::default();
        console.enabled = false;
        let result = LoggerConfig::new(console, FileConfig::default(), "info".to_string());
        assert!(matches!(result, Err(LoggerError::Config { .. })));
    }

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("FULL".parse::<LogFormat>().unwrap(), LogFormat::Full);
        assert_eq!("compact".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("xml".parse::<LogFormat>().is_err());
        assert_eq!(LogFormat::Compact.as_str(), "compact");
    }
}
