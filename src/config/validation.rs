//! Configuration validation logic
//!
//! Validation methods for every configuration section. `Settings::validate`
//! returns the first error encountered.

use reqwest::Url;

use crate::config::error::ConfigError;
use crate::config::settings::{
    ClientConfig, FileSettings, LoggerSettings, MAX_PERIODIC_INTERVAL_MINUTES, PluginSettings,
    PushbulletConfig, ServerConfig, Settings, WebcamConfig,
};

/// Valid log levels
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid log formats
const VALID_LOG_FORMATS: &[&str] = &["full", "compact", "json"];

fn validate_http_url(field: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value).map_err(|e| ConfigError::ValidationError {
        field: field.to_string(),
        message: format!("Invalid URL '{}': {}", value, e),
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::ValidationError {
            field: field.to_string(),
            message: format!("URL must use http or https, got '{}'", url.scheme()),
        });
    }

    Ok(url)
}

impl ServerConfig {
    /// Validate server configuration
    ///
    /// # Validation Rules
    /// - Port must be between 1 and 65535
    /// - Request timeout must be greater than 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::validation(
                "server.port",
                "Port must be between 1 and 65535. Please specify a valid port number.",
            ));
        }

        if self.request_timeout == 0 {
            return Err(ConfigError::validation(
                "server.request_timeout",
                "Request timeout must be greater than 0 seconds.",
            ));
        }

        Ok(())
    }
}

impl PushbulletConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_http_url("pushbullet.api_url", &self.api_url)?;

        if self.timeout == 0 {
            return Err(ConfigError::validation(
                "pushbullet.timeout",
                "Pushbullet timeout must be greater than 0 seconds.",
            ));
        }

        Ok(())
    }
}

impl PluginSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.periodic_updates_interval == 0 {
            return Err(ConfigError::validation(
                "plugin.periodic_updates_interval",
                "Periodic update interval must be at least 1 minute.",
            ));
        }

        if self.periodic_updates_interval > MAX_PERIODIC_INTERVAL_MINUTES {
            return Err(ConfigError::ValidationError {
                field: "plugin.periodic_updates_interval".to_string(),
                message: format!(
                    "Periodic update interval must be at most {} minutes (one week).",
                    MAX_PERIODIC_INTERVAL_MINUTES
                ),
            });
        }

        Ok(())
    }
}

impl WebcamConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(snapshot) = self.snapshot.as_deref().filter(|s| !s.is_empty()) {
            validate_http_url("webcam.snapshot", snapshot)?;
        }

        Ok(())
    }
}

impl ClientConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_http_url("client.base_url", &self.base_url)?;
        Ok(())
    }
}

impl FileSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled && self.path.trim().is_empty() {
            return Err(ConfigError::validation(
                "logger.file.path",
                "File path is required when file logging is enabled.",
            ));
        }

        if !VALID_LOG_FORMATS.contains(&self.format.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logger.file.format".to_string(),
                message: format!(
                    "Invalid log format '{}'. Valid formats are: {}",
                    self.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            });
        }

        Ok(())
    }
}

impl LoggerSettings {
    /// Validate logger settings
    ///
    /// # Validation Rules
    /// - Log level must be one of: trace, debug, info, warn, error
    /// - If file logging is enabled, path must not be empty
    /// - Log format must be one of: full, compact, json
    /// - At least one output must be enabled
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !VALID_LOG_LEVELS.contains(&self.level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logger.level".to_string(),
                message: format!(
                    "Invalid log level '{}'. Valid levels are: {}",
                    self.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        if !self.console.enabled && !self.file.enabled {
            return Err(ConfigError::validation(
                "logger",
                "At least one output (console or file) must be enabled.",
            ));
        }

        self.file.validate()
    }
}

impl Settings {
    /// Validate all configuration settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.logger.validate()?;
        self.pushbullet.validate()?;
        self.plugin.validate()?;
        self.webcam.validate()?;
        self.client.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(err: ConfigError) -> String {
        match err {
            ConfigError::ValidationError { field, .. } => field,
            other => panic!("Expected ValidationError, got {:?}", other),
        }
    }

    #[test]
    fn test_default_settings_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_server_config_invalid_port_zero() {
        let config = ServerConfig {
            port: 0,
            ..ServerConfig::default()
        };
        assert_eq!(field_of(config.validate().unwrap_err()), "server.port");
    }

    #[test]
    fn test_server_config_invalid_request_timeout() {
        let config = ServerConfig {
            request_timeout: 0,
            ..ServerConfig::default()
        };
        assert_eq!(
            field_of(config.validate().unwrap_err()),
            "server.request_timeout"
        );
    }

    #[test]
    fn test_pushbullet_url_must_be_http() {
        let config = PushbulletConfig {
            api_url: "ftp://api.pushbullet.com".to_string(),
            ..PushbulletConfig::default()
        };
        assert_eq!(field_of(config.validate().unwrap_err()), "pushbullet.api_url");
    }

    #[test]
    fn test_pushbullet_url_must_parse() {
        let config = PushbulletConfig {
            api_url: "not a url".to_string(),
            ..PushbulletConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_plugin_interval_must_be_positive() {
        let plugin = PluginSettings {
            periodic_updates_interval: 0,
            ..PluginSettings::default()
        };
        assert_eq!(
            field_of(plugin.validate().unwrap_err()),
            "plugin.periodic_updates_interval"
        );
    }

    #[test]
    fn test_plugin_interval_is_bounded() {
        let week = PluginSettings {
            periodic_updates_interval: MAX_PERIODIC_INTERVAL_MINUTES,
            ..PluginSettings::default()
        };
        assert!(week.validate().is_ok());

        let huge = PluginSettings {
            periodic_updates_interval: u64::MAX,
            ..PluginSettings::default()
        };
        assert_eq!(
            field_of(huge.validate().unwrap_err()),
            "plugin.periodic_updates_interval"
        );
    }

    #[test]
    fn test_webcam_empty_snapshot_is_ignored() {
        let webcam = WebcamConfig {
            snapshot: Some(String::new()),
            ..WebcamConfig::default()
        };
        assert!(webcam.validate().is_ok());
    }

    #[test]
    fn test_webcam_invalid_snapshot_url() {
        let webcam = WebcamConfig {
            snapshot: Some("snapshot.jpg".to_string()),
            ..WebcamConfig::default()
        };
        assert_eq!(field_of(webcam.validate().unwrap_err()), "webcam.snapshot");
    }

    #[test]
    fn test_client_base_url_validated() {
        let client = ClientConfig {
            base_url: "octopi.local".to_string(),
            api_key: None,
        };
        assert_eq!(field_of(client.validate().unwrap_err()), "client.base_url");
    }

    #[test]
    fn test_logger_settings_invalid_level() {
        let settings = LoggerSettings {
            level: "verbose".to_string(),
            ..LoggerSettings::default()
        };
        assert_eq!(field_of(settings.validate().unwrap_err()), "logger.level");
    }

    #[test]
    fn test_logger_settings_file_enabled_empty_path() {
        let mut settings = LoggerSettings::default();
        settings.file.enabled = true;
        settings.file.path = "  ".to_string();
        assert_eq!(field_of(settings.validate().unwrap_err()), "logger.file.path");
    }

    #[test]
    fn test_logger_settings_no_output() {
        let mut settings = LoggerSettings::default();
        settings.console.enabled = false;
        assert_eq!(field_of(settings.validate().unwrap_err()), "logger");
    }

    #[test]
    fn test_settings_reports_first_invalid_section() {
        let mut settings = Settings::default();
        settings.plugin.periodic_updates_interval = 0;
        settings.client.base_url = "nope".to_string();
        assert_eq!(
            field_of(settings.validate().unwrap_err()),
            "plugin.periodic_updates_interval"
        );
    }
}
