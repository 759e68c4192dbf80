//! Configuration merger for CLI arguments and config files
//!
//! This module handles merging CLI argument overrides with file-based configuration,
//! implementing the configuration precedence logic.

use super::parser::{Cli, Commands};
use crate::config::error::ConfigError;
use crate::config::{ConfigLoader, Environment, settings::Settings};
use std::path::Path;

/// Applies CLI argument overrides on top of file-based configuration.
///
/// CLI arguments have the highest priority.
pub struct ConfigurationMerger {
    base_config: Settings,
}

impl ConfigurationMerger {
    /// Create a new configuration merger with base configuration
    pub fn new(base_config: Settings) -> Self {
        Self { base_config }
    }

    /// Load the base configuration from `config_path`, or from the layered
    /// configuration directory when no path is given.
    ///
    /// # Errors
    /// Returns ConfigError if configuration loading or validation fails
    pub fn load(config_path: Option<&Path>, environment: Environment) -> Result<Self, ConfigError> {
        let loader = match config_path {
            Some(path) => {
                Self::validate_config_file_access(path)?;
                ConfigLoader::from_file(path)
            }
            None => ConfigLoader::new()?,
        };

        let config = loader.with_environment(environment).load()?;
        Ok(Self::new(config))
    }

    fn validate_config_file_access(path: &Path) -> Result<(), ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::validation(
                "config_file".to_string(),
                format!("Configuration file does not exist: '{}'", path.display()),
            ));
        }

        std::fs::File::open(path).map(|_| ()).map_err(|e| {
            ConfigError::validation(
                "config_file".to_string(),
                format!("Cannot read configuration file '{}': {}", path.display(), e),
            )
        })
    }

    /// Merge CLI arguments with the base configuration and validate the result.
    pub fn merge_cli_args(&self, cli: &Cli) -> Result<Settings, ConfigError> {
        let mut config = self.base_config.clone();

        Self::apply_global_overrides(&mut config, cli);

        if let Some(ref command) = cli.command {
            Self::apply_command_overrides(&mut config, command);
        }

        config.validate()?;

        Ok(config)
    }

    fn apply_global_overrides(config: &mut Settings, cli: &Cli) {
        if cli.verbose {
            config.logger.level = "debug".to_string();
        } else if cli.quiet {
            config.logger.level = "error".to_string();
        }
    }

    fn apply_command_overrides(config: &mut Settings, command: &Commands) {
        match command {
            Commands::Serve {
                host,
                port,
                log_level,
                dry_run: _,
            } => {
                if let Some(host_addr) = host {
                    config.server.host = host_addr.clone();
                }

                if let Some(port_num) = port {
                    config.server.port = *port_num;
                }

                // Command-specific level takes precedence over --verbose/--quiet
                if let Some(level) = log_level {
                    config.logger.level = level.clone().into();
                }
            }
            Commands::Test {
                url,
                token,
                channel,
                api_key,
            } => {
                if let Some(url) = url {
                    config.client.base_url = url.clone();
                }
                if let Some(key) = api_key {
                    config.client.api_key = Some(key.clone());
                }
                if let Some(token) = token {
                    config.plugin.access_token = Some(token.clone());
                }
                if let Some(channel) = channel {
                    config.plugin.push_channel = Some(channel.clone());
                }
            }
        }
    }

    /// Get the base configuration
    pub fn config(&self) -> &Settings {
        &self.base_config
    }
}
