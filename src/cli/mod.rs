//! CLI module for octobullet
//!
//! This module provides command-line interface functionality including:
//! - Argument parsing with clap
//! - Configuration merging (CLI args + config files)
//! - Command execution and validation
//! - Command handlers for the serve and test operations

pub mod config_merger;
pub mod executor;
pub mod handlers;
pub mod parser;
pub mod validation;

pub use config_merger::ConfigurationMerger;
pub use executor::execute_command;
pub use parser::{Cli, Commands, Environment, LogLevel};

use anyhow::Context;

use crate::config::Environment as AppEnvironment;
use crate::config::settings::Settings;
use crate::logger::{LogLevelHandle, init_logger};

/// Environment selected by `--env`, falling back to `OCTOBULLET_APP_ENV`.
pub fn resolve_environment(cli: &Cli) -> AppEnvironment {
    cli.env
        .map(AppEnvironment::from)
        .unwrap_or_else(AppEnvironment::from_env)
}

/// Load the configuration files and merge the CLI overrides on top.
///
/// # Errors
/// Returns error if configuration loading, merging, or validation fails
pub fn load_and_merge_config(cli: &Cli, environment: AppEnvironment) -> anyhow::Result<Settings> {
    let merger = ConfigurationMerger::load(cli.config.as_deref(), environment)
        .context("Configuration error")?;

    merger
        .merge_cli_args(cli)
        .context("Configuration merge error")
}

/// Initialize logger from settings
///
/// # Errors
/// Returns error if the logger settings are invalid or a global
/// subscriber is already installed
pub fn init_logger_from_settings(settings: &Settings) -> anyhow::Result<LogLevelHandle> {
    let logger_config = settings
        .logger
        .clone()
        .into_logger_config()
        .context("Logger configuration error")?;

    init_logger(logger_config).context("Logger initialization error")
}
