//! Command executor for dispatching CLI commands
//!
//! This module provides the main entry point for executing CLI commands
//! after parsing and configuration loading.

use std::process::ExitCode;

use super::handlers::{ServeCommandHandler, TestCommandHandler};
use super::parser::{Cli, Commands};
use crate::config::{Environment, settings::Settings};
use crate::error::{AppError, AppResult};

/// Execute a CLI command with the given settings
///
/// Without a subcommand the server is started.
///
/// # Returns
/// The process exit code: failure when `test` did not deliver the
/// notification.
///
/// # Errors
/// Returns errors from command handlers or validation failures
pub async fn execute_command(
    cli: &Cli,
    settings: Settings,
    environment: Environment,
) -> AppResult<ExitCode> {
    validate_command_args(cli)?;

    match &cli.command {
        Some(Commands::Serve { dry_run, .. }) => {
            ServeCommandHandler::new(settings, environment)
                .execute(*dry_run)
                .await?;
            Ok(ExitCode::SUCCESS)
        }
        None => {
            ServeCommandHandler::new(settings, environment)
                .execute(false)
                .await?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Test { .. }) => {
            let result = TestCommandHandler::new(&settings).execute().await?;
            tracing::debug!(result = %result, "Test command finished");
            if result.is_success() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
    }
}

/// Validate command arguments before execution
fn validate_command_args(cli: &Cli) -> AppResult<()> {
    cli.validate().map_err(|msg| AppError::Validation {
        field: "cli_arguments".to_string(),
        reason: msg,
    })?;

    if let Some(Commands::Serve {
        host: Some(host),
        port: Some(port),
        ..
    }) = &cli.command
        && *port < 1024
        && host == "0.0.0.0"
    {
        eprintln!(
            "Warning: Binding to 0.0.0.0 on port {} requires root privileges",
            port
        );
    }

    Ok(())
}
