use std::process::ExitCode;

use clap::Parser;
use octobullet::cli::{
    Cli, execute_command, init_logger_from_settings, load_and_merge_config, resolve_environment,
};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let environment = resolve_environment(&cli);

    let settings = load_and_merge_config(&cli, environment)?;

    let _log_handle = init_logger_from_settings(&settings)?;

    tracing::debug!(environment = %environment, "Configuration loaded");

    let code = execute_command(&cli, settings, environment).await?;
    Ok(code)
}
