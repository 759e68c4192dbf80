//! CLI argument parsing with clap
//!
//! This module defines the command-line interface structure using clap,
//! including all commands, arguments, and their documentation.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Pushbullet notifications for print jobs
#[derive(Parser, Debug)]
#[command(name = "octobullet")]
#[command(about = "Pushbullet notifications for print jobs")]
#[command(long_about = "
octobullet runs the Pushbullet notification plugin as an HTTP service and
ships a client that asks a running instance to send a test notification.

EXAMPLES:
    # Start the server with default configuration
    octobullet serve

    # Start server on custom host and port
    octobullet serve --host 0.0.0.0 --port 8080

    # Use custom configuration file
    octobullet --config /path/to/config.toml serve

    # Check configuration without starting server
    octobullet serve --dry-run

    # Send a test notification through a running server
    octobullet test --token o.abc123 --channel printers --api-key secret

    # Talk to a server on another host
    octobullet test --url http://octopi.local/api/ --api-key secret
")]
#[command(version = crate::clap_long_version())]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file path
    ///
    /// Use a single TOML file instead of the layered configuration
    /// directory. Environment variable overrides still apply.
    ///
    /// Example: --config /etc/octobullet/production.toml
    #[arg(short, long, value_name = "FILE", value_parser = super::validation::validate_config_file_path)]
    pub config: Option<PathBuf>,

    /// Override environment detection
    ///
    /// Selects the overlay file to load and whether the API docs are served.
    ///
    /// Available values: development (dev), test, staging (stage), production (prod)
    #[arg(short, long, value_enum)]
    pub env: Option<Environment>,

    /// Enable verbose logging
    ///
    /// Increases log output to debug level. Cannot be used with --quiet.
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-error output
    ///
    /// Reduces log output to error level only. Cannot be used with --verbose.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the plugin server (default)
    ///
    /// Connects to Pushbullet with the configured credentials and serves
    /// the plugin API.
    ///
    /// Examples:
    ///   octobullet serve                           # Start with defaults
    ///   octobullet serve --host 0.0.0.0 --port 80  # Bind to all interfaces on port 80
    ///   octobullet serve --dry-run                 # Validate config without starting
    Serve {
        /// Host address to bind to
        ///
        /// Use 127.0.0.1 for localhost only, or 0.0.0.0 to accept connections
        /// from any interface.
        ///
        /// Default: 127.0.0.1
        #[arg(long, value_name = "ADDRESS", value_parser = super::validation::validate_host_address)]
        host: Option<String>,

        /// Port number to listen on
        ///
        /// Default: 5000
        #[arg(short, long, value_name = "PORT", value_parser = super::validation::validate_port)]
        port: Option<u16>,

        /// Log level override
        ///
        /// Overrides both configuration file settings and global --verbose/--quiet flags.
        ///
        /// Available levels: error, warn, info, debug, trace
        #[arg(long, value_enum)]
        log_level: Option<LogLevel>,

        /// Validate configuration and exit
        ///
        /// Returns exit code 0 if valid, non-zero if invalid.
        #[arg(long)]
        dry_run: bool,
    },
    /// Send a test notification through a running server
    ///
    /// Posts the `test` command to the plugin endpoint and prints the
    /// outcome. Exits non-zero unless the notification was delivered.
    ///
    /// Examples:
    ///   octobullet test --token o.abc123                   # Whole account
    ///   octobullet test --token o.abc123 --channel shop    # One channel
    Test {
        /// Base URL of the server API
        ///
        /// Default: http://127.0.0.1:5000/api/
        #[arg(long, value_name = "URL", value_parser = super::validation::validate_base_url)]
        url: Option<String>,

        /// Pushbullet access token to test
        #[arg(long, value_name = "TOKEN", env = "OCTOBULLET_TEST_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Channel tag to test; omit for the whole account
        #[arg(long, value_name = "TAG")]
        channel: Option<String>,

        /// Admin API key of the server
        #[arg(long, value_name = "KEY", env = "OCTOBULLET_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
    },
}

/// Environment options
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Environment {
    #[value(name = "development", alias = "dev")]
    Development,
    #[value(name = "test")]
    Test,
    #[value(name = "staging", alias = "stage")]
    Staging,
    #[value(name = "production", alias = "prod")]
    Production,
}

/// Log level options
#[derive(ValueEnum, Clone, Debug)]
pub enum LogLevel {
    #[value(name = "error")]
    Error,
    #[value(name = "warn", alias = "warning")]
    Warn,
    #[value(name = "info")]
    Info,
    #[value(name = "debug")]
    Debug,
    #[value(name = "trace")]
    Trace,
}

impl Cli {
    /// Validate argument combinations clap cannot express.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(Commands::Test { token, channel, .. }) = &self.command {
            if token.as_deref().is_some_and(|t| t.trim().is_empty()) {
                return Err("--token must not be empty".to_string());
            }
            if channel.as_deref().is_some_and(|c| c.trim().is_empty()) {
                return Err("--channel must not be empty; omit it to use the whole account".to_string());
            }
        }

        if self.verbose && self.quiet {
            return Err("Cannot use --verbose and --quiet together".to_string());
        }

        Ok(())
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => "error".to_string(),
            LogLevel::Warn => "warn".to_string(),
            LogLevel::Info => "info".to_string(),
            LogLevel::Debug => "debug".to_string(),
            LogLevel::Trace => "trace".to_string(),
        }
    }
}

impl From<Environment> for crate::config::Environment {
    fn from(env: Environment) -> Self {
        match env {
            Environment::Development => crate::config::Environment::Development,
            Environment::Test => crate::config::Environment::Test,
            Environment::Staging => crate::config::Environment::Staging,
            Environment::Production => crate::config::Environment::Production,
        }
    }
}
