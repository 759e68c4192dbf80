//! Serve command handler
//!
//! Handles the serve command including dry-run validation and server startup.

use crate::config::{Environment, settings::Settings};
use crate::error::AppResult;
use crate::server::Server;

/// Handler for the serve command
pub struct ServeCommandHandler {
    config: Settings,
    environment: Environment,
}

impl ServeCommandHandler {
    pub fn new(config: Settings, environment: Environment) -> Self {
        Self {
            config,
            environment,
        }
    }

    /// Run the server, or only validate the configuration when `dry_run` is set.
    ///
    /// # Errors
    /// - Configuration validation errors
    /// - Server startup errors (if not dry-run)
    pub async fn execute(self, dry_run: bool) -> AppResult<()> {
        if dry_run {
            return self.validate_only();
        }

        Server::new(self.config, self.environment).run().await?;
        Ok(())
    }

    /// Validate configuration without starting the server
    pub fn validate_only(&self) -> AppResult<()> {
        self.config.validate()?;

        println!("✓ Configuration is valid");
        println!("✓ Server would bind to: {}", self.config.server.address());
        println!("✓ Pushbullet API: {}", self.config.pushbullet.api_url);
        println!(
            "✓ Access token {}",
            if self.config.plugin.access_token.is_some() {
                "is configured"
            } else {
                "is not configured, notifications are disabled"
            }
        );
        if self.config.api.admin_key.is_empty() {
            println!("! No admin key configured, admin-only endpoints will refuse every request");
        }
        if self.config.webcam.needs_transform() && self.config.webcam.ffmpeg.is_none() {
            println!("! Webcam flip/rotate is set but no ffmpeg path is configured");
        }

        println!("Dry run completed successfully - configuration is ready for deployment");
        Ok(())
    }

    /// Get the configuration
    pub fn config(&self) -> &Settings {
        &self.config
    }
}
