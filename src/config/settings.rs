//! Configuration settings structures for octobullet
//!
//! All structures can be loaded from TOML files and environment variables.
//! Every field has a serde default so partial files are valid.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::error::ConfigError;
use crate::logger::{ConsoleConfig, FileConfig, LogFormat, LoggerConfig};

// ============================================================================
// Default value functions
// ============================================================================

fn default_app_name() -> String {
    "octobullet".to_string()
}

fn default_app_version() -> String {
    crate::pkg_version().to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_request_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_path() -> String {
    "logs/octobullet.log".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_pushbullet_url() -> String {
    "https://api.pushbullet.com/v2".to_string()
}

fn default_pushbullet_timeout() -> u64 {
    30
}

fn default_periodic_interval() -> u64 {
    15
}

fn default_client_base_url() -> String {
    "http://127.0.0.1:5000/api/".to_string()
}

// ============================================================================
// Application / Server
// ============================================================================

/// Application basic information configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    #[serde(default = "default_app_name")]
    pub name: String,

    #[serde(default = "default_app_version")]
    pub version: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            version: default_app_version(),
        }
    }
}

/// Axum HTTP server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

impl ServerConfig {
    /// Get the full server address as "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout: default_request_timeout(),
        }
    }
}

/// Access control for the plugin API.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Key expected in `X-Api-Key` for admin-only endpoints.
    /// When empty, every admin-only request is refused.
    #[serde(default)]
    pub admin_key: String,
}

// ============================================================================
// Pushbullet / plugin
// ============================================================================

/// Upstream Pushbullet API configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushbulletConfig {
    #[serde(default = "default_pushbullet_url")]
    pub api_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_pushbullet_timeout")]
    pub timeout: u64,
}

impl Default for PushbulletConfig {
    fn default() -> Self {
        Self {
            api_url: default_pushbullet_url(),
            timeout: default_pushbullet_timeout(),
        }
    }
}

/// Title/body pair with `{placeholder}` substitution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageTemplate {
    pub title: String,
    pub body: String,
}

impl MessageTemplate {
    pub fn print_done() -> Self {
        Self {
            title: "Print job finished".to_string(),
            body: "{file} finished printing in {elapsed_time}".to_string(),
        }
    }

    pub fn print_progress() -> Self {
        Self {
            title: "Print job {progress}% complete".to_string(),
            body: "{progress}% on {file}\nTime elapsed: {elapsed_time}\nTime left: {remaining_time}\nETA: {eta}"
                .to_string(),
        }
    }
}

/// Runtime-editable plugin settings.
///
/// Loaded from the `[plugin]` section at startup and mutated through the
/// settings endpoint afterwards. Changes are kept in memory only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginSettings {
    #[serde(default)]
    pub access_token: Option<String>,

    #[serde(default)]
    pub push_channel: Option<String>,

    #[serde(default)]
    pub periodic_updates: bool,

    /// Minutes between periodic progress messages
    #[serde(default = "default_periodic_interval")]
    pub periodic_updates_interval: u64,

    #[serde(default = "MessageTemplate::print_done")]
    pub print_done: MessageTemplate,

    #[serde(default = "MessageTemplate::print_progress")]
    pub print_progress: MessageTemplate,
}

/// Longest accepted periodic interval, one week in minutes.
pub const MAX_PERIODIC_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

impl PluginSettings {
    /// Periodic interval in seconds.
    pub fn periodic_interval_secs(&self) -> i64 {
        i64::try_from(self.periodic_updates_interval)
            .unwrap_or(i64::MAX)
            .saturating_mul(60)
    }
}

impl Default for PluginSettings {
    fn default() -> Self {
        Self {
            access_token: None,
            push_channel: None,
            periodic_updates: false,
            periodic_updates_interval: default_periodic_interval(),
            print_done: MessageTemplate::print_done(),
            print_progress: MessageTemplate::print_progress(),
        }
    }
}

/// Webcam snapshot source and post-processing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WebcamConfig {
    /// Snapshot URL; no snapshot is attached when unset
    #[serde(default)]
    pub snapshot: Option<String>,

    #[serde(default)]
    pub flip_h: bool,

    #[serde(default)]
    pub flip_v: bool,

    #[serde(default)]
    pub rotate90: bool,

    /// Path to the ffmpeg binary used for flipping/rotating
    #[serde(default)]
    pub ffmpeg: Option<String>,
}

impl WebcamConfig {
    pub fn needs_transform(&self) -> bool {
        self.flip_h || self.flip_v || self.rotate90
    }
}

/// Where the `test` command sends its request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the host API, e.g. `http://octopi.local/api/`
    #[serde(default = "default_client_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_client_base_url(),
            api_key: None,
        }
    }
}

// ============================================================================
// Logger Settings
// ============================================================================

/// Console output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_true")]
    pub colored: bool,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            colored: true,
        }
    }
}

/// File output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSettings {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_log_path")]
    pub path: String,

    /// Whether to append to an existing file
    #[serde(default = "default_true")]
    pub append: bool,

    /// Log format: "full", "compact", or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_log_path(),
            append: true,
            format: default_log_format(),
        }
    }
}

/// Logger configuration settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerSettings {
    /// Log level or filter directive, e.g. "info" or "octobullet=debug"
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub console: ConsoleSettings,

    #[serde(default)]
    pub file: FileSettings,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            console: ConsoleSettings::default(),
            file: FileSettings::default(),
        }
    }
}

impl LoggerSettings {
    /// Convert the file representation into the runtime `LoggerConfig`.
    pub fn into_logger_config(self) -> Result<LoggerConfig, ConfigError> {
        let format = self
            .file
            .format
            .parse::<LogFormat>()
            .map_err(|e| ConfigError::ValidationError {
                field: "logger.file.format".to_string(),
                message: e.to_string(),
            })?;

        let console = ConsoleConfig {
            enabled: self.console.enabled,
            colored: self.console.colored,
        };
        let file = FileConfig {
            enabled: self.file.enabled,
            path: PathBuf::from(self.file.path),
            append: self.file.append,
            format,
        };

        LoggerConfig::new(console, file, self.level).map_err(|e| ConfigError::ValidationError {
            field: "logger".to_string(),
            message: e.to_string(),
        })
    }
}

// ============================================================================
// Main Settings Structure
// ============================================================================

/// Complete application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub application: ApplicationConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub logger: LoggerSettings,

    #[serde(default)]
    pub pushbullet: PushbulletConfig,

    #[serde(default)]
    pub plugin: PluginSettings,

    #[serde(default)]
    pub webcam: WebcamConfig,

    #[serde(default)]
    pub client: ClientConfig,
}
