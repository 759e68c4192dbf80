//! Logger Module
//!
//! A logging system based on `tracing-subscriber` with support for:
//! - Console output with color control
//! - File output in full, compact or JSON format
//! - Changing the level filter at runtime through `LogLevelHandle`

pub mod config;
pub mod error;
pub(crate) mod writer;

pub use config::*;
pub use error::LoggerError;

use std::io::IsTerminal;

use tracing::Subscriber;
use tracing_subscriber::{
    EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, registry::LookupSpan, reload,
    util::SubscriberInitExt,
};
use writer::LogFileWriter;

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

/// Handle to the installed level filter.
#[derive(Clone)]
pub struct LogLevelHandle {
    inner: reload::Handle<EnvFilter, Registry>,
}

impl LogLevelHandle {
    /// Replace the active filter, e.g. `"debug"` or `"octobullet=trace"`.
    pub fn set_level(&self, level: &str) -> Result<(), LoggerError> {
        let filter = parse_filter(level)?;
        self.inner.reload(filter).map_err(|e| LoggerError::Reload {
            message: e.to_string(),
        })
    }
}

/// Initialize the global logger with the given configuration.
///
/// The file layer is registered before the console layer so that ANSI
/// escapes from the console formatter never leak into span fields written
/// to the file (tokio-rs/tracing#1817).
pub fn init_logger(config: LoggerConfig) -> Result<LogLevelHandle, LoggerError> {
    config.validate()?;

    let (filter, handle) = reload::Layer::new(config.env_filter()?);

    let file_layer = if config.file.enabled {
        Some(file_layer(&config.file)?)
    } else {
        None
    };
    let console_layer = config.console.enabled.then(|| console_layer(&config.console));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| LoggerError::AlreadyInitialized {
            message: e.to_string(),
        })?;

    Ok(LogLevelHandle { inner: handle })
}

fn console_layer<S>(config: &ConsoleConfig) -> BoxedLayer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let use_ansi = config.colored && std::io::stdout().is_terminal();

    fmt::layer()
        .with_ansi(use_ansi)
        .with_target(true)
        .with_level(true)
        .boxed()
}

fn file_layer<S>(config: &FileConfig) -> Result<BoxedLayer<S>, LoggerError>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let writer = LogFileWriter::new(config)?;

    let layer = match config.format {
        LogFormat::Full => fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_writer(writer)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .compact()
            .with_writer(writer)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .with_ansi(false)
            .json()
            .with_writer(writer)
            .boxed(),
    };

    Ok(layer)
}
