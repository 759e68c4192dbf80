//! octobullet library
//!
//! Pushbullet notifications for print jobs: the HTTP plugin API, the push
//! service behind it and the client used to send a test notification.

use shadow_rs::shadow;
shadow!(build);

pub mod api;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod external;
pub mod logger;
pub mod server;
pub mod services;
pub mod state;
pub mod utils;

pub use state::AppState;

pub fn pkg_version() -> &'static str {
    build::PKG_VERSION
}

pub fn clap_long_version() -> &'static str {
    build::CLAP_LONG_VERSION
}
