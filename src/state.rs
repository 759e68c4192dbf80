//! Application state for Axum web framework.
//!
//! Contains shared services and resources that are accessible
//! across all request handlers.

use crate::config::{ApiConfig, Settings};
use crate::services::Services;

/// Application state containing all shared services and resources.
///
/// Cloning is cheap since the services keep their state behind `Arc`s.
#[derive(Clone)]
pub struct AppState {
    /// All business logic services
    pub services: Services,
    /// Access control for admin-only endpoints
    pub api: ApiConfig,
    /// Version reported by the health endpoint
    pub version: String,
}

impl AppState {
    /// Builds the services from the loaded settings.
    ///
    /// The Pushbullet sender is not connected yet; call
    /// `services.connect()` once the runtime is up.
    pub fn new(settings: &Settings) -> Self {
        Self {
            services: Services::new(settings),
            api: settings.api.clone(),
            version: settings.application.version.clone(),
        }
    }
}
