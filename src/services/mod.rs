//! Service layer for business logic operations.
//!
//! Services own the plugin's runtime state and coordinate the Pushbullet
//! client, the webcam and the print event handling for the API handlers.

pub mod formatting;
mod print_events;
mod push_service;
mod settings_service;
pub mod snapshot;

pub use print_events::{PrintEvent, PrintEventService, PrintMessage, PrintProgress};
pub use push_service::{DEFAULT_TEST_MESSAGE, PushSender, PushService, TEST_TITLE, TestOutcome};
pub use settings_service::{MessageTemplateUpdate, PluginSettingsUpdate, SettingsService};
pub use snapshot::Snapshotter;

use jiff::Timestamp;

use crate::config::{PluginSettings, Settings};

/// Aggregates all services for convenient access.
///
/// Used as part of the Axum application state. Cloning is cheap; shared
/// state lives behind `Arc`s.
#[derive(Clone)]
pub struct Services {
    pub settings: SettingsService,
    pub push: PushService,
    pub prints: PrintEventService,
}

impl Services {
    pub fn new(settings: &Settings) -> Self {
        let store = SettingsService::new(settings.plugin.clone());
        let push = PushService::new(
            settings.pushbullet.clone(),
            Snapshotter::new(settings.webcam.clone()),
        );
        let prints = PrintEventService::new(store.subscribe(), push.clone());

        Self {
            settings: store,
            push,
            prints,
        }
    }

    /// Connect the sender with the currently stored credentials.
    pub async fn connect(&self) {
        let current = self.settings.current();
        self.push
            .connect(
                current.access_token.as_deref(),
                current.push_channel.as_deref(),
            )
            .await;
    }

    /// Store `update`, reconnect in the background and restart a running
    /// progress schedule.
    pub fn save_settings(&self, update: PluginSettingsUpdate, now: Timestamp) -> PluginSettings {
        let saved = self.settings.apply(update);

        self.push.reconnect(saved.access_token.clone(), saved.push_channel.clone());

        self.prints.reset_schedule(now);
        saved
    }
}
