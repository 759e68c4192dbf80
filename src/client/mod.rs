//! Client side of the plugin's "send test notification" action.
//!
//! `TestNotifier` reads the current credentials through a
//! `SettingsAccessor`, posts the test command through a `PluginApi` and
//! reports the classified outcome to a `NotificationSink`.

mod notifier;
mod outcome;
mod settings;
mod sink;
mod transport;

pub use notifier::{PLUGIN_PATH, TestNotifier};
pub use outcome::{Notice, NoticeKind, TestResult};
pub use settings::{SettingsAccessor, StaticSettings};
pub use sink::{ConsoleSink, NotificationSink};
pub use transport::{API_KEY_HEADER, HttpPluginApi, PluginApi, TransportError};
