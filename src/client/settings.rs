//! Read access to the credential and channel the test uses.

use std::sync::Arc;

use tokio::sync::watch;

use crate::config::PluginSettings;

/// Current values of the plugin's `access_token` and `push_channel`.
///
/// Values are read once per test, at call time.
pub trait SettingsAccessor: Send + Sync {
    fn access_token(&self) -> Option<String>;
    fn push_channel(&self) -> Option<String>;
}

/// Fixed values, e.g. from the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticSettings {
    pub access_token: Option<String>,
    pub push_channel: Option<String>,
}

impl StaticSettings {
    pub fn new(access_token: Option<String>, push_channel: Option<String>) -> Self {
        Self {
            access_token,
            push_channel,
        }
    }
}

impl SettingsAccessor for StaticSettings {
    fn access_token(&self) -> Option<String> {
        self.access_token.clone()
    }

    fn push_channel(&self) -> Option<String> {
        self.push_channel.clone()
    }
}

/// Live view of settings published by the settings store.
impl SettingsAccessor for watch::Receiver<PluginSettings> {
    fn access_token(&self) -> Option<String> {
        self.borrow().access_token.clone()
    }

    fn push_channel(&self) -> Option<String> {
        self.borrow().push_channel.clone()
    }
}

impl<T: SettingsAccessor + ?Sized> SettingsAccessor for Arc<T> {
    fn access_token(&self) -> Option<String> {
        (**self).access_token()
    }

    fn push_channel(&self) -> Option<String> {
        (**self).push_channel()
    }
}
