//! In-memory store of the runtime-editable plugin settings.

use std::sync::Arc;

use tokio::sync::watch;

use crate::config::{MessageTemplate, PluginSettings};

/// Partial update of a message template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageTemplateUpdate {
    pub title: Option<String>,
    pub body: Option<String>,
}

impl MessageTemplateUpdate {
    fn apply_to(self, template: &mut MessageTemplate) {
        if let Some(title) = self.title {
            template.title = title;
        }
        if let Some(body) = self.body {
            template.body = body;
        }
    }
}

/// Partial update of `PluginSettings`. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginSettingsUpdate {
    /// `Some(None)` or an empty string clears the token
    pub access_token: Option<Option<String>>,
    /// `Some(None)` or an empty string clears the channel
    pub push_channel: Option<Option<String>>,
    pub periodic_updates: Option<bool>,
    pub periodic_updates_interval: Option<u64>,
    pub print_done: Option<MessageTemplateUpdate>,
    pub print_progress: Option<MessageTemplateUpdate>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Publishes settings changes to every subscriber.
#[derive(Clone)]
pub struct SettingsService {
    tx: Arc<watch::Sender<PluginSettings>>,
}

impl SettingsService {
    pub fn new(initial: PluginSettings) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    pub fn current(&self) -> PluginSettings {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PluginSettings> {
        self.tx.subscribe()
    }

    /// Apply `update` and return the resulting settings.
    pub fn apply(&self, update: PluginSettingsUpdate) -> PluginSettings {
        self.tx.send_modify(|settings| {
            if let Some(token) = update.access_token {
                settings.access_token = non_empty(token);
            }
            if let Some(channel) = update.push_channel {
                settings.push_channel = non_empty(channel);
            }
            if let Some(enabled) = update.periodic_updates {
                settings.periodic_updates = enabled;
            }
            if let Some(interval) = update.periodic_updates_interval {
                settings.periodic_updates_interval = interval;
            }
            if let Some(template) = update.print_done {
                template.apply_to(&mut settings.print_done);
            }
            if let Some(template) = update.print_progress {
                template.apply_to(&mut settings.print_progress);
            }
        });

        let settings = self.current();
        tracing::info!(
            has_token = settings.access_token.is_some(),
            channel = ?settings.push_channel,
            periodic_updates = settings.periodic_updates,
            interval = settings.periodic_updates_interval,
            "Plugin settings saved"
        );
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_partial_update() {
        let service = SettingsService::new(PluginSettings::default());
        let rx = service.subscribe();

        let saved = service.apply(PluginSettingsUpdate {
            access_token: Some(Some("o.tok".to_string())),
            periodic_updates_interval: Some(5),
            print_done: Some(MessageTemplateUpdate {
                title: Some("Done!".to_string()),
                body: None,
            }),
            ..PluginSettingsUpdate::default()
        });

        assert_eq!(saved.access_token.as_deref(), Some("o.tok"));
        assert!(saved.push_channel.is_none());
        assert_eq!(saved.periodic_updates_interval, 5);
        assert_eq!(saved.print_done.title, "Done!");
        assert_eq!(saved.print_done.body, MessageTemplate::print_done().body);
        assert_eq!(*rx.borrow(), saved);
    }

    #[test]
    fn test_empty_strings_clear_credentials() {
        let service = SettingsService::new(PluginSettings {
            access_token: Some("o.tok".to_string()),
            push_channel: Some("printers".to_string()),
            ..PluginSettings::default()
        });

        let saved = service.apply(PluginSettingsUpdate {
            access_token: Some(Some(String::new())),
            push_channel: Some(None),
            ..PluginSettingsUpdate::default()
        });

        assert!(saved.access_token.is_none());
        assert!(saved.push_channel.is_none());
    }

    #[test]
    fn test_empty_update_changes_nothing() {
        let initial = PluginSettings {
            push_channel: Some("printers".to_string()),
            ..PluginSettings::default()
        };
        let service = SettingsService::new(initial.clone());
        assert_eq!(service.apply(PluginSettingsUpdate::default()), initial);
    }
}
