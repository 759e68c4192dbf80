use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

use super::outcome::TestResult;
use super::settings::SettingsAccessor;
use super::sink::NotificationSink;
use super::transport::PluginApi;

/// Plugin endpoint the test command is posted to, relative to the API root.
pub const PLUGIN_PATH: &str = "plugin/octobullet";

#[derive(Debug, Serialize)]
struct TestCommand {
    command: &'static str,
    token: Option<String>,
    channel: Option<String>,
}

/// Sends a test notification through the plugin and reports the outcome.
///
/// `busy` is published on a watch channel so a UI control can bind to it
/// and suppress re-entry while a request is in flight. Nothing here
/// prevents a second concurrent call.
pub struct TestNotifier {
    settings: Arc<dyn SettingsAccessor>,
    sink: Arc<dyn NotificationSink>,
    api: Arc<dyn PluginApi>,
    busy: watch::Sender<bool>,
}

/// Clears `busy` on every exit path, including cancellation of the future.
struct BusyGuard<'a> {
    busy: &'a watch::Sender<bool>,
}

impl<'a> BusyGuard<'a> {
    fn acquire(busy: &'a watch::Sender<bool>) -> Self {
        busy.send_replace(true);
        Self { busy }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.busy.send_replace(false);
    }
}

impl TestNotifier {
    pub fn new(
        settings: Arc<dyn SettingsAccessor>,
        sink: Arc<dyn NotificationSink>,
        api: Arc<dyn PluginApi>,
    ) -> Self {
        let (busy, _) = watch::channel(false);
        Self {
            settings,
            sink,
            api,
            busy,
        }
    }

    pub fn is_busy(&self) -> bool {
        *self.busy.borrow()
    }

    /// Observe the busy flag.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.busy.subscribe()
    }

    /// Post the test command and emit the matching notice.
    ///
    /// Transport failures produce no notice; they are only logged.
    pub async fn send_test_message(&self) -> TestResult {
        let guard = BusyGuard::acquire(&self.busy);

        let command = TestCommand {
            command: "test",
            token: self.settings.access_token(),
            channel: self.settings.push_channel(),
        };
        let body = match serde_json::to_value(&command) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode test command");
                return TestResult::ErrorTransport;
            }
        };

        tracing::debug!(
            path = PLUGIN_PATH,
            has_token = command.token.is_some(),
            channel = ?command.channel,
            "Sending test message"
        );

        let result = match self.api.post_json(PLUGIN_PATH, &body).await {
            Ok(response) => TestResult::from_response(&response),
            Err(e) => {
                tracing::warn!(error = %e, "Test message request failed");
                TestResult::ErrorTransport
            }
        };

        drop(guard);

        if let Some(notice) = result.notice() {
            self.sink.notify(notice);
        }

        tracing::info!(result = %result, "Test message finished");
        result
    }
}
