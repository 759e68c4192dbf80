//! Plugin command and settings DTOs.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::Validate;

use crate::config::{MAX_PERIODIC_INTERVAL_MINUTES, MessageTemplate, PluginSettings};
use crate::services::{MessageTemplateUpdate, PluginSettingsUpdate, TestOutcome};

/// Distinguishes an explicit `null` (`Some(None)`) from an absent field (`None`).
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Simple-API command posted to the plugin endpoint.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "command": "test",
    "token": "o.abcdefghijklmnopqrstuvwxyz",
    "channel": "printers"
}))]
pub struct PluginCommandRequest {
    #[validate(length(min = 1, message = "command must not be empty"))]
    pub command: String,
    /// Access token to test with. The key is required; `null` is allowed.
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub token: Option<Option<String>>,
    /// Channel tag to test with
    #[serde(default)]
    pub channel: Option<String>,
    /// Overrides the default test message body
    #[serde(default)]
    pub message: Option<String>,
}

/// Result of the `test` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({"result": false, "error": "channel"}))]
pub struct TestResponse {
    pub result: bool,
    /// `channel` or `apikey` when the credentials were rejected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<TestOutcome> for TestResponse {
    fn from(outcome: TestOutcome) -> Self {
        match outcome {
            TestOutcome::Sent(result) => Self {
                result,
                error: None,
            },
            TestOutcome::UnknownChannel => Self {
                result: false,
                error: Some("channel".to_string()),
            },
            TestOutcome::InvalidKey => Self {
                result: false,
                error: Some("apikey".to_string()),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MessageTemplateDto {
    pub title: String,
    pub body: String,
}

impl From<MessageTemplate> for MessageTemplateDto {
    fn from(template: MessageTemplate) -> Self {
        Self {
            title: template.title,
            body: template.body,
        }
    }
}

/// Plugin settings as seen by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PluginSettingsResponse {
    /// `null` unless the caller is an admin
    pub access_token: Option<String>,
    /// `null` unless the caller is an admin
    pub push_channel: Option<String>,
    pub periodic_updates: bool,
    /// Minutes between progress messages
    pub periodic_updates_interval: u64,
    pub print_done: MessageTemplateDto,
    pub print_progress: MessageTemplateDto,
}

impl PluginSettingsResponse {
    pub fn for_caller(settings: PluginSettings, is_admin: bool) -> Self {
        let (access_token, push_channel) = if is_admin {
            (settings.access_token, settings.push_channel)
        } else {
            (None, None)
        };

        Self {
            access_token,
            push_channel,
            periodic_updates: settings.periodic_updates,
            periodic_updates_interval: settings.periodic_updates_interval,
            print_done: settings.print_done.into(),
            print_progress: settings.print_progress.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct MessageTemplatePatch {
    #[serde(default)]
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, message = "body must not be empty"))]
    pub body: Option<String>,
}

impl From<MessageTemplatePatch> for MessageTemplateUpdate {
    fn from(patch: MessageTemplatePatch) -> Self {
        Self {
            title: patch.title,
            body: patch.body,
        }
    }
}

/// Partial settings update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "access_token": "o.abcdefghijklmnopqrstuvwxyz",
    "push_channel": "",
    "periodic_updates": true,
    "periodic_updates_interval": "10"
}))]
pub struct PluginSettingsRequest {
    /// Empty string or `null` clears the token
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub access_token: Option<Option<String>>,
    /// Empty string or `null` clears the channel
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub push_channel: Option<Option<String>>,
    #[serde(default)]
    pub periodic_updates: Option<bool>,
    /// Whole minutes, as a number or numeric string; other values are ignored
    #[serde(default)]
    #[schema(value_type = Option<Value>)]
    pub periodic_updates_interval: Option<Value>,
    #[serde(default)]
    #[validate(nested)]
    pub print_done: Option<MessageTemplatePatch>,
    #[serde(default)]
    #[validate(nested)]
    pub print_progress: Option<MessageTemplatePatch>,
}

/// Read an interval in whole minutes, accepting numeric strings and
/// truncating fractions.
pub(crate) fn parse_interval(value: &Value) -> Option<u64> {
    let minutes = match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f.trunc() as u64)
        }),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    minutes.filter(|m| (1..=MAX_PERIODIC_INTERVAL_MINUTES).contains(m))
}

impl PluginSettingsRequest {
    pub fn into_update(self) -> PluginSettingsUpdate {
        let periodic_updates_interval = self.periodic_updates_interval.and_then(|value| {
            let parsed = parse_interval(&value);
            if parsed.is_none() {
                tracing::warn!(
                    value = %value,
                    "Got an invalid value to save for periodic_updates_interval, ignoring it"
                );
            }
            parsed
        });

        PluginSettingsUpdate {
            access_token: self.access_token,
            push_channel: self.push_channel,
            periodic_updates: self.periodic_updates,
            periodic_updates_interval,
            print_done: self.print_done.map(Into::into),
            print_progress: self.print_progress.map(Into::into),
        }
    }
}
