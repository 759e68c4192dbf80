//! Test outcomes and the notices shown for them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

const SENT_TITLE: &str = "Test message sent";
const SENT_TEXT: &str = "A test message was sent to Pushbullet";
const FAILED_TITLE: &str = "Test message could not be sent";
const CHANNEL_TEXT: &str =
    "Test message could not be sent to Pushbullet due to the channel being unknown, check settings";
const APIKEY_TEXT: &str =
    "Test message could not be sent to Pushbullet due to an invalid Access Token, check settings";
const OTHER_TEXT: &str =
    "Test message could not be sent to Pushbullet, check log & your settings";

/// Outcome of one `send_test_message` round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestResult {
    Success,
    /// The server does not know the configured channel.
    ErrorChannel,
    /// The server rejected the configured access token.
    ErrorApiKey,
    /// The server reported failure without a recognised error code.
    ErrorOther,
    /// No usable response arrived.
    ErrorTransport,
}

impl TestResult {
    /// Classify a response body.
    ///
    /// Total over every JSON value: anything that is not an object with a
    /// truthy `result` falls through to the error codes, and anything
    /// without a known `error` code is `ErrorOther`.
    pub fn from_response(response: &Value) -> Self {
        if response.get("result").is_some_and(is_truthy) {
            return TestResult::Success;
        }

        match response.get("error").and_then(Value::as_str) {
            Some("channel") => TestResult::ErrorChannel,
            Some("apikey") => TestResult::ErrorApiKey,
            _ => TestResult::ErrorOther,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TestResult::Success)
    }

    /// The notice to show, or `None` for transport failures which stay silent.
    pub fn notice(&self) -> Option<Notice> {
        let (title, text, kind) = match self {
            TestResult::Success => (SENT_TITLE, SENT_TEXT, NoticeKind::Success),
            TestResult::ErrorChannel => (FAILED_TITLE, CHANNEL_TEXT, NoticeKind::Error),
            TestResult::ErrorApiKey => (FAILED_TITLE, APIKEY_TEXT, NoticeKind::Error),
            TestResult::ErrorOther => (FAILED_TITLE, OTHER_TEXT, NoticeKind::Error),
            TestResult::ErrorTransport => return None,
        };

        Some(Notice {
            title: title.to_string(),
            text: text.to_string(),
            kind,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TestResult::Success => "success",
            TestResult::ErrorChannel => "error_channel",
            TestResult::ErrorApiKey => "error_api_key",
            TestResult::ErrorOther => "error_other",
            TestResult::ErrorTransport => "error_transport",
        }
    }
}

impl std::fmt::Display for TestResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Loose truthiness, the way the host UI reads `result`.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Error,
}

/// A transient `{title, text, type}` banner for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub title: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: NoticeKind,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_result_true_is_success() {
        assert_eq!(
            TestResult::from_response(&json!({"result": true})),
            TestResult::Success
        );
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            TestResult::from_response(&json!({"result": false, "error": "channel"})),
            TestResult::ErrorChannel
        );
        assert_eq!(
            TestResult::from_response(&json!({"result": false, "error": "apikey"})),
            TestResult::ErrorApiKey
        );
        assert_eq!(
            TestResult::from_response(&json!({"result": false, "error": "quota"})),
            TestResult::ErrorOther
        );
        assert_eq!(
            TestResult::from_response(&json!({"result": false})),
            TestResult::ErrorOther
        );
    }

    #[test]
    fn test_result_wins_over_error_field() {
        assert_eq!(
            TestResult::from_response(&json!({"result": true, "error": "channel"})),
            TestResult::Success
        );
    }

    #[test]
    fn test_truthiness_of_result() {
        assert!(TestResult::from_response(&json!({"result": 1})).is_success());
        assert!(TestResult::from_response(&json!({"result": "yes"})).is_success());
        assert!(TestResult::from_response(&json!({"result": {}})).is_success());
        assert!(!TestResult::from_response(&json!({"result": 0})).is_success());
        assert!(!TestResult::from_response(&json!({"result": ""})).is_success());
        assert!(!TestResult::from_response(&json!({"result": null})).is_success());
    }

    #[test]
    fn test_non_object_bodies_are_other() {
        assert_eq!(TestResult::from_response(&json!("ok")), TestResult::ErrorOther);
        assert_eq!(TestResult::from_response(&json!([true])), TestResult::ErrorOther);
        assert_eq!(TestResult::from_response(&Value::Null), TestResult::ErrorOther);
        assert_eq!(
            TestResult::from_response(&json!({"result": false, "error": 42})),
            TestResult::ErrorOther
        );
    }

    #[test]
    fn test_notices() {
        let success = TestResult::Success.notice().unwrap();
        assert_eq!(success.title, "Test message sent");
        assert_eq!(success.text, "A test message was sent to Pushbullet");
        assert_eq!(success.kind, NoticeKind::Success);

        let channel = TestResult::ErrorChannel.notice().unwrap();
        assert!(channel.text.contains("channel being unknown"));
        assert_eq!(channel.kind, NoticeKind::Error);

        let apikey = TestResult::ErrorApiKey.notice().unwrap();
        assert!(apikey.text.contains("invalid Access Token"));

        let other = TestResult::ErrorOther.notice().unwrap();
        assert!(other.text.contains("check log & your settings"));

        assert!(TestResult::ErrorTransport.notice().is_none());
    }

    #[test]
    fn test_notice_serializes_kind_as_type() {
        let value = serde_json::to_value(TestResult::ErrorApiKey.notice().unwrap()).unwrap();
        assert_eq!(value["type"], "error");
        assert_eq!(value["title"], "Test message could not be sent");
    }

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| json!(n)),
            any::<f64>().prop_map(|f| json!(f)),
            "[a-z]{0,8}".prop_map(Value::String),
            prop_oneof![Just("channel"), Just("apikey"), Just("result"), Just("error")]
                .prop_map(|s| Value::String(s.to_string())),
        ];
        leaf.prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::hash_map(
                    prop_oneof![Just("result".to_string()), Just("error".to_string()), "[a-z]{1,5}"],
                    inner,
                    0..4
                )
                .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_classification_is_total(body in arb_json()) {
            let result = TestResult::from_response(&body);
            // Never a transport failure and always has a notice
            prop_assert_ne!(result, TestResult::ErrorTransport);
            prop_assert!(result.notice().is_some());
        }
    }
}
