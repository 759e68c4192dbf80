//! Print event and progress DTOs.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::{PrintEvent, PrintProgress};

pub const PRINT_STARTED: &str = "PrintStarted";
pub const PRINT_DONE: &str = "PrintDone";

/// A host event. Events other than `PrintStarted` and `PrintDone` are ignored.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "event": "PrintDone",
    "payload": {"name": "benchy.gcode", "time": 3725.4}
}))]
pub struct PrintEventRequest {
    #[validate(length(min = 1, message = "event must not be empty"))]
    pub event: String,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub payload: Value,
}

#[derive(Debug, Deserialize)]
struct PrintDonePayload {
    name: String,
    #[serde(default)]
    time: Option<f64>,
}

impl PrintEventRequest {
    /// The event to act on, or `None` when it is not one we handle.
    pub fn into_event(self) -> AppResult<Option<PrintEvent>> {
        match self.event.as_str() {
            PRINT_STARTED => Ok(Some(PrintEvent::Started)),
            PRINT_DONE => {
                let payload: PrintDonePayload =
                    serde_json::from_value(self.payload).map_err(|e| AppError::Validation {
                        field: "payload".to_string(),
                        reason: e.to_string(),
                    })?;
                Ok(Some(PrintEvent::Done {
                    name: payload.name,
                    elapsed: payload.time.map(|t| t as i64),
                }))
            }
            _ => Ok(None),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PrintEventResponse {
    /// Whether the event is one the plugin reacts to
    pub handled: bool,
    /// Whether a notification was delivered
    pub sent: bool,
}

/// Progress report for the file being printed.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "progress": 40,
    "print_time": 1800,
    "print_time_left": 2700,
    "path": "models/benchy.gcode"
}))]
pub struct PrintProgressRequest {
    #[validate(range(max = 100, message = "progress must be between 0 and 100"))]
    pub progress: u8,
    /// Seconds since the print started
    #[serde(default)]
    pub print_time: Option<f64>,
    /// Estimated seconds left
    #[serde(default)]
    pub print_time_left: Option<f64>,
    #[validate(length(min = 1, message = "path must not be empty"))]
    pub path: String,
}

impl From<PrintProgressRequest> for PrintProgress {
    fn from(request: PrintProgressRequest) -> Self {
        Self {
            progress: request.progress,
            print_time: request.print_time.map(|t| t as i64),
            print_time_left: request.print_time_left.map(|t| t as i64),
            path: request.path,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PrintProgressResponse {
    pub sent: bool,
    /// When the next progress message is due, if one is scheduled
    #[schema(value_type = Option<String>, format = DateTime)]
    pub next_message: Option<String>,
}
