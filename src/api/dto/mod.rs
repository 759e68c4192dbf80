//! Data Transfer Objects for API requests and responses.
//!
//! DTOs are organized by domain:
//! - `plugin` - Plugin command and settings DTOs
//! - `print` - Print event and progress DTOs
//! - `health` - Health check DTOs
//! - `error` - Common error response DTOs

mod error;
mod health;
mod plugin;
mod print;

pub use error::ErrorResponse;
pub use health::{ComponentHealth, HealthResponse, HealthStatus};
pub use plugin::{
    MessageTemplateDto, MessageTemplatePatch, PluginCommandRequest, PluginSettingsRequest,
    PluginSettingsResponse, TestResponse,
};
pub use print::{
    PRINT_DONE, PRINT_STARTED, PrintEventRequest, PrintEventResponse, PrintProgressRequest,
    PrintProgressResponse,
};
