//! Health check endpoint handlers.
//!
//! Liveness for monitoring, with the Pushbullet sender state as the one
//! component check. A missing sender degrades the service but keeps it up.

use crate::api::doc::HEALTH_TAG;
use crate::api::dto::{ComponentHealth, HealthResponse, HealthStatus};
use crate::state::AppState;
use axum::{extract::State, response::Json};
use jiff::Timestamp;
use std::collections::HashMap;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

/// Creates health check routes.
///
/// # Routes
/// - `GET /health` - Health check with sender status
pub fn health_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(health_check))
}

/// Health check endpoint.
///
/// Always answers 200 while the process is serving; `status` is
/// `degraded` when no Pushbullet sender is connected.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    ),
    tag = HEALTH_TAG
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let pushbullet = check_pushbullet(&state).await;
    let status = pushbullet.status;

    let mut checks = HashMap::new();
    checks.insert("pushbullet".to_string(), pushbullet);

    Json(HealthResponse {
        status,
        version: state.version.clone(),
        timestamp: Timestamp::now().to_string(),
        checks,
    })
}

async fn check_pushbullet(state: &AppState) -> ComponentHealth {
    match state.services.push.current_target().await {
        Some(target) => ComponentHealth {
            status: HealthStatus::Healthy,
            message: Some(format!("Connected to {}", target)),
        },
        None => ComponentHealth {
            status: HealthStatus::Degraded,
            message: Some("No Pushbullet sender configured".to_string()),
        },
    }
}
