//! Plugin API handlers.
//!
//! The simple-API command endpoint, plugin settings and the hooks the
//! host uses to forward print events and progress.

use axum::{Extension, Json, extract::State};
use jiff::{Timestamp, Zoned};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::PLUGIN_TAG;
use crate::api::dto::{
    ErrorResponse, PluginCommandRequest, PluginSettingsRequest, PluginSettingsResponse,
    PrintEventRequest, PrintEventResponse, PrintProgressRequest, PrintProgressResponse,
    TestResponse,
};
use crate::api::middleware::Caller;
use crate::error::{AppError, AppResult};
use crate::services::PrintProgress;
use crate::state::AppState;
use crate::utils::validate::ValidatedJson;

const TEST_COMMAND: &str = "test";

/// Creates plugin routes.
///
/// Routes:
/// - POST /api/plugin/octobullet           - Run a plugin command
/// - GET  /api/plugin/octobullet/settings  - Read plugin settings
/// - POST /api/plugin/octobullet/settings  - Update plugin settings
/// - POST /api/plugin/octobullet/events    - Forward a print event
/// - POST /api/plugin/octobullet/progress  - Forward print progress
pub fn plugin_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(run_command))
        .routes(routes!(get_settings, save_settings))
        .routes(routes!(print_event))
        .routes(routes!(print_progress))
}

/// POST /api/plugin/octobullet - Run a plugin command
///
/// `test` sends a test notification with the given token and channel.
#[utoipa::path(
    post,
    path = "/api/plugin/octobullet",
    tag = PLUGIN_TAG,
    request_body = PluginCommandRequest,
    responses(
        (status = 200, description = "Test outcome", body = TestResponse),
        (status = 400, description = "Unknown command or missing token", body = ErrorResponse),
        (status = 403, description = "Insufficient rights", body = ErrorResponse)
    ),
    security(("apiKey" = []))
)]
async fn run_command(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ValidatedJson(payload): ValidatedJson<PluginCommandRequest>,
) -> AppResult<Json<TestResponse>> {
    caller.require_admin()?;

    if payload.command != TEST_COMMAND {
        return Err(AppError::BadRequest {
            message: format!("Unknown command: {}", payload.command),
        });
    }

    let token = payload.token.ok_or_else(|| AppError::Validation {
        field: "token".to_string(),
        reason: "required".to_string(),
    })?;

    tracing::info!(channel = ?payload.channel, "Sending test notification");
    let outcome = state
        .services
        .push
        .test(
            token.as_deref(),
            payload.channel.as_deref(),
            payload.message.as_deref(),
        )
        .await;

    Ok(Json(TestResponse::from(outcome)))
}

/// GET /api/plugin/octobullet/settings - Read plugin settings
///
/// Credentials are only returned to admins.
#[utoipa::path(
    get,
    path = "/api/plugin/octobullet/settings",
    tag = PLUGIN_TAG,
    responses(
        (status = 200, description = "Current plugin settings", body = PluginSettingsResponse)
    )
)]
async fn get_settings(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Json<PluginSettingsResponse> {
    let settings = state.services.settings.current();
    Json(PluginSettingsResponse::for_caller(settings, caller.is_admin))
}

/// POST /api/plugin/octobullet/settings - Update plugin settings
///
/// Reconnects the Pushbullet sender in the background and restarts a
/// running progress schedule.
#[utoipa::path(
    post,
    path = "/api/plugin/octobullet/settings",
    tag = PLUGIN_TAG,
    request_body = PluginSettingsRequest,
    responses(
        (status = 200, description = "Saved plugin settings", body = PluginSettingsResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Insufficient rights", body = ErrorResponse)
    ),
    security(("apiKey" = []))
)]
async fn save_settings(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ValidatedJson(payload): ValidatedJson<PluginSettingsRequest>,
) -> AppResult<Json<PluginSettingsResponse>> {
    caller.require_admin()?;

    let saved = state
        .services
        .save_settings(payload.into_update(), Timestamp::now());
    Ok(Json(PluginSettingsResponse::for_caller(saved, true)))
}

/// POST /api/plugin/octobullet/events - Forward a print event
///
/// Only `PrintStarted` and `PrintDone` are acted on.
#[utoipa::path(
    post,
    path = "/api/plugin/octobullet/events",
    tag = PLUGIN_TAG,
    request_body = PrintEventRequest,
    responses(
        (status = 200, description = "Event processed", body = PrintEventResponse),
        (status = 400, description = "Invalid event payload", body = ErrorResponse),
        (status = 403, description = "Insufficient rights", body = ErrorResponse)
    ),
    security(("apiKey" = []))
)]
async fn print_event(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ValidatedJson(payload): ValidatedJson<PrintEventRequest>,
) -> AppResult<Json<PrintEventResponse>> {
    caller.require_admin()?;

    let Some(event) = payload.into_event()? else {
        return Ok(Json(PrintEventResponse {
            handled: false,
            sent: false,
        }));
    };

    let sent = state
        .services
        .prints
        .handle_event(event, Timestamp::now())
        .await;
    Ok(Json(PrintEventResponse {
        handled: true,
        sent,
    }))
}

/// POST /api/plugin/octobullet/progress - Forward print progress
#[utoipa::path(
    post,
    path = "/api/plugin/octobullet/progress",
    tag = PLUGIN_TAG,
    request_body = PrintProgressRequest,
    responses(
        (status = 200, description = "Progress processed", body = PrintProgressResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Insufficient rights", body = ErrorResponse)
    ),
    security(("apiKey" = []))
)]
async fn print_progress(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ValidatedJson(payload): ValidatedJson<PrintProgressRequest>,
) -> AppResult<Json<PrintProgressResponse>> {
    caller.require_admin()?;

    let update = PrintProgress::from(payload);
    let prints = &state.services.prints;
    let sent = prints.on_print_progress(&update, &Zoned::now()).await;

    Ok(Json(PrintProgressResponse {
        sent,
        next_message: prints.next_message().map(|ts| ts.to_string()),
    }))
}

#[cfg(test)]
mod tests {
    use crate::api::routes::create_router;
    use crate::client::API_KEY_HEADER;
    use crate::config::{Environment, Settings};
    use crate::state::AppState;
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode},
    };
    use mockito::{Matcher, ServerGuard};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    const ADMIN_KEY: &str = "admin-key";

    fn settings_for(server: &ServerGuard) -> Settings {
        let mut settings = Settings::default();
        settings.api.admin_key = ADMIN_KEY.to_string();
        settings.pushbullet.api_url = format!("{}/v2", server.url());
        settings.pushbullet.timeout = 5;
        settings
    }

    fn app(settings: &Settings) -> (Router, AppState) {
        let state = AppState::new(settings);
        let router = create_router(state.clone(), &settings.server, Environment::Test);
        (router, state)
    }

    fn post(uri: &str, key: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(key) = key {
            builder = builder.header(API_KEY_HEADER, key);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get(uri: &str, key: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(key) = key {
            builder = builder.header(API_KEY_HEADER, key);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_command_requires_admin() {
        let server = mockito::Server::new_async().await;
        let (router, _) = app(&settings_for(&server));

        let (status, body) = send(
            router,
            post("/api/plugin/octobullet", Some("wrong"), json!({"command": "test", "token": "o.t"})),
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Insufficient rights");
        assert!(body["request_id"].is_string());
    }

    #[tokio::test]
    async fn test_command_rejects_unknown_command_and_missing_token() {
        let server = mockito::Server::new_async().await;
        let settings = settings_for(&server);

        let (router, _) = app(&settings);
        let (status, _) = send(
            router,
            post("/api/plugin/octobullet", Some(ADMIN_KEY), json!({"command": "reboot", "token": "o.t"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (router, _) = app(&settings);
        let (status, body) = send(
            router,
            post("/api/plugin/octobullet", Some(ADMIN_KEY), json!({"command": "test"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"]["field"], "token");
    }

    #[tokio::test]
    async fn test_command_with_null_token_reports_apikey() {
        let server = mockito::Server::new_async().await;
        let (router, _) = app(&settings_for(&server));

        let (status, body) = send(
            router,
            post("/api/plugin/octobullet", Some(ADMIN_KEY), json!({"command": "test", "token": null})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"result": false, "error": "apikey"}));
    }

    #[tokio::test]
    async fn test_command_reports_unknown_channel() {
        let mut server = mockito::Server::new_async().await;
        let _me = server
            .mock("GET", "/v2/users/me")
            .with_status(200)
            .with_body(r#"{"iden": "u1"}"#)
            .create_async()
            .await;
        let _channels = server
            .mock("GET", "/v2/channels")
            .with_status(200)
            .with_body(r#"{"channels": [{"iden": "c1", "tag": "printers"}]}"#)
            .create_async()
            .await;
        let (router, _) = app(&settings_for(&server));

        let (status, body) = send(
            router,
            post(
                "/api/plugin/octobullet",
                Some(ADMIN_KEY),
                json!({"command": "test", "token": "o.t", "channel": "garage"}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"result": false, "error": "channel"}));
    }

    #[tokio::test]
    async fn test_command_sends_test_note() {
        let mut server = mockito::Server::new_async().await;
        let _me = server
            .mock("GET", "/v2/users/me")
            .with_status(200)
            .with_body(r#"{"iden": "u1"}"#)
            .create_async()
            .await;
        let push = server
            .mock("POST", "/v2/pushes")
            .match_body(Matcher::PartialJson(json!({
                "type": "note",
                "title": "Test from the OctoPrint PushBullet Plugin",
                "body": "Testing, 1, 2, 3, 4..."
            })))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;
        let (router, _) = app(&settings_for(&server));

        let (status, body) = send(
            router,
            post("/api/plugin/octobullet", Some(ADMIN_KEY), json!({"command": "test", "token": "o.t"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"result": true}));
        push.assert_async().await;
    }

    #[tokio::test]
    async fn test_settings_are_masked_for_non_admins() {
        let server = mockito::Server::new_async().await;
        let mut settings = settings_for(&server);
        settings.plugin.access_token = Some("o.secret".to_string());

        let (router, _) = app(&settings);
        let (status, body) = send(router, get("/api/plugin/octobullet/settings", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["access_token"], Value::Null);
        assert_eq!(body["periodic_updates_interval"], 15);

        let (router, _) = app(&settings);
        let (_, body) = send(router, get("/api/plugin/octobullet/settings", Some(ADMIN_KEY))).await;
        assert_eq!(body["access_token"], "o.secret");
    }

    #[tokio::test]
    async fn test_save_settings() {
        let server = mockito::Server::new_async().await;
        let mut settings = settings_for(&server);
        settings.plugin.push_channel = Some("printers".to_string());
        let (router, state) = app(&settings);

        let (status, body) = send(
            router,
            post(
                "/api/plugin/octobullet/settings",
                Some(ADMIN_KEY),
                json!({
                    "push_channel": "",
                    "periodic_updates": true,
                    "periodic_updates_interval": "five",
                    "print_done": {"title": "All done"}
                }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["push_channel"], Value::Null);
        assert_eq!(body["periodic_updates"], true);
        assert_eq!(body["periodic_updates_interval"], 15);
        assert_eq!(body["print_done"]["title"], "All done");

        let stored = state.services.settings.current();
        assert!(stored.push_channel.is_none());
        assert!(stored.periodic_updates);
    }

    #[tokio::test]
    async fn test_save_settings_ignores_oversized_interval() {
        let server = mockito::Server::new_async().await;
        let (router, state) = app(&settings_for(&server));

        let (status, body) = send(
            router.clone(),
            post(
                "/api/plugin/octobullet/settings",
                Some(ADMIN_KEY),
                serde_json::from_str::<Value>(
                    r#"{"periodic_updates": true, "periodic_updates_interval": 18446744073709551615}"#,
                )
                .unwrap(),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["periodic_updates_interval"], 15);

        let (_, body) = send(
            router.clone(),
            post("/api/plugin/octobullet/events", Some(ADMIN_KEY), json!({"event": "PrintStarted"})),
        )
        .await;
        assert_eq!(body["handled"], true);

        let (status, body) = send(
            router,
            post(
                "/api/plugin/octobullet/progress",
                Some(ADMIN_KEY),
                json!({"progress": 10, "print_time": 60, "print_time_left": 0, "path": "a.gcode"}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["sent"], false);
        let next = state.services.prints.next_message().unwrap();
        assert!(next > jiff::Timestamp::now());
    }

    #[tokio::test]
    async fn test_save_settings_requires_admin() {
        let server = mockito::Server::new_async().await;
        let (router, state) = app(&settings_for(&server));

        let (status, _) = send(
            router,
            post("/api/plugin/octobullet/settings", None, json!({"periodic_updates": true})),
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(!state.services.settings.current().periodic_updates);
    }

    #[tokio::test]
    async fn test_print_started_schedules_progress() {
        let server = mockito::Server::new_async().await;
        let mut settings = settings_for(&server);
        settings.plugin.periodic_updates = true;
        let (router, state) = app(&settings);

        let (status, body) = send(
            router,
            post("/api/plugin/octobullet/events", Some(ADMIN_KEY), json!({"event": "PrintStarted"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"handled": true, "sent": false}));
        assert!(state.services.prints.next_message().is_some());
    }

    #[tokio::test]
    async fn test_unrelated_event_is_ignored() {
        let server = mockito::Server::new_async().await;
        let (router, _) = app(&settings_for(&server));

        let (status, body) = send(
            router,
            post(
                "/api/plugin/octobullet/events",
                Some(ADMIN_KEY),
                json!({"event": "Connected", "payload": {"port": "/dev/ttyUSB0"}}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"handled": false, "sent": false}));
    }

    #[tokio::test]
    async fn test_progress_validation() {
        let server = mockito::Server::new_async().await;
        let (router, _) = app(&settings_for(&server));

        let (status, body) = send(
            router,
            post(
                "/api/plugin/octobullet/progress",
                Some(ADMIN_KEY),
                json!({"progress": 140, "path": "a.gcode"}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"]["errors"][0]["field"], "progress");
    }

    #[tokio::test]
    async fn test_progress_without_schedule_sends_nothing() {
        let server = mockito::Server::new_async().await;
        let mut settings = settings_for(&server);
        settings.plugin.periodic_updates = true;
        let (router, _) = app(&settings);

        let (status, body) = send(
            router,
            post(
                "/api/plugin/octobullet/progress",
                Some(ADMIN_KEY),
                json!({"progress": 50, "print_time": 600, "print_time_left": 3600, "path": "a.gcode"}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"sent": false, "next_message": null}));
    }
}
