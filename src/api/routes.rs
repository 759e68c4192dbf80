//! Router configuration for the API.
//!
//! Centralized route registration and middleware configuration.

use std::time::Duration;

use axum::{Router, middleware};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::doc::ApiDoc;
use crate::api::handlers;
use crate::api::middleware::{
    api_key_middleware, global_error_handler, logging_middleware, request_id_middleware,
};
use crate::config::{Environment, settings::ServerConfig};
use crate::state::AppState;

/// Creates the main application router with all routes and middleware.
///
/// # Middleware Order
/// Outermost first:
/// 1. CORS, compression and request timeout
/// 2. Request ID - generates/propagates `x-request-id`
/// 3. Logging - one span per request, tagged with the request ID
/// 4. Global error handler - JSON error bodies with the request ID
/// 5. API key - marks admin callers
///
/// The swagger UI is mounted at `/swagger-ui` outside production.
pub fn create_router(state: AppState, server: &ServerConfig, environment: Environment) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .merge(handlers::plugin::plugin_routes())
        .merge(handlers::health::health_routes())
        .split_for_parts();

    let router = if environment.exposes_api_docs() {
        router.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api))
    } else {
        router
    };

    // Layers run in reverse order of declaration
    router
        .layer(middleware::from_fn_with_state(state.clone(), api_key_middleware))
        .layer(middleware::from_fn(global_error_handler))
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TimeoutLayer::new(Duration::from_secs(server.request_timeout)))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::middleware::REQUEST_ID_HEADER;
    use crate::config::Settings;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    fn router(environment: Environment) -> Router {
        let settings = Settings::default();
        create_router(AppState::new(&settings), &settings.server, environment)
    }

    #[tokio::test]
    async fn test_health_route_has_request_id() {
        let response = router(Environment::Test)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    }

    #[tokio::test]
    async fn test_openapi_document_lists_plugin_paths() {
        let response = router(Environment::Development)
            .oneshot(
                Request::builder()
                    .uri("/api-docs/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let doc: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(doc["paths"]["/api/plugin/octobullet"].is_object());
        assert!(doc["paths"]["/api/plugin/octobullet/settings"]["get"].is_object());
        assert!(doc["paths"]["/api/plugin/octobullet/settings"]["post"].is_object());
        assert!(doc["paths"]["/health"].is_object());
    }

    #[tokio::test]
    async fn test_docs_hidden_in_production() {
        let response = router(Environment::Production)
            .oneshot(
                Request::builder()
                    .uri("/api-docs/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
