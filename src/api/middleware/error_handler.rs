//! Error handler for converting AppError to HTTP responses.
//!
//! Implements `IntoResponse` for `AppError` and provides a global
//! middleware that turns plain-text error responses (unknown routes,
//! wrong methods, extractor rejections) into the same JSON shape and
//! stamps every error body with the request ID.

use axum::{
    Json,
    body::{Body, Bytes},
    extract::Request,
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

use super::RequestId;
use crate::api::dto::ErrorResponse;
use crate::error::AppError;

/// Largest error body the global handler will buffer and rewrite.
const MAX_ERROR_BODY: usize = 64 * 1024;

/// Maps an AppError variant to its HTTP status code.
pub fn error_to_status_code(error: &AppError) -> StatusCode {
    match error {
        AppError::Validation { .. }
        | AppError::ValidationErrors { .. }
        | AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
        AppError::Configuration { .. } | AppError::Internal { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_response(error: &AppError) -> ErrorResponse {
    match error {
        AppError::Validation { field, reason } => ErrorResponse::validation_error(field, reason),
        AppError::ValidationErrors { errors } => {
            ErrorResponse::new("VALIDATION_ERROR", "Validation failed")
                .with_details(json!({ "errors": errors }))
        }
        AppError::BadRequest { message } => ErrorResponse::new("BAD_REQUEST", message),
        AppError::Forbidden { message } => ErrorResponse::new("FORBIDDEN", message),
        AppError::Configuration { key, .. } => ErrorResponse::new(
            "CONFIGURATION_ERROR",
            &format!("Configuration error: {}", key),
        )
        .with_details(json!({ "key": key })),
        AppError::Internal { .. } => {
            ErrorResponse::new("INTERNAL_ERROR", "An internal error occurred")
        }
    }
}

impl IntoResponse for AppError {
    /// Sources of internal errors are logged, never returned to the caller.
    fn into_response(self) -> Response {
        let status = error_to_status_code(&self);
        if let AppError::Internal { source } | AppError::Configuration { source, .. } = &self {
            tracing::error!(error = ?source, "Request failed with an internal error");
        }

        (status, Json(error_response(&self))).into_response()
    }
}

fn default_message(status: StatusCode) -> &'static str {
    match status {
        StatusCode::NOT_FOUND => "The requested resource was not found",
        StatusCode::METHOD_NOT_ALLOWED => "HTTP method not allowed for this endpoint",
        StatusCode::UNSUPPORTED_MEDIA_TYPE => "Unsupported media type",
        StatusCode::PAYLOAD_TOO_LARGE => "Request payload too large",
        StatusCode::REQUEST_TIMEOUT => "Request timeout",
        s if s.is_server_error() => "An internal server error occurred",
        _ => "Bad request",
    }
}

fn status_code_name(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(|reason| reason.to_uppercase().replace([' ', '-', '\''], "_"))
        .unwrap_or_else(|| "UNKNOWN_ERROR".to_string())
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"))
}

/// Rewrite an error body into an `ErrorResponse` carrying `request_id`.
fn rewrite_error(status: StatusCode, json_body: bool, body: &Bytes, request_id: Option<&str>) -> ErrorResponse {
    let parsed = json_body
        .then(|| serde_json::from_slice::<ErrorResponse>(body).ok())
        .flatten();

    let error = parsed.unwrap_or_else(|| {
        let text = String::from_utf8_lossy(body).trim().to_string();
        let message = if text.is_empty() {
            default_message(status).to_string()
        } else {
            text
        };
        ErrorResponse::new(&status_code_name(status), &message)
    });

    match (error.request_id.is_none(), request_id) {
        (true, Some(id)) => error.with_request_id(id),
        _ => error,
    }
}

/// Global error handling middleware.
///
/// Must run inside `request_id_middleware`.
pub async fn global_error_handler(request: Request, next: Next) -> Response {
    let request_id = request.extensions().get::<RequestId>().map(|r| r.0.clone());
    let response = next.run(request).await;

    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let json_body = is_json(&response);
    let (mut parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_ERROR_BODY).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!(error = %e, "Error body could not be buffered");
            Bytes::new()
        }
    };

    let error = rewrite_error(status, json_body, &bytes, request_id.as_deref());
    let body = match serde_json::to_vec(&error) {
        Ok(body) => body,
        Err(_) => return Response::from_parts(parts, Body::from(bytes)),
    };

    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("application/json"),
    );
    Response::from_parts(parts, Body::from(body))
}
