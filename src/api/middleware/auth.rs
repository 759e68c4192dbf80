//! API key authentication middleware.
//!
//! Every request passes through; callers presenting the configured admin
//! key in `X-Api-Key` are marked as admins for the handlers to check.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::client::API_KEY_HEADER;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Who is calling, added to request extensions by `api_key_middleware`.
///
/// Extract it in handlers with `Extension<Caller>`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Caller {
    pub is_admin: bool,
}

impl Caller {
    pub fn admin() -> Self {
        Self { is_admin: true }
    }

    /// Fails with 403 unless the caller holds the admin key.
    pub fn require_admin(&self) -> AppResult<()> {
        if self.is_admin {
            Ok(())
        } else {
            Err(AppError::Forbidden {
                message: "Insufficient rights".to_string(),
            })
        }
    }
}

fn is_admin_key(presented: Option<&str>, admin_key: &str) -> bool {
    match presented {
        Some(key) => !admin_key.is_empty() && key == admin_key,
        None => false,
    }
}

/// Resolve the caller from the `X-Api-Key` header.
///
/// Never rejects a request; admin-only handlers call
/// [`Caller::require_admin`].
pub async fn api_key_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let presented = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|h| h.to_str().ok());

    let caller = Caller {
        is_admin: is_admin_key(presented, &state.api.admin_key),
    };
    request.extensions_mut().insert(caller);

    next.run(request).await
}
