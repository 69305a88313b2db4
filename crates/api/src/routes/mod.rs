//! API route definitions.

use axum::{Json, Router, http::StatusCode, response::IntoResponse, response::Response};
use serde_json::json;
use tracing::error;

use crate::AppState;
use mizan_shared::AppError;

pub mod accruals;
pub mod carry_forward;
pub mod health;
pub mod obligations;
pub mod rules;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(rules::routes())
        .merge(obligations::routes())
        .merge(accruals::routes())
        .merge(carry_forward::routes())
}

/// Renders an `AppError` as the standard error payload.
///
/// Server-side failures are logged here with full detail; the client only
/// sees the opaque public message.
pub(crate) fn error_response(err: &AppError) -> Response {
    if err.status_code() >= 500 {
        error!(error = %err, "Request failed");
    }

    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    (
        status,
        Json(json!({
            "error": err.error_code().to_lowercase(),
            "message": err.public_message()
        })),
    )
        .into_response()
}

/// Shorthand for a 400 validation error payload.
pub(crate) fn validation_error(message: &str) -> Response {
    error_response(&AppError::Validation(message.to_string()))
}
