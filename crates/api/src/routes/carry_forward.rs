//! Period close and carry-forward routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::AppState;
use crate::routes::error_response;
use mizan_db::CarryForwardRepository;

/// Creates the carry-forward routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/customers/{customer_id}/carry-forward", post(carry_forward))
        .route(
            "/customers/{customer_id}/carry-forward/status",
            get(carry_forward_status),
        )
}

/// Request body for closing a year into the next.
#[derive(Debug, Deserialize)]
pub struct CarryForwardRequest {
    /// Year being closed.
    pub from_year: i32,
    /// Year receiving the unpaid balance.
    pub to_year: i32,
}

/// POST `/customers/{customer_id}/carry-forward` - Close `from_year` and move
/// its unpaid balance into `to_year`.
async fn carry_forward(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
    Json(payload): Json<CarryForwardRequest>,
) -> impl IntoResponse {
    let repo = CarryForwardRepository::new((*state.db).clone(), state.locks.clone());

    match repo
        .process(customer_id, payload.from_year, payload.to_year)
        .await
    {
        Ok(outcome) => {
            info!(
                customer_id = %customer_id,
                from_year = payload.from_year,
                to_year = payload.to_year,
                carried = %outcome.carried_forward_amount,
                "Carry-forward completed"
            );
            (StatusCode::OK, Json(json!({ "result": outcome }))).into_response()
        }
        Err(e) => error_response(&e.into()),
    }
}

/// GET `/customers/{customer_id}/carry-forward/status` - Whether the
/// customer's most recent period received a carried balance.
async fn carry_forward_status(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = CarryForwardRepository::new((*state.db).clone(), state.locks.clone());

    match repo.status(customer_id).await {
        Ok(status) => (StatusCode::OK, Json(json!({ "status": status }))).into_response(),
        Err(e) => error_response(&e.into()),
    }
}
