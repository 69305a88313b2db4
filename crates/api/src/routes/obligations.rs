//! Obligation schedule routes.
//!
//! Runs the full pipeline for one customer: profile resolution, global rule
//! and override overlay, then expansion into concrete due-date instances.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::AppState;
use crate::routes::{error_response, validation_error};
use mizan_core::obligation::{DueInstance, expand};
use mizan_db::{CustomerDirectory, RuleRepository};
use mizan_shared::AppError;

/// Creates the obligation schedule routes.
pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/customers/{customer_id}/obligation-schedule",
        get(obligation_schedule),
    )
}

/// Query parameters for the schedule window.
#[derive(Debug, Deserialize)]
pub struct ScheduleQuery {
    /// Window start (YYYY-MM-DD).
    pub from: NaiveDate,
    /// Window end, inclusive (YYYY-MM-DD).
    pub to: NaiveDate,
}

/// GET `/customers/{customer_id}/obligation-schedule` - Expand the customer's
/// effective rules into due-date instances over the window.
async fn obligation_schedule(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
    Query(query): Query<ScheduleQuery>,
) -> impl IntoResponse {
    if query.from > query.to {
        return validation_error("from must not be after to");
    }

    let customer = match CustomerDirectory::find(state.db.as_ref(), customer_id).await {
        Ok(Some(customer)) => customer,
        Ok(None) => {
            return error_response(&AppError::NotFound(format!(
                "Customer not found: {customer_id}"
            )));
        }
        Err(e) => return error_response(&AppError::Database(e.to_string())),
    };

    let Some(profile) = CustomerDirectory::profile_of(&customer) else {
        return error_response(&AppError::Configuration(format!(
            "Customer {customer_id} has an invalid taxpayer profile"
        )));
    };

    let repo = RuleRepository::new((*state.db).clone());
    let rules = match repo.effective_rules(customer_id, &profile).await {
        Ok(rules) => rules,
        Err(e) => return error_response(&e.into()),
    };

    let mut instances: Vec<DueInstance> = Vec::new();
    for rule in &rules {
        match expand(rule, query.from, query.to) {
            Ok(expanded) => instances.extend(expanded),
            Err(e) => return error_response(&AppError::Configuration(e.to_string())),
        }
    }
    instances.sort_by(|a, b| {
        a.due_at
            .cmp(&b.due_at)
            .then_with(|| a.obligation_type.cmp(&b.obligation_type))
    });

    (
        StatusCode::OK,
        Json(json!({
            "customer_id": customer_id,
            "from": query.from,
            "to": query.to,
            "instances": instances
        })),
    )
        .into_response()
}
