//! Obligation rule config routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::AppState;
use crate::routes::{error_response, validation_error};
use mizan_core::obligation::{Frequency, ObligationRule, Quarters, RuleOverride};
use mizan_db::{CustomerDirectory, RuleRepository};
use mizan_shared::AppError;

/// Creates the rule config routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/obligation-rules", get(list_rules).post(create_rule))
        .route(
            "/obligation-rules/{obligation_type}",
            get(get_rule).put(update_rule).delete(delete_rule),
        )
        .route(
            "/customers/{customer_id}/obligation-overrides",
            get(list_overrides).put(replace_overrides),
        )
}

/// Request body for creating or updating a global rule.
#[derive(Debug, Deserialize)]
pub struct RuleRequest {
    /// Recurrence frequency: "MONTHLY", "QUARTERLY", or "YEARLY".
    pub frequency: String,
    /// Day of the due month.
    pub due_day: u32,
    /// Hour of the due instant. Defaults to 23.
    pub due_hour: Option<u32>,
    /// Minute of the due instant. Defaults to 59.
    pub due_minute: Option<u32>,
    /// Due month for yearly rules.
    pub due_month: Option<u32>,
    /// Months after a quarter's end month in which it falls due.
    pub quarter_offset: Option<u32>,
    /// Quarters the rule applies to. Defaults to all four.
    pub applicable_quarters: Option<Vec<u8>>,
    /// Whether quarter 4 is skipped. Defaults to false.
    pub skip_fourth_quarter: Option<bool>,
    /// Whether the rule is active. Defaults to true.
    pub enabled: Option<bool>,
}

impl RuleRequest {
    /// Builds the domain rule, validating the enumerated fields.
    fn into_rule(self, obligation_type: String) -> Result<ObligationRule, AppError> {
        let frequency = Frequency::parse(&self.frequency).ok_or_else(|| {
            AppError::Validation(format!("Unknown frequency: {}", self.frequency))
        })?;

        let applicable_quarters = match self.applicable_quarters {
            Some(numbers) => Quarters::from_numbers(&numbers).ok_or_else(|| {
                AppError::Validation(format!("Invalid quarter set: {numbers:?}"))
            })?,
            None => Quarters::ALL,
        };

        Ok(ObligationRule {
            obligation_type,
            frequency,
            due_day: self.due_day,
            due_hour: self.due_hour.unwrap_or(23),
            due_minute: self.due_minute.unwrap_or(59),
            due_month: self.due_month,
            quarter_offset: self.quarter_offset,
            applicable_quarters,
            skip_fourth_quarter: self.skip_fourth_quarter.unwrap_or(false),
            enabled: self.enabled.unwrap_or(true),
        })
    }
}

/// Request body for creating a rule, carrying its type key.
#[derive(Debug, Deserialize)]
pub struct CreateRuleRequest {
    /// Unique obligation type key (e.g., "KDV").
    pub obligation_type: String,
    /// Rule fields.
    #[serde(flatten)]
    pub rule: RuleRequest,
}

/// One override entry in a replace-all submission.
#[derive(Debug, Deserialize)]
pub struct OverrideRequest {
    /// Obligation type the override targets.
    pub obligation_type: String,
    /// Override for the frequency.
    pub frequency: Option<String>,
    /// Override for the due day.
    pub due_day: Option<u32>,
    /// Override for the due hour.
    pub due_hour: Option<u32>,
    /// Override for the due minute.
    pub due_minute: Option<u32>,
    /// Override for the yearly due month.
    pub due_month: Option<u32>,
    /// Override for the quarter offset.
    pub quarter_offset: Option<u32>,
    /// Override for the applicable quarters.
    pub applicable_quarters: Option<Vec<u8>>,
    /// Override for the fourth-quarter skip flag.
    pub skip_fourth_quarter: Option<bool>,
    /// Override for the enabled flag.
    pub enabled: Option<bool>,
}

impl OverrideRequest {
    fn into_override(self) -> Result<RuleOverride, AppError> {
        let frequency = match self.frequency {
            Some(text) => Some(Frequency::parse(&text).ok_or_else(|| {
                AppError::Validation(format!("Unknown frequency: {text}"))
            })?),
            None => None,
        };

        let applicable_quarters = match self.applicable_quarters {
            Some(numbers) => Some(Quarters::from_numbers(&numbers).ok_or_else(|| {
                AppError::Validation(format!("Invalid quarter set: {numbers:?}"))
            })?),
            None => None,
        };

        Ok(RuleOverride {
            obligation_type: self.obligation_type,
            frequency,
            due_day: self.due_day,
            due_hour: self.due_hour,
            due_minute: self.due_minute,
            due_month: self.due_month,
            quarter_offset: self.quarter_offset,
            applicable_quarters,
            skip_fourth_quarter: self.skip_fourth_quarter,
            enabled: self.enabled,
        })
    }
}

/// GET `/obligation-rules` - List all global rules.
async fn list_rules(State(state): State<AppState>) -> impl IntoResponse {
    let repo = RuleRepository::new((*state.db).clone());

    match repo.list_rules().await {
        Ok(rules) => (StatusCode::OK, Json(json!({ "rules": rules }))).into_response(),
        Err(e) => error_response(&e.into()),
    }
}

/// POST `/obligation-rules` - Create a global rule.
async fn create_rule(
    State(state): State<AppState>,
    Json(payload): Json<CreateRuleRequest>,
) -> impl IntoResponse {
    if payload.obligation_type.trim().is_empty() {
        return validation_error("obligation_type must not be empty");
    }

    let rule = match payload.rule.into_rule(payload.obligation_type) {
        Ok(rule) => rule,
        Err(e) => return error_response(&e),
    };

    let repo = RuleRepository::new((*state.db).clone());
    match repo.create_rule(&rule).await {
        Ok(created) => {
            info!(obligation_type = %created.obligation_type, "Created obligation rule");
            (StatusCode::CREATED, Json(json!({ "rule": created }))).into_response()
        }
        Err(e) => error_response(&e.into()),
    }
}

/// GET `/obligation-rules/{obligation_type}` - Fetch a global rule.
async fn get_rule(
    State(state): State<AppState>,
    Path(obligation_type): Path<String>,
) -> impl IntoResponse {
    let repo = RuleRepository::new((*state.db).clone());

    match repo.get_rule(&obligation_type).await {
        Ok(rule) => (StatusCode::OK, Json(json!({ "rule": rule }))).into_response(),
        Err(e) => error_response(&e.into()),
    }
}

/// PUT `/obligation-rules/{obligation_type}` - Update a global rule.
async fn update_rule(
    State(state): State<AppState>,
    Path(obligation_type): Path<String>,
    Json(payload): Json<RuleRequest>,
) -> impl IntoResponse {
    let rule = match payload.into_rule(obligation_type) {
        Ok(rule) => rule,
        Err(e) => return error_response(&e),
    };

    let repo = RuleRepository::new((*state.db).clone());
    match repo.update_rule(&rule).await {
        Ok(updated) => {
            info!(obligation_type = %updated.obligation_type, "Updated obligation rule");
            (StatusCode::OK, Json(json!({ "rule": updated }))).into_response()
        }
        Err(e) => error_response(&e.into()),
    }
}

/// DELETE `/obligation-rules/{obligation_type}` - Delete a global rule.
async fn delete_rule(
    State(state): State<AppState>,
    Path(obligation_type): Path<String>,
) -> impl IntoResponse {
    let repo = RuleRepository::new((*state.db).clone());

    match repo.delete_rule(&obligation_type).await {
        Ok(()) => {
            info!(obligation_type = %obligation_type, "Deleted obligation rule");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => error_response(&e.into()),
    }
}

/// GET `/customers/{customer_id}/obligation-overrides` - List a customer's overrides.
async fn list_overrides(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
) -> impl IntoResponse {
    if let Some(response) = require_customer(&state, customer_id).await {
        return response;
    }

    let repo = RuleRepository::new((*state.db).clone());
    match repo.list_overrides(customer_id).await {
        Ok(overrides) => {
            (StatusCode::OK, Json(json!({ "overrides": overrides }))).into_response()
        }
        Err(e) => error_response(&e.into()),
    }
}

/// PUT `/customers/{customer_id}/obligation-overrides` - Replace the override set.
///
/// The submitted set replaces every stored override for the customer;
/// omitting an entry deletes it.
async fn replace_overrides(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
    Json(payload): Json<Vec<OverrideRequest>>,
) -> impl IntoResponse {
    if let Some(response) = require_customer(&state, customer_id).await {
        return response;
    }

    let mut overrides = Vec::with_capacity(payload.len());
    for entry in payload {
        if entry.obligation_type.trim().is_empty() {
            return validation_error("obligation_type must not be empty");
        }
        match entry.into_override() {
            Ok(ov) => overrides.push(ov),
            Err(e) => return error_response(&e),
        }
    }

    let repo = RuleRepository::new((*state.db).clone());
    match repo.replace_overrides(customer_id, &overrides).await {
        Ok(()) => {
            info!(customer_id = %customer_id, count = overrides.len(), "Replaced overrides");
            (StatusCode::OK, Json(json!({ "count": overrides.len() }))).into_response()
        }
        Err(e) => error_response(&e.into()),
    }
}

/// Returns a 404 response when the customer does not exist.
async fn require_customer(
    state: &AppState,
    customer_id: Uuid,
) -> Option<axum::response::Response> {
    match CustomerDirectory::find(state.db.as_ref(), customer_id).await {
        Ok(Some(_)) => None,
        Ok(None) => Some(error_response(&AppError::NotFound(format!(
            "Customer not found: {customer_id}"
        )))),
        Err(e) => Some(error_response(&AppError::Database(e.to_string()))),
    }
}
