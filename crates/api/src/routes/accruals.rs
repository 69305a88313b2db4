//! Subscription accrual routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::AppState;
use crate::routes::{error_response, validation_error};
use mizan_db::AccrualRepository;
use mizan_db::entities::subscription_accruals;

/// Creates the accrual routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/accruals/generate", post(generate_all))
        .route(
            "/customers/{customer_id}/accruals/generate",
            post(generate_for_customer),
        )
        .route("/customers/{customer_id}/accruals", get(list_accruals))
        .route("/accruals/{accrual_id}/payment", patch(update_payment))
}

/// Query parameters for listing accruals.
#[derive(Debug, Deserialize)]
pub struct ListAccrualsQuery {
    /// Year to list, or "all" for the full ledger. Defaults to "all".
    pub year: Option<String>,
}

/// Request body for updating an accrual's payment state.
#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    /// New paid flag; marking unpaid clears the payment date.
    pub is_paid: Option<bool>,
    /// Payment date to record.
    pub payment_date: Option<NaiveDate>,
}

/// Response shape for one accrual row.
#[derive(Debug, Serialize)]
pub struct AccrualResponse {
    /// Accrual ID.
    pub id: Uuid,
    /// Owning customer.
    pub customer_id: Uuid,
    /// Accounting period the accrual belongs to.
    pub period_id: Uuid,
    /// Accrued amount.
    pub amount: Decimal,
    /// Due date.
    pub due_date: NaiveDate,
    /// Whether the accrual is paid.
    pub is_paid: bool,
    /// Payment date, when recorded.
    pub payment_date: Option<NaiveDate>,
    /// Portion already moved into a later period.
    pub carry_forward_amount: Decimal,
    /// Destination period of the carry-forward, when one happened.
    pub carry_forward_to_period_id: Option<Uuid>,
    /// Human-readable description.
    pub description: String,
}

impl From<subscription_accruals::Model> for AccrualResponse {
    fn from(model: subscription_accruals::Model) -> Self {
        Self {
            id: model.id,
            customer_id: model.customer_id,
            period_id: model.period_id,
            amount: model.amount,
            due_date: model.due_date,
            is_paid: model.is_paid,
            payment_date: model.payment_date,
            carry_forward_amount: model.carry_forward_amount,
            carry_forward_to_period_id: model.carry_forward_to_period_id,
            description: model.description,
        }
    }
}

/// POST `/accruals/generate` - Generate accruals for every active
/// fee-bearing customer, up to the current month.
async fn generate_all(State(state): State<AppState>) -> impl IntoResponse {
    let repo = AccrualRepository::new((*state.db).clone(), state.locks.clone());
    let today = chrono::Utc::now().date_naive();

    match repo.generate_all(today).await {
        Ok(report) => {
            info!(total_created = report.total_created, "Bulk accrual generation");
            (StatusCode::OK, Json(json!({ "report": report }))).into_response()
        }
        Err(e) => error_response(&e.into()),
    }
}

/// POST `/customers/{customer_id}/accruals/generate` - Generate accruals for
/// one customer, up to the current month.
async fn generate_for_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = AccrualRepository::new((*state.db).clone(), state.locks.clone());
    let today = chrono::Utc::now().date_naive();

    match repo.generate_for_customer(customer_id, today).await {
        Ok(outcome) => (StatusCode::OK, Json(json!({ "result": outcome }))).into_response(),
        Err(e) => error_response(&e.into()),
    }
}

/// GET `/customers/{customer_id}/accruals` - List a customer's accruals,
/// optionally limited to one year.
async fn list_accruals(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
    Query(query): Query<ListAccrualsQuery>,
) -> impl IntoResponse {
    let year = match query.year.as_deref() {
        None | Some("all") => None,
        Some(text) => match text.parse::<i32>() {
            Ok(year) => Some(year),
            Err(_) => {
                return validation_error("year must be a number or \"all\"");
            }
        },
    };

    let repo = AccrualRepository::new((*state.db).clone(), state.locks.clone());
    match repo.list(customer_id, year).await {
        Ok(accruals) => {
            let accruals: Vec<AccrualResponse> =
                accruals.into_iter().map(AccrualResponse::from).collect();
            (StatusCode::OK, Json(json!({ "accruals": accruals }))).into_response()
        }
        Err(e) => error_response(&e.into()),
    }
}

/// PATCH `/accruals/{accrual_id}/payment` - Update paid state and payment date.
async fn update_payment(
    State(state): State<AppState>,
    Path(accrual_id): Path<Uuid>,
    Json(payload): Json<PaymentRequest>,
) -> impl IntoResponse {
    if payload.is_paid.is_none() && payload.payment_date.is_none() {
        return validation_error("At least one of is_paid or payment_date is required");
    }

    let repo = AccrualRepository::new((*state.db).clone(), state.locks.clone());
    match repo
        .set_payment(accrual_id, payload.is_paid, payload.payment_date)
        .await
    {
        Ok(updated) => {
            info!(accrual_id = %accrual_id, is_paid = updated.is_paid, "Updated accrual payment");
            (
                StatusCode::OK,
                Json(json!({ "accrual": AccrualResponse::from(updated) })),
            )
                .into_response()
        }
        Err(e) => error_response(&e.into()),
    }
}
