//! Subscription accrual ledger.
//!
//! Generates recurring fee accruals per customer per accounting period,
//! idempotently: the month range runs from the customer's establishment
//! month to the current month, and a month that already has an accrual is
//! never given a second one. Generation holds the customer's lock and runs
//! in one transaction per customer; skips surface as structured
//! diagnostics instead of silent omissions.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set, TransactionTrait,
};
use serde::Serialize;
use uuid::Uuid;

use crate::entities::{accounting_periods, customers, subscription_accruals};
use crate::locks::CustomerLocks;
use crate::repositories::customers::CustomerDirectory;
use crate::repositories::periods::PeriodRepository;
use mizan_core::calendar::{YearMonth, clamp_day, last_day_of_month, month_name, months_inclusive};
use mizan_core::fees::{FeeError, parse_fee};
use mizan_shared::AppError;

/// Error types for accrual operations.
#[derive(Debug, thiserror::Error)]
pub enum AccrualError {
    /// Customer not found in the directory.
    #[error("Customer not found: {0}")]
    CustomerNotFound(Uuid),

    /// Accrual not found.
    #[error("Accrual not found: {0}")]
    AccrualNotFound(Uuid),

    /// Marking unpaid while supplying a payment date.
    #[error("An unpaid accrual cannot carry a payment date")]
    UnpaidWithPaymentDate,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<AccrualError> for AppError {
    fn from(err: AccrualError) -> Self {
        match err {
            AccrualError::CustomerNotFound(_) | AccrualError::AccrualNotFound(_) => {
                Self::NotFound(err.to_string())
            }
            AccrualError::UnpaidWithPaymentDate => Self::Validation(err.to_string()),
            AccrualError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Why a customer or month was skipped during generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// The customer is flagged inactive.
    CustomerInactive,
    /// The customer has no establishment date on record.
    MissingEstablishmentDate,
    /// The customer has no subscription fee on record.
    MissingFee,
    /// The fee text did not parse as a number.
    UnparseableFee {
        /// The raw fee text.
        fee: String,
    },
    /// The fee parsed but is zero or negative.
    NonPositiveFee {
        /// The raw fee text.
        fee: String,
    },
    /// The month's accounting period is already CLOSED.
    PeriodClosed {
        /// Period year.
        year: i32,
        /// Skipped month.
        month: u32,
    },
}

/// Per-customer generation outcome.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerGeneration {
    /// Customer the outcome belongs to.
    pub customer_id: Uuid,
    /// Number of accruals created in this run.
    pub created: u64,
    /// Diagnostics for anything that was skipped.
    pub skipped: Vec<SkipReason>,
}

/// Outcome of a bulk generation sweep.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    /// Total accruals created across all customers.
    pub total_created: u64,
    /// Per-customer outcomes, in sweep order.
    pub customers: Vec<CustomerGeneration>,
}

/// Subscription accrual repository.
#[derive(Clone)]
pub struct AccrualRepository {
    db: DatabaseConnection,
    locks: Arc<CustomerLocks>,
}

impl AccrualRepository {
    /// Creates a new accrual repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, locks: Arc<CustomerLocks>) -> Self {
        Self { db, locks }
    }

    /// Generates accruals for every active fee-bearing customer.
    ///
    /// Customers are processed strictly in order, one transaction each, so a
    /// failure aborts the sweep at that customer and everything before it
    /// stays committed; the sweep is safe to re-run.
    pub async fn generate_all(&self, today: NaiveDate) -> Result<GenerationReport, AccrualError> {
        let customers = CustomerDirectory::list_active_fee_bearing(&self.db).await?;

        let mut report = GenerationReport {
            total_created: 0,
            customers: Vec::with_capacity(customers.len()),
        };

        for customer in &customers {
            let outcome = self.generate_locked(customer, today).await?;
            report.total_created += outcome.created;
            report.customers.push(outcome);
        }

        tracing::info!(
            total_created = report.total_created,
            customers = report.customers.len(),
            "Bulk accrual generation finished"
        );
        Ok(report)
    }

    /// Generates accruals for one customer.
    pub async fn generate_for_customer(
        &self,
        customer_id: Uuid,
        today: NaiveDate,
    ) -> Result<CustomerGeneration, AccrualError> {
        let customer = CustomerDirectory::find(&self.db, customer_id)
            .await?
            .ok_or(AccrualError::CustomerNotFound(customer_id))?;

        self.generate_locked(&customer, today).await
    }

    /// Generation body; holds the customer lock for the whole run.
    async fn generate_locked(
        &self,
        customer: &customers::Model,
        today: NaiveDate,
    ) -> Result<CustomerGeneration, AccrualError> {
        let _guard = self.locks.acquire(customer.id).await;

        let mut outcome = CustomerGeneration {
            customer_id: customer.id,
            created: 0,
            skipped: Vec::new(),
        };

        if !customer.is_active {
            outcome.skipped.push(SkipReason::CustomerInactive);
            return Ok(outcome);
        }

        let Some(established_on) = customer.established_on else {
            outcome.skipped.push(SkipReason::MissingEstablishmentDate);
            return Ok(outcome);
        };

        let Some(fee_text) = customer.subscription_fee.as_deref() else {
            outcome.skipped.push(SkipReason::MissingFee);
            return Ok(outcome);
        };

        let amount = match parse_fee(fee_text) {
            Ok(amount) => amount,
            Err(FeeError::NotANumber(_)) => {
                outcome.skipped.push(SkipReason::UnparseableFee {
                    fee: fee_text.to_string(),
                });
                return Ok(outcome);
            }
            Err(FeeError::NotPositive(_)) => {
                outcome.skipped.push(SkipReason::NonPositiveFee {
                    fee: fee_text.to_string(),
                });
                return Ok(outcome);
            }
        };

        let months = months_inclusive(
            YearMonth::from_date(established_on),
            YearMonth::from_date(today),
        );

        let txn = self.db.begin().await?;
        let mut periods: HashMap<i32, accounting_periods::Model> = HashMap::new();

        for month in months {
            if !periods.contains_key(&month.year) {
                let period = PeriodRepository::find_or_create(&txn, customer.id, month.year).await?;
                periods.insert(month.year, period);
            }
            // Lookup cannot fail after the insert above.
            let Some(period) = periods.get(&month.year) else {
                continue;
            };

            if !period.is_open() {
                outcome.skipped.push(SkipReason::PeriodClosed {
                    year: month.year,
                    month: month.month,
                });
                continue;
            }

            if accrual_exists_in_month(&txn, customer.id, period.id, month).await? {
                continue;
            }

            let now = chrono::Utc::now().into();
            let accrual = subscription_accruals::ActiveModel {
                id: Set(Uuid::new_v4()),
                customer_id: Set(customer.id),
                period_id: Set(period.id),
                amount: Set(amount),
                due_date: Set(clamp_day(month.year, month.month, 28)),
                is_paid: Set(false),
                payment_date: Set(None),
                carry_forward_amount: Set(Decimal::ZERO),
                carry_forward_to_period_id: Set(None),
                description: Set(accrual_description(month)),
                created_at: Set(now),
                updated_at: Set(now),
            };
            accrual.insert(&txn).await?;
            outcome.created += 1;
        }

        txn.commit().await?;

        tracing::info!(
            customer_id = %customer.id,
            created = outcome.created,
            skipped = outcome.skipped.len(),
            "Generated subscription accruals"
        );
        Ok(outcome)
    }

    /// Lists a customer's accruals, optionally limited to one year, ordered
    /// by due date ascending.
    pub async fn list(
        &self,
        customer_id: Uuid,
        year: Option<i32>,
    ) -> Result<Vec<subscription_accruals::Model>, AccrualError> {
        if CustomerDirectory::find(&self.db, customer_id).await?.is_none() {
            return Err(AccrualError::CustomerNotFound(customer_id));
        }

        let mut query = subscription_accruals::Entity::find()
            .filter(subscription_accruals::Column::CustomerId.eq(customer_id));

        if let Some(year) = year {
            // Accrual due dates fall within their period's year by invariant.
            query = query
                .filter(subscription_accruals::Column::DueDate.gte(clamp_day(year, 1, 1)))
                .filter(subscription_accruals::Column::DueDate.lte(clamp_day(year, 12, 31)));
        }

        let accruals = query
            .order_by_asc(subscription_accruals::Column::DueDate)
            .all(&self.db)
            .await?;
        Ok(accruals)
    }

    /// Updates an accrual's paid state and payment date.
    ///
    /// Marking unpaid clears the payment date, so supplying a payment date
    /// alongside `is_paid: false` is rejected. The update timestamp is
    /// always refreshed.
    pub async fn set_payment(
        &self,
        accrual_id: Uuid,
        is_paid: Option<bool>,
        payment_date: Option<NaiveDate>,
    ) -> Result<subscription_accruals::Model, AccrualError> {
        if is_paid == Some(false) && payment_date.is_some() {
            return Err(AccrualError::UnpaidWithPaymentDate);
        }

        let accrual = subscription_accruals::Entity::find_by_id(accrual_id)
            .one(&self.db)
            .await?
            .ok_or(AccrualError::AccrualNotFound(accrual_id))?;

        let mut active: subscription_accruals::ActiveModel = accrual.into();

        if let Some(paid) = is_paid {
            active.is_paid = Set(paid);
            if !paid {
                active.payment_date = Set(None);
            }
        }
        if let Some(date) = payment_date {
            active.payment_date = Set(Some(date));
        }
        active.updated_at = Set(chrono::Utc::now().into());

        let updated = active.update(&self.db).await?;
        Ok(updated)
    }
}

/// Whether the period already holds an accrual due in `month`.
async fn accrual_exists_in_month<C: sea_orm::ConnectionTrait>(
    conn: &C,
    customer_id: Uuid,
    period_id: Uuid,
    month: YearMonth,
) -> Result<bool, DbErr> {
    let existing = subscription_accruals::Entity::find()
        .filter(subscription_accruals::Column::CustomerId.eq(customer_id))
        .filter(subscription_accruals::Column::PeriodId.eq(period_id))
        .filter(subscription_accruals::Column::DueDate.gte(clamp_day(month.year, month.month, 1)))
        .filter(
            subscription_accruals::Column::DueDate
                .lte(last_day_of_month(month.year, month.month)),
        )
        .one(conn)
        .await?;

    Ok(existing.is_some())
}

/// Human-readable period description for a generated accrual.
fn accrual_description(month: YearMonth) -> String {
    format!("Subscription fee {} {}", month_name(month.month), month.year)
}
