//! Carry-forward of unpaid balances across accounting periods.
//!
//! Closing a period sums its unpaid accrual balances, stamps each source
//! accrual with the destination period, creates one forwarding accrual
//! there, and transitions the source period to CLOSED. The whole sequence
//! runs in a single transaction under the customer's lock, so a
//! mid-sequence failure can never leave accruals marked forwarded without
//! the compensating new accrual. Accruals already pointing at a destination
//! period are excluded, which makes a re-invocation a no-op for them.

use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, Set, TransactionTrait,
};
use serde::Serialize;
use uuid::Uuid;

use crate::entities::subscription_accruals;
use crate::locks::CustomerLocks;
use crate::repositories::periods::PeriodRepository;
use mizan_core::calendar::clamp_day;
use mizan_shared::AppError;

/// Error types for carry-forward operations.
#[derive(Debug, thiserror::Error)]
pub enum CarryForwardError {
    /// Destination year must come after the source year.
    #[error("Destination year {to_year} must be after source year {from_year}")]
    InvalidYearRange {
        /// Source year.
        from_year: i32,
        /// Destination year.
        to_year: i32,
    },

    /// No accounting period exists for the source year.
    #[error("No accounting period for customer {customer_id} in {year}")]
    PeriodNotFound {
        /// Customer id.
        customer_id: Uuid,
        /// Missing period year.
        year: i32,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<CarryForwardError> for AppError {
    fn from(err: CarryForwardError) -> Self {
        match err {
            CarryForwardError::InvalidYearRange { .. } => Self::Validation(err.to_string()),
            CarryForwardError::PeriodNotFound { .. } => Self::NotFound(err.to_string()),
            CarryForwardError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Result of closing a period into the next one.
#[derive(Debug, Clone, Serialize)]
pub struct CarryForwardOutcome {
    /// Total unpaid balance moved forward.
    pub carried_forward_amount: Decimal,
    /// Source period id (now CLOSED).
    pub from_period_id: Uuid,
    /// Destination period id.
    pub to_period_id: Uuid,
    /// The forwarding accrual, when a positive balance was moved.
    pub carry_forward_accrual_id: Option<Uuid>,
    /// Number of source accruals stamped as forwarded.
    pub forwarded_count: u64,
}

/// Carry-forward status of a customer's most recent period.
#[derive(Debug, Clone, Serialize)]
pub struct CarryForwardStatus {
    /// Whether any accrual was forwarded into the most recent period.
    pub has_carry_forward: bool,
    /// Year of the most recent period, when one exists.
    pub period_year: Option<i32>,
    /// Number of accruals forwarded into it.
    pub carried_forward_count: u64,
}

/// Carry-forward repository.
#[derive(Clone)]
pub struct CarryForwardRepository {
    db: DatabaseConnection,
    locks: Arc<CustomerLocks>,
}

impl CarryForwardRepository {
    /// Creates a new carry-forward repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, locks: Arc<CustomerLocks>) -> Self {
        Self { db, locks }
    }

    /// Closes `from_year` into `to_year` for a customer.
    pub async fn process(
        &self,
        customer_id: Uuid,
        from_year: i32,
        to_year: i32,
    ) -> Result<CarryForwardOutcome, CarryForwardError> {
        if to_year <= from_year {
            return Err(CarryForwardError::InvalidYearRange { from_year, to_year });
        }

        let _guard = self.locks.acquire(customer_id).await;
        let txn = self.db.begin().await?;

        let from_period = PeriodRepository::find_by_year(&txn, customer_id, from_year)
            .await?
            .ok_or(CarryForwardError::PeriodNotFound {
                customer_id,
                year: from_year,
            })?;

        let to_period = PeriodRepository::find_or_create(&txn, customer_id, to_year).await?;

        let unpaid = unforwarded_unpaid(customer_id, from_period.id)
            .all(&txn)
            .await?;

        let mut total_unpaid = Decimal::ZERO;
        let mut forwarded_count: u64 = 0;
        let now: sea_orm::prelude::DateTimeWithTimeZone = chrono::Utc::now().into();

        for accrual in unpaid {
            total_unpaid += outstanding_balance(accrual.amount, accrual.carry_forward_amount);

            let amount = accrual.amount;
            let mut active: subscription_accruals::ActiveModel = accrual.into();
            active.carry_forward_amount = Set(amount);
            active.carry_forward_to_period_id = Set(Some(to_period.id));
            active.updated_at = Set(now);
            active.update(&txn).await?;
            forwarded_count += 1;
        }

        let carry_forward_accrual_id = if total_unpaid > Decimal::ZERO {
            let accrual = subscription_accruals::ActiveModel {
                id: Set(Uuid::new_v4()),
                customer_id: Set(customer_id),
                period_id: Set(to_period.id),
                amount: Set(total_unpaid),
                due_date: Set(clamp_day(to_year, 1, 28)),
                is_paid: Set(false),
                payment_date: Set(None),
                carry_forward_amount: Set(Decimal::ZERO),
                carry_forward_to_period_id: Set(None),
                description: Set(carry_forward_description(from_year)),
                created_at: Set(now),
                updated_at: Set(now),
            };
            Some(accrual.insert(&txn).await?.id)
        } else {
            None
        };

        let from_period = PeriodRepository::close(&txn, from_period).await?;

        txn.commit().await?;

        tracing::info!(
            customer_id = %customer_id,
            from_year,
            to_year,
            carried = %total_unpaid,
            forwarded = forwarded_count,
            "Carried forward unpaid balance"
        );

        Ok(CarryForwardOutcome {
            carried_forward_amount: total_unpaid,
            from_period_id: from_period.id,
            to_period_id: to_period.id,
            carry_forward_accrual_id,
            forwarded_count,
        })
    }

    /// Reports whether the customer's most recent period received any
    /// forwarded accruals.
    pub async fn status(&self, customer_id: Uuid) -> Result<CarryForwardStatus, CarryForwardError> {
        let Some(latest) = PeriodRepository::latest(&self.db, customer_id).await? else {
            return Ok(CarryForwardStatus {
                has_carry_forward: false,
                period_year: None,
                carried_forward_count: 0,
            });
        };

        let count = subscription_accruals::Entity::find()
            .filter(subscription_accruals::Column::CarryForwardToPeriodId.eq(latest.id))
            .count(&self.db)
            .await?;

        Ok(CarryForwardStatus {
            has_carry_forward: count > 0,
            period_year: Some(latest.year),
            carried_forward_count: count,
        })
    }
}

/// Unpaid accruals in a period not yet forwarded anywhere.
///
/// The NULL destination filter is the double-forward guard: a retry after a
/// past run sees nothing it already moved.
fn unforwarded_unpaid(
    customer_id: Uuid,
    period_id: Uuid,
) -> sea_orm::Select<subscription_accruals::Entity> {
    subscription_accruals::Entity::find()
        .filter(subscription_accruals::Column::CustomerId.eq(customer_id))
        .filter(subscription_accruals::Column::PeriodId.eq(period_id))
        .filter(subscription_accruals::Column::IsPaid.eq(false))
        .filter(subscription_accruals::Column::CarryForwardToPeriodId.is_null())
}

/// Balance still owed on an accrual after prior forwarding.
fn outstanding_balance(amount: Decimal, carry_forward_amount: Decimal) -> Decimal {
    amount - carry_forward_amount
}

/// Description of the forwarding accrual created in the destination period.
fn carry_forward_description(from_year: i32) -> String {
    format!("Carried balance from {from_year}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_outstanding_balance() {
        assert_eq!(outstanding_balance(dec!(2500), dec!(0)), dec!(2500));
        assert_eq!(outstanding_balance(dec!(2500), dec!(1000)), dec!(1500));
        assert_eq!(outstanding_balance(dec!(2500), dec!(2500)), dec!(0));
    }

    #[test]
    fn test_carry_forward_description() {
        assert_eq!(carry_forward_description(2023), "Carried balance from 2023");
    }

    #[test]
    fn test_forwarding_due_date_is_january_28() {
        let due = clamp_day(2024, 1, 28);
        assert_eq!(due, chrono::NaiveDate::from_ymd_opt(2024, 1, 28).unwrap());
    }

    #[test]
    fn test_unpaid_selection_excludes_already_forwarded() {
        use sea_orm::QueryTrait;

        let sql = unforwarded_unpaid(Uuid::new_v4(), Uuid::new_v4())
            .build(sea_orm::DatabaseBackend::Postgres)
            .to_string();

        assert!(sql.contains(r#""carry_forward_to_period_id" IS NULL"#));
        assert!(sql.contains(r#""is_paid" = FALSE"#));
    }

    #[test]
    fn test_invalid_year_range_maps_to_validation() {
        let err: AppError = CarryForwardError::InvalidYearRange {
            from_year: 2024,
            to_year: 2024,
        }
        .into();
        assert_eq!(err.status_code(), 400);
    }
}
