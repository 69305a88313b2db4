//! Accounting period store.
//!
//! Periods are yearly buckets created lazily on first need. All functions
//! are generic over the connection so callers can run them inside a
//! transaction.

use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use uuid::Uuid;

use crate::entities::{accounting_periods, sea_orm_active_enums::AccountingPeriodStatus};

/// Accounting period repository.
pub struct PeriodRepository;

impl PeriodRepository {
    /// Finds a customer's period for a calendar year.
    pub async fn find_by_year<C: ConnectionTrait>(
        conn: &C,
        customer_id: Uuid,
        year: i32,
    ) -> Result<Option<accounting_periods::Model>, DbErr> {
        accounting_periods::Entity::find()
            .filter(accounting_periods::Column::CustomerId.eq(customer_id))
            .filter(accounting_periods::Column::Year.eq(year))
            .one(conn)
            .await
    }

    /// Fetches the period for a year, creating it when absent.
    ///
    /// New periods span Jan 1 to Dec 31 and start OPEN. The unique index on
    /// (customer_id, year) backstops concurrent creation across processes.
    pub async fn find_or_create<C: ConnectionTrait>(
        conn: &C,
        customer_id: Uuid,
        year: i32,
    ) -> Result<accounting_periods::Model, DbErr> {
        if let Some(existing) = Self::find_by_year(conn, customer_id, year).await? {
            return Ok(existing);
        }

        let now = chrono::Utc::now().into();
        let period = accounting_periods::ActiveModel {
            id: Set(Uuid::new_v4()),
            customer_id: Set(customer_id),
            year: Set(year),
            start_date: Set(year_start(year)),
            end_date: Set(year_end(year)),
            status: Set(AccountingPeriodStatus::Open),
            closed_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        period.insert(conn).await
    }

    /// The customer's most recent period by year, if any.
    pub async fn latest<C: ConnectionTrait>(
        conn: &C,
        customer_id: Uuid,
    ) -> Result<Option<accounting_periods::Model>, DbErr> {
        accounting_periods::Entity::find()
            .filter(accounting_periods::Column::CustomerId.eq(customer_id))
            .order_by_desc(accounting_periods::Column::Year)
            .one(conn)
            .await
    }

    /// Transitions a period to CLOSED, stamping the close time.
    pub async fn close<C: ConnectionTrait>(
        conn: &C,
        period: accounting_periods::Model,
    ) -> Result<accounting_periods::Model, DbErr> {
        let now = chrono::Utc::now().into();
        let mut active: accounting_periods::ActiveModel = period.into();
        active.status = Set(AccountingPeriodStatus::Closed);
        active.closed_at = Set(Some(now));
        active.updated_at = Set(now);
        active.update(conn).await
    }
}

fn year_start(year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or_default()
}

fn year_end(year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, 12, 31).unwrap_or_default()
}
