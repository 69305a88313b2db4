//! `SeaORM` Entity for yearly accounting periods.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::AccountingPeriodStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "accounting_periods")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub customer_id: Uuid,
    /// Calendar year; unique per customer.
    pub year: i32,
    pub start_date: Date,
    pub end_date: Date,
    pub status: AccountingPeriodStatus,
    pub closed_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Returns true if accruals can still be generated into this period.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status == AccountingPeriodStatus::Open
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::customers::Entity",
        from = "Column::CustomerId",
        to = "super::customers::Column::Id"
    )]
    Customers,
    #[sea_orm(has_many = "super::subscription_accruals::Entity")]
    SubscriptionAccruals,
}

impl Related<super::customers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customers.def()
    }
}

impl Related<super::subscription_accruals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SubscriptionAccruals.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
