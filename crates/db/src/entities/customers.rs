//! `SeaORM` Entity for the customers table.
//!
//! The customer directory is an external collaborator; this subsystem reads
//! establishment date, subscription fee, activity flag, and the
//! taxpayer-profile fields, and never writes customer rows.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "customers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub company_type: String,
    pub ledger_type: String,
    pub has_employees: bool,
    pub is_active: bool,
    /// Raw operator-entered fee text; may carry a currency symbol and
    /// locale separators.
    pub subscription_fee: Option<String>,
    pub established_on: Option<Date>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::accounting_periods::Entity")]
    AccountingPeriods,
    #[sea_orm(has_many = "super::customer_obligation_overrides::Entity")]
    CustomerObligationOverrides,
    #[sea_orm(has_many = "super::subscription_accruals::Entity")]
    SubscriptionAccruals,
}

impl Related<super::accounting_periods::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AccountingPeriods.def()
    }
}

impl Related<super::customer_obligation_overrides::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CustomerObligationOverrides.def()
    }
}

impl Related<super::subscription_accruals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SubscriptionAccruals.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
