//! `SeaORM` Entity for the obligation_rules table (global rule defaults).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "obligation_rules")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Unique obligation type key (e.g., "KDV").
    #[sea_orm(unique)]
    pub obligation_type: String,
    /// Upper-case frequency token: MONTHLY, QUARTERLY, or YEARLY.
    pub frequency: String,
    pub due_day: i16,
    pub due_hour: i16,
    pub due_minute: i16,
    /// Due month for yearly rules.
    pub due_month: Option<i16>,
    /// Months after quarter end for quarterly rules.
    pub quarter_offset: Option<i16>,
    /// CSV of applicable quarters ("1,2,3,4").
    pub applicable_quarters: String,
    pub skip_fourth_quarter: bool,
    pub enabled: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
