//! `SeaORM` Entity for per-customer obligation rule overrides.
//!
//! Every rule field is nullable; a NULL keeps the global value. The write
//! path replaces a customer's full override set in one transaction.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "customer_obligation_overrides")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub customer_id: Uuid,
    pub obligation_type: String,
    pub frequency: Option<String>,
    pub due_day: Option<i16>,
    pub due_hour: Option<i16>,
    pub due_minute: Option<i16>,
    pub due_month: Option<i16>,
    pub quarter_offset: Option<i16>,
    pub applicable_quarters: Option<String>,
    pub skip_fourth_quarter: Option<bool>,
    pub enabled: Option<bool>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::customers::Entity",
        from = "Column::CustomerId",
        to = "super::customers::Column::Id"
    )]
    Customers,
}

impl Related<super::customers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
