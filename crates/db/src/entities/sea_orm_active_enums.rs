//! Database enum mappings.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Status of a yearly accounting period.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(
    rs_type = "String",
    db_type = "Enum",
    enum_name = "accounting_period_status"
)]
pub enum AccountingPeriodStatus {
    /// Period accepts new accruals.
    #[sea_orm(string_value = "OPEN")]
    Open,
    /// Period is closed; balances were carried forward.
    #[sea_orm(string_value = "CLOSED")]
    Closed,
}
