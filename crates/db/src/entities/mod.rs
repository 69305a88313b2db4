//! `SeaORM` entity definitions.

pub mod accounting_periods;
pub mod customer_obligation_overrides;
pub mod customers;
pub mod obligation_rules;
pub mod sea_orm_active_enums;
pub mod subscription_accruals;
