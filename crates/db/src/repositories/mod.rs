//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod accrual;
pub mod carry_forward;
pub mod customers;
pub mod periods;
pub mod rules;

pub use accrual::{
    AccrualError, AccrualRepository, CustomerGeneration, GenerationReport, SkipReason,
};
pub use carry_forward::{
    CarryForwardError, CarryForwardOutcome, CarryForwardRepository, CarryForwardStatus,
};
pub use customers::CustomerDirectory;
pub use periods::PeriodRepository;
pub use rules::{RuleError, RuleRepository};
