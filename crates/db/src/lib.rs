//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Repository abstractions for data access
//! - Database migrations
//! - The per-customer lock registry serializing ledger writes

pub mod entities;
pub mod locks;
pub mod migration;
pub mod repositories;

pub use locks::CustomerLocks;
pub use repositories::{
    AccrualRepository, CarryForwardRepository, CustomerDirectory, PeriodRepository, RuleRepository,
};

use sea_orm::{Database, DatabaseConnection, DbErr};

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}
