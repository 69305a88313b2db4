//! Shared error taxonomy and configuration for Mizan.
//!
//! This crate provides common types used across all other crates:
//! - Application-wide error types with HTTP mappings
//! - Configuration management

pub mod config;
pub mod error;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
