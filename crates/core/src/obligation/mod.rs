//! Taxpayer profiles, obligation rules, and due-date expansion.
//!
//! This module implements the recurrence engine for periodic tax filings:
//! - Taxpayer profile types
//! - Obligation rule specs and the field-wise override merge
//! - Profile resolution into the applicable rule set
//! - Expansion of a rule across a date range into concrete due instants
//! - Error types for misconfigured rules

pub mod error;
pub mod profile;
pub mod resolver;
pub mod rule;
pub mod schedule;

#[cfg(test)]
mod schedule_props;

pub use error::ScheduleError;
pub use profile::{CompanyType, LedgerType, TaxpayerProfile};
pub use resolver::{default_rules, resolve};
pub use rule::{Frequency, ObligationRule, Quarters, RuleOverride, merge};
pub use schedule::{DueInstance, expand};
