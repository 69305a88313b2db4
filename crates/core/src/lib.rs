//! Core business logic for Mizan.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, recurrence rules, and calendar calculations live here.
//!
//! # Modules
//!
//! - `obligation` - Taxpayer profiles, obligation rules, and due-date expansion
//! - `calendar` - Month arithmetic, quarter table, and day clamping
//! - `fees` - Locale-formatted subscription fee parsing

pub mod calendar;
pub mod fees;
pub mod obligation;
