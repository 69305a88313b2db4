//! Error types for obligation scheduling.

use thiserror::Error;

use super::rule::Frequency;

/// Error types for rule expansion.
///
/// A rule lacking a field its frequency requires is a configuration error
/// reported to the caller; the scheduler never fabricates a default due date.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    /// Rule is missing a field required for its frequency.
    #[error("Rule {obligation_type} is {frequency} but has no {field}")]
    MissingField {
        /// Obligation type key.
        obligation_type: String,
        /// The rule's frequency.
        frequency: Frequency,
        /// Name of the missing field.
        field: &'static str,
    },

    /// Rule carries an out-of-range due time.
    #[error("Rule {obligation_type} has invalid due time {hour:02}:{minute:02}")]
    InvalidDueTime {
        /// Obligation type key.
        obligation_type: String,
        /// Configured hour.
        hour: u32,
        /// Configured minute.
        minute: u32,
    },

    /// Rule carries an out-of-range due month.
    #[error("Rule {obligation_type} has invalid due month {month}")]
    InvalidDueMonth {
        /// Obligation type key.
        obligation_type: String,
        /// Configured month.
        month: u32,
    },
}
