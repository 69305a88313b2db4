//! Expansion of a merged rule across a date range into concrete due instants.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::error::ScheduleError;
use super::rule::{Frequency, ObligationRule};
use crate::calendar::{YearMonth, add_months, clamp_day, months_inclusive, quarter_end_month};

/// A concrete due-date instance produced by rule expansion.
///
/// Consumed by filing-submission tracking; this subsystem only derives them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DueInstance {
    /// Obligation type key.
    pub obligation_type: String,
    /// Label of the filing period ("2024-03", "2024-Q1", "2024").
    pub period_label: String,
    /// Calendar year of the filing period.
    pub year: i32,
    /// Month of the filing period for monthly rules.
    pub month: Option<u32>,
    /// The due instant.
    pub due_at: NaiveDateTime,
}

/// Expands a rule across `[from, to]` into due-date instances, oldest first.
///
/// A disabled rule expands to nothing. Day-of-month values past the due
/// month's length clamp to its last valid day.
///
/// # Errors
///
/// Returns `ScheduleError` when the rule lacks a field its frequency
/// requires or carries an out-of-range due time or month.
pub fn expand(
    rule: &ObligationRule,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<DueInstance>, ScheduleError> {
    if !rule.enabled || from > to {
        return Ok(Vec::new());
    }

    if rule.due_hour > 23 || rule.due_minute > 59 {
        return Err(ScheduleError::InvalidDueTime {
            obligation_type: rule.obligation_type.clone(),
            hour: rule.due_hour,
            minute: rule.due_minute,
        });
    }

    match rule.frequency {
        Frequency::Monthly => expand_monthly(rule, from, to),
        Frequency::Quarterly => expand_quarterly(rule, from, to),
        Frequency::Yearly => expand_yearly(rule, from, to),
    }
}

/// One instance per covered month, due in the following month.
fn expand_monthly(
    rule: &ObligationRule,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<DueInstance>, ScheduleError> {
    let months = months_inclusive(YearMonth::from_date(from), YearMonth::from_date(to));

    months
        .into_iter()
        .map(|filing_month| {
            let due_month = filing_month.next();
            let due_at = due_instant(rule, due_month.year, due_month.month)?;

            Ok(DueInstance {
                obligation_type: rule.obligation_type.clone(),
                period_label: filing_month.label(),
                year: filing_month.year,
                month: Some(filing_month.month),
                due_at,
            })
        })
        .collect()
}

/// One instance per covered applicable quarter, due `quarter_offset` months
/// after the quarter's end month.
fn expand_quarterly(
    rule: &ObligationRule,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<DueInstance>, ScheduleError> {
    let offset = rule
        .quarter_offset
        .ok_or_else(|| ScheduleError::MissingField {
            obligation_type: rule.obligation_type.clone(),
            frequency: rule.frequency,
            field: "quarter_offset",
        })?;

    let mut instances = Vec::new();

    for year in from.year()..=to.year() {
        for quarter in 1u8..=4 {
            if !rule.applicable_quarters.contains(quarter) {
                continue;
            }
            if quarter == 4 && rule.skip_fourth_quarter {
                continue;
            }

            // Quarter is covered when its three months intersect the range.
            let end_month = quarter_end_month(quarter);
            let q_start = clamp_day(year, end_month - 2, 1);
            let q_end = clamp_day(year, end_month, 31);
            if q_start > to || q_end < from {
                continue;
            }

            let (due_year, due_month) = add_months(year, end_month, offset);
            let due_at = due_instant(rule, due_year, due_month)?;

            instances.push(DueInstance {
                obligation_type: rule.obligation_type.clone(),
                period_label: format!("{year}-Q{quarter}"),
                year,
                month: None,
                due_at,
            });
        }
    }

    Ok(instances)
}

/// One instance per covered calendar year, due the following year.
fn expand_yearly(
    rule: &ObligationRule,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<DueInstance>, ScheduleError> {
    let due_month = rule.due_month.ok_or_else(|| ScheduleError::MissingField {
        obligation_type: rule.obligation_type.clone(),
        frequency: rule.frequency,
        field: "due_month",
    })?;

    if !(1..=12).contains(&due_month) {
        return Err(ScheduleError::InvalidDueMonth {
            obligation_type: rule.obligation_type.clone(),
            month: due_month,
        });
    }

    (from.year()..=to.year())
        .map(|year| {
            let due_at = due_instant(rule, year + 1, due_month)?;

            Ok(DueInstance {
                obligation_type: rule.obligation_type.clone(),
                period_label: format!("{year}"),
                year,
                month: None,
                due_at,
            })
        })
        .collect()
}

fn due_instant(rule: &ObligationRule, year: i32, month: u32) -> Result<NaiveDateTime, ScheduleError> {
    clamp_day(year, month, rule.due_day)
        .and_hms_opt(rule.due_hour, rule.due_minute, 0)
        .ok_or(ScheduleError::InvalidDueTime {
            obligation_type: rule.obligation_type.clone(),
            hour: rule.due_hour,
            minute: rule.due_minute,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::obligation::rule::Quarters;

    fn rule(frequency: Frequency) -> ObligationRule {
        ObligationRule {
            obligation_type: "TEST".to_string(),
            frequency,
            due_day: 28,
            due_hour: 23,
            due_minute: 59,
            due_month: None,
            quarter_offset: None,
            applicable_quarters: Quarters::ALL,
            skip_fourth_quarter: false,
            enabled: true,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_monthly_due_in_following_month() {
        let r = rule(Frequency::Monthly);
        let instances = expand(&r, date(2024, 1, 1), date(2024, 3, 31)).unwrap();

        assert_eq!(instances.len(), 3);
        assert_eq!(instances[0].period_label, "2024-01");
        assert_eq!(instances[0].month, Some(1));
        assert_eq!(
            instances[0].due_at,
            date(2024, 2, 28).and_hms_opt(23, 59, 0).unwrap()
        );
        // December filing is due in January of the next year
        let december = expand(&r, date(2024, 12, 1), date(2024, 12, 31)).unwrap();
        assert_eq!(
            december[0].due_at,
            date(2025, 1, 28).and_hms_opt(23, 59, 0).unwrap()
        );
    }

    #[test]
    fn test_quarterly_offset_one() {
        let mut r = rule(Frequency::Quarterly);
        r.quarter_offset = Some(1);
        r.due_day = 26;

        let instances = expand(&r, date(2024, 1, 1), date(2024, 12, 31)).unwrap();
        assert_eq!(instances.len(), 4);
        assert_eq!(instances[0].period_label, "2024-Q1");
        assert_eq!(
            instances[0].due_at,
            date(2024, 4, 26).and_hms_opt(23, 59, 0).unwrap()
        );
        // Q4 due month rolls into January of the next year
        assert_eq!(instances[3].period_label, "2024-Q4");
        assert_eq!(
            instances[3].due_at,
            date(2025, 1, 26).and_hms_opt(23, 59, 0).unwrap()
        );
    }

    #[test]
    fn test_provisional_shape_never_emits_q4() {
        let mut r = rule(Frequency::Quarterly);
        r.quarter_offset = Some(2);
        r.due_day = 17;
        r.applicable_quarters = Quarters::from_numbers(&[1, 2, 3]).unwrap();
        r.skip_fourth_quarter = true;

        let instances = expand(&r, date(2024, 1, 1), date(2024, 12, 31)).unwrap();
        assert_eq!(instances.len(), 3);
        assert!(instances.iter().all(|i| !i.period_label.ends_with("Q4")));
        // Offset 2 from quarter ends: May, August, November
        assert_eq!(
            instances[0].due_at,
            date(2024, 5, 17).and_hms_opt(23, 59, 0).unwrap()
        );
        assert_eq!(
            instances[1].due_at,
            date(2024, 8, 17).and_hms_opt(23, 59, 0).unwrap()
        );
        assert_eq!(
            instances[2].due_at,
            date(2024, 11, 17).and_hms_opt(23, 59, 0).unwrap()
        );
    }

    #[test]
    fn test_q4_offset_two_rolls_into_february_not_month_14() {
        let mut r = rule(Frequency::Quarterly);
        r.quarter_offset = Some(2);

        let instances = expand(&r, date(2024, 10, 1), date(2024, 12, 31)).unwrap();
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].period_label, "2024-Q4");
        assert_eq!(instances[0].due_at.date(), date(2025, 2, 28));
    }

    #[test]
    fn test_yearly_due_next_year() {
        let mut r = rule(Frequency::Yearly);
        r.due_month = Some(4);
        r.due_day = 30;

        let instances = expand(&r, date(2023, 1, 1), date(2024, 12, 31)).unwrap();
        assert_eq!(instances.len(), 2);
        assert_eq!(instances[0].period_label, "2023");
        assert_eq!(instances[0].due_at.date(), date(2024, 4, 30));
        assert_eq!(instances[1].due_at.date(), date(2025, 4, 30));
    }

    #[test]
    fn test_day_clamps_to_month_length() {
        let mut r = rule(Frequency::Yearly);
        r.due_month = Some(2);
        r.due_day = 31;

        let instances = expand(&r, date(2023, 1, 1), date(2023, 12, 31)).unwrap();
        // 2024 is a leap year
        assert_eq!(instances[0].due_at.date(), date(2024, 2, 29));
    }

    #[test]
    fn test_missing_quarter_offset_is_configuration_error() {
        let r = rule(Frequency::Quarterly);
        let err = expand(&r, date(2024, 1, 1), date(2024, 12, 31)).unwrap_err();
        assert!(matches!(
            err,
            ScheduleError::MissingField {
                field: "quarter_offset",
                ..
            }
        ));
    }

    #[test]
    fn test_missing_due_month_is_configuration_error() {
        let r = rule(Frequency::Yearly);
        let err = expand(&r, date(2024, 1, 1), date(2024, 12, 31)).unwrap_err();
        assert!(matches!(
            err,
            ScheduleError::MissingField {
                field: "due_month",
                ..
            }
        ));
    }

    #[test]
    fn test_disabled_rule_expands_to_nothing() {
        let mut r = rule(Frequency::Monthly);
        r.enabled = false;
        assert!(
            expand(&r, date(2024, 1, 1), date(2024, 12, 31))
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_invalid_due_time_rejected() {
        let mut r = rule(Frequency::Monthly);
        r.due_hour = 24;
        assert!(matches!(
            expand(&r, date(2024, 1, 1), date(2024, 1, 31)),
            Err(ScheduleError::InvalidDueTime { .. })
        ));
    }
}
