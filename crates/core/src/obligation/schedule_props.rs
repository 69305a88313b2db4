//! Property-based tests for rule expansion.
//!
//! - Quarter-4 exclusion holds for every offset and range
//! - Due months always normalize into 1-12 across year rollover
//! - Monthly expansion emits exactly one instance per covered month

use chrono::{Datelike, NaiveDate};
use proptest::prelude::*;

use super::rule::{Frequency, ObligationRule, Quarters};
use super::schedule::expand;
use crate::calendar::{YearMonth, months_inclusive};

fn base_rule(frequency: Frequency) -> ObligationRule {
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

/// Strategy to generate a date between 2020 and 2030.
fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (2020i32..=2030, 1u32..=12, 1u32..=28)
        .prop_map(|(year, month, day)| NaiveDate::from_ymd_opt(year, month, day).unwrap())
}

/// Strategy to generate an ordered date range up to ~3 years long.
fn date_range() -> impl Strategy<Value = (NaiveDate, NaiveDate)> {
    date_strategy().prop_flat_map(|from| {
        (Just(from), 0i64..=1000)
            .prop_map(move |(f, days)| (f, f + chrono::Duration::days(days)))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// A quarterly rule restricted to quarters {1,2,3} never emits a
    /// quarter-4 instance, for any offset and any range.
    #[test]
    fn prop_restricted_quarters_never_emit_q4(
        (from, to) in date_range(),
        offset in 0u32..=6,
        skip_flag in any::<bool>(),
    ) {
        let mut rule = base_rule(Frequency::Quarterly);
        rule.quarter_offset = Some(offset);
        rule.applicable_quarters = Quarters::from_numbers(&[1, 2, 3]).unwrap();
        rule.skip_fourth_quarter = skip_flag;

        let instances = expand(&rule, from, to).unwrap();
        prop_assert!(instances.iter().all(|i| !i.period_label.ends_with("Q4")));
    }

    /// Every emitted due instant has a valid month; offsets past December
    /// roll into the next year instead of producing "month 14".
    #[test]
    fn prop_quarterly_due_months_normalize(
        (from, to) in date_range(),
        offset in 0u32..=12,
    ) {
        let mut rule = base_rule(Frequency::Quarterly);
        rule.quarter_offset = Some(offset);

        let instances = expand(&rule, from, to).unwrap();
        for instance in &instances {
            let due = instance.due_at.date();
            prop_assert!((1..=12).contains(&due.month()));
            // Offset pushes the due date forward, never backward
            prop_assert!(due.year() >= instance.year);
        }
    }

    /// Monthly expansion emits exactly one instance per covered month, in
    /// ascending order, each due in the month after its filing month.
    #[test]
    fn prop_monthly_one_instance_per_month((from, to) in date_range()) {
        let rule = base_rule(Frequency::Monthly);
        let instances = expand(&rule, from, to).unwrap();

        let months = months_inclusive(YearMonth::from_date(from), YearMonth::from_date(to));
        prop_assert_eq!(instances.len(), months.len());

        for (instance, month) in instances.iter().zip(&months) {
            prop_assert_eq!(&instance.period_label, &month.label());
            let due = YearMonth::from_date(instance.due_at.date());
            prop_assert_eq!(due, month.next());
        }
    }

    /// Day values past a month's length clamp instead of failing, so every
    /// configured day in 1..=31 yields a valid due date.
    #[test]
    fn prop_due_day_always_yields_valid_date(
        (from, to) in date_range(),
        due_day in 1u32..=31,
    ) {
        let mut rule = base_rule(Frequency::Monthly);
        rule.due_day = due_day;

        let instances = expand(&rule, from, to).unwrap();
        for instance in &instances {
            prop_assert!(instance.due_at.date().day() <= due_day);
        }
    }
}
