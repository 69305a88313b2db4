//! Obligation rule specs and the field-wise override merge.

use serde::{Deserialize, Serialize};

/// Recurrence frequency of an obligation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Frequency {
    /// One instance per calendar month.
    Monthly,
    /// One instance per applicable calendar quarter.
    Quarterly,
    /// One instance per calendar year.
    Yearly,
}

impl Frequency {
    /// Parses the frequency token, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "MONTHLY" => Some(Self::Monthly),
            "QUARTERLY" => Some(Self::Quarterly),
            "YEARLY" => Some(Self::Yearly),
            _ => None,
        }
    }

    /// The stored upper-case token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Monthly => "MONTHLY",
            Self::Quarterly => "QUARTERLY",
            Self::Yearly => "YEARLY",
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subset of the four calendar quarters a quarterly rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Vec<u8>", try_from = "Vec<u8>")]
pub struct Quarters([bool; 4]);

impl Quarters {
    /// All four quarters.
    pub const ALL: Self = Self([true; 4]);

    /// Builds a set from quarter numbers, ignoring duplicates.
    ///
    /// Returns `None` when any number is outside 1-4 or the set is empty.
    #[must_use]
    pub fn from_numbers(quarters: &[u8]) -> Option<Self> {
        if quarters.is_empty() {
            return None;
        }
        let mut set = [false; 4];
        for &q in quarters {
            if !(1..=4).contains(&q) {
                return None;
            }
            set[(q - 1) as usize] = true;
        }
        Some(Self(set))
    }

    /// Parses the stored CSV form ("1,2,3").
    #[must_use]
    pub fn from_csv(csv: &str) -> Option<Self> {
        let numbers: Option<Vec<u8>> = csv
            .split(',')
            .map(|s| s.trim().parse::<u8>().ok())
            .collect();
        Self::from_numbers(&numbers?)
    }

    /// The stored CSV form, ascending ("1,2,3").
    #[must_use]
    pub fn to_csv(self) -> String {
        self.iter()
            .map(|q| q.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Whether quarter `q` (1-4) is in the set.
    #[must_use]
    pub fn contains(self, q: u8) -> bool {
        (1..=4).contains(&q) && self.0[(q - 1) as usize]
    }

    /// Quarter numbers in the set, ascending.
    pub fn iter(self) -> impl Iterator<Item = u8> {
        (1u8..=4).filter(move |&q| self.contains(q))
    }
}

impl From<Quarters> for Vec<u8> {
    fn from(q: Quarters) -> Self {
        q.iter().collect()
    }
}

impl TryFrom<Vec<u8>> for Quarters {
    type Error = String;

    fn try_from(v: Vec<u8>) -> Result<Self, Self::Error> {
        Quarters::from_numbers(&v).ok_or_else(|| format!("invalid quarter set: {v:?}"))
    }
}

/// A fully-specified recurrence rule for one obligation type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObligationRule {
    /// Unique obligation type key (e.g., "KDV").
    pub obligation_type: String,
    /// Recurrence frequency.
    pub frequency: Frequency,
    /// Day of the due month. Conventionally <= 28; larger values clamp to
    /// the month's last valid day.
    pub due_day: u32,
    /// Hour of the due instant.
    pub due_hour: u32,
    /// Minute of the due instant.
    pub due_minute: u32,
    /// Due month for yearly rules (1-12).
    pub due_month: Option<u32>,
    /// Months after a quarter's end month in which it falls due.
    pub quarter_offset: Option<u32>,
    /// Quarters this rule applies to (quarterly rules).
    pub applicable_quarters: Quarters,
    /// Whether quarter 4 is skipped even when in the applicable set.
    pub skip_fourth_quarter: bool,
    /// Whether the rule is active.
    pub enabled: bool,
}

/// Per-customer partial override of a rule; `None` fields keep the base value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleOverride {
    /// Obligation type this override targets.
    pub obligation_type: String,
    /// Override for the frequency.
    pub frequency: Option<Frequency>,
    /// Override for the due day.
    pub due_day: Option<u32>,
    /// Override for the due hour.
    pub due_hour: Option<u32>,
    /// Override for the due minute.
    pub due_minute: Option<u32>,
    /// Override for the yearly due month.
    pub due_month: Option<u32>,
    /// Override for the quarter offset.
    pub quarter_offset: Option<u32>,
    /// Override for the applicable quarters.
    pub applicable_quarters: Option<Quarters>,
    /// Override for the fourth-quarter skip flag.
    pub skip_fourth_quarter: Option<bool>,
    /// Override for the enabled flag.
    pub enabled: Option<bool>,
}

/// Overlays a customer override onto a base rule, field by field.
///
/// Fields present in the override replace the base value; absent fields
/// leave it untouched. Pure coalesce, no storage access.
#[must_use]
pub fn merge(base: &ObligationRule, ov: &RuleOverride) -> ObligationRule {
    ObligationRule {
        obligation_type: base.obligation_type.clone(),
        frequency: ov.frequency.unwrap_or(base.frequency),
        due_day: ov.due_day.unwrap_or(base.due_day),
        due_hour: ov.due_hour.unwrap_or(base.due_hour),
        due_minute: ov.due_minute.unwrap_or(base.due_minute),
        due_month: ov.due_month.or(base.due_month),
        quarter_offset: ov.quarter_offset.or(base.quarter_offset),
        applicable_quarters: ov.applicable_quarters.unwrap_or(base.applicable_quarters),
        skip_fourth_quarter: ov.skip_fourth_quarter.unwrap_or(base.skip_fourth_quarter),
        enabled: ov.enabled.unwrap_or(base.enabled),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_rule() -> ObligationRule {
        ObligationRule {
            obligation_type: "KDV".to_string(),
            frequency: Frequency::Monthly,
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

    #[test]
    fn test_frequency_parse_case_insensitive() {
        assert_eq!(Frequency::parse("monthly"), Some(Frequency::Monthly));
        assert_eq!(Frequency::parse("Quarterly"), Some(Frequency::Quarterly));
        assert_eq!(Frequency::parse("YEARLY"), Some(Frequency::Yearly));
        assert_eq!(Frequency::parse("weekly"), None);
    }

    #[test]
    fn test_frequency_stored_upper_case() {
        assert_eq!(Frequency::Monthly.as_str(), "MONTHLY");
        assert_eq!(Frequency::parse("quarterly").unwrap().as_str(), "QUARTERLY");
    }

    #[test]
    fn test_quarters_csv_round_trip() {
        let q = Quarters::from_csv("1,2,3").unwrap();
        assert!(q.contains(1) && q.contains(2) && q.contains(3));
        assert!(!q.contains(4));
        assert_eq!(q.to_csv(), "1,2,3");
    }

    #[test]
    fn test_quarters_rejects_invalid() {
        assert!(Quarters::from_csv("").is_none());
        assert!(Quarters::from_csv("0,1").is_none());
        assert!(Quarters::from_csv("1,5").is_none());
        assert!(Quarters::from_csv("x").is_none());
    }

    #[test]
    fn test_merge_empty_override_is_identity() {
        let base = base_rule();
        let ov = RuleOverride {
            obligation_type: "KDV".to_string(),
            ..RuleOverride::default()
        };
        assert_eq!(merge(&base, &ov), base);
    }

    #[test]
    fn test_merge_present_fields_win() {
        let base = base_rule();
        let ov = RuleOverride {
            obligation_type: "KDV".to_string(),
            due_day: Some(26),
            enabled: Some(false),
            ..RuleOverride::default()
        };

        let merged = merge(&base, &ov);
        assert_eq!(merged.due_day, 26);
        assert!(!merged.enabled);
        // Untouched fields keep the base value
        assert_eq!(merged.frequency, Frequency::Monthly);
        assert_eq!(merged.due_hour, 23);
    }

    #[test]
    fn test_merge_optional_base_fields_coalesce() {
        let mut base = base_rule();
        base.frequency = Frequency::Quarterly;
        base.quarter_offset = Some(1);

        let ov = RuleOverride {
            obligation_type: "KDV".to_string(),
            quarter_offset: Some(2),
            ..RuleOverride::default()
        };
        assert_eq!(merge(&base, &ov).quarter_offset, Some(2));

        let no_ov = RuleOverride {
            obligation_type: "KDV".to_string(),
            ..RuleOverride::default()
        };
        assert_eq!(merge(&base, &no_ov).quarter_offset, Some(1));
    }
}
