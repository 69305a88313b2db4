//! Profile resolution into the applicable rule set.
//!
//! Pure function: a taxpayer profile always resolves to exactly four rules
//! (VAT, employment withholding, provisional tax, annual return). The choice
//! within each slot depends solely on the profile.

use super::profile::{CompanyType, TaxpayerProfile};
use super::rule::{Frequency, ObligationRule, Quarters};

/// Canonical obligation type keys.
pub mod keys {
    /// Value-added tax, filed monthly.
    pub const KDV: &str = "KDV";
    /// Combined withholding + social-security declaration for employers.
    pub const WITHHOLDING_SSI_MONTHLY: &str = "WITHHOLDING_SSI_MONTHLY";
    /// Quarterly withholding declaration for taxpayers without employees.
    pub const WITHHOLDING_QUARTERLY: &str = "WITHHOLDING_QUARTERLY";
    /// Provisional (advance) tax, corporate variant.
    pub const PROVISIONAL_CORPORATE: &str = "PROVISIONAL_CORPORATE";
    /// Provisional (advance) tax, personal variant.
    pub const PROVISIONAL_PERSONAL: &str = "PROVISIONAL_PERSONAL";
    /// Annual corporate income tax return.
    pub const ANNUAL_CORPORATE: &str = "ANNUAL_CORPORATE";
    /// Annual personal income tax return.
    pub const ANNUAL_PERSONAL: &str = "ANNUAL_PERSONAL";
}

// Filing deadlines fall at end of day.
const DUE_HOUR: u32 = 23;
const DUE_MINUTE: u32 = 59;

fn rule(obligation_type: &str, frequency: Frequency, due_day: u32) -> ObligationRule {
    ObligationRule {
        obligation_type: obligation_type.to_string(),
        frequency,
        due_day,
        due_hour: DUE_HOUR,
        due_minute: DUE_MINUTE,
        due_month: None,
        quarter_offset: None,
        applicable_quarters: Quarters::ALL,
        skip_fourth_quarter: false,
        enabled: true,
    }
}

fn kdv_rule() -> ObligationRule {
    // Due day 28 of the month following the filing month.
    rule(keys::KDV, Frequency::Monthly, 28)
}

fn withholding_rule(has_employees: bool) -> ObligationRule {
    if has_employees {
        // Single combined withholding + social-security declaration,
        // due day 26 of the following month.
        rule(keys::WITHHOLDING_SSI_MONTHLY, Frequency::Monthly, 26)
    } else {
        let mut r = rule(keys::WITHHOLDING_QUARTERLY, Frequency::Quarterly, 26);
        r.quarter_offset = Some(1);
        r
    }
}

fn provisional_rule(company_type: CompanyType) -> ObligationRule {
    let key = match company_type {
        CompanyType::Capital => keys::PROVISIONAL_CORPORATE,
        CompanyType::Personal => keys::PROVISIONAL_PERSONAL,
    };

    // Due two months after quarter end (May/Aug/Nov); quarter 4 provisional
    // tax does not apply.
    let mut r = rule(key, Frequency::Quarterly, 17);
    r.quarter_offset = Some(2);
    r.applicable_quarters = Quarters::from_numbers(&[1, 2, 3]).unwrap_or(Quarters::ALL);
    r.skip_fourth_quarter = true;
    r
}

fn annual_rule(company_type: CompanyType) -> ObligationRule {
    let (key, month, day) = match company_type {
        CompanyType::Capital => (keys::ANNUAL_CORPORATE, 4, 30),
        CompanyType::Personal => (keys::ANNUAL_PERSONAL, 3, 31),
    };

    let mut r = rule(key, Frequency::Yearly, day);
    r.due_month = Some(month);
    r
}

/// Resolves a taxpayer profile into its applicable rule specs.
///
/// Deterministic and always non-empty: one VAT rule, one employment rule
/// (monthly-combined or quarterly, chosen by `has_employees`), one
/// provisional-tax rule, one annual-return rule.
#[must_use]
pub fn resolve(profile: &TaxpayerProfile) -> Vec<ObligationRule> {
    vec![
        kdv_rule(),
        withholding_rule(profile.has_employees),
        provisional_rule(profile.company_type),
        annual_rule(profile.company_type),
    ]
}

/// The canonical global rule set across all obligation types.
///
/// Used to seed the rule config store with defaults.
#[must_use]
pub fn default_rules() -> Vec<ObligationRule> {
    vec![
        kdv_rule(),
        withholding_rule(true),
        withholding_rule(false),
        provisional_rule(CompanyType::Capital),
        provisional_rule(CompanyType::Personal),
        annual_rule(CompanyType::Capital),
        annual_rule(CompanyType::Personal),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::obligation::profile::LedgerType;
    use rstest::rstest;

    fn profile(company_type: CompanyType, has_employees: bool) -> TaxpayerProfile {
        TaxpayerProfile {
            company_type,
            ledger_type: LedgerType::Balance,
            has_employees,
        }
    }

    fn find<'a>(rules: &'a [ObligationRule], key: &str) -> Option<&'a ObligationRule> {
        rules.iter().find(|r| r.obligation_type == key)
    }

    #[rstest]
    #[case(CompanyType::Personal, false)]
    #[case(CompanyType::Personal, true)]
    #[case(CompanyType::Capital, false)]
    #[case(CompanyType::Capital, true)]
    fn test_every_profile_gets_exactly_four_rules(
        #[case] company_type: CompanyType,
        #[case] has_employees: bool,
    ) {
        let rules = resolve(&profile(company_type, has_employees));
        assert_eq!(rules.len(), 4);
        assert!(find(&rules, keys::KDV).is_some());
        assert!(rules.iter().all(|r| r.enabled));
    }

    #[test]
    fn test_kdv_monthly_day_28() {
        let rules = resolve(&profile(CompanyType::Capital, true));
        let kdv = find(&rules, keys::KDV).unwrap();
        assert_eq!(kdv.frequency, Frequency::Monthly);
        assert_eq!(kdv.due_day, 28);
    }

    #[test]
    fn test_employment_rule_is_monthly_xor_quarterly() {
        let with = resolve(&profile(CompanyType::Personal, true));
        assert!(find(&with, keys::WITHHOLDING_SSI_MONTHLY).is_some());
        assert!(find(&with, keys::WITHHOLDING_QUARTERLY).is_none());
        let combined = find(&with, keys::WITHHOLDING_SSI_MONTHLY).unwrap();
        assert_eq!(combined.frequency, Frequency::Monthly);
        assert_eq!(combined.due_day, 26);

        let without = resolve(&profile(CompanyType::Personal, false));
        assert!(find(&without, keys::WITHHOLDING_SSI_MONTHLY).is_none());
        let quarterly = find(&without, keys::WITHHOLDING_QUARTERLY).unwrap();
        assert_eq!(quarterly.frequency, Frequency::Quarterly);
        assert_eq!(quarterly.quarter_offset, Some(1));
        assert_eq!(quarterly.due_day, 26);
        assert!(quarterly.applicable_quarters.contains(4));
    }

    #[rstest]
    #[case(CompanyType::Capital, keys::PROVISIONAL_CORPORATE)]
    #[case(CompanyType::Personal, keys::PROVISIONAL_PERSONAL)]
    fn test_provisional_tax_excludes_fourth_quarter(
        #[case] company_type: CompanyType,
        #[case] key: &str,
    ) {
        let rules = resolve(&profile(company_type, false));
        let prov = find(&rules, key).unwrap();
        assert_eq!(prov.frequency, Frequency::Quarterly);
        assert_eq!(prov.quarter_offset, Some(2));
        assert_eq!(prov.due_day, 17);
        assert!(prov.skip_fourth_quarter);
        assert_eq!(prov.applicable_quarters.to_csv(), "1,2,3");
    }

    #[test]
    fn test_annual_return_depends_on_company_type() {
        let capital = resolve(&profile(CompanyType::Capital, true));
        let corp = find(&capital, keys::ANNUAL_CORPORATE).unwrap();
        assert_eq!(corp.frequency, Frequency::Yearly);
        assert_eq!(corp.due_month, Some(4));
        assert_eq!(corp.due_day, 30);

        let personal = resolve(&profile(CompanyType::Personal, true));
        assert!(find(&personal, keys::ANNUAL_CORPORATE).is_none());
        let pers = find(&personal, keys::ANNUAL_PERSONAL).unwrap();
        assert_eq!(pers.due_month, Some(3));
        assert_eq!(pers.due_day, 31);
    }

    #[test]
    fn test_default_rules_cover_all_types_once() {
        let rules = default_rules();
        assert_eq!(rules.len(), 7);

        let mut types: Vec<&str> = rules.iter().map(|r| r.obligation_type.as_str()).collect();
        types.sort_unstable();
        types.dedup();
        assert_eq!(types.len(), 7);
    }
}
