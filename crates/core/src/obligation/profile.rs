//! Taxpayer profile types.

use serde::{Deserialize, Serialize};

/// Legal form of the taxpayer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompanyType {
    /// Sole proprietorship or personal company.
    Personal,
    /// Capital company (corporate taxpayer).
    Capital,
}

impl CompanyType {
    /// Parses the stored token, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PERSONAL" => Some(Self::Personal),
            "CAPITAL" => Some(Self::Capital),
            _ => None,
        }
    }

    /// The stored upper-case token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Personal => "PERSONAL",
            Self::Capital => "CAPITAL",
        }
    }
}

/// Bookkeeping regime of the taxpayer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerType {
    /// Full balance-sheet bookkeeping.
    Balance,
    /// Simplified operating-book bookkeeping.
    Operating,
}

impl LedgerType {
    /// Parses the stored token, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "BALANCE" => Some(Self::Balance),
            "OPERATING" => Some(Self::Operating),
            _ => None,
        }
    }

    /// The stored upper-case token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Balance => "BALANCE",
            Self::Operating => "OPERATING",
        }
    }
}

/// Profile fields that decide which periodic obligations apply.
///
/// Input only; never persisted by this subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxpayerProfile {
    /// Legal form.
    pub company_type: CompanyType,
    /// Bookkeeping regime.
    pub ledger_type: LedgerType,
    /// Whether the taxpayer has employees on payroll.
    pub has_employees: bool,
}
