//! Subscription fee parsing.
//!
//! Fees arrive as operator-entered text and may carry a currency symbol and
//! locale formatting with dot thousands separators and a comma decimal
//! separator ("₺2.500,00"). The ledger needs a positive `Decimal`.

use rust_decimal::Decimal;
use thiserror::Error;

/// Error types for fee parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeeError {
    /// The fee text is empty or not a number after normalization.
    #[error("Fee is not a number: {0:?}")]
    NotANumber(String),

    /// The fee parsed but is zero or negative.
    #[error("Fee must be positive, got {0}")]
    NotPositive(Decimal),
}

/// Parses a locale-formatted fee string into a positive `Decimal`.
///
/// Strips everything except digits, separators, and a leading sign, drops
/// dot thousands separators, and converts the comma decimal separator to a
/// dot. "2.500,00" parses as 2500.00.
///
/// Dots are only accepted as thousands separators, so every dot group must
/// be exactly three digits. A dot-decimal input like "2500.50" is rejected
/// rather than read as 250050.
///
/// # Errors
///
/// Returns `FeeError::NotANumber` when nothing numeric remains or the
/// separators are malformed, and `FeeError::NotPositive` for zero or
/// negative amounts.
pub fn parse_fee(raw: &str) -> Result<Decimal, FeeError> {
    let normalized: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
        .collect();

    // Dots are thousands separators in this format, commas the decimal mark.
    let (integer_part, fraction_part) = match normalized.split_once(',') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (normalized.as_str(), None),
    };

    if fraction_part.is_some_and(|f| f.contains('.')) {
        return Err(FeeError::NotANumber(raw.to_string()));
    }

    let mut groups = integer_part.split('.');
    groups.next();
    for group in groups {
        if group.len() != 3 {
            return Err(FeeError::NotANumber(raw.to_string()));
        }
    }

    let normalized = normalized.replace('.', "").replace(',', ".");

    let amount: Decimal = normalized
        .parse()
        .map_err(|_| FeeError::NotANumber(raw.to_string()))?;

    if amount <= Decimal::ZERO {
        return Err(FeeError::NotPositive(amount));
    }

    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_locale_formatted_fee() {
        assert_eq!(parse_fee("2.500,00").unwrap(), dec!(2500.00));
        assert_eq!(parse_fee("1.234.567,89").unwrap(), dec!(1234567.89));
    }

    #[test]
    fn test_currency_symbol_stripped() {
        assert_eq!(parse_fee("₺2.500,00").unwrap(), dec!(2500.00));
        assert_eq!(parse_fee("2500 TL").unwrap(), dec!(2500));
    }

    #[test]
    fn test_plain_integer() {
        assert_eq!(parse_fee("2500").unwrap(), dec!(2500));
    }

    #[test]
    fn test_comma_decimal_only() {
        assert_eq!(parse_fee("750,50").unwrap(), dec!(750.50));
    }

    #[test]
    fn test_non_numeric_is_error_not_panic() {
        assert!(matches!(parse_fee("abc"), Err(FeeError::NotANumber(_))));
        assert!(matches!(parse_fee(""), Err(FeeError::NotANumber(_))));
        assert!(matches!(parse_fee("n/a"), Err(FeeError::NotANumber(_))));
    }

    #[test]
    fn test_dot_decimal_rejected_not_misread() {
        // A two-digit dot group would have been read as thousands and
        // multiplied the amount by 100.
        assert!(matches!(parse_fee("2500.50"), Err(FeeError::NotANumber(_))));
        assert!(matches!(parse_fee("12.34"), Err(FeeError::NotANumber(_))));
        assert!(matches!(parse_fee("1.2345,00"), Err(FeeError::NotANumber(_))));
        assert!(matches!(parse_fee("750,5.0"), Err(FeeError::NotANumber(_))));
        // Well-formed thousands groups still parse.
        assert_eq!(parse_fee("2.500").unwrap(), dec!(2500));
        assert_eq!(parse_fee("1.234.567,89").unwrap(), dec!(1234567.89));
    }

    #[test]
    fn test_non_positive_rejected() {
        assert_eq!(parse_fee("0,00"), Err(FeeError::NotPositive(dec!(0.00))));
        assert_eq!(parse_fee("-100"), Err(FeeError::NotPositive(dec!(-100))));
    }
}
