use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

use crate::models::UNCATEGORIZED;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,
    #[error("amount is not a number: {0}")]
    NotNumeric(String),
    #[error("amount is negative")]
    Negative,
    #[error("amount has more than 2 decimal places")]
    TooPrecise,
    #[error("amount exceeds the accepted maximum")]
    TooLarge,
}

/// Decimal places kept for an amount (cents).
pub const MAX_AMOUNT_SCALE: u32 = 2;

/// Exclusive upper bound for a single sale, matching the `NUMERIC(14, 2)` column.
pub fn max_amount() -> Decimal {
    Decimal::from(1_000_000_000_000i64)
}

// Digits with at most one decimal separator, after an optional sign
fn is_plain_number(input: &str) -> bool {
    let unsigned = input
        .strip_prefix('-')
        .or_else(|| input.strip_prefix('+'))
        .unwrap_or(input);

    let separators = unsigned.chars().filter(|c| *c == '.').count();
    separators <= 1
        && unsigned.chars().any(|c| c.is_ascii_digit())
        && unsigned.chars().all(|c| c.is_ascii_digit() || c == '.')
}

/// Parses a user-typed amount. Accepts either `,` or `.` as decimal separator.
pub fn parse_amount(input: &str) -> Result<Decimal, AmountError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AmountError::Empty);
    }

    let normalized = trimmed.replace(',', ".");
    if !is_plain_number(&normalized) {
        return Err(AmountError::NotNumeric(trimmed.to_string()));
    }
    let amount = Decimal::from_str(&normalized)
        .map_err(|_| AmountError::NotNumeric(trimmed.to_string()))?;

    if amount < Decimal::ZERO {
        return Err(AmountError::Negative);
    }
    if amount.normalize().scale() > MAX_AMOUNT_SCALE {
        return Err(AmountError::TooPrecise);
    }
    if amount >= max_amount() {
        return Err(AmountError::TooLarge);
    }

    Ok(amount.round_dp(MAX_AMOUNT_SCALE))
}

pub fn normalize_category(input: Option<&str>) -> String {
    match input.map(str::trim) {
        Some(category) if !category.is_empty() => category.to_string(),
        _ => UNCATEGORIZED.to_string(),
    }
}

// Only shape checks; the auth provider owns real address validation
pub fn validate_email(input: &str) -> Result<String, String> {
    let email = input.trim();
    if email.is_empty() {
        return Err("Email is empty".to_string());
    }
    if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
        return Err("Email is not valid".to_string());
    }
    Ok(email.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount_accepts_comma_and_period() {
        assert_eq!(parse_amount("12,50"), Ok(Decimal::new(1250, 2)));
        assert_eq!(parse_amount("12.50"), Ok(Decimal::new(1250, 2)));
        assert_eq!(parse_amount("  7 "), Ok(Decimal::new(7, 0)));
        assert_eq!(parse_amount("0"), Ok(Decimal::ZERO));
    }

    #[test]
    fn test_parse_amount_rejects_bad_input() {
        assert_eq!(parse_amount(""), Err(AmountError::Empty));
        assert_eq!(parse_amount("   "), Err(AmountError::Empty));
        assert_eq!(parse_amount("-1"), Err(AmountError::Negative));
        assert_eq!(parse_amount("-0,01"), Err(AmountError::Negative));
        assert!(matches!(parse_amount("abc"), Err(AmountError::NotNumeric(_))));
        assert!(matches!(parse_amount("1,000.50"), Err(AmountError::NotNumeric(_))));
        assert!(matches!(parse_amount("1_000"), Err(AmountError::NotNumeric(_))));
        assert!(matches!(parse_amount("1e3"), Err(AmountError::NotNumeric(_))));
        assert!(matches!(parse_amount("."), Err(AmountError::NotNumeric(_))));
    }

    #[test]
    fn test_parse_amount_enforces_range_and_precision() {
        assert_eq!(parse_amount("79228162514264337593543950335"), Err(AmountError::TooLarge));
        assert_eq!(parse_amount("1000000000000"), Err(AmountError::TooLarge));
        assert_eq!(parse_amount("999999999999,99"), Ok(Decimal::new(99_999_999_999_999, 2)));
        assert_eq!(parse_amount("0,125"), Err(AmountError::TooPrecise));
        assert_eq!(parse_amount("1.500"), Ok(Decimal::new(150, 2)));
    }

    #[test]
    fn test_normalize_category() {
        assert_eq!(normalize_category(None), UNCATEGORIZED);
        assert_eq!(normalize_category(Some("")), UNCATEGORIZED);
        assert_eq!(normalize_category(Some("   ")), UNCATEGORIZED);
        assert_eq!(normalize_category(Some(" Caffè ")), "Caffè");
    }

    #[test]
    fn test_validate_email() {
        assert_eq!(validate_email(" mario@example.com "), Ok("mario@example.com".to_string()));
        assert!(validate_email("").is_err());
        assert!(validate_email("mario").is_err());
        assert!(validate_email("@example.com").is_err());
    }
}
