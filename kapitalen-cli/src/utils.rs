use rust_decimal::Decimal;
use thiserror::Error;

/// Error returned when a string cannot be parsed as a [`Decimal`].
#[derive(Debug, Error)]
#[error("invalid amount '{input}': {source}")]
pub struct ParseDecimalError {
    input: String,
    #[source]
    source: rust_decimal::Error,
}

/// Normalizes amount input typed in either Norwegian or English style.
///
/// Spaces, non-breaking spaces and underscores are dropped as digit
/// grouping. A lone comma with no dot is the decimal separator
/// (`"1 234,50"`); otherwise commas are grouping (`"1,234.50"`).
fn normalize_decimal_input(s: &str) -> String {
    let compact: String = s
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '\u{a0}' | '\u{202f}' | '_'))
        .collect();

    if !compact.contains('.') && compact.matches(',').count() == 1 {
        compact.replace(',', ".")
    } else {
        compact.replace(',', "")
    }
}

/// Parses a string into a [`Decimal`].
///
/// Empty or whitespace-only input is treated as 0.
pub fn parse_decimal(s: &str) -> Result<Decimal, ParseDecimalError> {
    let normalized = normalize_decimal_input(s);
    if normalized.is_empty() {
        return Ok(Decimal::ZERO);
    }
    normalized.parse().map_err(|e| {
        tracing::error!(input = %s, "invalid decimal: {}", e);
        ParseDecimalError {
            input: s.to_string(),
            source: e,
        }
    })
}

/// clap value parser for amount arguments.
pub fn amount_arg(s: &str) -> Result<Decimal, String> {
    if s.trim().is_empty() {
        return Err("amount cannot be empty".to_string());
    }
    parse_decimal(s).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn parse_decimal_accepts_comma_thousands_separator() {
        assert_eq!(parse_decimal("1,234.56").unwrap(), dec!(1234.56));
        assert_eq!(parse_decimal("1,234,567.89").unwrap(), dec!(1234567.89));
    }

    #[test]
    fn parse_decimal_accepts_norwegian_grouping() {
        assert_eq!(parse_decimal("600 000").unwrap(), dec!(600000));
        assert_eq!(parse_decimal("1 234,50").unwrap(), dec!(1234.50));
        assert_eq!(parse_decimal("12\u{a0}835").unwrap(), dec!(12835));
        assert_eq!(parse_decimal("1_000_000").unwrap(), dec!(1000000));
    }

    #[test]
    fn parse_decimal_trim_whitespace() {
        assert_eq!(parse_decimal("  123.45  ").unwrap(), dec!(123.45));
    }

    #[test]
    fn parse_decimal_empty_treated_as_zero() {
        assert_eq!(parse_decimal("").unwrap(), Decimal::ZERO);
        assert_eq!(parse_decimal("   ").unwrap(), Decimal::ZERO);
    }

    #[test]
    fn parse_decimal_invalid_returns_error() {
        assert!(parse_decimal("abc").is_err());
        assert!(parse_decimal("NaN").is_err());
        assert!(parse_decimal("inf").is_err());
    }

    #[test]
    fn amount_arg_rejects_empty() {
        assert!(amount_arg("").is_err());
        assert_eq!(amount_arg("45 000").unwrap(), dec!(45000));
    }
}
