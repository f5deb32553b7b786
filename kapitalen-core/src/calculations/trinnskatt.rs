//! Progressive bracket tax (trinnskatt) on personinntekt.
//!
//! Each bracket taxes only the slice of income between its threshold and
//! the next one. Bracket 0 is the zero-rate baseline and is never taxed.
//! Amounts are rounded to whole kroner per bracket, not on the total.

use rust_decimal::Decimal;

use crate::calculations::common::round_whole;
use crate::models::{TrinnskattBracket, TrinnskattBracketTax, TrinnskattResult};

/// Computes trinnskatt on `income` with a per-bracket breakdown.
///
/// Only brackets with a nonzero rounded amount appear in the breakdown.
///
/// ```
/// use rust_decimal_macros::dec;
/// use kapitalen_core::calculations::calculate_trinnskatt_with_breakdown;
/// use kapitalen_core::TaxYearRules;
///
/// let rules = TaxYearRules::norway_2026();
/// let result = calculate_trinnskatt_with_breakdown(&rules.trinnskatt_brackets, dec!(600000));
///
/// assert_eq!(result.total, dec!(12835));
/// assert_eq!(result.breakdown.len(), 2);
/// ```
pub fn calculate_trinnskatt_with_breakdown(
    brackets: &[TrinnskattBracket],
    income: Decimal,
) -> TrinnskattResult {
    let mut result = TrinnskattResult::default();

    for (index, bracket) in brackets.iter().enumerate().skip(1) {
        let lower = bracket.threshold;
        if income <= lower {
            break;
        }

        let taxable_amount = match brackets.get(index + 1) {
            Some(next) => income.min(next.threshold) - lower,
            None => income - lower,
        };
        let amount = round_whole(taxable_amount * bracket.rate);

        result.total += amount;
        if !amount.is_zero() {
            result.breakdown.push(TrinnskattBracketTax {
                bracket: index,
                taxable_amount,
                amount,
            });
        }
    }

    result
}

/// Total trinnskatt on `income`.
pub fn calculate_trinnskatt(
    brackets: &[TrinnskattBracket],
    income: Decimal,
) -> Decimal {
    calculate_trinnskatt_with_breakdown(brackets, income).total
}
