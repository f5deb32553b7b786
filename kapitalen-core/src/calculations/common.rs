//! Common utility functions for tax calculations.
//!
//! Rounding helpers and percentage arithmetic shared by the calculator,
//! the aggregator and legacy record migration.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a decimal value to øre (two places) using half-up rounding.
///
/// Values at exactly 0.005 are rounded away from zero.
///
/// ```
/// use rust_decimal_macros::dec;
/// use kapitalen_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(83.333)), dec!(83.33));
/// assert_eq!(round_half_up(dec!(83.335)), dec!(83.34));
/// assert_eq!(round_half_up(dec!(-83.335)), dec!(-83.34)); // Away from zero
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds to whole kroner, midpoints away from zero.
///
/// Used for per-bracket trinnskatt amounts.
///
/// ```
/// use rust_decimal_macros::dec;
/// use kapitalen_core::calculations::common::round_whole;
///
/// assert_eq!(round_whole(dec!(1567.4)), dec!(1567));
/// assert_eq!(round_whole(dec!(1567.5)), dec!(1568));
/// ```
pub fn round_whole(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Returns the maximum of two decimal values.
///
/// ```
/// use rust_decimal_macros::dec;
/// use kapitalen_core::calculations::common::max;
///
/// assert_eq!(max(dec!(-5000), dec!(0)), dec!(0));
/// assert_eq!(max(dec!(389760), dec!(0)), dec!(389760));
/// ```
pub fn max(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    if a > b { a } else { b }
}

/// Applies a 0-100 percentage to `amount`.
pub fn percent_of(
    amount: Decimal,
    percent: Decimal,
) -> Decimal {
    amount * percent / Decimal::ONE_HUNDRED
}

/// `numerator / denominator × 100`, or zero when the denominator is not
/// positive.
pub fn rate_percent(
    numerator: Decimal,
    denominator: Decimal,
) -> Decimal {
    if denominator > Decimal::ZERO {
        numerator / denominator * Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    }
}
