//! Proration of employment income by work period and stillingsprosent.
//!
//! These figures cover base salary only. Adjustments are summed separately
//! by [`total_adjustments`] and [`adjustments_for_feriepenger`].

use chrono::Datelike;
use rust_decimal::Decimal;

use crate::calculations::common::percent_of;
use crate::models::{Income, WorkPeriod};

/// Months in a full income year.
pub const FULL_YEAR_MONTHS: u32 = 12;

/// Number of calendar months the income is earned in, counted inclusively
/// and clamped to 1..=12.
///
/// Any part of a calendar month counts as a whole month.
///
/// ```
/// use chrono::NaiveDate;
/// use rust_decimal_macros::dec;
/// use kapitalen_core::calculations::months_worked;
/// use kapitalen_core::{Income, WorkPeriod};
///
/// let mut income = Income::new("Sommerjobb", dec!(480000), dec!(100));
/// income.period = WorkPeriod::Custom {
///     start: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
///     end: NaiveDate::from_ymd_opt(2026, 8, 31).unwrap(),
/// };
///
/// assert_eq!(months_worked(&income), 6);
/// ```
pub fn months_worked(income: &Income) -> u32 {
    match income.period {
        WorkPeriod::FullYear => FULL_YEAR_MONTHS,
        WorkPeriod::Custom { start, end } => {
            let months = i64::from(end.year() - start.year()) * 12
                + i64::from(end.month()) - i64::from(start.month())
                + 1;
            // Clamped into 1..=12, so the cast cannot truncate.
            months.clamp(1, i64::from(FULL_YEAR_MONTHS)) as u32
        }
    }
}

/// Full-time-equivalent pay scaled by stillingsprosent.
pub fn full_year_amount(income: &Income) -> Decimal {
    percent_of(income.yearly_amount, income.employee_percentage)
}

/// Base salary actually earned in the year.
pub fn prorated_yearly_amount(income: &Income) -> Decimal {
    full_year_amount(income) * Decimal::from(months_worked(income))
        / Decimal::from(FULL_YEAR_MONTHS)
}

/// Prorated yearly base spread over twelve months.
pub fn monthly_income(income: &Income) -> Decimal {
    prorated_yearly_amount(income) / Decimal::from(FULL_YEAR_MONTHS)
}

pub fn total_adjustments(income: &Income) -> Decimal {
    income.adjustments.iter().map(|a| a.amount).sum()
}

/// Sum of the adjustments that earn holiday pay.
pub fn adjustments_for_feriepenger(income: &Income) -> Decimal {
    income
        .adjustments
        .iter()
        .filter(|a| a.affects_feriepenger)
        .map(|a| a.amount)
        .sum()
}
