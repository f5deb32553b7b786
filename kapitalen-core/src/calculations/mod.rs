//! Tax calculation for Norwegian personal income.
//!
//! [`TaxCalculator`] is the entry point; the free functions below it are
//! the proration and bracket building blocks it is made of.

pub mod calculator;
pub mod common;
pub mod period;
pub mod trinnskatt;
pub mod withholding;

pub use calculator::{CombinedTaxInput, TaxCalculator};
pub use period::{
    FULL_YEAR_MONTHS, adjustments_for_feriepenger, full_year_amount, monthly_income,
    months_worked, prorated_yearly_amount, total_adjustments,
};
pub use trinnskatt::{calculate_trinnskatt, calculate_trinnskatt_with_breakdown};
pub use withholding::{CoarseWithholdingEstimator, WithholdingEstimator};
