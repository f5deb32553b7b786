//! Tabelltrekk estimation.
//!
//! The real withholding tables are not modelled. [`CoarseWithholdingEstimator`]
//! approximates them with a handful of flat-rate brackets, and the
//! [`WithholdingEstimator`] trait lets an exact table lookup replace it
//! without touching the calculator.

use rust_decimal::Decimal;

use crate::models::WithholdingBracket;

/// Estimates the tax an employer withholds on a yearly gross amount.
pub trait WithholdingEstimator: Send + Sync {
    fn estimate(
        &self,
        gross_income: Decimal,
    ) -> Decimal;
}

/// Highest-threshold-wins bracket lookup.
#[derive(Debug, Clone, Copy)]
pub struct CoarseWithholdingEstimator<'a> {
    brackets: &'a [WithholdingBracket],
}

impl<'a> CoarseWithholdingEstimator<'a> {
    /// `brackets` must be sorted ascending by threshold.
    pub fn new(brackets: &'a [WithholdingBracket]) -> Self {
        Self { brackets }
    }

    /// Rate for `gross_income`: the highest bracket whose threshold is
    /// strictly exceeded, else the lowest bracket's rate.
    pub fn rate_for(
        &self,
        gross_income: Decimal,
    ) -> Decimal {
        self.brackets
            .iter()
            .rev()
            .find(|b| gross_income > b.threshold)
            .or_else(|| self.brackets.first())
            .map_or(Decimal::ZERO, |b| b.rate)
    }
}

impl WithholdingEstimator for CoarseWithholdingEstimator<'_> {
    fn estimate(
        &self,
        gross_income: Decimal,
    ) -> Decimal {
        gross_income * self.rate_for(gross_income)
    }
}
