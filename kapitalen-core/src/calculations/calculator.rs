//! Norwegian personal income tax calculator.
//!
//! Combines employment income (lønn), self-employment income (ENK) and
//! income adjustments into one [`CombinedTaxBreakdown`].
//!
//! # Calculation Structure
//!
//! | Step | Description |
//! |------|-------------|
//! | 1    | Lønn gross: prorated base salary plus adjustments, all incomes |
//! | 2    | ENK net: freelance gross minus ENK expenses, minimum 0 |
//! | 3    | Trygdeavgift on lønn gross (7.6%) and ENK net (10.8%) |
//! | 4    | Trinnskatt on personinntekt (lønn gross + ENK net) |
//! | 5    | Fellesskatt (22%) on alminnelig inntekt |
//!
//! Minstefradrag and personfradrag reduce only the fellesskatt base in
//! step 5. Trygdeavgift and trinnskatt are always levied on the unreduced
//! amounts.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use kapitalen_core::calculations::{CombinedTaxInput, TaxCalculator};
//! use kapitalen_core::{Income, TaxMethod, TaxYearRules};
//!
//! let rules = TaxYearRules::norway_2026();
//! let incomes = vec![Income::new("Fast jobb", dec!(600000), dec!(100))];
//!
//! let calculator = TaxCalculator::new(&rules);
//! let result = calculator.calculate_combined_tax(&CombinedTaxInput {
//!     incomes: &incomes,
//!     freelance_gross: dec!(0),
//!     enk_expenses: dec!(0),
//!     global_tax_method: TaxMethod::Tabelltrekk,
//!     global_tax_percentage: dec!(35),
//! });
//!
//! assert_eq!(result.trinnskatt, dec!(12835));
//! assert_eq!(result.total_tax, dec!(144182.2));
//! ```

use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::calculations::common::{max, percent_of, rate_percent};
use crate::calculations::period::{
    adjustments_for_feriepenger, full_year_amount, prorated_yearly_amount, total_adjustments,
};
use crate::calculations::trinnskatt::calculate_trinnskatt_with_breakdown;
use crate::calculations::withholding::{CoarseWithholdingEstimator, WithholdingEstimator};
use crate::models::{
    CombinedTaxBreakdown, FerieUker, Income, TaxBreakdown, TaxMethod, TaxYearRules, Withholding,
    WithholdingResult,
};

/// Snapshot of everything the combined calculation reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CombinedTaxInput<'a> {
    pub incomes: &'a [Income],
    /// Sum of ENK invoice amounts, excluding MVA.
    pub freelance_gross: Decimal,
    pub enk_expenses: Decimal,
    /// Overrides each income's own method when estimating skattetrekk.
    pub global_tax_method: TaxMethod,
    /// Used for every income when the global method is prosenttrekk.
    pub global_tax_percentage: Decimal,
}

/// Tax calculator bound to one tax year's rules.
///
/// Holds no state besides the rules and the withholding estimator; every
/// method is a pure function of its arguments.
pub struct TaxCalculator<'a> {
    rules: &'a TaxYearRules,
    estimator: Box<dyn WithholdingEstimator + 'a>,
}

impl fmt::Debug for TaxCalculator<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("TaxCalculator")
            .field("tax_year", &self.rules.tax_year)
            .finish_non_exhaustive()
    }
}

impl<'a> TaxCalculator<'a> {
    /// Creates a calculator that approximates tabelltrekk with the rules'
    /// coarse withholding brackets.
    pub fn new(rules: &'a TaxYearRules) -> Self {
        Self::with_estimator(
            rules,
            Box::new(CoarseWithholdingEstimator::new(&rules.withholding_brackets)),
        )
    }

    pub fn with_estimator(
        rules: &'a TaxYearRules,
        estimator: Box<dyn WithholdingEstimator + 'a>,
    ) -> Self {
        Self { rules, estimator }
    }

    pub fn rules(&self) -> &TaxYearRules {
        self.rules
    }

    pub fn trygdeavgift_lonn(
        &self,
        lonn_gross: Decimal,
    ) -> Decimal {
        lonn_gross * self.rules.trygdeavgift_lonn_rate
    }

    pub fn trygdeavgift_enk(
        &self,
        enk_net: Decimal,
    ) -> Decimal {
        enk_net * self.rules.trygdeavgift_naering_rate
    }

    /// Employment deduction, capped at the yearly maximum.
    ///
    /// The statutory floor is not applied.
    pub fn minstefradrag(
        &self,
        lonn_gross: Decimal,
    ) -> Decimal {
        (lonn_gross * self.rules.minstefradrag_rate).min(self.rules.minstefradrag_max)
    }

    /// Personinntekt minus minstefradrag and personfradrag, floored at 0.
    pub fn alminnelig_inntekt(
        &self,
        total_personinntekt: Decimal,
        minstefradrag: Decimal,
    ) -> Decimal {
        max(
            total_personinntekt - minstefradrag - self.rules.personfradrag,
            Decimal::ZERO,
        )
    }

    pub fn fellesskatt(
        &self,
        alminnelig_inntekt: Decimal,
    ) -> Decimal {
        alminnelig_inntekt * self.rules.fellesskatt_rate
    }

    /// Approximate tabelltrekk on a yearly gross amount.
    pub fn estimated_withholding(
        &self,
        gross_income: Decimal,
    ) -> Decimal {
        self.estimator.estimate(gross_income)
    }

    /// Withholding on one income's full-year-equivalent pay, using that
    /// income's own method.
    pub fn calculate_withholding(
        &self,
        income: &Income,
    ) -> WithholdingResult {
        let gross_income = full_year_amount(income);

        match income.withholding {
            Withholding::Prosenttrekk { percent } => WithholdingResult {
                gross_income,
                withheld: percent_of(gross_income, percent),
                tax_percent: percent,
            },
            Withholding::Tabelltrekk { .. } => {
                let withheld = self.estimated_withholding(gross_income);
                WithholdingResult {
                    gross_income,
                    withheld,
                    tax_percent: rate_percent(withheld, gross_income),
                }
            }
        }
    }

    pub fn feriepenger_rate(
        &self,
        ferie_uker: FerieUker,
        is_over_60: bool,
    ) -> Decimal {
        self.rules.feriepenger_rates.rate(ferie_uker, is_over_60)
    }

    /// Holiday pay on the prorated base plus eligible adjustments.
    pub fn calculate_feriepenger(
        &self,
        income: &Income,
    ) -> Decimal {
        let base = prorated_yearly_amount(income) + adjustments_for_feriepenger(income);
        base * self.feriepenger_rate(income.ferie_uker, income.is_over_60)
    }

    /// Simplified single-income preview.
    ///
    /// The apparent tax is the withholding on the full-year-equivalent
    /// pay, reported entirely as fellesskatt. Use
    /// [`calculate_combined_tax`](Self::calculate_combined_tax) for the
    /// actual liability.
    pub fn calculate_tax(
        &self,
        income: &Income,
    ) -> TaxBreakdown {
        let withholding = self.calculate_withholding(income);
        let gross_income = withholding.gross_income;
        let total_tax = withholding.withheld;

        TaxBreakdown {
            gross_income,
            trygdeavgift: Decimal::ZERO,
            trinnskatt: Decimal::ZERO,
            fellesskatt: total_tax,
            total_tax,
            net_income: gross_income - total_tax,
            effective_rate: withholding.tax_percent,
        }
    }

    /// Authoritative tax liability across all income sources.
    pub fn calculate_combined_tax(
        &self,
        input: &CombinedTaxInput<'_>,
    ) -> CombinedTaxBreakdown {
        // Step 1: lønn gross
        let lonn_gross: Decimal = input
            .incomes
            .iter()
            .map(|i| prorated_yearly_amount(i) + total_adjustments(i))
            .sum();

        // Step 2: ENK net
        let enk_gross = input.freelance_gross;
        let enk_expenses = input.enk_expenses;
        let enk_net = max(enk_gross - enk_expenses, Decimal::ZERO);

        // Step 3: trygdeavgift on unreduced bases
        let trygdeavgift_lonn = self.trygdeavgift_lonn(lonn_gross);
        let trygdeavgift_enk = self.trygdeavgift_enk(enk_net);

        // Step 4: trinnskatt on personinntekt
        let total_personinntekt = lonn_gross + enk_net;
        let trinnskatt =
            calculate_trinnskatt_with_breakdown(&self.rules.trinnskatt_brackets, total_personinntekt);

        // Step 5: fellesskatt
        let minstefradrag = self.minstefradrag(lonn_gross);
        let alminnelig_inntekt = self.alminnelig_inntekt(total_personinntekt, minstefradrag);
        let fellesskatt = self.fellesskatt(alminnelig_inntekt);

        let total_tax = trygdeavgift_lonn + trygdeavgift_enk + trinnskatt.total + fellesskatt;

        let skattetrekk: Decimal = input
            .incomes
            .iter()
            .map(|i| self.skattetrekk(i, input.global_tax_method, input.global_tax_percentage))
            .sum();

        let total_gross = lonn_gross + enk_gross - enk_expenses;
        let total_feriepenger: Decimal = input
            .incomes
            .iter()
            .map(|i| self.calculate_feriepenger(i))
            .sum();

        CombinedTaxBreakdown {
            lonn_gross,
            minstefradrag,
            enk_gross,
            enk_expenses,
            enk_net,
            total_personinntekt,
            trygdeavgift_lonn,
            trygdeavgift_enk,
            trinnskatt: trinnskatt.total,
            trinnskatt_breakdown: trinnskatt.breakdown,
            personfradrag: self.rules.personfradrag,
            alminnelig_inntekt,
            fellesskatt,
            total_tax,
            skatt_fra_lonn: trygdeavgift_lonn,
            skatt_fra_oppdrag: trygdeavgift_enk,
            skatt_fra_kombinert: trinnskatt.total + fellesskatt,
            skattetrekk,
            difference: skattetrekk - total_tax,
            total_feriepenger,
            net_income: total_gross - total_tax,
            effective_rate: rate_percent(total_tax, total_gross),
        }
    }

    /// Withholding on one income's prorated base under the global method.
    fn skattetrekk(
        &self,
        income: &Income,
        global_method: TaxMethod,
        global_percentage: Decimal,
    ) -> Decimal {
        let prorated = prorated_yearly_amount(income);

        match (global_method, income.withholding) {
            (TaxMethod::Prosenttrekk, _) => percent_of(prorated, global_percentage),
            (
                TaxMethod::Tabelltrekk,
                Withholding::Tabelltrekk {
                    reported_percent: Some(percent),
                },
            ) if percent > Decimal::ZERO => percent_of(prorated, percent),
            (TaxMethod::Tabelltrekk, _) => self.estimated_withholding(prorated),
        }
    }
}
