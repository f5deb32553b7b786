use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Tax levied within a single trinnskatt bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrinnskattBracketTax {
    /// Index into the schedule (1-based; bracket 0 is never taxed).
    pub bracket: usize,
    pub taxable_amount: Decimal,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrinnskattResult {
    pub total: Decimal,
    /// Only brackets with a nonzero tax amount are listed.
    pub breakdown: Vec<TrinnskattBracketTax>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithholdingResult {
    pub gross_income: Decimal,
    pub withheld: Decimal,
    /// Rate used, as a percentage.
    pub tax_percent: Decimal,
}

/// Simplified per-income preview.
///
/// The whole apparent tax is reported as `fellesskatt`; `trygdeavgift` and
/// `trinnskatt` are always zero here. [`CombinedTaxBreakdown`] is the
/// authoritative decomposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBreakdown {
    pub gross_income: Decimal,
    pub trygdeavgift: Decimal,
    pub trinnskatt: Decimal,
    pub fellesskatt: Decimal,
    pub total_tax: Decimal,
    pub net_income: Decimal,
    pub effective_rate: Decimal,
}

/// Aggregate tax liability across all income sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedTaxBreakdown {
    /// Prorated base salary plus adjustments, before any deduction.
    pub lonn_gross: Decimal,
    /// Applies to the fellesskatt base only.
    pub minstefradrag: Decimal,
    pub enk_gross: Decimal,
    pub enk_expenses: Decimal,
    pub enk_net: Decimal,
    /// Gross lønn plus net ENK; the trinnskatt base.
    pub total_personinntekt: Decimal,

    pub trygdeavgift_lonn: Decimal,
    pub trygdeavgift_enk: Decimal,
    pub trinnskatt: Decimal,
    pub trinnskatt_breakdown: Vec<TrinnskattBracketTax>,
    pub personfradrag: Decimal,
    pub alminnelig_inntekt: Decimal,
    pub fellesskatt: Decimal,
    pub total_tax: Decimal,

    pub skatt_fra_lonn: Decimal,
    pub skatt_fra_oppdrag: Decimal,
    pub skatt_fra_kombinert: Decimal,

    /// Estimated tax withheld across all employers.
    pub skattetrekk: Decimal,
    /// Positive means a refund, negative means tax owed.
    pub difference: Decimal,

    /// Informational; not part of any tax total.
    pub total_feriepenger: Decimal,

    pub net_income: Decimal,
    pub effective_rate: Decimal,
}
