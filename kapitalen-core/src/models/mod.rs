mod breakdown;
mod drafts;
mod expense;
mod freelance;
mod income;
mod tax_year_rules;

pub use breakdown::{
    CombinedTaxBreakdown, TaxBreakdown, TrinnskattBracketTax, TrinnskattResult, WithholdingResult,
};
pub use drafts::{AdjustmentDraft, ExpenseDraft, FreelanceDraft, IncomeDraft};
pub use expense::{
    Expense, ExpenseCategory, ExpenseId, Frequency, MONTHS_PER_YEAR, repeat_monthly, spread_yearly,
};
pub use freelance::{FreelanceId, FreelanceIncome};
pub use income::{
    AdjustmentId, AdjustmentType, FerieUker, Income, IncomeAdjustment, IncomeId, PeriodType,
    TaxMethod, Withholding, WorkPeriod,
};
pub use tax_year_rules::{
    FeriepengerRate, FeriepengerRates, RulesError, TaxYearRules, TrinnskattBracket,
    WithholdingBracket,
};
