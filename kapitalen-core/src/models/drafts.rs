//! Unvalidated user input for each entity.
//!
//! Drafts keep dates and enum codes as the raw strings the user typed so
//! the validation layer can reject them with a readable reason before an
//! entity is ever constructed.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::expense::{Frequency, repeat_monthly, spread_yearly};
use super::income::{FerieUker, PeriodType, TaxMethod};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeDraft {
    pub name: String,
    pub yearly_amount: Decimal,
    pub employee_percentage: Decimal,
    pub tax_method: TaxMethod,
    /// Only meaningful for prosenttrekk.
    pub custom_tax_percentage: Option<Decimal>,
    /// Only meaningful for tabelltrekk.
    pub trekkprosent: Option<Decimal>,
    pub period_type: PeriodType,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub ferie_uker: FerieUker,
    pub is_over_60: bool,
}

impl Default for IncomeDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            yearly_amount: Decimal::ZERO,
            employee_percentage: Decimal::ONE_HUNDRED,
            tax_method: TaxMethod::Tabelltrekk,
            custom_tax_percentage: None,
            trekkprosent: None,
            period_type: PeriodType::FullYear,
            start_date: None,
            end_date: None,
            ferie_uker: FerieUker::Five,
            is_over_60: false,
        }
    }
}

impl IncomeDraft {
    pub fn new(
        name: impl Into<String>,
        yearly_amount: Decimal,
        employee_percentage: Decimal,
    ) -> Self {
        Self {
            name: name.into(),
            yearly_amount,
            employee_percentage,
            ..Self::default()
        }
    }

    pub fn custom_period(
        mut self,
        start_date: impl Into<String>,
        end_date: impl Into<String>,
    ) -> Self {
        self.period_type = PeriodType::Custom;
        self.start_date = Some(start_date.into());
        self.end_date = Some(end_date.into());
        self
    }

    pub fn prosenttrekk(
        mut self,
        percent: Option<Decimal>,
    ) -> Self {
        self.tax_method = TaxMethod::Prosenttrekk;
        self.custom_tax_percentage = percent;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentDraft {
    /// One of `bonus`, `overtid`, `annet`.
    pub kind: String,
    pub amount: Decimal,
    pub month: u32,
    pub description: Option<String>,
    /// `None` falls back to the type's default (or, on update, the
    /// previous value).
    pub affects_feriepenger: Option<bool>,
}

impl AdjustmentDraft {
    pub fn new(
        kind: impl Into<String>,
        amount: Decimal,
        month: u32,
    ) -> Self {
        Self {
            kind: kind.into(),
            amount,
            month,
            description: None,
            affects_feriepenger: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseDraft {
    pub name: String,
    /// One of the [`ExpenseCategory`](super::ExpenseCategory) codes.
    pub category: String,
    pub monthly_amounts: Vec<Decimal>,
    pub frequency: Frequency,
}

impl ExpenseDraft {
    /// Same amount every month.
    pub fn monthly(
        name: impl Into<String>,
        category: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            monthly_amounts: repeat_monthly(amount).to_vec(),
            frequency: Frequency::Monthly,
        }
    }

    /// A yearly amount spread evenly over twelve months.
    pub fn yearly(
        name: impl Into<String>,
        category: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            monthly_amounts: spread_yearly(amount).to_vec(),
            frequency: Frequency::Yearly,
        }
    }

    pub fn with_amounts(
        name: impl Into<String>,
        category: impl Into<String>,
        monthly_amounts: Vec<Decimal>,
    ) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            monthly_amounts,
            frequency: Frequency::Monthly,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreelanceDraft {
    pub client: String,
    pub description: String,
    pub amount: Decimal,
}

impl FreelanceDraft {
    pub fn new(
        client: impl Into<String>,
        description: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        Self {
            client: client.into(),
            description: description.into(),
            amount,
        }
    }
}
