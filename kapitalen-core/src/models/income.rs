use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type IncomeId = Uuid;
pub type AdjustmentId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxMethod {
    /// Withholding from the official tax table, reported by the employer.
    #[default]
    Tabelltrekk,
    /// Flat withholding percentage chosen by the taxpayer.
    Prosenttrekk,
}

impl TaxMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tabelltrekk => "tabelltrekk",
            Self::Prosenttrekk => "prosenttrekk",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "tabelltrekk" => Some(Self::Tabelltrekk),
            "prosenttrekk" => Some(Self::Prosenttrekk),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PeriodType {
    #[default]
    FullYear,
    Custom,
}

impl PeriodType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FullYear => "fullYear",
            Self::Custom => "custom",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "fullYear" => Some(Self::FullYear),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }
}

/// Vacation-week entitlement, which selects the feriepenger rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FerieUker {
    #[serde(rename = "4+1")]
    FourPlusOne,
    #[default]
    #[serde(rename = "5")]
    Five,
}

impl FerieUker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FourPlusOne => "4+1",
            Self::Five => "5",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "4+1" => Some(Self::FourPlusOne),
            "5" => Some(Self::Five),
            _ => None,
        }
    }
}

/// When during the year the income is earned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WorkPeriod {
    #[default]
    FullYear,
    Custom { start: NaiveDate, end: NaiveDate },
}

impl WorkPeriod {
    pub fn period_type(&self) -> PeriodType {
        match self {
            Self::FullYear => PeriodType::FullYear,
            Self::Custom { .. } => PeriodType::Custom,
        }
    }
}

/// How tax is withheld from this income.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum Withholding {
    Prosenttrekk {
        percent: Decimal,
    },
    Tabelltrekk {
        /// Trekkprosent from the payslip, when known.
        reported_percent: Option<Decimal>,
    },
}

impl Default for Withholding {
    fn default() -> Self {
        Self::Tabelltrekk {
            reported_percent: None,
        }
    }
}

impl Withholding {
    pub fn method(&self) -> TaxMethod {
        match self {
            Self::Prosenttrekk { .. } => TaxMethod::Prosenttrekk,
            Self::Tabelltrekk { .. } => TaxMethod::Tabelltrekk,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentType {
    Bonus,
    Overtid,
    Annet,
}

impl AdjustmentType {
    pub const ALL: [AdjustmentType; 3] = [Self::Bonus, Self::Overtid, Self::Annet];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bonus => "bonus",
            Self::Overtid => "overtid",
            Self::Annet => "annet",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "bonus" => Some(Self::Bonus),
            "overtid" => Some(Self::Overtid),
            "annet" => Some(Self::Annet),
            _ => None,
        }
    }

    /// Bonus and overtime earn holiday pay unless stated otherwise.
    pub fn default_affects_feriepenger(&self) -> bool {
        !matches!(self, Self::Annet)
    }
}

/// One-off or monthly addition to an income.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeAdjustment {
    pub id: AdjustmentId,
    pub kind: AdjustmentType,
    pub amount: Decimal,
    /// Calendar month, 1-12.
    pub month: u32,
    pub description: Option<String>,
    pub affects_feriepenger: bool,
}

/// Salaried employment record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Income {
    pub id: IncomeId,
    pub name: String,
    /// Nominal full-time annual pay (årslønn).
    pub yearly_amount: Decimal,
    /// Stillingsprosent, 0-100.
    pub employee_percentage: Decimal,
    pub withholding: Withholding,
    pub period: WorkPeriod,
    pub ferie_uker: FerieUker,
    pub is_over_60: bool,
    pub adjustments: Vec<IncomeAdjustment>,
}

impl Income {
    /// Creates a full-year tabelltrekk income with five vacation weeks.
    pub fn new(
        name: impl Into<String>,
        yearly_amount: Decimal,
        employee_percentage: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            yearly_amount,
            employee_percentage,
            withholding: Withholding::default(),
            period: WorkPeriod::default(),
            ferie_uker: FerieUker::default(),
            is_over_60: false,
            adjustments: Vec::new(),
        }
    }

    pub fn tax_method(&self) -> TaxMethod {
        self.withholding.method()
    }

    pub fn adjustment(
        &self,
        id: AdjustmentId,
    ) -> Option<&IncomeAdjustment> {
        self.adjustments.iter().find(|a| a.id == id)
    }
}
