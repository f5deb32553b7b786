use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calculations::common::round_half_up;

pub type ExpenseId = Uuid;

/// Number of monthly slots carried by every expense.
pub const MONTHS_PER_YEAR: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExpenseCategory {
    FasteUtgifter,
    Abonnement,
    MatInne,
    MatUte,
    Diverse,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 5] = [
        Self::FasteUtgifter,
        Self::Abonnement,
        Self::MatInne,
        Self::MatUte,
        Self::Diverse,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FasteUtgifter => "faste-utgifter",
            Self::Abonnement => "abonnement",
            Self::MatInne => "mat-inne",
            Self::MatUte => "mat-ute",
            Self::Diverse => "diverse",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "faste-utgifter" => Some(Self::FasteUtgifter),
            "abonnement" => Some(Self::Abonnement),
            "mat-inne" => Some(Self::MatInne),
            "mat-ute" => Some(Self::MatUte),
            "diverse" => Some(Self::Diverse),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::FasteUtgifter => "Faste utgifter",
            Self::Abonnement => "Abonnement",
            Self::MatInne => "Mat - Inne",
            Self::MatUte => "Mat - Ute",
            Self::Diverse => "Diverse",
        }
    }
}

/// How the user originally entered the amounts. Informational only; the
/// twelve monthly figures are always authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    #[default]
    Monthly,
    Yearly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "monthly" => Some(Self::Monthly),
            "yearly" => Some(Self::Yearly),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub name: String,
    pub category: ExpenseCategory,
    /// Index 0 is January.
    pub monthly_amounts: [Decimal; MONTHS_PER_YEAR],
    pub frequency: Frequency,
}

impl Expense {
    pub fn yearly_total(&self) -> Decimal {
        self.monthly_amounts.iter().copied().sum()
    }

    pub fn monthly_average(&self) -> Decimal {
        self.yearly_total() / Decimal::from(MONTHS_PER_YEAR)
    }

    /// True when not every month carries the same amount.
    pub fn varies(&self) -> bool {
        let first = self.monthly_amounts[0];
        self.monthly_amounts.iter().any(|amount| *amount != first)
    }
}

/// Spreads a yearly amount evenly over twelve months, rounded to øre.
pub fn spread_yearly(amount: Decimal) -> [Decimal; MONTHS_PER_YEAR] {
    [round_half_up(amount / Decimal::from(MONTHS_PER_YEAR)); MONTHS_PER_YEAR]
}

/// Repeats a monthly amount across all twelve months.
pub fn repeat_monthly(amount: Decimal) -> [Decimal; MONTHS_PER_YEAR] {
    [amount; MONTHS_PER_YEAR]
}
