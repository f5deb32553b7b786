//! Stored record shapes and the schema upgrade applied at load time.
//!
//! Records are persisted in a flat camelCase JSON shape where fields that
//! only apply to one variant are optional. Older versions of that shape
//! lacked several fields entirely; every `upgrade_*` function accepts any
//! historical version and fills the gaps with defaults.
//!
//! | Version | Change |
//! |---------|--------|
//! | 1       | Single `amount` + `frequency` expenses, old category codes, no work period, vacation weeks or adjustments on incomes |
//! | 2       | Twelve `monthlyAmounts` per expense, current categories, full income shape |

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::models::{
    AdjustmentType, Expense, ExpenseCategory, FerieUker, Frequency, FreelanceIncome, Income,
    IncomeAdjustment, MONTHS_PER_YEAR, TaxMethod, TaxYearRules, Withholding, WorkPeriod,
    repeat_monthly, spread_yearly,
};
use crate::validation::{clamp_amount, clamp_percentage, validate_date};

/// Schema version written by this build.
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

/// Version assumed when none has been stored.
pub const LEGACY_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAdjustment {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub amount: Decimal,
    pub month: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affects_feriepenger: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredIncome {
    pub id: String,
    pub name: String,
    pub yearly_amount: Decimal,
    #[serde(default)]
    pub employee_percentage: Option<Decimal>,
    #[serde(default)]
    pub tax_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_tax_percentage: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trekkprosent: Option<Decimal>,
    #[serde(default)]
    pub period_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default)]
    pub ferie_uker: Option<String>,
    #[serde(default, rename = "isOver60")]
    pub is_over_60: Option<bool>,
    #[serde(default)]
    pub adjustments: Option<Vec<StoredAdjustment>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFreelance {
    pub id: String,
    pub client: String,
    #[serde(default)]
    pub description: String,
    pub amount: Decimal,
    #[serde(default)]
    pub mva: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredExpense {
    pub id: String,
    pub name: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_amounts: Option<Vec<Decimal>>,
    /// Version 1 only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub frequency: Option<String>,
}

impl From<&IncomeAdjustment> for StoredAdjustment {
    fn from(adjustment: &IncomeAdjustment) -> Self {
        Self {
            id: adjustment.id.to_string(),
            kind: adjustment.kind.as_str().to_string(),
            amount: adjustment.amount,
            month: adjustment.month,
            description: adjustment.description.clone(),
            affects_feriepenger: Some(adjustment.affects_feriepenger),
        }
    }
}

impl From<&Income> for StoredIncome {
    fn from(income: &Income) -> Self {
        let (custom_tax_percentage, trekkprosent) = match income.withholding {
            Withholding::Prosenttrekk { percent } => (Some(percent), None),
            Withholding::Tabelltrekk { reported_percent } => (None, reported_percent),
        };
        let (start_date, end_date) = match income.period {
            WorkPeriod::FullYear => (None, None),
            WorkPeriod::Custom { start, end } => (
                Some(start.format("%Y-%m-%d").to_string()),
                Some(end.format("%Y-%m-%d").to_string()),
            ),
        };

        Self {
            id: income.id.to_string(),
            name: income.name.clone(),
            yearly_amount: income.yearly_amount,
            employee_percentage: Some(income.employee_percentage),
            tax_method: Some(income.tax_method().as_str().to_string()),
            custom_tax_percentage,
            trekkprosent,
            period_type: Some(income.period.period_type().as_str().to_string()),
            start_date,
            end_date,
            ferie_uker: Some(income.ferie_uker.as_str().to_string()),
            is_over_60: Some(income.is_over_60),
            adjustments: Some(income.adjustments.iter().map(StoredAdjustment::from).collect()),
        }
    }
}

impl From<&FreelanceIncome> for StoredFreelance {
    fn from(invoice: &FreelanceIncome) -> Self {
        Self {
            id: invoice.id.to_string(),
            client: invoice.client.clone(),
            description: invoice.description.clone(),
            amount: invoice.amount,
            mva: Some(invoice.mva),
        }
    }
}

impl From<&Expense> for StoredExpense {
    fn from(expense: &Expense) -> Self {
        Self {
            id: expense.id.to_string(),
            name: expense.name.clone(),
            category: expense.category.as_str().to_string(),
            monthly_amounts: Some(expense.monthly_amounts.to_vec()),
            amount: None,
            frequency: Some(expense.frequency.as_str().to_string()),
        }
    }
}

/// Parses a stored id, minting a fresh one when it is not a UUID.
fn upgrade_id(
    record: &'static str,
    id: &str,
) -> Uuid {
    Uuid::parse_str(id).unwrap_or_else(|_| {
        let fresh = Uuid::new_v4();
        warn!(record, old_id = id, new_id = %fresh, "stored id is not a UUID; reassigned");
        fresh
    })
}

pub fn upgrade_adjustment(stored: StoredAdjustment) -> IncomeAdjustment {
    let kind = AdjustmentType::parse(&stored.kind).unwrap_or_else(|| {
        warn!(kind = %stored.kind, "unknown adjustment type; stored as annet");
        AdjustmentType::Annet
    });

    IncomeAdjustment {
        id: upgrade_id("adjustment", &stored.id),
        kind,
        amount: clamp_amount(stored.amount),
        month: stored.month.clamp(1, 12),
        description: stored.description,
        affects_feriepenger: stored
            .affects_feriepenger
            .unwrap_or_else(|| kind.default_affects_feriepenger()),
    }
}

pub fn upgrade_income(
    stored: StoredIncome,
    rules: &TaxYearRules,
) -> Income {
    let tax_method = stored
        .tax_method
        .as_deref()
        .and_then(TaxMethod::parse)
        .unwrap_or_default();
    let withholding = match tax_method {
        TaxMethod::Prosenttrekk => Withholding::Prosenttrekk {
            percent: clamp_percentage(
                stored
                    .custom_tax_percentage
                    .unwrap_or(rules.default_tax_percentage),
            ),
        },
        TaxMethod::Tabelltrekk => Withholding::Tabelltrekk {
            reported_percent: stored.trekkprosent.map(clamp_percentage),
        },
    };

    let period = match stored.period_type.as_deref() {
        Some("custom") => custom_period(&stored),
        _ => WorkPeriod::FullYear,
    };

    Income {
        id: upgrade_id("income", &stored.id),
        name: stored.name,
        yearly_amount: clamp_amount(stored.yearly_amount),
        employee_percentage: clamp_percentage(
            stored
                .employee_percentage
                .unwrap_or(rules.default_employee_percentage),
        ),
        withholding,
        period,
        ferie_uker: stored
            .ferie_uker
            .as_deref()
            .and_then(FerieUker::parse)
            .unwrap_or_default(),
        is_over_60: stored.is_over_60.unwrap_or(false),
        adjustments: stored
            .adjustments
            .unwrap_or_default()
            .into_iter()
            .map(upgrade_adjustment)
            .collect(),
    }
}

/// A custom period with missing or unparseable dates counts as a full year.
fn custom_period(stored: &StoredIncome) -> WorkPeriod {
    let start = stored.start_date.as_deref().map(validate_date);
    let end = stored.end_date.as_deref().map(validate_date);

    match (start, end) {
        (Some(Ok(start)), Some(Ok(end))) => WorkPeriod::Custom { start, end },
        _ => {
            warn!(income = %stored.name, "custom period without valid dates; using full year");
            WorkPeriod::FullYear
        }
    }
}

/// A missing MVA is recomputed from `mva_rate`.
pub fn upgrade_freelance(
    stored: StoredFreelance,
    mva_rate: Decimal,
) -> FreelanceIncome {
    let amount = clamp_amount(stored.amount);
    FreelanceIncome {
        id: upgrade_id("freelance", &stored.id),
        mva: clamp_amount(stored.mva.unwrap_or(amount * mva_rate)),
        client: stored.client,
        description: stored.description,
        amount,
    }
}

/// Maps current and version 1 category codes. Unknown codes become
/// [`ExpenseCategory::Diverse`].
pub fn upgrade_category(code: &str) -> ExpenseCategory {
    match code {
        "bolig" | "transport" | "forsikring" => ExpenseCategory::FasteUtgifter,
        "mat" => ExpenseCategory::MatInne,
        "annet" => ExpenseCategory::Diverse,
        other => ExpenseCategory::parse(other).unwrap_or(ExpenseCategory::Diverse),
    }
}

pub fn upgrade_expense(stored: StoredExpense) -> Expense {
    let frequency = stored
        .frequency
        .as_deref()
        .and_then(Frequency::parse)
        .unwrap_or_default();

    let monthly_amounts = match stored
        .monthly_amounts
        .as_deref()
        .map(<[Decimal; MONTHS_PER_YEAR]>::try_from)
    {
        Some(Ok(amounts)) => amounts.map(clamp_amount),
        _ => {
            let amount = clamp_amount(stored.amount.unwrap_or(Decimal::ZERO));
            match frequency {
                Frequency::Yearly => spread_yearly(amount),
                Frequency::Monthly => repeat_monthly(amount),
            }
        }
    };

    Expense {
        id: upgrade_id("expense", &stored.id),
        name: stored.name,
        category: upgrade_category(&stored.category),
        monthly_amounts,
        frequency,
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::validation::MAX_AMOUNT;

    fn rules() -> TaxYearRules {
        TaxYearRules::norway_2026()
    }

    // =========================================================================
    // income upgrade tests
    // =========================================================================

    #[test]
    fn legacy_income_gets_defaults() {
        let json = r#"{
            "id": "0b7c6f0e-3f2a-4c55-9c1e-86a4d1b1e2a1",
            "name": "Fast jobb",
            "yearlyAmount": 600000,
            "employeePercentage": 100,
            "taxMethod": "tabelltrekk"
        }"#;
        let stored: StoredIncome = serde_json::from_str(json).unwrap();

        let income = upgrade_income(stored, &rules());

        assert_eq!(
            income.id,
            Uuid::parse_str("0b7c6f0e-3f2a-4c55-9c1e-86a4d1b1e2a1").unwrap()
        );
        assert_eq!(income.yearly_amount, dec!(600000));
        assert_eq!(income.period, WorkPeriod::FullYear);
        assert_eq!(income.ferie_uker, FerieUker::Five);
        assert!(!income.is_over_60);
        assert!(income.adjustments.is_empty());
    }

    #[test]
    fn legacy_prosenttrekk_without_percentage_uses_default() {
        let json = r#"{"id": "a", "name": "Jobb", "yearlyAmount": 500000, "taxMethod": "prosenttrekk"}"#;
        let stored: StoredIncome = serde_json::from_str(json).unwrap();

        let income = upgrade_income(stored, &rules());

        assert_eq!(income.withholding, Withholding::Prosenttrekk { percent: dec!(35) });
        assert_eq!(income.employee_percentage, dec!(100));
    }

    #[test]
    fn non_uuid_id_is_reassigned() {
        let json = r#"{"id": "1712345678901", "name": "Jobb", "yearlyAmount": 1}"#;
        let stored: StoredIncome = serde_json::from_str(json).unwrap();

        let income = upgrade_income(stored, &rules());

        assert_eq!(income.id.get_version_num(), 4);
    }

    #[test]
    fn custom_period_with_bad_dates_degrades() {
        let json = r#"{
            "id": "a", "name": "Jobb", "yearlyAmount": 1,
            "periodType": "custom", "startDate": "2026-03-01", "endDate": "31.08.2026"
        }"#;
        let stored: StoredIncome = serde_json::from_str(json).unwrap();

        assert_eq!(upgrade_income(stored, &rules()).period, WorkPeriod::FullYear);
    }

    #[test]
    fn custom_period_is_kept() {
        let json = r#"{
            "id": "a", "name": "Jobb", "yearlyAmount": 1,
            "periodType": "custom", "startDate": "2026-03-01", "endDate": "2026-08-31"
        }"#;
        let stored: StoredIncome = serde_json::from_str(json).unwrap();

        assert_eq!(
            upgrade_income(stored, &rules()).period,
            WorkPeriod::Custom {
                start: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
                end: NaiveDate::from_ymd_opt(2026, 8, 31).unwrap(),
            }
        );
    }

    #[test]
    fn income_survives_store_and_upgrade() {
        let mut income = Income::new("Jobb", dec!(550000), dec!(80));
        income.withholding = Withholding::Tabelltrekk {
            reported_percent: Some(dec!(27)),
        };
        income.ferie_uker = FerieUker::FourPlusOne;
        income.adjustments.push(IncomeAdjustment {
            id: Uuid::new_v4(),
            kind: AdjustmentType::Overtid,
            amount: dec!(7500),
            month: 11,
            description: Some("Helgevakter".to_string()),
            affects_feriepenger: false,
        });

        let json = serde_json::to_string(&StoredIncome::from(&income)).unwrap();
        let stored: StoredIncome = serde_json::from_str(&json).unwrap();

        assert_eq!(upgrade_income(stored, &rules()), income);
    }

    #[test]
    fn stored_income_uses_camel_case_keys() {
        let income = Income::new("Jobb", dec!(550000), dec!(100));

        let value = serde_json::to_value(StoredIncome::from(&income)).unwrap();

        assert_eq!(value["periodType"], "fullYear");
        assert_eq!(value["ferieUker"], "5");
        assert_eq!(value["isOver60"], false);
        assert!(value.get("startDate").is_none());
    }

    #[test]
    fn out_of_range_income_values_are_clamped() {
        let json = r#"{
            "id": "a", "name": "Jobb", "yearlyAmount": 9000000000000000000,
            "employeePercentage": 250, "taxMethod": "tabelltrekk", "trekkprosent": -5,
            "adjustments": [{"id": "b", "type": "bonus", "amount": -300, "month": 14}]
        }"#;
        let stored: StoredIncome = serde_json::from_str(json).unwrap();

        let income = upgrade_income(stored, &rules());

        assert_eq!(income.yearly_amount, MAX_AMOUNT);
        assert_eq!(income.employee_percentage, dec!(100));
        assert_eq!(
            income.withholding,
            Withholding::Tabelltrekk { reported_percent: Some(dec!(0)) }
        );
        assert_eq!(income.adjustments[0].amount, dec!(0));
        assert_eq!(income.adjustments[0].month, 12);
    }

    // =========================================================================
    // adjustment upgrade tests
    // =========================================================================

    #[test]
    fn adjustment_flag_defaults_by_type() {
        let annet: StoredAdjustment =
            serde_json::from_str(r#"{"id": "x", "type": "annet", "amount": 100, "month": 2}"#)
                .unwrap();
        let bonus: StoredAdjustment =
            serde_json::from_str(r#"{"id": "y", "type": "bonus", "amount": 100, "month": 2}"#)
                .unwrap();

        assert!(!upgrade_adjustment(annet).affects_feriepenger);
        assert!(upgrade_adjustment(bonus).affects_feriepenger);
    }

    // =========================================================================
    // expense upgrade tests
    // =========================================================================

    #[test]
    fn legacy_yearly_expense_is_spread() {
        let json = r#"{"id": "e1", "name": "Forsikring", "category": "forsikring", "amount": 1200, "frequency": "yearly"}"#;
        let stored: StoredExpense = serde_json::from_str(json).unwrap();

        let expense = upgrade_expense(stored);

        assert_eq!(expense.monthly_amounts, [dec!(100); 12]);
        assert_eq!(expense.category, ExpenseCategory::FasteUtgifter);
        assert_eq!(expense.frequency, Frequency::Yearly);
    }

    #[test]
    fn legacy_yearly_expense_rounds_to_ore() {
        let json = r#"{"id": "e1", "name": "Bompenger", "category": "transport", "amount": 1000, "frequency": "yearly"}"#;
        let stored: StoredExpense = serde_json::from_str(json).unwrap();

        assert_eq!(upgrade_expense(stored).monthly_amounts[0], dec!(83.33));
    }

    #[test]
    fn legacy_monthly_expense_is_repeated() {
        let json = r#"{"id": "e2", "name": "Mat", "category": "mat", "amount": 4500}"#;
        let stored: StoredExpense = serde_json::from_str(json).unwrap();

        let expense = upgrade_expense(stored);

        assert_eq!(expense.monthly_amounts, [dec!(4500); 12]);
        assert_eq!(expense.category, ExpenseCategory::MatInne);
    }

    #[test]
    fn current_expense_is_kept() {
        let mut amounts = vec![dec!(300); 12];
        amounts[6] = dec!(0);
        let stored = StoredExpense {
            id: Uuid::new_v4().to_string(),
            name: "Strømming".to_string(),
            category: "abonnement".to_string(),
            monthly_amounts: Some(amounts.clone()),
            amount: None,
            frequency: None,
        };

        let expense = upgrade_expense(stored);

        assert_eq!(expense.monthly_amounts.to_vec(), amounts);
        assert_eq!(expense.category, ExpenseCategory::Abonnement);
    }

    #[test]
    fn short_monthly_amounts_fall_back_to_amount() {
        let stored = StoredExpense {
            id: "e3".to_string(),
            name: "Diverse".to_string(),
            category: "ukjent".to_string(),
            monthly_amounts: Some(vec![dec!(1); 3]),
            amount: Some(dec!(250)),
            frequency: Some("monthly".to_string()),
        };

        let expense = upgrade_expense(stored);

        assert_eq!(expense.monthly_amounts, [dec!(250); 12]);
        assert_eq!(expense.category, ExpenseCategory::Diverse);
    }

    // =========================================================================
    // freelance upgrade tests
    // =========================================================================

    #[test]
    fn freelance_missing_mva_is_recomputed() {
        let json = r#"{"id": "f1", "client": "Acme AS", "description": "Logo", "amount": 8000}"#;
        let stored: StoredFreelance = serde_json::from_str(json).unwrap();

        assert_eq!(upgrade_freelance(stored, dec!(0.25)).mva, dec!(2000));
    }

    #[test]
    fn freelance_cached_mva_is_kept() {
        let json = r#"{"id": "f1", "client": "Acme AS", "description": "Logo", "amount": 8000, "mva": 1000}"#;
        let stored: StoredFreelance = serde_json::from_str(json).unwrap();

        assert_eq!(upgrade_freelance(stored, dec!(0.25)).mva, dec!(1000));
    }

    #[test]
    fn oversized_freelance_and_expense_amounts_are_clamped() {
        let json = r#"{"id": "f1", "client": "Acme AS", "amount": 9000000000000000000}"#;
        let stored: StoredFreelance = serde_json::from_str(json).unwrap();
        let invoice = upgrade_freelance(stored, dec!(0.25));
        assert_eq!(invoice.amount, MAX_AMOUNT);
        assert_eq!(invoice.mva, MAX_AMOUNT * dec!(0.25));

        let json = r#"{"id": "e1", "name": "Husleie", "category": "faste-utgifter",
                       "amount": 9000000000000000000, "frequency": "monthly"}"#;
        let stored: StoredExpense = serde_json::from_str(json).unwrap();
        assert_eq!(upgrade_expense(stored).monthly_amounts, [MAX_AMOUNT; 12]);
    }
}
