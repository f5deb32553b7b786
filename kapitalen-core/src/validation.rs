//! Input validation for budget entities.
//!
//! Every validator returns `Ok` or a [`ValidationError`] whose `Display`
//! is the reason shown to the user. Composite validators stop at the first
//! failing rule. Validation never looks at calculator output.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{
    AdjustmentDraft, AdjustmentType, ExpenseCategory, ExpenseDraft, FreelanceDraft, IncomeDraft,
    MONTHS_PER_YEAR, PeriodType, TaxMethod,
};

/// Largest accepted amount, 1 000 000 000 000 000 kr. Keeps every derived
/// figure well inside the range of [`Decimal`].
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xA4C6_8000, 0x0003_8D7E, 0, false, 0);

static ISO_DATE: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$"));

fn is_iso_date(value: &str) -> bool {
    ISO_DATE.as_ref().is_ok_and(|re| re.is_match(value))
}

/// Reasons an entity draft is rejected.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} cannot be empty.")]
    Empty(&'static str),

    #[error("Invalid date format. Expected YYYY-MM-DD, got {0:?}.")]
    InvalidDate(String),

    #[error("Invalid date format. Expected YYYY-MM-DD.")]
    MissingDate,

    #[error("End date must be on or after start date ({start} > {end}).")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },

    #[error("{field}: Amount cannot be negative.")]
    NegativeAmount { field: &'static str, value: Decimal },

    #[error("{field}: Amount is too large.")]
    AmountTooLarge { field: &'static str, value: Decimal },

    #[error("{field}: Percentage must be between 0 and 100.")]
    PercentageOutOfRange { field: &'static str, value: Decimal },

    #[error("Month must be an integer between 1 and 12, got {0}.")]
    MonthOutOfRange(u32),

    #[error("Expected 12 monthly amounts, got {0}.")]
    WrongMonthCount(usize),

    #[error("Invalid adjustment type {0:?}.")]
    InvalidAdjustmentType(String),

    #[error("Invalid expense category {0:?}.")]
    InvalidExpenseCategory(String),
}

/// Parses an ISO `YYYY-MM-DD` calendar date.
///
/// The text must match the pattern exactly and name a real date, so
/// `2026-2-1` and `2026-02-30` are both rejected.
pub fn validate_date(value: &str) -> Result<NaiveDate, ValidationError> {
    if !is_iso_date(value) {
        return Err(ValidationError::InvalidDate(value.to_string()));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDate(value.to_string()))
}

/// Both dates must be present and valid, with `end >= start`.
pub fn validate_date_range(
    start: Option<&str>,
    end: Option<&str>,
) -> Result<(NaiveDate, NaiveDate), ValidationError> {
    let (Some(start), Some(end)) = (start, end) else {
        return Err(ValidationError::MissingDate);
    };
    let start = validate_date(start)?;
    let end = validate_date(end)?;

    if end < start {
        return Err(ValidationError::EndBeforeStart { start, end });
    }
    Ok((start, end))
}

pub fn validate_amount(
    field: &'static str,
    amount: Decimal,
) -> Result<(), ValidationError> {
    if amount < Decimal::ZERO {
        return Err(ValidationError::NegativeAmount {
            field,
            value: amount,
        });
    }
    if amount > MAX_AMOUNT {
        return Err(ValidationError::AmountTooLarge {
            field,
            value: amount,
        });
    }
    Ok(())
}

/// Forces a stored amount into the range [`validate_amount`] accepts.
pub fn clamp_amount(amount: Decimal) -> Decimal {
    amount.clamp(Decimal::ZERO, MAX_AMOUNT)
}

/// Forces a stored percentage into 0 through 100.
pub fn clamp_percentage(percentage: Decimal) -> Decimal {
    percentage.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
}

/// Accepts 0 through 100 inclusive.
pub fn validate_percentage(
    field: &'static str,
    percentage: Decimal,
) -> Result<(), ValidationError> {
    if percentage < Decimal::ZERO || percentage > Decimal::ONE_HUNDRED {
        return Err(ValidationError::PercentageOutOfRange {
            field,
            value: percentage,
        });
    }
    Ok(())
}

pub fn validate_month(month: u32) -> Result<(), ValidationError> {
    if !(1..=12).contains(&month) {
        return Err(ValidationError::MonthOutOfRange(month));
    }
    Ok(())
}

/// Rejects empty and whitespace-only text.
pub fn validate_non_empty(
    value: &str,
    field: &'static str,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty(field));
    }
    Ok(())
}

pub fn validate_income(draft: &IncomeDraft) -> Result<(), ValidationError> {
    validate_non_empty(&draft.name, "Income name")?;
    validate_amount("Yearly amount", draft.yearly_amount)?;
    validate_percentage("Employee percentage", draft.employee_percentage)?;

    if draft.period_type == PeriodType::Custom {
        validate_date_range(draft.start_date.as_deref(), draft.end_date.as_deref())?;
    }

    if let (TaxMethod::Prosenttrekk, Some(percent)) =
        (draft.tax_method, draft.custom_tax_percentage)
    {
        validate_percentage("Tax percentage", percent)?;
    }
    if let (TaxMethod::Tabelltrekk, Some(percent)) = (draft.tax_method, draft.trekkprosent) {
        validate_percentage("Trekkprosent", percent)?;
    }

    Ok(())
}

pub fn validate_adjustment(draft: &AdjustmentDraft) -> Result<(), ValidationError> {
    validate_amount("Adjustment amount", draft.amount)?;
    validate_month(draft.month)?;

    if AdjustmentType::parse(&draft.kind).is_none() {
        return Err(ValidationError::InvalidAdjustmentType(draft.kind.clone()));
    }
    Ok(())
}

pub fn validate_expense(draft: &ExpenseDraft) -> Result<(), ValidationError> {
    validate_non_empty(&draft.name, "Expense name")?;

    if draft.monthly_amounts.len() != MONTHS_PER_YEAR {
        return Err(ValidationError::WrongMonthCount(draft.monthly_amounts.len()));
    }
    for amount in &draft.monthly_amounts {
        validate_amount("Expense amount", *amount)?;
    }

    if ExpenseCategory::parse(&draft.category).is_none() {
        return Err(ValidationError::InvalidExpenseCategory(
            draft.category.clone(),
        ));
    }
    Ok(())
}

pub fn validate_freelance(draft: &FreelanceDraft) -> Result<(), ValidationError> {
    validate_non_empty(&draft.client, "Client")?;
    validate_amount("Freelance amount", draft.amount)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn date(
        y: i32,
        m: u32,
        d: u32,
    ) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // =========================================================================
    // validate_date tests
    // =========================================================================

    #[test]
    fn validate_date_accepts_iso_date() {
        assert_eq!(validate_date("2026-03-01"), Ok(date(2026, 3, 1)));
    }

    #[test]
    fn validate_date_rejects_unpadded_date() {
        assert_eq!(
            validate_date("2026-3-1"),
            Err(ValidationError::InvalidDate("2026-3-1".to_string()))
        );
    }

    #[test]
    fn validate_date_rejects_impossible_date() {
        assert!(validate_date("2026-02-30").is_err());
        assert!(validate_date("2026-13-01").is_err());
    }

    #[test]
    fn validate_date_rejects_trailing_text() {
        assert!(validate_date("2026-03-01T00:00").is_err());
        assert!(validate_date("").is_err());
    }

    // =========================================================================
    // validate_date_range tests
    // =========================================================================

    #[test]
    fn date_range_allows_same_day() {
        assert_eq!(
            validate_date_range(Some("2026-05-05"), Some("2026-05-05")),
            Ok((date(2026, 5, 5), date(2026, 5, 5)))
        );
    }

    #[test]
    fn date_range_rejects_end_before_start() {
        assert_eq!(
            validate_date_range(Some("2026-08-31"), Some("2026-03-01")),
            Err(ValidationError::EndBeforeStart {
                start: date(2026, 8, 31),
                end: date(2026, 3, 1),
            })
        );
    }

    #[test]
    fn date_range_requires_both_dates() {
        assert_eq!(
            validate_date_range(Some("2026-01-01"), None),
            Err(ValidationError::MissingDate)
        );
    }

    // =========================================================================
    // scalar validator tests
    // =========================================================================

    #[test]
    fn amount_rejects_negative() {
        assert_eq!(
            validate_amount("Amount", dec!(-0.01)),
            Err(ValidationError::NegativeAmount {
                field: "Amount",
                value: dec!(-0.01),
            })
        );
        assert_eq!(validate_amount("Amount", dec!(0)), Ok(()));
    }

    #[test]
    fn amount_rejects_values_above_the_limit() {
        assert_eq!(MAX_AMOUNT, dec!(1000000000000000));
        assert_eq!(validate_amount("Amount", MAX_AMOUNT), Ok(()));
        assert_eq!(
            validate_amount("Amount", dec!(1000000000000000.01)),
            Err(ValidationError::AmountTooLarge {
                field: "Amount",
                value: dec!(1000000000000000.01),
            })
        );
    }

    #[test]
    fn clamp_amount_bounds_both_ends() {
        assert_eq!(clamp_amount(dec!(-5)), dec!(0));
        assert_eq!(clamp_amount(dec!(1000000000000000000000000000)), MAX_AMOUNT);
        assert_eq!(clamp_amount(dec!(600000)), dec!(600000));
    }

    #[test]
    fn percentage_bounds_are_inclusive() {
        assert_eq!(validate_percentage("Pct", dec!(0)), Ok(()));
        assert_eq!(validate_percentage("Pct", dec!(100)), Ok(()));
        assert!(validate_percentage("Pct", dec!(100.01)).is_err());
        assert!(validate_percentage("Pct", dec!(-1)).is_err());
    }

    #[test]
    fn month_must_be_one_through_twelve() {
        assert_eq!(validate_month(1), Ok(()));
        assert_eq!(validate_month(12), Ok(()));
        assert_eq!(validate_month(0), Err(ValidationError::MonthOutOfRange(0)));
        assert_eq!(validate_month(13), Err(ValidationError::MonthOutOfRange(13)));
    }

    // =========================================================================
    // validate_income tests
    // =========================================================================

    #[test]
    fn income_rejects_whitespace_name() {
        let draft = IncomeDraft::new("   ", dec!(600000), dec!(100));

        assert_eq!(
            validate_income(&draft),
            Err(ValidationError::Empty("Income name"))
        );
    }

    #[test]
    fn income_checks_name_before_amount() {
        let draft = IncomeDraft::new("", dec!(-1), dec!(100));

        assert_eq!(
            validate_income(&draft),
            Err(ValidationError::Empty("Income name"))
        );
    }

    #[test]
    fn income_rejects_percentage_above_100() {
        let draft = IncomeDraft::new("Jobb", dec!(600000), dec!(120));

        assert_eq!(
            validate_income(&draft).unwrap_err().to_string(),
            "Employee percentage: Percentage must be between 0 and 100."
        );
    }

    #[test]
    fn income_rejects_salary_beyond_the_amount_limit() {
        let draft = IncomeDraft::new("Jobb", dec!(1000000000000000000000000000), dec!(100));

        assert!(matches!(
            validate_income(&draft),
            Err(ValidationError::AmountTooLarge {
                field: "Yearly amount",
                ..
            })
        ));
    }

    #[test]
    fn income_checks_reported_trekkprosent() {
        let mut draft = IncomeDraft::new("Jobb", dec!(600000), dec!(100));
        draft.trekkprosent = Some(dec!(250));

        assert!(matches!(
            validate_income(&draft),
            Err(ValidationError::PercentageOutOfRange {
                field: "Trekkprosent",
                ..
            })
        ));
    }

    #[test]
    fn income_ignores_dates_for_full_year() {
        let mut draft = IncomeDraft::new("Jobb", dec!(600000), dec!(100));
        draft.start_date = Some("not a date".to_string());

        assert_eq!(validate_income(&draft), Ok(()));
    }

    #[test]
    fn income_validates_custom_dates() {
        let draft = IncomeDraft::new("Vikariat", dec!(600000), dec!(100))
            .custom_period("2026-03-01", "2026-02-01");

        assert!(matches!(
            validate_income(&draft),
            Err(ValidationError::EndBeforeStart { .. })
        ));
    }

    #[test]
    fn income_validates_supplied_tax_percentage() {
        let draft =
            IncomeDraft::new("Jobb", dec!(600000), dec!(100)).prosenttrekk(Some(dec!(150)));

        assert_eq!(
            validate_income(&draft),
            Err(ValidationError::PercentageOutOfRange {
                field: "Tax percentage",
                value: dec!(150),
            })
        );
    }

    #[test]
    fn income_prosenttrekk_without_percentage_is_valid() {
        let draft = IncomeDraft::new("Jobb", dec!(600000), dec!(100)).prosenttrekk(None);

        assert_eq!(validate_income(&draft), Ok(()));
    }

    #[test]
    fn income_ignores_tax_percentage_for_tabelltrekk() {
        let mut draft = IncomeDraft::new("Jobb", dec!(600000), dec!(100));
        draft.custom_tax_percentage = Some(dec!(400));

        assert_eq!(validate_income(&draft), Ok(()));
    }

    // =========================================================================
    // validate_adjustment tests
    // =========================================================================

    #[test]
    fn adjustment_accepts_known_type() {
        assert_eq!(
            validate_adjustment(&AdjustmentDraft::new("overtid", dec!(4000), 11)),
            Ok(())
        );
    }

    #[test]
    fn adjustment_rejects_unknown_type() {
        assert_eq!(
            validate_adjustment(&AdjustmentDraft::new("provisjon", dec!(4000), 11)),
            Err(ValidationError::InvalidAdjustmentType("provisjon".to_string()))
        );
    }

    #[test]
    fn adjustment_checks_amount_then_month() {
        let draft = AdjustmentDraft::new("bonus", dec!(-5), 0);

        assert!(matches!(
            validate_adjustment(&draft),
            Err(ValidationError::NegativeAmount { .. })
        ));
        assert_eq!(
            validate_adjustment(&AdjustmentDraft::new("bonus", dec!(5), 0)),
            Err(ValidationError::MonthOutOfRange(0))
        );
    }

    // =========================================================================
    // validate_expense tests
    // =========================================================================

    #[test]
    fn expense_accepts_monthly_draft() {
        let draft = ExpenseDraft::monthly("Husleie", "faste-utgifter", dec!(12000));

        assert_eq!(validate_expense(&draft), Ok(()));
    }

    #[test]
    fn expense_requires_twelve_months() {
        let draft = ExpenseDraft::with_amounts("Strøm", "faste-utgifter", vec![dec!(900); 11]);

        assert_eq!(
            validate_expense(&draft),
            Err(ValidationError::WrongMonthCount(11))
        );
    }

    #[test]
    fn expense_rejects_negative_month() {
        let mut amounts = vec![dec!(900); 12];
        amounts[3] = dec!(-1);
        let draft = ExpenseDraft::with_amounts("Strøm", "faste-utgifter", amounts);

        assert!(matches!(
            validate_expense(&draft),
            Err(ValidationError::NegativeAmount { .. })
        ));
    }

    #[test]
    fn expense_rejects_legacy_category() {
        let draft = ExpenseDraft::monthly("Husleie", "bolig", dec!(12000));

        assert_eq!(
            validate_expense(&draft),
            Err(ValidationError::InvalidExpenseCategory("bolig".to_string()))
        );
    }

    // =========================================================================
    // validate_freelance tests
    // =========================================================================

    #[test]
    fn freelance_requires_client() {
        let draft = FreelanceDraft::new(" ", "Konsulentoppdrag", dec!(10000));

        assert_eq!(
            validate_freelance(&draft),
            Err(ValidationError::Empty("Client"))
        );
    }
}
