//! The budget aggregator.
//!
//! [`Budget`] owns every entity collection plus the global withholding
//! settings. All mutations go through it: each one validates its draft,
//! applies the change and then notifies the registered change hooks with
//! the [`Collection`] that was touched. Persistence subscribes through
//! such a hook (see [`PendingSaves`]).

use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::calculations::{CombinedTaxInput, TaxCalculator, monthly_income};
use crate::models::{
    AdjustmentDraft, AdjustmentId, AdjustmentType, CombinedTaxBreakdown, Expense, ExpenseCategory,
    ExpenseDraft, ExpenseId, FreelanceDraft, FreelanceId, FreelanceIncome, Income,
    IncomeAdjustment, IncomeDraft, IncomeId, MONTHS_PER_YEAR, PeriodType, TaxMethod, TaxYearRules,
    Withholding, WorkPeriod,
};
use crate::validation::{
    ValidationError, clamp_amount, clamp_percentage, validate_adjustment, validate_date_range,
    validate_expense, validate_freelance, validate_income,
};

/// Independently persisted parts of a budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Collection {
    Incomes,
    Freelance,
    Expenses,
    EnkExpenses,
    TaxMethod,
    TaxPercentage,
}

impl Collection {
    pub const ALL: [Collection; 6] = [
        Self::Incomes,
        Self::Freelance,
        Self::Expenses,
        Self::EnkExpenses,
        Self::TaxMethod,
        Self::TaxPercentage,
    ];
}

impl fmt::Display for Collection {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let name = match self {
            Self::Incomes => "incomes",
            Self::Freelance => "freelance",
            Self::Expenses => "expenses",
            Self::EnkExpenses => "enk expenses",
            Self::TaxMethod => "tax method",
            Self::TaxPercentage => "tax percentage",
        };
        f.write_str(name)
    }
}

type ChangeHook = Box<dyn FnMut(Collection) + Send>;

/// Household budget: incomes, ENK invoices, expenses and withholding
/// settings, bound to one tax year's rules.
pub struct Budget {
    pub(crate) rules: TaxYearRules,
    pub(crate) incomes: Vec<Income>,
    pub(crate) freelance: Vec<FreelanceIncome>,
    pub(crate) expenses: Vec<Expense>,
    pub(crate) enk_expenses: Decimal,
    pub(crate) global_tax_method: TaxMethod,
    pub(crate) global_tax_percentage: Decimal,
    hooks: Vec<ChangeHook>,
}

impl fmt::Debug for Budget {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Budget")
            .field("tax_year", &self.rules.tax_year)
            .field("incomes", &self.incomes.len())
            .field("freelance", &self.freelance.len())
            .field("expenses", &self.expenses.len())
            .field("enk_expenses", &self.enk_expenses)
            .field("global_tax_method", &self.global_tax_method)
            .field("global_tax_percentage", &self.global_tax_percentage)
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

impl Budget {
    /// Empty budget with tabelltrekk and the rules' default percentage.
    pub fn new(rules: TaxYearRules) -> Self {
        let global_tax_percentage = rules.default_tax_percentage;
        Self {
            rules,
            incomes: Vec::new(),
            freelance: Vec::new(),
            expenses: Vec::new(),
            enk_expenses: Decimal::ZERO,
            global_tax_method: TaxMethod::default(),
            global_tax_percentage,
            hooks: Vec::new(),
        }
    }

    /// Registers an observer called after every mutation.
    pub fn on_change(
        &mut self,
        hook: impl FnMut(Collection) + Send + 'static,
    ) {
        self.hooks.push(Box::new(hook));
    }

    fn notify(
        &mut self,
        collection: Collection,
    ) {
        for hook in &mut self.hooks {
            hook(collection);
        }
    }

    pub fn rules(&self) -> &TaxYearRules {
        &self.rules
    }

    pub fn incomes(&self) -> &[Income] {
        &self.incomes
    }

    pub fn income(
        &self,
        id: IncomeId,
    ) -> Option<&Income> {
        self.incomes.iter().find(|i| i.id == id)
    }

    pub fn freelance(&self) -> &[FreelanceIncome] {
        &self.freelance
    }

    pub fn expenses(&self) -> &[Expense] {
        &self.expenses
    }

    pub fn enk_expenses(&self) -> Decimal {
        self.enk_expenses
    }

    pub fn global_tax_method(&self) -> TaxMethod {
        self.global_tax_method
    }

    pub fn global_tax_percentage(&self) -> Decimal {
        self.global_tax_percentage
    }

    // =========================================================================
    // Incomes
    // =========================================================================

    /// Adds an income with an empty adjustment list.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] the draft violates.
    pub fn add_income(
        &mut self,
        draft: &IncomeDraft,
    ) -> Result<IncomeId, ValidationError> {
        validate_income(draft)?;
        let income = self.build_income(Uuid::new_v4(), draft, Vec::new())?;
        let id = income.id;

        debug!(income_id = %id, name = %income.name, "income added");
        self.incomes.push(income);
        self.notify(Collection::Incomes);
        Ok(id)
    }

    /// Replaces every field of an income except its adjustments.
    ///
    /// Returns `Ok(false)` when no income has `id`.
    pub fn update_income(
        &mut self,
        id: IncomeId,
        draft: &IncomeDraft,
    ) -> Result<bool, ValidationError> {
        validate_income(draft)?;
        let Some(index) = self.incomes.iter().position(|i| i.id == id) else {
            return Ok(false);
        };

        let mut income = self.build_income(id, draft, Vec::new())?;
        income.adjustments = std::mem::take(&mut self.incomes[index].adjustments);
        self.incomes[index] = income;

        debug!(income_id = %id, "income updated");
        self.notify(Collection::Incomes);
        Ok(true)
    }

    /// Removes an income together with its adjustments.
    pub fn remove_income(
        &mut self,
        id: IncomeId,
    ) -> bool {
        let before = self.incomes.len();
        self.incomes.retain(|i| i.id != id);
        if self.incomes.len() == before {
            return false;
        }

        debug!(income_id = %id, "income removed");
        self.notify(Collection::Incomes);
        true
    }

    fn build_income(
        &self,
        id: IncomeId,
        draft: &IncomeDraft,
        adjustments: Vec<IncomeAdjustment>,
    ) -> Result<Income, ValidationError> {
        let withholding = match draft.tax_method {
            TaxMethod::Prosenttrekk => Withholding::Prosenttrekk {
                percent: draft
                    .custom_tax_percentage
                    .unwrap_or(self.rules.default_tax_percentage),
            },
            TaxMethod::Tabelltrekk => Withholding::Tabelltrekk {
                reported_percent: draft.trekkprosent,
            },
        };

        let period = match draft.period_type {
            PeriodType::FullYear => WorkPeriod::FullYear,
            PeriodType::Custom => {
                let (start, end) =
                    validate_date_range(draft.start_date.as_deref(), draft.end_date.as_deref())?;
                WorkPeriod::Custom { start, end }
            }
        };

        Ok(Income {
            id,
            name: draft.name.clone(),
            yearly_amount: draft.yearly_amount,
            employee_percentage: draft.employee_percentage,
            withholding,
            period,
            ferie_uker: draft.ferie_uker,
            is_over_60: draft.is_over_60,
            adjustments,
        })
    }

    // =========================================================================
    // Adjustments
    // =========================================================================

    /// Appends an adjustment to an income.
    ///
    /// Returns `Ok(None)` when no income has `income_id`.
    pub fn add_adjustment(
        &mut self,
        income_id: IncomeId,
        draft: &AdjustmentDraft,
    ) -> Result<Option<AdjustmentId>, ValidationError> {
        validate_adjustment(draft)?;
        let kind = adjustment_type(draft)?;
        let Some(income) = self.incomes.iter_mut().find(|i| i.id == income_id) else {
            return Ok(None);
        };

        let adjustment = IncomeAdjustment {
            id: Uuid::new_v4(),
            kind,
            amount: draft.amount,
            month: draft.month,
            description: draft.description.clone(),
            affects_feriepenger: draft
                .affects_feriepenger
                .unwrap_or_else(|| kind.default_affects_feriepenger()),
        };
        let id = adjustment.id;
        income.adjustments.push(adjustment);

        debug!(%income_id, adjustment_id = %id, kind = kind.as_str(), "adjustment added");
        self.notify(Collection::Incomes);
        Ok(Some(id))
    }

    /// Replaces an adjustment. An unset `affects_feriepenger` keeps the
    /// previous value.
    pub fn update_adjustment(
        &mut self,
        income_id: IncomeId,
        adjustment_id: AdjustmentId,
        draft: &AdjustmentDraft,
    ) -> Result<bool, ValidationError> {
        validate_adjustment(draft)?;
        let kind = adjustment_type(draft)?;
        let Some(adjustment) = self
            .incomes
            .iter_mut()
            .find(|i| i.id == income_id)
            .and_then(|i| i.adjustments.iter_mut().find(|a| a.id == adjustment_id))
        else {
            return Ok(false);
        };

        adjustment.kind = kind;
        adjustment.amount = draft.amount;
        adjustment.month = draft.month;
        adjustment.description = draft.description.clone();
        if let Some(affects) = draft.affects_feriepenger {
            adjustment.affects_feriepenger = affects;
        }

        debug!(%income_id, %adjustment_id, "adjustment updated");
        self.notify(Collection::Incomes);
        Ok(true)
    }

    pub fn remove_adjustment(
        &mut self,
        income_id: IncomeId,
        adjustment_id: AdjustmentId,
    ) -> bool {
        let Some(income) = self.incomes.iter_mut().find(|i| i.id == income_id) else {
            return false;
        };
        let before = income.adjustments.len();
        income.adjustments.retain(|a| a.id != adjustment_id);
        if income.adjustments.len() == before {
            return false;
        }

        debug!(%income_id, %adjustment_id, "adjustment removed");
        self.notify(Collection::Incomes);
        true
    }

    // =========================================================================
    // Freelance (ENK)
    // =========================================================================

    pub fn add_freelance(
        &mut self,
        draft: &FreelanceDraft,
    ) -> Result<FreelanceId, ValidationError> {
        validate_freelance(draft)?;
        let invoice = FreelanceIncome::new(
            draft.client.clone(),
            draft.description.clone(),
            draft.amount,
            self.rules.mva_rate,
        );
        let id = invoice.id;
        self.freelance.push(invoice);

        debug!(freelance_id = %id, "freelance income added");
        self.notify(Collection::Freelance);
        Ok(id)
    }

    /// Replaces an invoice and recomputes its cached MVA.
    pub fn update_freelance(
        &mut self,
        id: FreelanceId,
        draft: &FreelanceDraft,
    ) -> Result<bool, ValidationError> {
        validate_freelance(draft)?;
        let mva_rate = self.rules.mva_rate;
        let Some(invoice) = self.freelance.iter_mut().find(|f| f.id == id) else {
            return Ok(false);
        };

        invoice.client = draft.client.clone();
        invoice.description = draft.description.clone();
        invoice.amount = draft.amount;
        invoice.mva = draft.amount * mva_rate;

        debug!(freelance_id = %id, "freelance income updated");
        self.notify(Collection::Freelance);
        Ok(true)
    }

    pub fn remove_freelance(
        &mut self,
        id: FreelanceId,
    ) -> bool {
        let before = self.freelance.len();
        self.freelance.retain(|f| f.id != id);
        if self.freelance.len() == before {
            return false;
        }

        debug!(freelance_id = %id, "freelance income removed");
        self.notify(Collection::Freelance);
        true
    }

    // =========================================================================
    // Expenses
    // =========================================================================

    pub fn add_expense(
        &mut self,
        draft: &ExpenseDraft,
    ) -> Result<ExpenseId, ValidationError> {
        validate_expense(draft)?;
        let (category, monthly_amounts) = expense_fields(draft)?;
        let expense = Expense {
            id: Uuid::new_v4(),
            name: draft.name.clone(),
            category,
            monthly_amounts,
            frequency: draft.frequency,
        };
        let id = expense.id;
        self.expenses.push(expense);

        debug!(expense_id = %id, category = category.as_str(), "expense added");
        self.notify(Collection::Expenses);
        Ok(id)
    }

    pub fn update_expense(
        &mut self,
        id: ExpenseId,
        draft: &ExpenseDraft,
    ) -> Result<bool, ValidationError> {
        validate_expense(draft)?;
        let (category, monthly_amounts) = expense_fields(draft)?;
        let Some(expense) = self.expenses.iter_mut().find(|e| e.id == id) else {
            return Ok(false);
        };

        expense.name = draft.name.clone();
        expense.category = category;
        expense.monthly_amounts = monthly_amounts;
        expense.frequency = draft.frequency;

        debug!(expense_id = %id, "expense updated");
        self.notify(Collection::Expenses);
        Ok(true)
    }

    pub fn remove_expense(
        &mut self,
        id: ExpenseId,
    ) -> bool {
        let before = self.expenses.len();
        self.expenses.retain(|e| e.id != id);
        if self.expenses.len() == before {
            return false;
        }

        debug!(expense_id = %id, "expense removed");
        self.notify(Collection::Expenses);
        true
    }

    // =========================================================================
    // Settings
    // =========================================================================

    /// Clamped into the accepted amount range; negative amounts become zero.
    pub fn set_enk_expenses(
        &mut self,
        amount: Decimal,
    ) {
        self.enk_expenses = clamp_amount(amount);
        self.notify(Collection::EnkExpenses);
    }

    pub fn set_global_tax_method(
        &mut self,
        method: TaxMethod,
    ) {
        self.global_tax_method = method;
        self.notify(Collection::TaxMethod);
    }

    /// Clamped into 0..=100.
    pub fn set_global_tax_percentage(
        &mut self,
        percentage: Decimal,
    ) {
        self.global_tax_percentage = clamp_percentage(percentage);
        self.notify(Collection::TaxPercentage);
    }

    // =========================================================================
    // Derived figures
    // =========================================================================

    pub fn calculator(&self) -> TaxCalculator<'_> {
        TaxCalculator::new(&self.rules)
    }

    /// Authoritative yearly tax across all sources.
    pub fn combined_tax(&self) -> CombinedTaxBreakdown {
        let breakdown = self.calculator().calculate_combined_tax(&CombinedTaxInput {
            incomes: &self.incomes,
            freelance_gross: self.total_freelance_income(),
            enk_expenses: self.enk_expenses,
            global_tax_method: self.global_tax_method,
            global_tax_percentage: self.global_tax_percentage,
        });
        debug!(
            total_tax = %breakdown.total_tax,
            difference = %breakdown.difference,
            "combined tax calculated"
        );
        breakdown
    }

    /// Monthly prorated base salary across all incomes.
    pub fn total_gross_income(&self) -> Decimal {
        self.incomes.iter().map(monthly_income).sum()
    }

    /// Monthly net income from the per-income preview.
    pub fn total_net_income(&self) -> Decimal {
        let calculator = self.calculator();
        self.incomes
            .iter()
            .map(|i| calculator.calculate_tax(i).net_income / Decimal::from(MONTHS_PER_YEAR))
            .sum()
    }

    pub fn monthly_expense_amount(expense: &Expense) -> Decimal {
        expense.monthly_average()
    }

    pub fn yearly_expense_amount(expense: &Expense) -> Decimal {
        expense.yearly_total()
    }

    pub fn expense_varies(expense: &Expense) -> bool {
        expense.varies()
    }

    /// Average monthly expenses.
    pub fn total_expenses(&self) -> Decimal {
        self.expenses.iter().map(Expense::monthly_average).sum()
    }

    /// Expense sum per calendar month, January first.
    pub fn monthly_totals(&self) -> [Decimal; MONTHS_PER_YEAR] {
        let mut totals = [Decimal::ZERO; MONTHS_PER_YEAR];
        for expense in &self.expenses {
            for (total, amount) in totals.iter_mut().zip(expense.monthly_amounts) {
                *total += amount;
            }
        }
        totals
    }

    pub fn expenses_by_category(
        &self,
        category: ExpenseCategory,
    ) -> Vec<&Expense> {
        self.expenses
            .iter()
            .filter(|e| e.category == category)
            .collect()
    }

    /// Average monthly expenses in one category.
    pub fn category_total(
        &self,
        category: ExpenseCategory,
    ) -> Decimal {
        self.expenses_by_category(category)
            .into_iter()
            .map(Expense::monthly_average)
            .sum()
    }

    pub fn monthly_savings(&self) -> Decimal {
        self.total_net_income() - self.total_expenses()
    }

    /// Savings as a percentage of monthly net income, 0 when there is none.
    pub fn savings_rate(&self) -> Decimal {
        let net = self.total_net_income();
        if net.is_zero() {
            return Decimal::ZERO;
        }
        self.monthly_savings() / net * Decimal::ONE_HUNDRED
    }

    /// ENK invoice total excluding MVA.
    pub fn total_freelance_income(&self) -> Decimal {
        self.freelance.iter().map(|f| f.amount).sum()
    }

    pub fn total_freelance_mva(&self) -> Decimal {
        self.freelance.iter().map(|f| f.mva).sum()
    }
}

fn adjustment_type(draft: &AdjustmentDraft) -> Result<AdjustmentType, ValidationError> {
    AdjustmentType::parse(&draft.kind)
        .ok_or_else(|| ValidationError::InvalidAdjustmentType(draft.kind.clone()))
}

fn expense_fields(
    draft: &ExpenseDraft,
) -> Result<(ExpenseCategory, [Decimal; MONTHS_PER_YEAR]), ValidationError> {
    let category = ExpenseCategory::parse(&draft.category)
        .ok_or_else(|| ValidationError::InvalidExpenseCategory(draft.category.clone()))?;
    let monthly_amounts = <[Decimal; MONTHS_PER_YEAR]>::try_from(draft.monthly_amounts.as_slice())
        .map_err(|_| ValidationError::WrongMonthCount(draft.monthly_amounts.len()))?;
    Ok((category, monthly_amounts))
}

/// Change hook that records which collections are dirty so they can be
/// flushed together.
///
/// ```
/// use rust_decimal_macros::dec;
/// use kapitalen_core::{Budget, Collection, PendingSaves, TaxYearRules};
///
/// let pending = PendingSaves::default();
/// let mut budget = Budget::new(TaxYearRules::norway_2026());
/// budget.on_change(pending.hook());
///
/// budget.set_enk_expenses(dec!(12000));
///
/// assert_eq!(pending.take().into_iter().collect::<Vec<_>>(), vec![Collection::EnkExpenses]);
/// assert!(pending.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct PendingSaves {
    dirty: Arc<Mutex<BTreeSet<Collection>>>,
}

impl PendingSaves {
    pub fn hook(&self) -> impl FnMut(Collection) + Send + 'static {
        let dirty = Arc::clone(&self.dirty);
        move |collection| {
            dirty
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(collection);
        }
    }

    pub fn mark(
        &self,
        collection: Collection,
    ) {
        self.dirty
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(collection);
    }

    /// Drains the dirty set.
    pub fn take(&self) -> BTreeSet<Collection> {
        std::mem::take(&mut *self.dirty.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn is_empty(&self) -> bool {
        self.dirty
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::{FerieUker, Frequency};

    fn budget() -> Budget {
        Budget::new(TaxYearRules::norway_2026())
    }

    fn tracked() -> (Budget, PendingSaves) {
        let pending = PendingSaves::default();
        let mut budget = budget();
        budget.on_change(pending.hook());
        (budget, pending)
    }

    // =========================================================================
    // income tests
    // =========================================================================

    #[test]
    fn add_income_applies_defaults() {
        let mut budget = budget();

        let id = budget
            .add_income(&IncomeDraft::new("Fast jobb", dec!(600000), dec!(100)))
            .unwrap();

        let income = budget.income(id).unwrap();
        assert_eq!(income.period, WorkPeriod::FullYear);
        assert_eq!(income.ferie_uker, FerieUker::Five);
        assert_eq!(
            income.withholding,
            Withholding::Tabelltrekk {
                reported_percent: None
            }
        );
        assert!(income.adjustments.is_empty());
    }

    #[test]
    fn add_income_prosenttrekk_defaults_to_35() {
        let mut budget = budget();

        let id = budget
            .add_income(&IncomeDraft::new("Jobb", dec!(500000), dec!(100)).prosenttrekk(None))
            .unwrap();

        assert_eq!(
            budget.income(id).unwrap().withholding,
            Withholding::Prosenttrekk { percent: dec!(35) }
        );
    }

    #[test]
    fn add_income_drops_trekkprosent_for_prosenttrekk() {
        let mut budget = budget();
        let mut draft = IncomeDraft::new("Jobb", dec!(500000), dec!(100)).prosenttrekk(Some(dec!(28)));
        draft.trekkprosent = Some(dec!(31));

        let id = budget.add_income(&draft).unwrap();

        assert_eq!(
            budget.income(id).unwrap().withholding,
            Withholding::Prosenttrekk { percent: dec!(28) }
        );
    }

    #[test]
    fn add_income_rejects_invalid_draft() {
        let (mut budget, pending) = tracked();

        let result = budget.add_income(&IncomeDraft::new(" ", dec!(600000), dec!(100)));

        assert_eq!(result, Err(ValidationError::Empty("Income name")));
        assert!(budget.incomes().is_empty());
        assert!(pending.is_empty());
    }

    #[test]
    fn update_income_preserves_adjustments() {
        let mut budget = budget();
        let id = budget
            .add_income(&IncomeDraft::new("Jobb", dec!(500000), dec!(100)))
            .unwrap();
        budget
            .add_adjustment(id, &AdjustmentDraft::new("bonus", dec!(20000), 6))
            .unwrap();

        let draft = IncomeDraft::new("Ny jobb", dec!(650000), dec!(80))
            .custom_period("2026-04-01", "2026-12-31");
        assert_eq!(budget.update_income(id, &draft), Ok(true));

        let income = budget.income(id).unwrap();
        assert_eq!(income.name, "Ny jobb");
        assert_eq!(income.adjustments.len(), 1);
        assert!(matches!(income.period, WorkPeriod::Custom { .. }));
    }

    #[test]
    fn update_unknown_income_is_false() {
        let mut budget = budget();

        let result = budget.update_income(Uuid::new_v4(), &IncomeDraft::new("Jobb", dec!(1), dec!(100)));

        assert_eq!(result, Ok(false));
    }

    #[test]
    fn remove_income_notifies_once() {
        let (mut budget, pending) = tracked();
        let id = budget
            .add_income(&IncomeDraft::new("Jobb", dec!(500000), dec!(100)))
            .unwrap();
        pending.take();

        assert!(budget.remove_income(id));
        assert!(!budget.remove_income(id));
        assert_eq!(pending.take(), BTreeSet::from([Collection::Incomes]));
    }

    // =========================================================================
    // adjustment tests
    // =========================================================================

    #[test]
    fn adjustment_feriepenger_defaults_by_type() {
        let mut budget = budget();
        let income_id = budget
            .add_income(&IncomeDraft::new("Jobb", dec!(500000), dec!(100)))
            .unwrap();

        let bonus = budget
            .add_adjustment(income_id, &AdjustmentDraft::new("bonus", dec!(10000), 6))
            .unwrap()
            .unwrap();
        let annet = budget
            .add_adjustment(income_id, &AdjustmentDraft::new("annet", dec!(2000), 9))
            .unwrap()
            .unwrap();

        let income = budget.income(income_id).unwrap();
        assert!(income.adjustment(bonus).unwrap().affects_feriepenger);
        assert!(!income.adjustment(annet).unwrap().affects_feriepenger);
    }

    #[test]
    fn add_adjustment_to_unknown_income_is_none() {
        let mut budget = budget();

        let result =
            budget.add_adjustment(Uuid::new_v4(), &AdjustmentDraft::new("bonus", dec!(1), 1));

        assert_eq!(result, Ok(None));
    }

    #[test]
    fn update_adjustment_keeps_flag_when_unset() {
        let mut budget = budget();
        let income_id = budget
            .add_income(&IncomeDraft::new("Jobb", dec!(500000), dec!(100)))
            .unwrap();
        let mut draft = AdjustmentDraft::new("annet", dec!(2000), 9);
        draft.affects_feriepenger = Some(true);
        let adjustment_id = budget.add_adjustment(income_id, &draft).unwrap().unwrap();

        let update = AdjustmentDraft::new("annet", dec!(3000), 10);
        assert_eq!(
            budget.update_adjustment(income_id, adjustment_id, &update),
            Ok(true)
        );

        let adjustment = budget
            .income(income_id)
            .unwrap()
            .adjustment(adjustment_id)
            .unwrap();
        assert_eq!(adjustment.amount, dec!(3000));
        assert_eq!(adjustment.month, 10);
        assert!(adjustment.affects_feriepenger);
    }

    #[test]
    fn remove_adjustment_only_touches_owner() {
        let mut budget = budget();
        let income_id = budget
            .add_income(&IncomeDraft::new("Jobb", dec!(500000), dec!(100)))
            .unwrap();
        let other_id = budget
            .add_income(&IncomeDraft::new("Annen", dec!(100000), dec!(20)))
            .unwrap();
        let adjustment_id = budget
            .add_adjustment(income_id, &AdjustmentDraft::new("overtid", dec!(5000), 3))
            .unwrap()
            .unwrap();

        assert!(!budget.remove_adjustment(other_id, adjustment_id));
        assert!(budget.remove_adjustment(income_id, adjustment_id));
        assert!(budget.income(income_id).unwrap().adjustments.is_empty());
    }

    // =========================================================================
    // freelance tests
    // =========================================================================

    #[test]
    fn freelance_caches_mva() {
        let mut budget = budget();

        let id = budget
            .add_freelance(&FreelanceDraft::new("Acme AS", "Nettside", dec!(40000)))
            .unwrap();
        budget
            .update_freelance(id, &FreelanceDraft::new("Acme AS", "Nettside", dec!(48000)))
            .unwrap();

        assert_eq!(budget.freelance()[0].mva, dec!(12000));
        assert_eq!(budget.total_freelance_income(), dec!(48000));
        assert_eq!(budget.total_freelance_mva(), dec!(12000));
    }

    // =========================================================================
    // expense tests
    // =========================================================================

    #[test]
    fn expense_totals() {
        let mut budget = budget();
        budget
            .add_expense(&ExpenseDraft::monthly("Husleie", "faste-utgifter", dec!(12000)))
            .unwrap();
        let mut amounts = vec![dec!(0); 12];
        amounts[11] = dec!(6000);
        budget
            .add_expense(&ExpenseDraft::with_amounts("Julegaver", "diverse", amounts))
            .unwrap();

        assert_eq!(budget.total_expenses(), dec!(12500));
        assert_eq!(budget.monthly_totals()[0], dec!(12000));
        assert_eq!(budget.monthly_totals()[11], dec!(18000));
        assert_eq!(budget.category_total(ExpenseCategory::Diverse), dec!(500));
        assert_eq!(budget.expenses_by_category(ExpenseCategory::MatUte).len(), 0);
    }

    #[test]
    fn expense_yearly_draft_is_spread() {
        let mut budget = budget();

        let id = budget
            .add_expense(&ExpenseDraft::yearly("Forsikring", "faste-utgifter", dec!(1200)))
            .unwrap();

        let expense = budget.expenses().iter().find(|e| e.id == id).unwrap();
        assert_eq!(expense.frequency, Frequency::Yearly);
        assert_eq!(Budget::yearly_expense_amount(expense), dec!(1200));
        assert_eq!(Budget::monthly_expense_amount(expense), dec!(100));
        assert!(!Budget::expense_varies(expense));
    }

    #[test]
    fn update_expense_replaces_fields() {
        let (mut budget, pending) = tracked();
        let id = budget
            .add_expense(&ExpenseDraft::monthly("Mat", "mat-inne", dec!(4000)))
            .unwrap();

        let result = budget.update_expense(id, &ExpenseDraft::monthly("Restaurant", "mat-ute", dec!(1500)));

        assert_eq!(result, Ok(true));
        assert_eq!(budget.expenses()[0].category, ExpenseCategory::MatUte);
        assert_eq!(pending.take(), BTreeSet::from([Collection::Expenses]));
    }

    // =========================================================================
    // settings tests
    // =========================================================================

    #[test]
    fn settings_are_clamped() {
        let mut budget = budget();

        budget.set_enk_expenses(dec!(-500));
        budget.set_global_tax_percentage(dec!(140));

        assert_eq!(budget.enk_expenses(), dec!(0));
        assert_eq!(budget.global_tax_percentage(), dec!(100));

        budget.set_enk_expenses(dec!(1000000000000000000000000000));
        assert_eq!(budget.enk_expenses(), crate::validation::MAX_AMOUNT);
    }

    #[test]
    fn oversized_income_is_rejected_and_tax_still_computes() {
        let mut budget = budget();

        let result = budget.add_income(&IncomeDraft::new(
            "Jobb",
            dec!(1000000000000000000000000000),
            dec!(100),
        ));

        assert!(matches!(result, Err(ValidationError::AmountTooLarge { .. })));
        assert!(budget.incomes().is_empty());
        assert_eq!(budget.combined_tax().total_tax, dec!(0));
    }

    #[test]
    fn largest_accepted_amounts_do_not_overflow() {
        let mut budget = budget();
        let max = crate::validation::MAX_AMOUNT;
        let income_id = budget
            .add_income(&IncomeDraft::new("Jobb", max, dec!(100)))
            .unwrap();
        budget
            .add_adjustment(income_id, &AdjustmentDraft::new("bonus", max, 12))
            .unwrap();
        budget
            .add_freelance(&FreelanceDraft::new("Kunde", "", max))
            .unwrap();
        budget
            .add_expense(&ExpenseDraft::monthly("Husleie", "faste-utgifter", max))
            .unwrap();

        let breakdown = budget.combined_tax();

        assert!(breakdown.total_tax > dec!(0));
        assert!(budget.savings_rate() < dec!(100));
    }

    #[test]
    fn setters_mark_their_collection() {
        let (mut budget, pending) = tracked();

        budget.set_global_tax_method(TaxMethod::Prosenttrekk);
        budget.set_global_tax_percentage(dec!(30));

        assert_eq!(
            pending.take(),
            BTreeSet::from([Collection::TaxMethod, Collection::TaxPercentage])
        );
    }

    // =========================================================================
    // derived figure tests
    // =========================================================================

    #[test]
    fn combined_tax_uses_budget_state() {
        let mut budget = budget();
        budget
            .add_income(&IncomeDraft::new("Jobb", dec!(600000), dec!(100)))
            .unwrap();
        budget
            .add_freelance(&FreelanceDraft::new("Acme AS", "Oppdrag", dec!(100000)))
            .unwrap();
        budget.set_enk_expenses(dec!(20000));

        let result = budget.combined_tax();

        assert_eq!(result.enk_gross, dec!(100000));
        assert_eq!(result.enk_net, dec!(80000));
        assert_eq!(result.total_personinntekt, dec!(680000));
    }

    #[test]
    fn monthly_income_and_savings() {
        let mut budget = budget();
        budget
            .add_income(&IncomeDraft::new("Jobb", dec!(600000), dec!(100)).prosenttrekk(Some(dec!(30))))
            .unwrap();
        budget
            .add_expense(&ExpenseDraft::monthly("Husleie", "faste-utgifter", dec!(14000)))
            .unwrap();

        // 600000 * 0.70 / 12 = 35000 net per month
        assert_eq!(budget.total_gross_income(), dec!(50000));
        assert_eq!(budget.total_net_income(), dec!(35000));
        assert_eq!(budget.monthly_savings(), dec!(21000));
        assert_eq!(budget.savings_rate(), dec!(60));
    }

    #[test]
    fn savings_rate_without_income_is_zero() {
        let mut budget = budget();
        budget
            .add_expense(&ExpenseDraft::monthly("Husleie", "faste-utgifter", dec!(14000)))
            .unwrap();

        assert_eq!(budget.savings_rate(), dec!(0));
    }
}
