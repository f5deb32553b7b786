//! Loading and saving a [`Budget`] through a [`BudgetRepository`].

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use super::repository::{BudgetRepository, StorageKey, has_key, load_or_default, save};
use crate::budget::{Budget, Collection, PendingSaves};
use crate::migration::{
    CURRENT_SCHEMA_VERSION, LEGACY_SCHEMA_VERSION, StoredExpense, StoredFreelance, StoredIncome,
    upgrade_expense, upgrade_freelance, upgrade_income,
};
use crate::models::{TaxMethod, TaxYearRules};
use crate::validation::{clamp_amount, clamp_percentage};

impl From<Collection> for StorageKey {
    fn from(collection: Collection) -> Self {
        match collection {
            Collection::Incomes => Self::Incomes,
            Collection::Freelance => Self::Freelance,
            Collection::Expenses => Self::Expenses,
            Collection::EnkExpenses => Self::EnkExpenses,
            Collection::TaxMethod => Self::TaxMethod,
            Collection::TaxPercentage => Self::TaxPercentage,
        }
    }
}

impl Budget {
    /// Loads every record, upgrading older stored shapes.
    ///
    /// Unreadable records fall back to their defaults. When the stored
    /// schema is older than [`CURRENT_SCHEMA_VERSION`] the upgraded budget
    /// is written back once, followed by the new version number.
    pub async fn load(
        repo: &dyn BudgetRepository,
        rules: TaxYearRules,
    ) -> Self {
        let version: u32 =
            load_or_default(repo, StorageKey::SchemaVersion, LEGACY_SCHEMA_VERSION).await;

        let incomes: Vec<StoredIncome> =
            load_or_default(repo, StorageKey::Incomes, Vec::new()).await;
        let freelance: Vec<StoredFreelance> =
            load_or_default(repo, StorageKey::Freelance, Vec::new()).await;
        let expenses: Vec<StoredExpense> =
            load_or_default(repo, StorageKey::Expenses, Vec::new()).await;
        let enk_expenses: Decimal =
            load_or_default(repo, StorageKey::EnkExpenses, Decimal::ZERO).await;
        let tax_method: TaxMethod =
            load_or_default(repo, StorageKey::TaxMethod, TaxMethod::default()).await;
        let tax_percentage: Decimal =
            load_or_default(repo, StorageKey::TaxPercentage, rules.default_tax_percentage).await;

        let mut budget = Budget::new(rules);
        budget.incomes = incomes
            .into_iter()
            .map(|stored| upgrade_income(stored, &budget.rules))
            .collect();
        budget.freelance = freelance
            .into_iter()
            .map(|stored| upgrade_freelance(stored, budget.rules.mva_rate))
            .collect();
        budget.expenses = expenses.into_iter().map(upgrade_expense).collect();
        budget.enk_expenses = clamp_amount(enk_expenses);
        budget.global_tax_method = tax_method;
        budget.global_tax_percentage = clamp_percentage(tax_percentage);

        debug!(
            schema_version = version,
            incomes = budget.incomes.len(),
            freelance = budget.freelance.len(),
            expenses = budget.expenses.len(),
            "budget loaded"
        );

        if version < CURRENT_SCHEMA_VERSION {
            budget.upgrade_storage(repo, version).await;
        }

        budget
    }

    async fn upgrade_storage(
        &self,
        repo: &dyn BudgetRepository,
        from: u32,
    ) {
        let mut has_records = false;
        for collection in Collection::ALL {
            has_records |= has_key(repo, collection.into()).await;
        }

        if has_records {
            info!(from, to = CURRENT_SCHEMA_VERSION, "upgrading stored budget");
            if !self.save_all(repo).await {
                warn!("upgraded budget could not be written back; keeping old schema version");
                return;
            }
        }
        if !save(repo, StorageKey::SchemaVersion, &CURRENT_SCHEMA_VERSION).await {
            warn!(from, "schema version could not be written; upgrade will be retried");
        }
    }

    /// Writes one collection in its stored shape.
    pub async fn save_collection(
        &self,
        repo: &dyn BudgetRepository,
        collection: Collection,
    ) -> bool {
        let key = StorageKey::from(collection);
        match collection {
            Collection::Incomes => {
                let stored: Vec<StoredIncome> = self.incomes.iter().map(StoredIncome::from).collect();
                save(repo, key, &stored).await
            }
            Collection::Freelance => {
                let stored: Vec<StoredFreelance> =
                    self.freelance.iter().map(StoredFreelance::from).collect();
                save(repo, key, &stored).await
            }
            Collection::Expenses => {
                let stored: Vec<StoredExpense> =
                    self.expenses.iter().map(StoredExpense::from).collect();
                save(repo, key, &stored).await
            }
            Collection::EnkExpenses => save(repo, key, &self.enk_expenses).await,
            Collection::TaxMethod => save(repo, key, &self.global_tax_method).await,
            Collection::TaxPercentage => save(repo, key, &self.global_tax_percentage).await,
        }
    }

    /// Writes every collection. Returns `false` if any write failed; the
    /// remaining collections are still attempted.
    pub async fn save_all(
        &self,
        repo: &dyn BudgetRepository,
    ) -> bool {
        let mut ok = true;
        for collection in Collection::ALL {
            ok &= self.save_collection(repo, collection).await;
        }
        ok
    }

    /// Flushes the collections marked dirty in `pending`.
    ///
    /// Collections that fail to save are marked dirty again.
    pub async fn save_pending(
        &self,
        repo: &dyn BudgetRepository,
        pending: &PendingSaves,
    ) -> bool {
        let mut ok = true;
        for collection in pending.take() {
            if !self.save_collection(repo, collection).await {
                pending.mark(collection);
                ok = false;
            }
        }
        ok
    }
}
