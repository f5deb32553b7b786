//! Wires configuration, storage and the budget together for one command.

use std::fs::File;

use anyhow::{Context, Result, bail};
use kapitalen_core::db::{MemoryRepositoryFactory, clear_all};
use kapitalen_core::{
    AdjustmentDraft, AdjustmentType, Budget, BudgetRepository, ExpenseDraft, FreelanceDraft,
    IncomeDraft, PendingSaves, RepositoryRegistry, TaxMethod, TaxYearRules,
};
use kapitalen_data::ScheduleLoader;
use kapitalen_db_sqlite::SqliteRepositoryFactory;
use tracing::{debug, info};
use uuid::Uuid;

use crate::cli::{
    AdjustmentCommand, Cli, Command, ExpenseCommand, FreelanceCommand, IncomeArgs, IncomeCommand,
    SettingsArgs,
};
use crate::config::{AppConfig, TaxConfig};
use crate::{csv_loader, report};

/// Registry with every backend this binary ships with.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));
    registry.register(Box::new(MemoryRepositoryFactory));
    registry
}

/// Command-line flags take precedence over the configuration file.
pub fn apply_overrides(
    config: &mut AppConfig,
    cli: &Cli,
) {
    if let Some(backend) = &cli.backend {
        config.database.backend = backend.clone();
    }
    if let Some(db) = &cli.db {
        config.database.connection_string = db.clone();
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    if let Some(year) = cli.year {
        config.tax.year = year;
    }
    if let Some(schedule) = &cli.schedule {
        config.tax.schedule = Some(schedule.clone());
    }
}

/// Rules for the configured year.
///
/// A schedule file replaces the trinnskatt brackets of the year's built-in
/// rules, or of the latest built-in year when the year has none.
pub fn resolve_rules(tax: &TaxConfig) -> Result<TaxYearRules> {
    let Some(path) = &tax.schedule else {
        return TaxYearRules::for_year(tax.year).cloned().with_context(|| {
            format!(
                "no built-in tax rules for {} (built in: {:?}); pass a trinnskatt schedule with --schedule",
                tax.year,
                TaxYearRules::supported_years()
            )
        });
    };

    let file = File::open(path)
        .with_context(|| format!("cannot open trinnskatt schedule '{}'", path.display()))?;
    let records = ScheduleLoader::parse(file)
        .with_context(|| format!("in trinnskatt schedule '{}'", path.display()))?;

    let base = TaxYearRules::for_year(tax.year)
        .or_else(|| {
            TaxYearRules::supported_years()
                .last()
                .and_then(|year| TaxYearRules::for_year(*year))
        })
        .context("no built-in tax rules to extend")?;

    let rules = ScheduleLoader::into_rules(base, tax.year, &records)
        .with_context(|| format!("in trinnskatt schedule '{}'", path.display()))?;
    info!(
        year = rules.tax_year,
        brackets = rules.trinnskatt_brackets.len(),
        "using trinnskatt schedule"
    );
    Ok(rules)
}

/// Finds the one id in `ids` that starts with `prefix`.
fn resolve_id(
    what: &str,
    prefix: &str,
    ids: impl IntoIterator<Item = Uuid>,
) -> Result<Uuid> {
    let needle = prefix.trim().to_lowercase().replace('-', "");
    if needle.is_empty() {
        bail!("{what} id cannot be empty");
    }

    let matches: Vec<Uuid> = ids
        .into_iter()
        .filter(|id| id.simple().to_string().starts_with(&needle))
        .collect();
    match matches.as_slice() {
        [id] => Ok(*id),
        [] => bail!("no {what} with id '{prefix}'"),
        _ => bail!("{what} id '{prefix}' is ambiguous ({} matches)", matches.len()),
    }
}

fn income_draft(args: IncomeArgs) -> IncomeDraft {
    let mut draft = IncomeDraft::new(args.name, args.yearly_amount, args.percentage);
    draft.tax_method = args.method.into();
    match draft.tax_method {
        TaxMethod::Prosenttrekk => draft.custom_tax_percentage = args.tax_percentage,
        TaxMethod::Tabelltrekk => draft.trekkprosent = args.trekkprosent,
    }
    if let (Some(start), Some(end)) = (args.start, args.end) {
        draft = draft.custom_period(start, end);
    }
    draft.ferie_uker = args.ferie.into();
    draft.is_over_60 = args.over_60;
    draft
}

fn income_command(
    budget: &mut Budget,
    action: IncomeCommand,
) -> Result<String> {
    match action {
        IncomeCommand::Add(args) => {
            let id = budget.add_income(&income_draft(args))?;
            info!(income_id = %id, "income added");
            Ok(format!("La til inntekt {}\n", report::short_id(id)))
        }
        IncomeCommand::List => Ok(report::render_incomes(budget)),
        IncomeCommand::Update { id, args } => {
            let id = resolve_id("income", &id, budget.incomes().iter().map(|i| i.id))?;
            budget.update_income(id, &income_draft(args))?;
            info!(income_id = %id, "income updated");
            Ok(format!("Oppdaterte inntekt {}\n", report::short_id(id)))
        }
        IncomeCommand::Remove { id } => {
            let id = resolve_id("income", &id, budget.incomes().iter().map(|i| i.id))?;
            budget.remove_income(id);
            info!(income_id = %id, "income removed");
            Ok(format!("Slettet inntekt {}\n", report::short_id(id)))
        }
    }
}

fn adjustment_command(
    budget: &mut Budget,
    action: AdjustmentCommand,
) -> Result<String> {
    match action {
        AdjustmentCommand::Add {
            income,
            kind,
            amount,
            month,
            description,
            feriepenger,
        } => {
            let income_id = resolve_id("income", &income, budget.incomes().iter().map(|i| i.id))?;
            let mut draft = AdjustmentDraft::new(AdjustmentType::from(kind).as_str(), amount, month);
            draft.description = description;
            draft.affects_feriepenger = feriepenger;

            let id = budget
                .add_adjustment(income_id, &draft)?
                .with_context(|| format!("no income with id '{income}'"))?;
            info!(%income_id, adjustment_id = %id, "adjustment added");
            Ok(format!("La til tillegg {}\n", report::short_id(id)))
        }
        AdjustmentCommand::Remove { income, adjustment } => {
            let income_id = resolve_id("income", &income, budget.incomes().iter().map(|i| i.id))?;
            let adjustments: Vec<Uuid> = budget
                .income(income_id)
                .map(|i| i.adjustments.iter().map(|a| a.id).collect())
                .unwrap_or_default();
            let adjustment_id = resolve_id("adjustment", &adjustment, adjustments)?;

            budget.remove_adjustment(income_id, adjustment_id);
            info!(%income_id, %adjustment_id, "adjustment removed");
            Ok(format!("Slettet tillegg {}\n", report::short_id(adjustment_id)))
        }
    }
}

fn freelance_command(
    budget: &mut Budget,
    action: FreelanceCommand,
) -> Result<String> {
    match action {
        FreelanceCommand::Add {
            client,
            amount,
            description,
        } => {
            let id = budget.add_freelance(&FreelanceDraft::new(client, description, amount))?;
            info!(freelance_id = %id, "freelance income added");
            Ok(format!("La til oppdrag {}\n", report::short_id(id)))
        }
        FreelanceCommand::List => Ok(report::render_freelance(budget)),
        FreelanceCommand::Remove { id } => {
            let id = resolve_id("invoice", &id, budget.freelance().iter().map(|f| f.id))?;
            budget.remove_freelance(id);
            info!(freelance_id = %id, "freelance income removed");
            Ok(format!("Slettet oppdrag {}\n", report::short_id(id)))
        }
    }
}

fn expense_command(
    budget: &mut Budget,
    action: ExpenseCommand,
) -> Result<String> {
    match action {
        ExpenseCommand::Add {
            name,
            category,
            amount,
            yearly,
            months,
        } => {
            let draft = match (months, amount) {
                (Some(months), _) => ExpenseDraft::with_amounts(name, category, months),
                (None, Some(amount)) if yearly => ExpenseDraft::yearly(name, category, amount),
                (None, Some(amount)) => ExpenseDraft::monthly(name, category, amount),
                (None, None) => bail!("an expense needs an amount or --months"),
            };
            let id = budget.add_expense(&draft)?;
            info!(expense_id = %id, "expense added");
            Ok(format!("La til utgift {}\n", report::short_id(id)))
        }
        ExpenseCommand::List => Ok(report::render_expenses(budget)),
        ExpenseCommand::Remove { id } => {
            let id = resolve_id("expense", &id, budget.expenses().iter().map(|e| e.id))?;
            budget.remove_expense(id);
            info!(expense_id = %id, "expense removed");
            Ok(format!("Slettet utgift {}\n", report::short_id(id)))
        }
    }
}

fn settings_command(
    budget: &mut Budget,
    args: SettingsArgs,
) -> String {
    if let Some(method) = args.method {
        budget.set_global_tax_method(method.into());
    }
    if let Some(percentage) = args.percentage {
        budget.set_global_tax_percentage(percentage);
    }
    if let Some(amount) = args.enk_expenses {
        budget.set_enk_expenses(amount);
    }
    report::render_settings(budget)
}

/// Applies `command` to `budget` and returns the text to print.
///
/// A failing command returns before every change is made, so callers must
/// not persist the budget after an error.
pub fn execute(
    budget: &mut Budget,
    command: Command,
) -> Result<String> {
    match command {
        Command::Summary => Ok(report::render_summary(budget)),
        Command::Income { action } => income_command(budget, action),
        Command::Adjustment { action } => adjustment_command(budget, action),
        Command::Freelance { action } => freelance_command(budget, action),
        Command::Expense { action } => expense_command(budget, action),
        Command::Settings(args) => Ok(settings_command(budget, args)),
        Command::Import { path } => {
            let drafts = csv_loader::load_from_file(&path)
                .with_context(|| format!("cannot import '{}'", path.display()))?;
            for (index, draft) in drafts.iter().enumerate() {
                budget
                    .add_income(draft)
                    .with_context(|| format!("row {} of '{}'", index + 1, path.display()))?;
            }
            info!(count = drafts.len(), path = %path.display(), "incomes imported");
            Ok(format!("Importerte {} inntekter\n", drafts.len()))
        }
        Command::Clear { .. } => bail!("clear operates on storage, not on a loaded budget"),
    }
}

/// Runs one command against an open store and returns the text to print.
///
/// Only the collections the command changed are written back.
pub async fn run_with(
    config: &AppConfig,
    repo: &dyn BudgetRepository,
    command: Command,
) -> Result<String> {
    if let Command::Clear { yes } = command {
        if !yes {
            bail!("refusing to delete all budget data without --yes");
        }
        if !clear_all(repo).await {
            bail!("could not delete all budget data");
        }
        info!("storage cleared");
        return Ok("Alle data er slettet.\n".to_string());
    }

    let rules = resolve_rules(&config.tax)?;
    let mut budget = Budget::load(repo, rules).await;
    let pending = PendingSaves::default();
    budget.on_change(pending.hook());

    let output = execute(&mut budget, command)?;

    if !pending.is_empty() {
        if !budget.save_pending(repo, &pending).await {
            bail!("some changes could not be saved: {:?}", pending.take());
        }
        debug!("changes saved");
    }
    Ok(output)
}

/// Entry point used by the binary, with `config` as read from disk.
pub async fn run(
    cli: Cli,
    mut config: AppConfig,
) -> Result<String> {
    apply_overrides(&mut config, &cli);

    debug!(
        backend = %config.database.backend,
        connection = %config.database.connection_string,
        "opening storage"
    );
    let registry = build_registry();
    let repo = registry
        .create(&config.database)
        .await
        .with_context(|| format!("cannot open '{}' storage", config.database.backend))?;

    run_with(&config, repo.as_ref(), cli.command).await
}
