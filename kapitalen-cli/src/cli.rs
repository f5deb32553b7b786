use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use kapitalen_core::{AdjustmentType, FerieUker, TaxMethod};
use rust_decimal::Decimal;

use crate::utils::amount_arg;

/// Norwegian personal tax and budget calculator.
///
/// Keeps incomes, ENK invoices and expenses in a local store and estimates
/// the year's tax against what is being withheld.
#[derive(Debug, Parser)]
#[command(name = "kapitalen", version)]
pub struct Cli {
    /// Configuration file (default: ./kapitalen.toml, if present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Storage backend (`sqlite` or `memory`).
    #[arg(long, global = true)]
    pub backend: Option<String>,

    /// Storage connection string. For SQLite a file path or `:memory:`.
    #[arg(long, global = true)]
    pub db: Option<String>,

    /// Log filter, e.g. `debug` or `kapitalen_core=debug,info`.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Income year.
    #[arg(long, global = true)]
    pub year: Option<i32>,

    /// Trinnskatt schedule CSV (`tax_year,threshold,rate`).
    #[arg(long, global = true)]
    pub schedule: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the yearly tax breakdown and monthly budget.
    Summary,

    /// Manage employment incomes.
    Income {
        #[command(subcommand)]
        action: IncomeCommand,
    },

    /// Manage bonus, overtime and other additions to an income.
    Adjustment {
        #[command(subcommand)]
        action: AdjustmentCommand,
    },

    /// Manage ENK invoices.
    Freelance {
        #[command(subcommand)]
        action: FreelanceCommand,
    },

    /// Manage household expenses.
    Expense {
        #[command(subcommand)]
        action: ExpenseCommand,
    },

    /// Show or change the global withholding settings.
    Settings(SettingsArgs),

    /// Add every income in a CSV file.
    Import { path: PathBuf },

    /// Delete all stored budget data.
    Clear {
        /// Confirm deletion.
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum MethodArg {
    #[default]
    Tabelltrekk,
    Prosenttrekk,
}

impl From<MethodArg> for TaxMethod {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Tabelltrekk => TaxMethod::Tabelltrekk,
            MethodArg::Prosenttrekk => TaxMethod::Prosenttrekk,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum FerieArg {
    #[default]
    #[value(name = "5")]
    Five,
    #[value(name = "4+1")]
    FourPlusOne,
}

impl From<FerieArg> for FerieUker {
    fn from(arg: FerieArg) -> Self {
        match arg {
            FerieArg::Five => FerieUker::Five,
            FerieArg::FourPlusOne => FerieUker::FourPlusOne,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Bonus,
    Overtid,
    Annet,
}

impl From<KindArg> for AdjustmentType {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Bonus => AdjustmentType::Bonus,
            KindArg::Overtid => AdjustmentType::Overtid,
            KindArg::Annet => AdjustmentType::Annet,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct IncomeArgs {
    /// Employer or job title.
    pub name: String,

    /// Full-time yearly salary (årslønn).
    #[arg(value_parser = amount_arg)]
    pub yearly_amount: Decimal,

    /// Stillingsprosent, 0-100.
    #[arg(long, default_value = "100", value_parser = amount_arg)]
    pub percentage: Decimal,

    #[arg(long, value_enum, default_value_t)]
    pub method: MethodArg,

    /// Prosenttrekk percentage (defaults to 35).
    #[arg(long, value_parser = amount_arg)]
    pub tax_percentage: Option<Decimal>,

    /// Trekkprosent from the payslip, for tabelltrekk.
    #[arg(long, value_parser = amount_arg)]
    pub trekkprosent: Option<Decimal>,

    /// First day of employment this year (YYYY-MM-DD).
    #[arg(long, requires = "end")]
    pub start: Option<String>,

    /// Last day of employment this year (YYYY-MM-DD).
    #[arg(long, requires = "start")]
    pub end: Option<String>,

    /// Vacation weeks.
    #[arg(long, value_enum, default_value_t)]
    pub ferie: FerieArg,

    /// Apply the over-60 feriepenger rate.
    #[arg(long)]
    pub over_60: bool,
}

#[derive(Debug, Subcommand)]
pub enum IncomeCommand {
    Add(IncomeArgs),
    List,
    /// Replace an income's fields, keeping its adjustments.
    Update {
        /// Id or unique id prefix.
        id: String,
        #[command(flatten)]
        args: IncomeArgs,
    },
    Remove {
        /// Id or unique id prefix.
        id: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum AdjustmentCommand {
    Add {
        /// Income id or unique prefix.
        income: String,
        #[arg(value_enum)]
        kind: KindArg,
        #[arg(value_parser = amount_arg)]
        amount: Decimal,
        /// Month paid, 1-12.
        month: u32,
        #[arg(long)]
        description: Option<String>,
        /// Override whether the amount earns feriepenger.
        #[arg(long)]
        feriepenger: Option<bool>,
    },
    Remove {
        income: String,
        adjustment: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum FreelanceCommand {
    Add {
        client: String,
        /// Invoice amount excluding MVA.
        #[arg(value_parser = amount_arg)]
        amount: Decimal,
        #[arg(long, default_value = "")]
        description: String,
    },
    List,
    Remove {
        id: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum ExpenseCommand {
    Add {
        name: String,
        /// One of faste-utgifter, abonnement, mat-inne, mat-ute, diverse.
        category: String,
        /// Monthly amount, or the yearly total with `--yearly`.
        #[arg(value_parser = amount_arg, required_unless_present = "months")]
        amount: Option<Decimal>,
        /// Treat the amount as a yearly total spread over twelve months.
        #[arg(long, conflicts_with = "months")]
        yearly: bool,
        /// Twelve amounts separated by `;`, January first.
        #[arg(long, value_delimiter = ';', value_parser = amount_arg)]
        months: Option<Vec<Decimal>>,
    },
    List,
    Remove {
        id: String,
    },
}

#[derive(Debug, Clone, Args)]
pub struct SettingsArgs {
    /// Withholding method applied to ENK income.
    #[arg(long, value_enum)]
    pub method: Option<MethodArg>,

    /// Prosenttrekk percentage applied to ENK income.
    #[arg(long, value_parser = amount_arg)]
    pub percentage: Option<Decimal>,

    /// Deductible ENK business expenses for the year.
    #[arg(long, value_parser = amount_arg)]
    pub enk_expenses: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn income_add_parses_norwegian_amounts() {
        let cli = Cli::parse_from([
            "kapitalen",
            "income",
            "add",
            "Fast jobb",
            "600 000",
            "--method",
            "prosenttrekk",
            "--tax-percentage",
            "32,5",
            "--ferie",
            "4+1",
        ]);

        let Command::Income {
            action: IncomeCommand::Add(args),
        } = cli.command
        else {
            panic!("expected income add, got {:?}", cli.command);
        };
        assert_eq!(args.yearly_amount, dec!(600000));
        assert_eq!(args.percentage, dec!(100));
        assert_eq!(args.method, MethodArg::Prosenttrekk);
        assert_eq!(args.tax_percentage, Some(dec!(32.5)));
        assert_eq!(args.ferie, FerieArg::FourPlusOne);
    }

    #[test]
    fn start_requires_end() {
        let result = Cli::try_parse_from([
            "kapitalen",
            "income",
            "add",
            "Vikariat",
            "500000",
            "--start",
            "2026-03-01",
        ]);

        assert!(result.is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["kapitalen", "summary", "--backend", "memory", "--year", "2026"]);

        assert_eq!(cli.backend.as_deref(), Some("memory"));
        assert_eq!(cli.year, Some(2026));
    }

    #[test]
    fn expense_months_split_on_semicolon() {
        let cli = Cli::parse_from([
            "kapitalen",
            "expense",
            "add",
            "Strøm",
            "faste-utgifter",
            "--months",
            "900;800;700;500;400;300;300;300;400;600;800;900",
        ]);

        let Command::Expense {
            action: ExpenseCommand::Add { amount, months, .. },
        } = cli.command
        else {
            panic!("expected expense add");
        };
        assert_eq!(amount, None);
        assert_eq!(months.map(|m| m.len()), Some(12));
    }

    #[test]
    fn expense_needs_amount_or_months() {
        let result = Cli::try_parse_from(["kapitalen", "expense", "add", "Strøm", "faste-utgifter"]);

        assert!(result.is_err());
    }
}
