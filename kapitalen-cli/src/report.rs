//! Plain-text rendering of budgets, with Norwegian number formatting.

use chrono::NaiveDate;
use kapitalen_core::calculations::common::round_whole;
use kapitalen_core::calculations::months_worked;
use kapitalen_core::{Budget, ExpenseCategory, Income, Withholding, WorkPeriod};
use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

const LABEL_WIDTH: usize = 30;
const VALUE_WIDTH: usize = 16;

const MONTHS: [&str; 12] = [
    "Januar",
    "Februar",
    "Mars",
    "April",
    "Mai",
    "Juni",
    "Juli",
    "August",
    "September",
    "Oktober",
    "November",
    "Desember",
];

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(c);
    }
    grouped
}

/// Whole kroner with a space as thousands separator: `12 835`.
pub fn format_number(amount: Decimal) -> String {
    let rounded = round_whole(amount);
    let digits = group_thousands(&rounded.abs().trunc().to_string());
    if rounded < Decimal::ZERO {
        format!("-{digits}")
    } else {
        digits
    }
}

/// `12 835 kr`
pub fn format_currency(amount: Decimal) -> String {
    format!("{} kr", format_number(amount))
}

/// A 0-100 percentage with one decimal and a decimal comma: `24,0 %`.
pub fn format_percent(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
    format!("{rounded:.1} %").replace('.', ",")
}

/// Norwegian month name for 1-12, empty otherwise.
pub fn format_month(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|i| MONTHS.get(i as usize))
        .copied()
        .unwrap_or("")
}

/// `DD.MM.YYYY`
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

/// First eight hex digits, enough to address a record from the CLI.
pub fn short_id(id: Uuid) -> String {
    id.simple().to_string()[..8].to_string()
}

fn line(
    out: &mut String,
    label: &str,
    value: &str,
) {
    out.push_str(&format!("{label:<LABEL_WIDTH$}{value:>VALUE_WIDTH$}\n"));
}

fn heading(
    out: &mut String,
    title: &str,
) {
    if !out.is_empty() {
        out.push('\n');
    }
    out.push_str(title);
    out.push('\n');
    out.push_str(&"-".repeat(LABEL_WIDTH + VALUE_WIDTH));
    out.push('\n');
}

fn describe_period(income: &Income) -> String {
    match income.period {
        WorkPeriod::FullYear => "hele året".to_string(),
        WorkPeriod::Custom { start, end } => format!(
            "{} - {} ({} mnd)",
            format_date(start),
            format_date(end),
            months_worked(income)
        ),
    }
}

fn describe_withholding(withholding: &Withholding) -> String {
    match withholding {
        Withholding::Prosenttrekk { percent } => {
            format!("prosenttrekk {}", format_percent(*percent))
        }
        Withholding::Tabelltrekk {
            reported_percent: Some(percent),
        } => format!("tabelltrekk {}", format_percent(*percent)),
        Withholding::Tabelltrekk {
            reported_percent: None,
        } => "tabelltrekk (estimert)".to_string(),
    }
}

/// Yearly tax breakdown followed by the monthly budget.
pub fn render_summary(budget: &Budget) -> String {
    let tax = budget.combined_tax();
    let rules = budget.rules();
    let mut out = String::new();

    heading(&mut out, &format!("Skatteberegning {}", rules.tax_year));
    line(&mut out, "Lønnsinntekt", &format_currency(tax.lonn_gross));
    line(&mut out, "  Minstefradrag", &format_currency(-tax.minstefradrag));
    if !tax.enk_gross.is_zero() || !tax.enk_expenses.is_zero() {
        line(&mut out, "ENK brutto", &format_currency(tax.enk_gross));
        line(&mut out, "  Driftskostnader", &format_currency(-tax.enk_expenses));
        line(&mut out, "ENK netto", &format_currency(tax.enk_net));
    }
    line(&mut out, "Personinntekt", &format_currency(tax.total_personinntekt));
    line(&mut out, "Personfradrag", &format_currency(-tax.personfradrag));
    line(&mut out, "Alminnelig inntekt", &format_currency(tax.alminnelig_inntekt));

    heading(&mut out, "Skatt");
    line(&mut out, "Trygdeavgift lønn", &format_currency(tax.trygdeavgift_lonn));
    if !tax.trygdeavgift_enk.is_zero() {
        line(&mut out, "Trygdeavgift næring", &format_currency(tax.trygdeavgift_enk));
    }
    line(&mut out, "Trinnskatt", &format_currency(tax.trinnskatt));
    for entry in &tax.trinnskatt_breakdown {
        let rate = rules
            .trinnskatt_brackets
            .get(entry.bracket)
            .map(|b| format_percent(b.rate * Decimal::ONE_HUNDRED))
            .unwrap_or_default();
        line(
            &mut out,
            &format!("  Trinn {} ({rate})", entry.bracket),
            &format_currency(entry.amount),
        );
    }
    line(&mut out, "Fellesskatt", &format_currency(tax.fellesskatt));
    line(&mut out, "Sum skatt", &format_currency(tax.total_tax));
    line(&mut out, "Effektiv skattesats", &format_percent(tax.effective_rate));

    heading(&mut out, "Skattetrekk");
    line(&mut out, "Trukket fra lønn", &format_currency(tax.skatt_fra_lonn));
    if !tax.skatt_fra_oppdrag.is_zero() {
        line(&mut out, "Satt av fra oppdrag", &format_currency(tax.skatt_fra_oppdrag));
    }
    line(&mut out, "Sum skattetrekk", &format_currency(tax.skattetrekk));
    let outcome = if tax.difference < Decimal::ZERO {
        "Restskatt"
    } else {
        "Til gode"
    };
    line(&mut out, outcome, &format_currency(tax.difference.abs()));
    line(&mut out, "Feriepenger", &format_currency(tax.total_feriepenger));
    line(&mut out, "Netto inntekt", &format_currency(tax.net_income));

    heading(&mut out, "Månedsbudsjett");
    line(&mut out, "Netto lønn per måned", &format_currency(budget.total_net_income()));
    for category in ExpenseCategory::ALL {
        let total = budget.category_total(category);
        if !total.is_zero() {
            line(&mut out, &format!("  {}", category.label()), &format_currency(-total));
        }
    }
    line(&mut out, "Utgifter per måned", &format_currency(budget.total_expenses()));
    line(&mut out, "Sparing per måned", &format_currency(budget.monthly_savings()));
    line(&mut out, "Sparerate", &format_percent(budget.savings_rate()));

    out
}

pub fn render_incomes(budget: &Budget) -> String {
    if budget.incomes().is_empty() {
        return "Ingen inntekter registrert.\n".to_string();
    }

    let mut out = String::new();
    for income in budget.incomes() {
        out.push_str(&format!(
            "{}  {}  {} ({}), {}, {}\n",
            short_id(income.id),
            income.name,
            format_currency(income.yearly_amount),
            format_percent(income.employee_percentage),
            describe_withholding(&income.withholding),
            describe_period(income),
        ));
        for adjustment in &income.adjustments {
            out.push_str(&format!(
                "    {}  {} {} i {}\n",
                short_id(adjustment.id),
                adjustment.kind.as_str(),
                format_currency(adjustment.amount),
                format_month(adjustment.month).to_lowercase(),
            ));
        }
    }
    out
}

pub fn render_freelance(budget: &Budget) -> String {
    if budget.freelance().is_empty() {
        return "Ingen oppdrag registrert.\n".to_string();
    }

    let mut out = String::new();
    for invoice in budget.freelance() {
        out.push_str(&format!(
            "{}  {}  {} + mva {}\n",
            short_id(invoice.id),
            invoice.client,
            format_currency(invoice.amount),
            format_currency(invoice.mva),
        ));
    }
    line(
        &mut out,
        "Sum eks. mva",
        &format_currency(budget.total_freelance_income()),
    );
    line(&mut out, "Sum mva", &format_currency(budget.total_freelance_mva()));
    out
}

pub fn render_expenses(budget: &Budget) -> String {
    if budget.expenses().is_empty() {
        return "Ingen utgifter registrert.\n".to_string();
    }

    let mut out = String::new();
    for expense in budget.expenses() {
        let amount = if expense.varies() {
            format!("snitt {} per måned", format_currency(expense.monthly_average()))
        } else {
            format!("{} per måned", format_currency(expense.monthly_average()))
        };
        out.push_str(&format!(
            "{}  {} [{}]  {}\n",
            short_id(expense.id),
            expense.name,
            expense.category.label(),
            amount,
        ));
    }

    heading(&mut out, "Per måned");
    for (index, total) in budget.monthly_totals().iter().enumerate() {
        line(&mut out, MONTHS[index], &format_currency(*total));
    }
    out
}

pub fn render_settings(budget: &Budget) -> String {
    let mut out = String::new();
    line(&mut out, "Trekkmetode (lønn)", budget.global_tax_method().as_str());
    line(
        &mut out,
        "Trekkprosent (lønn)",
        &format_percent(budget.global_tax_percentage()),
    );
    line(
        &mut out,
        "Driftskostnader (ENK)",
        &format_currency(budget.enk_expenses()),
    );
    out
}
