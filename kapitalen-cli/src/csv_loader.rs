//! CSV import of employment incomes.
//!
//! ## CSV Format
//!
//! Headers are matched by name, so column order does not matter. Only
//! `name` and `yearly_amount` are required.
//!
//! | Column                | Required | Type    | Notes                                      |
//! |-----------------------|----------|---------|--------------------------------------------|
//! | `name`                | yes      | string  | Employer or job title                      |
//! | `yearly_amount`       | yes      | decimal | Full-time årslønn, e.g. `600000`           |
//! | `employee_percentage` | no       | decimal | Stillingsprosent 0-100, default `100`      |
//! | `tax_method`          | no       | string  | `tabelltrekk` (default) or `prosenttrekk`  |
//! | `tax_percentage`      | no       | decimal | Prosenttrekk percentage                    |
//! | `trekkprosent`        | no       | decimal | Tabelltrekk percentage from the payslip    |
//! | `start_date`          | no       | date    | `YYYY-MM-DD`; set with `end_date`          |
//! | `end_date`            | no       | date    | `YYYY-MM-DD`; set with `start_date`        |
//! | `ferie_uker`          | no       | string  | `5` (default) or `4+1`                     |
//! | `over_60`             | no       | bool    | `true` / `false`, default `false`          |
//!
//! ### Example
//!
//! ```csv
//! name,yearly_amount,employee_percentage,tax_method,tax_percentage,start_date,end_date
//! Fast jobb,600000,100,tabelltrekk,,,
//! Vikariat,480000,50,prosenttrekk,30,2026-03-01,2026-08-31
//! ```
//!
//! Rows become [`IncomeDraft`]s; amounts and dates are validated when the
//! drafts are added to a budget.

use std::path::Path;

use kapitalen_core::{FerieUker, IncomeDraft, PeriodType, TaxMethod};
use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct CsvRow {
    name: String,
    yearly_amount: Decimal,
    employee_percentage: Option<Decimal>,
    tax_method: Option<String>,
    tax_percentage: Option<Decimal>,
    trekkprosent: Option<Decimal>,
    start_date: Option<String>,
    end_date: Option<String>,
    ferie_uker: Option<String>,
    over_60: Option<bool>,
}

/// Errors that can occur while loading or converting CSV data.
///
/// Row numbers are 1-based, counting data rows only (header = row 0).
#[derive(Debug, thiserror::Error)]
pub enum CsvLoadError {
    #[error("cannot read CSV file: {0}")]
    Io(#[from] std::io::Error),

    /// Bad structure, missing required column, or a type mismatch.
    #[error("CSV parse error: {0}")]
    Parse(#[from] csv::Error),

    #[error("unrecognised tax method '{value}' on row {row}")]
    InvalidTaxMethod { value: String, row: usize },

    #[error("unrecognised ferie_uker '{value}' on row {row}")]
    InvalidFerieUker { value: String, row: usize },

    #[error("row {row} has only one of start_date and end_date")]
    IncompletePeriod { row: usize },
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn convert_row(
    row: CsvRow,
    row_number: usize,
) -> Result<IncomeDraft, CsvLoadError> {
    let tax_method = match non_empty(row.tax_method) {
        Some(value) => TaxMethod::parse(&value.to_lowercase()).ok_or(
            CsvLoadError::InvalidTaxMethod {
                value,
                row: row_number,
            },
        )?,
        None => TaxMethod::default(),
    };

    let ferie_uker = match non_empty(row.ferie_uker) {
        Some(value) => FerieUker::parse(&value).ok_or(CsvLoadError::InvalidFerieUker {
            value,
            row: row_number,
        })?,
        None => FerieUker::default(),
    };

    let (period_type, start_date, end_date) =
        match (non_empty(row.start_date), non_empty(row.end_date)) {
            (Some(start), Some(end)) => (PeriodType::Custom, Some(start), Some(end)),
            (None, None) => (PeriodType::FullYear, None, None),
            _ => return Err(CsvLoadError::IncompletePeriod { row: row_number }),
        };

    let (custom_tax_percentage, trekkprosent) = match tax_method {
        TaxMethod::Prosenttrekk => (row.tax_percentage, None),
        TaxMethod::Tabelltrekk => (None, row.trekkprosent),
    };

    Ok(IncomeDraft {
        name: row.name,
        yearly_amount: row.yearly_amount,
        employee_percentage: row.employee_percentage.unwrap_or(Decimal::ONE_HUNDRED),
        tax_method,
        custom_tax_percentage,
        trekkprosent,
        period_type,
        start_date,
        end_date,
        ferie_uker,
        is_over_60: row.over_60.unwrap_or(false),
    })
}

/// Parse CSV text and return one [`IncomeDraft`] per row, in file order.
///
/// # Errors
///
/// * [`CsvLoadError::Parse`] if the CSV is structurally invalid or a
///   required field cannot be deserialised.
/// * A row-numbered variant for unrecognised codes or half-specified
///   periods.
pub fn load_from_str(input: &str) -> Result<Vec<IncomeDraft>, CsvLoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(false)
        .from_reader(input.as_bytes());

    reader
        .deserialize::<CsvRow>()
        .enumerate()
        .map(|(idx, result)| {
            let row = result?;
            convert_row(row, idx + 1)
        })
        .collect()
}

/// Read a file from disk and delegate to [`load_from_str`].
pub fn load_from_file(path: &Path) -> Result<Vec<IncomeDraft>, CsvLoadError> {
    let contents = std::fs::read_to_string(path)?;
    load_from_str(&contents)
}
