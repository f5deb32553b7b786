use std::collections::BTreeSet;
use std::io::Read;

use kapitalen_core::{RulesError, TaxYearRules, TrinnskattBracket};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur when loading a trinnskatt schedule.
#[derive(Debug, Error)]
pub enum ScheduleLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("No trinnskatt brackets for tax year {0}")]
    NoRecordsForYear(i32),

    #[error("Invalid schedule: {0}")]
    Rules(#[from] RulesError),
}

impl From<csv::Error> for ScheduleLoaderError {
    fn from(err: csv::Error) -> Self {
        ScheduleLoaderError::CsvParse(err.to_string())
    }
}

/// A single row of a trinnskatt schedule CSV.
///
/// - `tax_year`: the income year (e.g. 2026)
/// - `threshold`: lower bound of the bracket in kroner
/// - `rate`: marginal rate as a fraction (e.g. 0.017 for 1.7%)
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct ScheduleRecord {
    pub tax_year: i32,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub threshold: Decimal,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub rate: Decimal,
}

fn deserialize_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.trim().parse::<Decimal>().map_err(serde::de::Error::custom)
}

/// Builds [`TaxYearRules`] for new income years from CSV schedules.
///
/// Only the trinnskatt brackets change from year to year in the CSV; flat
/// rates and deductions are carried over from a base rule set.
pub struct ScheduleLoader;

impl ScheduleLoader {
    /// Parse schedule records from a CSV reader with a
    /// `tax_year,threshold,rate` header.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<ScheduleRecord>, ScheduleLoaderError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: ScheduleRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Distinct tax years present in `records`, ascending.
    pub fn years(records: &[ScheduleRecord]) -> Vec<i32> {
        records
            .iter()
            .map(|r| r.tax_year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Derive the rule set for `tax_year` from `base` and the matching
    /// records.
    ///
    /// Rows may appear in any order. A schedule without a zero-threshold
    /// row gets the 0% base bracket added in front.
    pub fn into_rules(
        base: &TaxYearRules,
        tax_year: i32,
        records: &[ScheduleRecord],
    ) -> Result<TaxYearRules, ScheduleLoaderError> {
        let mut brackets: Vec<TrinnskattBracket> = records
            .iter()
            .filter(|r| r.tax_year == tax_year)
            .map(|r| TrinnskattBracket {
                threshold: r.threshold,
                rate: r.rate,
            })
            .collect();

        if brackets.is_empty() {
            return Err(ScheduleLoaderError::NoRecordsForYear(tax_year));
        }

        brackets.sort_by_key(|b| b.threshold);
        if brackets[0].threshold > Decimal::ZERO {
            brackets.insert(
                0,
                TrinnskattBracket {
                    threshold: Decimal::ZERO,
                    rate: Decimal::ZERO,
                },
            );
        }

        debug!(tax_year, brackets = brackets.len(), "trinnskatt schedule loaded");
        Ok(base.with_trinnskatt(tax_year, brackets)?)
    }
}
