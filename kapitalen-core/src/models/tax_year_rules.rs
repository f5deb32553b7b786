use std::sync::LazyLock;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::income::FerieUker;

/// One step of the trinnskatt schedule.
///
/// `threshold` is the lower bound of the bracket; the upper bound is the
/// threshold of the next bracket (or unbounded for the last one).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrinnskattBracket {
    pub threshold: Decimal,
    pub rate: Decimal,
}

/// Coarse withholding bracket used to approximate tabelltrekk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithholdingBracket {
    pub threshold: Decimal,
    pub rate: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeriepengerRate {
    pub standard: Decimal,
    pub over_60: Decimal,
}

/// Holiday pay rates keyed by vacation entitlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeriepengerRates {
    pub four_plus_one: FeriepengerRate,
    pub five: FeriepengerRate,
}

impl FeriepengerRates {
    pub fn rate(
        &self,
        ferie_uker: FerieUker,
        is_over_60: bool,
    ) -> Decimal {
        let rates = match ferie_uker {
            FerieUker::FourPlusOne => self.four_plus_one,
            FerieUker::Five => self.five,
        };
        if is_over_60 {
            rates.over_60
        } else {
            rates.standard
        }
    }
}

/// Errors raised when a rule set violates the schedule invariants.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RulesError {
    #[error("trinnskatt schedule is empty")]
    EmptySchedule,

    #[error("first trinnskatt bracket must be threshold 0 at rate 0, got {threshold} at {rate}")]
    InvalidBaseBracket { threshold: Decimal, rate: Decimal },

    #[error("trinnskatt threshold {threshold} at bracket {index} is not above the previous one")]
    NonIncreasingThreshold { index: usize, threshold: Decimal },

    #[error("rate {rate} at bracket {index} is outside 0..=1")]
    RateOutOfRange { index: usize, rate: Decimal },

    #[error("withholding estimate schedule is empty")]
    EmptyWithholdingSchedule,

    #[error("withholding threshold {threshold} at bracket {index} is out of order")]
    UnorderedWithholding { index: usize, threshold: Decimal },
}

/// The complete set of figures the calculator needs for one tax year.
///
/// A new tax year is added by constructing another rule set; the calculator
/// itself never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxYearRules {
    pub tax_year: i32,
    pub trinnskatt_brackets: Vec<TrinnskattBracket>,
    /// Trygdeavgift on employment income.
    pub trygdeavgift_lonn_rate: Decimal,
    /// Trygdeavgift on self-employment (næring) income.
    pub trygdeavgift_naering_rate: Decimal,
    pub fellesskatt_rate: Decimal,
    pub personfradrag: Decimal,
    pub minstefradrag_rate: Decimal,
    pub minstefradrag_max: Decimal,
    /// Statutory floor. Published with the schedule but not applied by the
    /// calculator.
    pub minstefradrag_min: Decimal,
    pub feriepenger_rates: FeriepengerRates,
    pub withholding_brackets: Vec<WithholdingBracket>,
    pub mva_rate: Decimal,
    /// Prosenttrekk percentage assumed when none is given (0-100).
    pub default_tax_percentage: Decimal,
    /// Stillingsprosent assumed when none is given (0-100).
    pub default_employee_percentage: Decimal,
}

static NORWAY_2026: LazyLock<TaxYearRules> = LazyLock::new(TaxYearRules::norway_2026);

impl TaxYearRules {
    /// Norwegian figures for the 2026 income year.
    pub fn norway_2026() -> Self {
        Self {
            tax_year: 2026,
            trinnskatt_brackets: vec![
                trinn(0, 0, 0),
                trinn(226_100, 17, 3),
                trinn(318_300, 40, 3),
                trinn(725_050, 137, 3),
                trinn(980_100, 168, 3),
                trinn(1_467_200, 178, 3),
            ],
            trygdeavgift_lonn_rate: Decimal::new(76, 3),
            trygdeavgift_naering_rate: Decimal::new(108, 3),
            fellesskatt_rate: Decimal::new(22, 2),
            personfradrag: Decimal::from(114_540),
            minstefradrag_rate: Decimal::new(46, 2),
            minstefradrag_max: Decimal::from(95_700),
            minstefradrag_min: Decimal::from(31_800),
            feriepenger_rates: FeriepengerRates {
                four_plus_one: FeriepengerRate {
                    standard: Decimal::new(102, 3),
                    over_60: Decimal::new(125, 3),
                },
                five: FeriepengerRate {
                    standard: Decimal::new(12, 2),
                    over_60: Decimal::new(143, 3),
                },
            },
            // Placeholder until real tabelltrekk tables are implemented.
            withholding_brackets: vec![
                withholding(0, 25),
                withholding(200_000, 30),
                withholding(400_000, 35),
                withholding(600_000, 40),
                withholding(900_000, 45),
            ],
            mva_rate: Decimal::new(25, 2),
            default_tax_percentage: Decimal::from(35),
            default_employee_percentage: Decimal::ONE_HUNDRED,
        }
    }

    /// Returns the built-in rule set for `year`, if one exists.
    pub fn for_year(year: i32) -> Option<&'static TaxYearRules> {
        match year {
            2026 => Some(&NORWAY_2026),
            _ => None,
        }
    }

    /// Years with a built-in rule set.
    pub fn supported_years() -> &'static [i32] {
        &[2026]
    }

    /// Derives a parallel rule set for another year with a replaced
    /// trinnskatt schedule. All flat rates and deductions are carried over.
    ///
    /// # Errors
    ///
    /// Returns [`RulesError`] if the new schedule breaks an invariant.
    pub fn with_trinnskatt(
        &self,
        tax_year: i32,
        brackets: Vec<TrinnskattBracket>,
    ) -> Result<Self, RulesError> {
        let rules = Self {
            tax_year,
            trinnskatt_brackets: brackets,
            ..self.clone()
        };
        rules.validate()?;
        Ok(rules)
    }

    /// Checks the schedule invariants the calculator relies on.
    pub fn validate(&self) -> Result<(), RulesError> {
        let first = self
            .trinnskatt_brackets
            .first()
            .ok_or(RulesError::EmptySchedule)?;
        if !first.threshold.is_zero() || !first.rate.is_zero() {
            return Err(RulesError::InvalidBaseBracket {
                threshold: first.threshold,
                rate: first.rate,
            });
        }

        for (index, pair) in self.trinnskatt_brackets.windows(2).enumerate() {
            if pair[1].threshold <= pair[0].threshold {
                return Err(RulesError::NonIncreasingThreshold {
                    index: index + 1,
                    threshold: pair[1].threshold,
                });
            }
        }

        for (index, bracket) in self.trinnskatt_brackets.iter().enumerate() {
            check_rate(index, bracket.rate)?;
        }

        if self.withholding_brackets.is_empty() {
            return Err(RulesError::EmptyWithholdingSchedule);
        }
        for (index, pair) in self.withholding_brackets.windows(2).enumerate() {
            if pair[1].threshold <= pair[0].threshold {
                return Err(RulesError::UnorderedWithholding {
                    index: index + 1,
                    threshold: pair[1].threshold,
                });
            }
        }
        for (index, bracket) in self.withholding_brackets.iter().enumerate() {
            check_rate(index, bracket.rate)?;
        }

        Ok(())
    }
}

fn check_rate(
    index: usize,
    rate: Decimal,
) -> Result<(), RulesError> {
    if rate < Decimal::ZERO || rate > Decimal::ONE {
        return Err(RulesError::RateOutOfRange { index, rate });
    }
    Ok(())
}

fn trinn(
    threshold: i64,
    rate: i64,
    scale: u32,
) -> TrinnskattBracket {
    TrinnskattBracket {
        threshold: Decimal::from(threshold),
        rate: Decimal::new(rate, scale),
    }
}

fn withholding(
    threshold: i64,
    percent: i64,
) -> WithholdingBracket {
    WithholdingBracket {
        threshold: Decimal::from(threshold),
        rate: Decimal::new(percent, 2),
    }
}
