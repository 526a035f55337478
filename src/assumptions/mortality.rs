//! Age/sex-specific mortality rates per 1,000 population
//!
//! Rates are stored per cohort with explicit gaps. A cohort with no published
//! rate resolves to the table's default rate rather than propagating a missing
//! value into the projection.

use super::SexRates;
use crate::population::{AgeVector, Sex, NUM_AGE_GROUPS};

/// Default annual death rate (per 1,000) for cohorts missing from the source table
pub const DEFAULT_MORTALITY_RATE_PER_1000: f64 = 8.0;

/// Annual mortality rates per 1,000 by age group and sex, for one reference year
#[derive(Debug, Clone, PartialEq)]
pub struct MortalityRateTable {
    /// Male rates per 1,000 (None = not published)
    male: [Option<f64>; NUM_AGE_GROUPS],

    /// Female rates per 1,000 (None = not published)
    female: [Option<f64>; NUM_AGE_GROUPS],

    /// Substitute for missing entries
    default_rate: f64,
}

impl Default for MortalityRateTable {
    fn default() -> Self {
        Self::empty()
    }
}

impl MortalityRateTable {
    /// Table with no published rates; every cohort resolves to the default
    pub fn empty() -> Self {
        Self {
            male: [None; NUM_AGE_GROUPS],
            female: [None; NUM_AGE_GROUPS],
            default_rate: DEFAULT_MORTALITY_RATE_PER_1000,
        }
    }

    /// Fully populated table
    pub fn new(male: AgeVector, female: AgeVector) -> Self {
        let mut table = Self::empty();
        for age_group in 0..NUM_AGE_GROUPS {
            table.set_rate(age_group, Sex::Male, male[age_group]);
            table.set_rate(age_group, Sex::Female, female[age_group]);
        }
        table
    }

    /// Same rate for every cohort
    pub fn uniform(rate_per_1000: f64) -> Self {
        Self::new([rate_per_1000; NUM_AGE_GROUPS], [rate_per_1000; NUM_AGE_GROUPS])
    }

    /// Replace the rate used for missing entries
    pub fn with_default_rate(mut self, rate_per_1000: f64) -> Self {
        if rate_per_1000.is_finite() && rate_per_1000 >= 0.0 {
            self.default_rate = rate_per_1000;
        }
        self
    }

    pub fn default_rate(&self) -> f64 {
        self.default_rate
    }

    /// Set the published rate for one cohort
    ///
    /// Negative or non-finite rates are rejected and leave the entry unchanged.
    /// Returns whether the rate was stored.
    pub fn set_rate(&mut self, age_group: usize, sex: Sex, rate_per_1000: f64) -> bool {
        if !rate_per_1000.is_finite() || rate_per_1000 < 0.0 {
            return false;
        }
        let column = match sex {
            Sex::Male => &mut self.male,
            Sex::Female => &mut self.female,
        };
        match column.get_mut(age_group) {
            Some(cell) => {
                *cell = Some(rate_per_1000);
                true
            }
            None => false,
        }
    }

    /// Clear a cohort's rate so it falls back to the default
    pub fn clear_rate(&mut self, age_group: usize, sex: Sex) {
        let column = match sex {
            Sex::Male => &mut self.male,
            Sex::Female => &mut self.female,
        };
        if let Some(cell) = column.get_mut(age_group) {
            *cell = None;
        }
    }

    /// Published rate per 1,000, or the default when the entry is missing
    pub fn rate(&self, age_group: usize, sex: Sex) -> f64 {
        let column = match sex {
            Sex::Male => &self.male,
            Sex::Female => &self.female,
        };
        column
            .get(age_group)
            .copied()
            .flatten()
            .unwrap_or(self.default_rate)
    }

    /// Rate per 1,000 after applying a mortality multiplier
    pub fn adjusted_rate(&self, age_group: usize, sex: Sex, multiplier: f64) -> f64 {
        self.rate(age_group, sex) * multiplier
    }

    /// Annual probability of death after the multiplier, clamped to [0, 1]
    pub fn death_proportion(&self, age_group: usize, sex: Sex, multiplier: f64) -> f64 {
        let proportion = self.adjusted_rate(age_group, sex, multiplier) / 1000.0;
        if proportion.is_nan() {
            return 0.0;
        }
        proportion.clamp(0.0, 1.0)
    }

    /// Number of cohorts that resolve to the default rate
    pub fn missing_entries(&self) -> usize {
        self.male
            .iter()
            .chain(self.female.iter())
            .filter(|rate| rate.is_none())
            .count()
    }

    /// Resolved rates for every cohort
    pub fn resolved(&self) -> SexRates {
        let mut rates = SexRates::zeros();
        for age_group in 0..NUM_AGE_GROUPS {
            rates.male[age_group] = self.rate(age_group, Sex::Male);
            rates.female[age_group] = self.rate(age_group, Sex::Female);
        }
        rates
    }
}
