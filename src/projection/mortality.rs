//! Mortality step: deaths and survivors for every cohort over one year

use crate::assumptions::MortalityRateTable;
use crate::population::{PopulationSnapshot, Sex, NUM_AGE_GROUPS};

/// Deaths and survivors after one year of mortality
#[derive(Debug, Clone, PartialEq)]
pub struct MortalityOutcome {
    /// Whole-number deaths per cohort
    pub deaths: PopulationSnapshot,

    /// Population remaining in each cohort
    pub survivors: PopulationSnapshot,

    /// Deaths summed over all 42 cohorts
    pub total_deaths: f64,

    /// Population summed over all 42 cohorts, before mortality
    pub total_population: f64,
}

impl MortalityOutcome {
    /// Crude death rate per 1,000: actual deaths over actual population
    ///
    /// This is the weighted rate. It is not the mean of per-cohort base rates.
    /// Returns 0.0 for an empty population.
    pub fn global_rate(&self) -> f64 {
        if self.total_population > 0.0 {
            self.total_deaths / self.total_population * 1000.0
        } else {
            0.0
        }
    }
}

/// Apply one year of mortality
///
/// For each cohort: `proportion = clamp(rate * multiplier / 1000, 0, 1)` and
/// `deaths = round(pop * proportion)`. Deaths never exceed the cohort, so
/// survivors stay non-negative even for fractional populations, and a
/// proportion of 1 empties the cohort exactly.
pub fn apply_mortality(
    population: &PopulationSnapshot,
    rates: &MortalityRateTable,
    mortality_multiplier: f64,
) -> MortalityOutcome {
    let mut deaths = PopulationSnapshot::zeros();
    let mut survivors = PopulationSnapshot::zeros();
    let mut total_deaths = 0.0;
    let mut total_population = 0.0;

    for sex in Sex::ALL {
        let pop = population.by_sex(sex);
        for age_group in 0..NUM_AGE_GROUPS {
            let count = pop[age_group].max(0.0);
            let proportion = rates.death_proportion(age_group, sex, mortality_multiplier);
            let died = if proportion >= 1.0 {
                count
            } else {
                (count * proportion).round().min(count)
            };

            deaths.set(age_group, sex, died);
            survivors.set(age_group, sex, count - died);
            total_deaths += died;
            total_population += count;
        }
    }

    MortalityOutcome {
        deaths,
        survivors,
        total_deaths,
        total_population,
    }
}
