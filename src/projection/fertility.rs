//! Births from reproductive-age women, with first-year infant survival
//!
//! Births use the female population at the start of the year, before
//! mortality is applied.

use crate::assumptions::{FertilitySchedule, MortalityRateTable};
use crate::population::{AgeVector, Sex, FIRST_REPRODUCTIVE_AGE_GROUP, LAST_REPRODUCTIVE_AGE_GROUP};

/// Births for one year and the infants that survive into group 0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BirthOutcome {
    /// Births before infant mortality
    pub raw_births: f64,

    /// Surviving male infants
    pub male_infants: f64,

    /// Surviving female infants
    pub female_infants: f64,

    /// Scenario-adjusted TFR (5 x sum of ASFR)
    pub adjusted_tfr: f64,
}

impl BirthOutcome {
    pub fn infants(&self, sex: Sex) -> f64 {
        match sex {
            Sex::Male => self.male_infants,
            Sex::Female => self.female_infants,
        }
    }

    pub fn surviving_infants(&self) -> f64 {
        self.male_infants + self.female_infants
    }
}

/// Compute births and surviving infants
///
/// * `female_population` - female population at the start of the year
/// * `schedule` - scenario-adjusted ASFRs
/// * `male_birth_share` - fraction of births that are male
/// * `mortality` / `mortality_multiplier` - group 0 rates give infant mortality per sex
pub fn compute_births(
    female_population: &AgeVector,
    schedule: &FertilitySchedule,
    male_birth_share: f64,
    mortality: &MortalityRateTable,
    mortality_multiplier: f64,
) -> BirthOutcome {
    let raw_births: f64 = (FIRST_REPRODUCTIVE_AGE_GROUP..=LAST_REPRODUCTIVE_AGE_GROUP)
        .map(|age_group| female_population[age_group].max(0.0) * schedule.asfr[age_group])
        .sum();

    let surviving = |sex: Sex, share: f64| {
        let infant_mortality = mortality.death_proportion(0, sex, mortality_multiplier);
        raw_births * share * (1.0 - infant_mortality)
    };

    BirthOutcome {
        raw_births,
        male_infants: surviving(Sex::Male, male_birth_share),
        female_infants: surviving(Sex::Female, 1.0 - male_birth_share),
        adjusted_tfr: schedule.tfr,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::FertilityRateTable;
    use crate::population::NUM_AGE_GROUPS;
    use approx::assert_relative_eq;

    fn schedule(rate: f64) -> FertilitySchedule {
        FertilityRateTable::from_asfr([rate; NUM_AGE_GROUPS]).scaled(0.0)
    }

    #[test]
    fn test_births_from_reproductive_groups_only() {
        let mut women = [0.0; NUM_AGE_GROUPS];
        women[2] = 10_000.0; // too young
        women[5] = 1_000.0;
        women[9] = 1_000.0;
        women[10] = 10_000.0; // too old

        let outcome = compute_births(&women, &schedule(0.05), 0.49, &MortalityRateTable::uniform(0.0), 1.0);

        assert_relative_eq!(outcome.raw_births, 100.0, epsilon = 1e-9);
        assert_relative_eq!(outcome.male_infants, 49.0, epsilon = 1e-9);
        assert_relative_eq!(outcome.female_infants, 51.0, epsilon = 1e-9);
        assert_relative_eq!(outcome.adjusted_tfr, 5.0 * 7.0 * 0.05, epsilon = 1e-12);
    }

    #[test]
    fn test_no_reproductive_women_no_births() {
        let mut women = [5_000.0; NUM_AGE_GROUPS];
        for group in FIRST_REPRODUCTIVE_AGE_GROUP..=LAST_REPRODUCTIVE_AGE_GROUP {
            women[group] = 0.0;
        }

        let outcome = compute_births(&women, &schedule(0.2), 0.49, &MortalityRateTable::uniform(3.0), 1.0);
        assert_eq!(outcome.raw_births, 0.0);
        assert_eq!(outcome.surviving_infants(), 0.0);
    }

    #[test]
    fn test_infant_survival_per_sex() {
        let mut women = [0.0; NUM_AGE_GROUPS];
        women[6] = 10_000.0;

        let mut mortality = MortalityRateTable::uniform(0.0);
        mortality.set_rate(0, Sex::Male, 10.0);
        mortality.set_rate(0, Sex::Female, 5.0);

        // 1000 raw births; multiplier doubles the infant rates
        let outcome = compute_births(&women, &schedule(0.1), 0.5, &mortality, 2.0);
        assert_relative_eq!(outcome.raw_births, 1000.0, epsilon = 1e-9);
        assert_relative_eq!(outcome.infants(Sex::Male), 500.0 * (1.0 - 0.02), epsilon = 1e-9);
        assert_relative_eq!(outcome.infants(Sex::Female), 500.0 * (1.0 - 0.01), epsilon = 1e-9);
    }
}
