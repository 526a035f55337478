//! Age-specific fertility rates (ASFR)
//!
//! Rates are births per woman-year. Only the reproductive age groups
//! (15 to 49) carry a rate; all other entries are exactly zero.

use crate::population::{is_reproductive, AgeVector, AGE_GROUP_WIDTH, NUM_AGE_GROUPS};
use log::warn;
use serde::{Deserialize, Serialize};

/// Fertility multiplier for a scenario percentage, floored at zero
pub fn fertility_multiplier(fertility_pct: f64) -> f64 {
    (1.0 + fertility_pct / 100.0).max(0.0)
}

/// Total fertility rate implied by a set of five-year ASFRs
pub fn total_fertility_rate(asfr: &AgeVector) -> f64 {
    AGE_GROUP_WIDTH as f64 * asfr.iter().sum::<f64>()
}

/// Scenario-adjusted fertility schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FertilitySchedule {
    /// Births per woman-year by age group
    pub asfr: AgeVector,

    /// Total fertility rate (5 x sum of ASFR)
    pub tfr: f64,
}

/// Baseline ASFR table
#[derive(Debug, Clone, PartialEq)]
pub struct FertilityRateTable {
    asfr: AgeVector,
}

impl Default for FertilityRateTable {
    fn default() -> Self {
        Self {
            asfr: [0.0; NUM_AGE_GROUPS],
        }
    }
}

impl FertilityRateTable {
    /// Build from births per woman-year
    ///
    /// Entries outside the reproductive bands are forced to zero, as are
    /// negative or non-finite rates.
    pub fn from_asfr(asfr: AgeVector) -> Self {
        let mut table = Self::default();
        for (age_group, rate) in asfr.into_iter().enumerate() {
            table.set_rate(age_group, rate);
        }
        table
    }

    /// Build from rates published per 1,000 women
    pub fn from_per_1000(rates: AgeVector) -> Self {
        Self::from_asfr(rates.map(|r| r / 1000.0))
    }

    /// Set one age group's rate (births per woman-year)
    ///
    /// Returns whether the rate was stored.
    pub fn set_rate(&mut self, age_group: usize, rate: f64) -> bool {
        if age_group >= NUM_AGE_GROUPS {
            return false;
        }
        if !is_reproductive(age_group) {
            if rate != 0.0 {
                warn!("ignoring fertility rate {} for non-reproductive age group {}", rate, age_group);
            }
            return false;
        }
        if !rate.is_finite() || rate < 0.0 {
            warn!("ignoring invalid fertility rate {} for age group {}", rate, age_group);
            return false;
        }
        self.asfr[age_group] = rate;
        true
    }

    /// Baseline births per woman-year for one age group
    pub fn rate(&self, age_group: usize) -> f64 {
        self.asfr.get(age_group).copied().unwrap_or(0.0)
    }

    pub fn asfr(&self) -> &AgeVector {
        &self.asfr
    }

    /// Baseline total fertility rate
    pub fn tfr(&self) -> f64 {
        total_fertility_rate(&self.asfr)
    }

    /// Schedule after applying the fertility scenario
    pub fn scaled(&self, fertility_pct: f64) -> FertilitySchedule {
        let multiplier = fertility_multiplier(fertility_pct);
        let asfr = self.asfr.map(|rate| rate * multiplier);
        FertilitySchedule {
            tfr: total_fertility_rate(&asfr),
            asfr,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_table() -> FertilityRateTable {
        let mut per_1000 = [0.0; NUM_AGE_GROUPS];
        per_1000[3] = 5.0;
        per_1000[4] = 30.0;
        per_1000[5] = 80.0;
        per_1000[6] = 100.0;
        per_1000[7] = 55.0;
        per_1000[8] = 12.0;
        per_1000[9] = 1.0;
        FertilityRateTable::from_per_1000(per_1000)
    }

    #[test]
    fn test_tfr_is_five_times_sum() {
        let table = sample_table();
        // (5+30+80+100+55+12+1)/1000 * 5 = 1.415
        assert_relative_eq!(table.tfr(), 1.415, epsilon = 1e-12);
    }

    #[test]
    fn test_non_reproductive_entries_zero() {
        let mut asfr = [0.01; NUM_AGE_GROUPS];
        asfr[20] = 0.5;
        let table = FertilityRateTable::from_asfr(asfr);

        for age_group in 0..NUM_AGE_GROUPS {
            if is_reproductive(age_group) {
                assert_eq!(table.rate(age_group), 0.01);
            } else {
                assert_eq!(table.rate(age_group), 0.0);
            }
        }
    }

    #[test]
    fn test_zero_rate_replaces_existing() {
        let mut table = sample_table();
        assert!(table.set_rate(6, 0.0));
        assert_eq!(table.rate(6), 0.0);
        assert_relative_eq!(table.tfr(), 1.415 - 0.5, epsilon = 1e-12);

        assert!(!table.set_rate(12, 0.0));
        assert!(!table.set_rate(NUM_AGE_GROUPS, 0.1));
    }

    #[test]
    fn test_scaled_schedule() {
        let table = sample_table();

        let up = table.scaled(20.0);
        assert_relative_eq!(up.tfr, 1.415 * 1.2, epsilon = 1e-12);
        assert_relative_eq!(up.asfr[6], 0.12, epsilon = 1e-12);

        let neutral = table.scaled(0.0);
        assert_eq!(&neutral.asfr, table.asfr());
    }

    #[test]
    fn test_multiplier_floored_at_zero() {
        assert_eq!(fertility_multiplier(-100.0), 0.0);
        assert_eq!(fertility_multiplier(-250.0), 0.0);

        let schedule = sample_table().scaled(-300.0);
        assert_eq!(schedule.tfr, 0.0);
        assert!(schedule.asfr.iter().all(|r| *r == 0.0));
    }
}
