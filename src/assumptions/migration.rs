//! Net migration distribution across age/sex cohorts
//!
//! Shares are derived from net migrant counts over a reference period. A
//! scalar net migration total is spread across cohorts by these shares.

use crate::population::{AgeVector, Sex, NUM_AGE_GROUPS};
use log::warn;
use serde::{Deserialize, Serialize};

/// Tolerance for the shares summing to one
pub const SHARE_SUM_TOLERANCE: f64 = 1e-6;

/// Shares plus reference-period totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationShares {
    pub male: AgeVector,
    pub female: AgeVector,
    pub total_male: f64,
    pub total_female: f64,
    pub grand_total: f64,
}

/// Per-cohort share of total net migration
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationDistribution {
    male: AgeVector,
    female: AgeVector,

    /// Reference-period net migrants by sex
    total_male: f64,
    total_female: f64,
}

impl Default for MigrationDistribution {
    fn default() -> Self {
        Self {
            male: [0.0; NUM_AGE_GROUPS],
            female: [0.0; NUM_AGE_GROUPS],
            total_male: 0.0,
            total_female: 0.0,
        }
    }
}

impl MigrationDistribution {
    /// Derive shares from reference-period net migrant counts
    ///
    /// Individual cohorts may be negative (net emigration) as long as the
    /// grand total is not zero. A zero grand total yields all-zero shares.
    pub fn from_counts(male_counts: AgeVector, female_counts: AgeVector) -> Self {
        let total_male: f64 = male_counts.iter().sum();
        let total_female: f64 = female_counts.iter().sum();
        let grand_total = total_male + total_female;

        if grand_total == 0.0 || !grand_total.is_finite() {
            warn!("migration reference counts total {}; distributing no migrants", grand_total);
            return Self {
                total_male,
                total_female,
                ..Self::default()
            };
        }

        Self {
            male: male_counts.map(|c| c / grand_total),
            female: female_counts.map(|c| c / grand_total),
            total_male,
            total_female,
        }
    }

    /// Use shares directly; totals are the share sums
    pub fn from_shares(male: AgeVector, female: AgeVector) -> Self {
        let distribution = Self {
            total_male: male.iter().sum(),
            total_female: female.iter().sum(),
            male,
            female,
        };
        if !distribution.is_normalized() {
            warn!(
                "migration shares sum to {} rather than 1",
                distribution.share_sum()
            );
        }
        distribution
    }

    /// Share of total net migration for one cohort
    pub fn share(&self, age_group: usize, sex: Sex) -> f64 {
        let column = match sex {
            Sex::Male => &self.male,
            Sex::Female => &self.female,
        };
        column.get(age_group).copied().unwrap_or(0.0)
    }

    /// Sum of all 42 shares
    pub fn share_sum(&self) -> f64 {
        self.male.iter().sum::<f64>() + self.female.iter().sum::<f64>()
    }

    pub fn is_normalized(&self) -> bool {
        (self.share_sum() - 1.0).abs() <= SHARE_SUM_TOLERANCE
    }

    pub fn total_male(&self) -> f64 {
        self.total_male
    }

    pub fn total_female(&self) -> f64 {
        self.total_female
    }

    pub fn grand_total(&self) -> f64 {
        self.total_male + self.total_female
    }

    pub fn shares(&self) -> MigrationShares {
        MigrationShares {
            male: self.male,
            female: self.female,
            total_male: self.total_male,
            total_female: self.total_female,
            grand_total: self.grand_total(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_counts_normalized_to_shares() {
        let mut male = [0.0; NUM_AGE_GROUPS];
        let mut female = [0.0; NUM_AGE_GROUPS];
        male[5] = 300.0;
        male[6] = 200.0;
        female[5] = 400.0;
        female[0] = 150.0;
        female[13] = -50.0;

        let dist = MigrationDistribution::from_counts(male, female);

        assert!(dist.is_normalized());
        assert_abs_diff_eq!(dist.share_sum(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(dist.share(5, Sex::Male), 0.3, epsilon = 1e-12);
        assert_abs_diff_eq!(dist.share(13, Sex::Female), -0.05, epsilon = 1e-12);
        assert_eq!(dist.total_male(), 500.0);
        assert_eq!(dist.total_female(), 500.0);
        assert_eq!(dist.grand_total(), 1000.0);
    }

    #[test]
    fn test_zero_reference_total() {
        let dist = MigrationDistribution::from_counts([0.0; NUM_AGE_GROUPS], [0.0; NUM_AGE_GROUPS]);
        assert_eq!(dist.share_sum(), 0.0);
        assert!(!dist.is_normalized());
    }

    #[test]
    fn test_shares_json_field_names() {
        let dist = MigrationDistribution::from_shares([1.0 / 42.0; NUM_AGE_GROUPS], [1.0 / 42.0; NUM_AGE_GROUPS]);
        assert!(dist.is_normalized());

        let json = serde_json::to_value(dist.shares()).unwrap();
        assert!(json.get("totalMale").is_some());
        assert!(json.get("grandTotal").is_some());
    }
}
