//! Net migration spread across cohorts by fixed shares

use crate::assumptions::MigrationDistribution;
use crate::population::{PopulationSnapshot, Sex, NUM_AGE_GROUPS};

/// Migrants added to each cohort for one year
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationOutcome {
    /// Scenario-adjusted scalar net migration, rounded
    pub adjusted_net_migration: f64,

    /// Whole-number net migrants per cohort (may be negative)
    pub migrants: PopulationSnapshot,
}

impl MigrationOutcome {
    /// Sum of per-cohort migrants; may drift from `adjusted_net_migration` by rounding
    pub fn distributed_total(&self) -> f64 {
        self.migrants.male.iter().sum::<f64>() + self.migrants.female.iter().sum::<f64>()
    }
}

/// Distribute `round(baseline * multiplier)` by cohort shares
///
/// Rounding drift between the cohort sum and the total is not corrected.
pub fn distribute_migration(
    baseline_net_migration: f64,
    migration_multiplier: f64,
    distribution: &MigrationDistribution,
) -> MigrationOutcome {
    let adjusted_net_migration = (baseline_net_migration * migration_multiplier).round();
    let mut migrants = PopulationSnapshot::zeros();

    for sex in Sex::ALL {
        for age_group in 0..NUM_AGE_GROUPS {
            let share = distribution.share(age_group, sex);
            migrants.set(age_group, sex, (adjusted_net_migration * share).round());
        }
    }

    MigrationOutcome {
        adjusted_net_migration,
        migrants,
    }
}
