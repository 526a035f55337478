//! Reference rate tables: mortality, fertility (ASFR) and migration distribution
//!
//! Tables are loaded once and are immutable afterwards. Provider traits let
//! external collaborators supply rates; `RateTables::from_providers` snapshots
//! them into the immutable form the engine runs on.

mod mortality;
mod fertility;
mod migration;
pub mod loader;

pub use mortality::{MortalityRateTable, DEFAULT_MORTALITY_RATE_PER_1000};
pub use fertility::{fertility_multiplier, total_fertility_rate, FertilityRateTable, FertilitySchedule};
pub use migration::{MigrationDistribution, MigrationShares, SHARE_SUM_TOLERANCE};

use crate::error::{LoadError, LoadReport};
use crate::population::{AgeVector, PopulationSnapshot, Sex, NUM_AGE_GROUPS};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One rate per cohort for each sex
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SexRates {
    pub male: AgeVector,
    pub female: AgeVector,
}

impl SexRates {
    pub fn zeros() -> Self {
        Self {
            male: [0.0; NUM_AGE_GROUPS],
            female: [0.0; NUM_AGE_GROUPS],
        }
    }

    pub fn by_sex(&self, sex: Sex) -> &AgeVector {
        match sex {
            Sex::Male => &self.male,
            Sex::Female => &self.female,
        }
    }
}

/// Source of annual mortality rates per 1,000 (reference year fixed at load time)
pub trait MortalityRateProvider {
    fn get(&self) -> SexRates;
}

/// Source of ASFRs, scaled by a fertility scenario percentage
pub trait FertilityRateProvider {
    fn get(&self, fertility_pct: f64) -> FertilitySchedule;
}

/// Source of migration shares by cohort
pub trait MigrationDistributionProvider {
    fn get(&self) -> MigrationShares;
}

/// Source of observed population by year
pub trait ObservedPopulationProvider {
    fn get(&self, year: i32) -> Option<PopulationSnapshot>;
}

impl MortalityRateProvider for MortalityRateTable {
    fn get(&self) -> SexRates {
        self.resolved()
    }
}

impl FertilityRateProvider for FertilityRateTable {
    fn get(&self, fertility_pct: f64) -> FertilitySchedule {
        self.scaled(fertility_pct)
    }
}

impl MigrationDistributionProvider for MigrationDistribution {
    fn get(&self) -> MigrationShares {
        self.shares()
    }
}

impl ObservedPopulationProvider for crate::population::ObservedPopulation {
    fn get(&self, year: i32) -> Option<PopulationSnapshot> {
        crate::population::ObservedPopulation::get(self, year).cloned()
    }
}

/// Container for all rate tables used by a projection
#[derive(Debug, Clone, Default)]
pub struct RateTables {
    pub mortality: MortalityRateTable,
    pub fertility: FertilityRateTable,
    pub migration: MigrationDistribution,
}

impl RateTables {
    pub fn new(
        mortality: MortalityRateTable,
        fertility: FertilityRateTable,
        migration: MigrationDistribution,
    ) -> Self {
        Self {
            mortality,
            fertility,
            migration,
        }
    }

    /// Snapshot external providers into immutable tables
    pub fn from_providers(
        mortality: &dyn MortalityRateProvider,
        fertility: &dyn FertilityRateProvider,
        migration: &dyn MigrationDistributionProvider,
    ) -> Self {
        let rates = mortality.get();
        let shares = migration.get();
        Self {
            mortality: MortalityRateTable::new(rates.male, rates.female),
            fertility: FertilityRateTable::from_asfr(fertility.get(0.0).asfr),
            migration: MigrationDistribution::from_shares(shares.male, shares.female),
        }
    }

    /// Load all tables from CSV files in the default data directory
    pub fn from_default_dir() -> Result<(Self, LoadReport), LoadError> {
        Self::from_dir(Path::new(loader::DEFAULT_DATA_PATH))
    }

    /// Load all tables from CSV files in a specific directory
    pub fn from_dir(dir: &Path) -> Result<(Self, LoadReport), LoadError> {
        let (mortality, mortality_report) = loader::load_mortality_rates(dir)?;
        let (fertility, fertility_report) = loader::load_fertility_rates(dir)?;
        let (migration, migration_report) = loader::load_migration_distribution(dir)?;

        let report = mortality_report
            .merge(fertility_report)
            .merge(migration_report);

        Ok((Self::new(mortality, fertility, migration), report))
    }

    /// Load all tables asynchronously; the result is immutable and fully synchronous to use
    pub async fn load(dir: &Path) -> Result<(Self, LoadReport), LoadError> {
        let mortality_path = dir.join(loader::MORTALITY_RATES_FILE);
        let fertility_path = dir.join(loader::FERTILITY_RATES_FILE);
        let migration_path = dir.join(loader::MIGRATION_DISTRIBUTION_FILE);

        let (mortality_src, fertility_src, migration_src) = tokio::try_join!(
            loader::read_source(&mortality_path),
            loader::read_source(&fertility_path),
            loader::read_source(&migration_path),
        )?;

        let (mortality, mortality_report) = loader::load_mortality_rates_from_reader(
            mortality_src.as_bytes(),
            &mortality_path.display().to_string(),
        )?;
        let (fertility, fertility_report) = loader::load_fertility_rates_from_reader(
            fertility_src.as_bytes(),
            &fertility_path.display().to_string(),
        )?;
        let (migration, migration_report) = loader::load_migration_distribution_from_reader(
            migration_src.as_bytes(),
            &migration_path.display().to_string(),
        )?;

        let report = mortality_report
            .merge(fertility_report)
            .merge(migration_report);

        Ok((Self::new(mortality, fertility, migration), report))
    }

    /// Replace the mortality fallback rate for missing entries
    pub fn with_default_mortality_rate(mut self, rate_per_1000: f64) -> Self {
        self.mortality = self.mortality.with_default_rate(rate_per_1000);
        self
    }
}
