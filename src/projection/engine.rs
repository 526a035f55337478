//! Core cohort-component projection engine
//!
//! A year step runs mortality, aging, births and migration in a fixed order.
//! Every step is pure; the only state is the caller-owned `ProjectionCache`.

use crate::assumptions::{ObservedPopulationProvider, RateTables};
use crate::config::EngineConfig;
use crate::population::{PopulationSnapshot, Sex, NUM_AGE_GROUPS};
use crate::scenario::ScenarioParameters;
use super::aging::age_population;
use super::cache::{CacheKey, ProjectionCache};
use super::diagnostics::{ProjectionStep, YearDiagnostics};
use super::fertility::compute_births;
use super::migration::distribute_migration;
use super::mortality::apply_mortality;
use log::debug;

/// Main projection engine
#[derive(Debug, Clone)]
pub struct ProjectionEngine {
    tables: RateTables,
    config: EngineConfig,
}

impl ProjectionEngine {
    /// Create an engine over immutable rate tables
    ///
    /// The config's default mortality rate replaces the tables' fallback for
    /// missing entries.
    pub fn new(tables: RateTables, config: EngineConfig) -> Self {
        let tables = tables.with_default_mortality_rate(config.default_mortality_rate);
        Self { tables, config }
    }

    pub fn tables(&self) -> &RateTables {
        &self.tables
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Advance a population by one calendar year
    pub fn project_one_year(
        &self,
        population: &PopulationSnapshot,
        scenario: &ScenarioParameters,
    ) -> (PopulationSnapshot, YearDiagnostics) {
        let scenario = scenario.sanitized();
        let mortality_multiplier = scenario.mortality_multiplier();

        // 1. Deaths and survivors from the start-of-year population
        let mortality = apply_mortality(population, &self.tables.mortality, mortality_multiplier);

        // 2. Survivors slide up one fifth of a band; group 0 left empty
        let mut projected = age_population(&mortality.survivors);

        // 3. Births come from women alive at the start of the year
        let schedule = self.tables.fertility.scaled(scenario.fertility);
        let births = compute_births(
            &population.female,
            &schedule,
            self.config.male_birth_share,
            &self.tables.mortality,
            mortality_multiplier,
        );

        // 4. Surviving infants fill group 0
        for sex in Sex::ALL {
            projected.set(0, sex, births.infants(sex));
        }

        // 5. Net migration by cohort
        let migration = distribute_migration(
            self.config.baseline_net_migration,
            scenario.migration_multiplier(),
            &self.tables.migration,
        );

        // 6. Combine, never below zero
        let mut next = PopulationSnapshot::zeros();
        for sex in Sex::ALL {
            for age_group in 0..NUM_AGE_GROUPS {
                let value = projected.get(age_group, sex) + migration.migrants.get(age_group, sex);
                next.set(age_group, sex, value.max(0.0));
            }
        }

        let diagnostics = YearDiagnostics {
            births: births.raw_births,
            surviving_infants: births.surviving_infants(),
            deaths: mortality.total_deaths,
            adjusted_tfr: births.adjusted_tfr,
            adjusted_net_migration: migration.adjusted_net_migration,
            distributed_net_migration: migration.distributed_total(),
            mortality_multiplier,
            global_mortality_rate: mortality.global_rate(),
            start_population: mortality.total_population,
            end_population: next.total(),
        };

        (next, diagnostics)
    }

    /// Apply `years` consecutive year steps, without caching
    pub fn project_from(
        &self,
        base: &PopulationSnapshot,
        scenario: &ScenarioParameters,
        years: u32,
    ) -> PopulationSnapshot {
        let mut population = base.clone();
        for _ in 0..years {
            let (next, _) = self.project_one_year(&population, scenario);
            population = next;
        }
        population
    }

    /// Project the observed snapshot for `base_year` forward to `target_year`
    ///
    /// Returns None when `base_year` has no observed snapshot or
    /// `target_year` precedes it. Results are memoized in `cache`; a cached
    /// intermediate year for the same base and scenario is used as a
    /// starting point.
    pub fn project_to_year(
        &self,
        cache: &mut ProjectionCache,
        observed: &dyn ObservedPopulationProvider,
        scenario: &ScenarioParameters,
        target_year: i32,
        base_year: i32,
    ) -> Option<PopulationSnapshot> {
        let Some(base) = observed.get(base_year) else {
            debug!("no observed population for base year {}", base_year);
            return None;
        };
        if target_year < base_year {
            debug!("target year {} precedes base year {}", target_year, base_year);
            return None;
        }
        if target_year == base_year {
            return Some(base);
        }

        let key = CacheKey::new(base_year, target_year, scenario);
        if let Some(hit) = cache.get(&key).cloned() {
            cache.record_hit();
            debug!("projection cache hit for {}", target_year);
            return Some(hit);
        }
        cache.record_miss();

        // Resume from the latest cached year on the same path, if any
        let (start_year, start) = ((base_year + 1)..target_year)
            .rev()
            .find_map(|year| {
                cache
                    .get(&CacheKey::new(base_year, year, scenario))
                    .map(|snapshot| (year, snapshot.clone()))
            })
            .unwrap_or((base_year, base));

        debug!(
            "projecting {} -> {} (path from {})",
            start_year, target_year, base_year
        );
        let result = self.project_from(&start, scenario, (target_year - start_year) as u32);
        cache.insert(key, result.clone());
        Some(result)
    }

    /// Every year from `base_year + 1` through `target_year`, with diagnostics
    pub fn project_series(
        &self,
        base: &PopulationSnapshot,
        base_year: i32,
        scenario: &ScenarioParameters,
        target_year: i32,
    ) -> Vec<ProjectionStep> {
        let mut steps = Vec::new();
        let mut population = base.clone();

        for year in (base_year + 1)..=target_year {
            let (next, diagnostics) = self.project_one_year(&population, scenario);
            debug!(
                "{}: births {:.0}, deaths {:.0}, net migration {:.0}, population {:.0}",
                year,
                diagnostics.births,
                diagnostics.deaths,
                diagnostics.adjusted_net_migration,
                diagnostics.end_population
            );
            steps.push(ProjectionStep {
                year,
                population: next.clone(),
                diagnostics,
            });
            population = next;
        }

        steps
    }

    /// Deaths per 1,000 for a population under a scenario
    ///
    /// Weighted by the actual population: computed deaths over total
    /// population. For an unadjusted baseline both the population and the
    /// scenario passed here must be neutral.
    pub fn calculate_global_mortality_rate(
        &self,
        population: &PopulationSnapshot,
        scenario: &ScenarioParameters,
    ) -> f64 {
        let scenario = scenario.sanitized();
        apply_mortality(population, &self.tables.mortality, scenario.mortality_multiplier()).global_rate()
    }
}
