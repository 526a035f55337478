//! Scenario parameters, the observed/projected gateway, and batch scenario runs
//!
//! The gateway routes a requested year either to stored observed data or to
//! the projection engine. The runner pre-loads an engine once and projects
//! many scenarios without touching the cache.

use crate::assumptions::RateTables;
use crate::config::EngineConfig;
use crate::population::{ObservedPopulation, PopulationSnapshot};
use crate::projection::{ProjectionCache, ProjectionEngine, YearDiagnostics};
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Largest magnitude accepted for a scenario percentage; larger values are
/// clamped (the per-cohort proportions are clamped regardless)
pub const MAX_SCENARIO_PCT: f64 = 1.0e9;

/// Percentage adjustments to baseline fertility, mortality and migration
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioParameters {
    /// Fertility adjustment in percent
    pub fertility: f64,

    /// Mortality adjustment in percent
    pub mortality: f64,

    /// Net migration adjustment in percent
    pub migration: f64,
}

/// Proportional change in mortality per year of life expectancy gained
pub const LIFE_EXPECTANCY_MORTALITY_ELASTICITY: f64 = 0.06;

/// Scenario expressed as demographic targets instead of percentages
///
/// Unset targets leave the corresponding percentage untouched.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioTargets {
    /// Target total fertility rate
    pub tfr: Option<f64>,

    /// Change in life expectancy at birth, in years
    pub life_expectancy_change: Option<f64>,

    /// Target annual net migration
    pub net_migration: Option<f64>,
}

impl ScenarioTargets {
    pub fn is_empty(&self) -> bool {
        self.tfr.is_none() && self.life_expectancy_change.is_none() && self.net_migration.is_none()
    }
}

/// Hashable identity of a scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScenarioKey([u64; 3]);

impl ScenarioParameters {
    pub fn new(fertility: f64, mortality: f64, migration: f64) -> Self {
        Self {
            fertility,
            mortality,
            migration,
        }
    }

    /// No adjustment to any component
    pub fn neutral() -> Self {
        Self::default()
    }

    /// Percentages that reproduce `targets` against the baseline tables and config
    pub fn from_targets(targets: &ScenarioTargets, tables: &RateTables, config: &EngineConfig) -> Self {
        Self::neutral().with_targets(targets, tables, config)
    }

    /// Replace the percentages for which `targets` sets a value
    ///
    /// - fertility: `(tfr / baseline TFR - 1) * 100`
    /// - mortality: `(exp(-0.06 * change) - 1) * 100`
    /// - migration: `(net / baseline net migration - 1) * 100`
    ///
    /// A target against a zero baseline cannot be expressed as a percentage
    /// and leaves that component unchanged.
    pub fn with_targets(mut self, targets: &ScenarioTargets, tables: &RateTables, config: &EngineConfig) -> Self {
        if let Some(tfr) = targets.tfr {
            let baseline = tables.fertility.tfr();
            if baseline > 0.0 {
                self.fertility = (tfr / baseline - 1.0) * 100.0;
            } else {
                warn!("baseline TFR is zero; ignoring TFR target {}", tfr);
            }
        }
        if let Some(change) = targets.life_expectancy_change {
            self.mortality = ((-LIFE_EXPECTANCY_MORTALITY_ELASTICITY * change).exp() - 1.0) * 100.0;
        }
        if let Some(net) = targets.net_migration {
            let baseline = config.baseline_net_migration;
            if baseline != 0.0 {
                self.migration = (net / baseline - 1.0) * 100.0;
            } else {
                warn!("baseline net migration is zero; ignoring migration target {}", net);
            }
        }
        self
    }

    pub fn is_neutral(&self) -> bool {
        self.fertility == 0.0 && self.mortality == 0.0 && self.migration == 0.0
    }

    /// All values finite and at or above -100%
    pub fn is_conventional(&self) -> bool {
        [self.fertility, self.mortality, self.migration]
            .iter()
            .all(|v| v.is_finite() && *v >= -100.0)
    }

    /// Replace NaN with 0 and clamp magnitudes to `MAX_SCENARIO_PCT`
    pub fn sanitized(&self) -> Self {
        fn clean(value: f64) -> f64 {
            if value.is_nan() {
                0.0
            } else {
                value.clamp(-MAX_SCENARIO_PCT, MAX_SCENARIO_PCT)
            }
        }
        Self::new(clean(self.fertility), clean(self.mortality), clean(self.migration))
    }

    /// `1 + mortality% / 100`
    pub fn mortality_multiplier(&self) -> f64 {
        1.0 + self.mortality / 100.0
    }

    /// `1 + fertility% / 100`, floored at zero
    pub fn fertility_multiplier(&self) -> f64 {
        crate::assumptions::fertility_multiplier(self.fertility)
    }

    /// `1 + migration% / 100`; negative values reverse net migration
    pub fn migration_multiplier(&self) -> f64 {
        1.0 + self.migration / 100.0
    }

    /// Identity used for caching; -0.0 and 0.0 map to the same key
    pub fn key(&self) -> ScenarioKey {
        fn bits(value: f64) -> u64 {
            if value == 0.0 {
                0.0f64.to_bits()
            } else {
                value.to_bits()
            }
        }
        let clean = self.sanitized();
        ScenarioKey([bits(clean.fertility), bits(clean.mortality), bits(clean.migration)])
    }
}

/// Whether a year is served from observed data or projected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum YearClass {
    Observed,
    Projected,
}

/// Routes requests for a year to observed data or to the projection engine
#[derive(Debug)]
pub struct ScenarioGateway {
    engine: ProjectionEngine,
    observed: ObservedPopulation,
    cache: ProjectionCache,
}

impl ScenarioGateway {
    pub fn new(engine: ProjectionEngine, observed: ObservedPopulation) -> Self {
        let cache = ProjectionCache::with_max_entries(engine.config().max_cached_projections);
        Self {
            engine,
            observed,
            cache,
        }
    }

    pub fn engine(&self) -> &ProjectionEngine {
        &self.engine
    }

    pub fn observed(&self) -> &ObservedPopulation {
        &self.observed
    }

    pub fn cache(&self) -> &ProjectionCache {
        &self.cache
    }

    /// Latest observed year: the configured override, else the latest year in the data
    pub fn last_observed_year(&self) -> Option<i32> {
        self.engine
            .config()
            .last_observed_year
            .or_else(|| self.observed.last_observed_year())
    }

    pub fn classify(&self, year: i32) -> YearClass {
        match self.last_observed_year() {
            Some(last) if year <= last => YearClass::Observed,
            _ => YearClass::Projected,
        }
    }

    /// Population for `year` under `scenario`
    ///
    /// Observed years return the stored snapshot unmodified and ignore the
    /// scenario. Later years are projected from the last observed year.
    /// Returns None when the required snapshot is absent or the year lies
    /// more than `max_projection_years` past the last observed year.
    pub fn apply_scenarios(&mut self, scenario: &ScenarioParameters, year: i32) -> Option<PopulationSnapshot> {
        if !scenario.is_conventional() {
            warn!("scenario {:?} is outside the conventional range; proportions will be clamped", scenario);
        }

        match self.classify(year) {
            YearClass::Observed => {
                debug!("{}: observed", year);
                self.observed.get(year).cloned()
            }
            YearClass::Projected => {
                let base_year = self.last_observed_year()?;
                let horizon = self.engine.config().max_projection_years;
                if i64::from(year) - i64::from(base_year) > i64::from(horizon) {
                    warn!("{} is more than {} years past {}; not projecting", year, horizon, base_year);
                    return None;
                }
                debug!("{}: projected from {}", year, base_year);
                self.engine
                    .project_to_year(&mut self.cache, &self.observed, scenario, year, base_year)
            }
        }
    }

    /// Diagnostics of the year step ending in `year`
    ///
    /// None for observed years and whenever the prior year's population is
    /// unavailable.
    pub fn year_diagnostics(&mut self, scenario: &ScenarioParameters, year: i32) -> Option<YearDiagnostics> {
        if self.classify(year) == YearClass::Observed {
            return None;
        }
        let previous = self.apply_scenarios(scenario, year.checked_sub(1)?)?;
        let (_, diagnostics) = self.engine.project_one_year(&previous, scenario);
        Some(diagnostics)
    }

    /// Unadjusted crude death rate for `year`
    ///
    /// Both the population and the rate use the neutral scenario, so scenario
    /// adjustments never leak into the baseline figure.
    pub fn baseline_global_mortality_rate(&mut self, year: i32) -> Option<f64> {
        let neutral = ScenarioParameters::neutral();
        let population = self.apply_scenarios(&neutral, year)?;
        Some(self.engine.calculate_global_mortality_rate(&population, &neutral))
    }

    /// Drop every memoized projection
    pub fn clear_projection_cache(&mut self) {
        self.cache.clear();
    }

    /// Swap in new rate tables; invalidates the cache
    pub fn replace_rate_tables(&mut self, tables: RateTables) {
        self.engine = ProjectionEngine::new(tables, self.engine.config().clone());
        self.cache.clear();
        info!("rate tables replaced; projection cache cleared");
    }

    /// Swap in new observed data; invalidates the cache
    pub fn replace_observed(&mut self, observed: ObservedPopulation) {
        self.observed = observed;
        self.cache.clear();
        info!("observed population replaced; projection cache cleared");
    }
}

/// One scenario's outcome in a sweep
#[derive(Debug, Clone, Serialize)]
pub struct SweepResult {
    pub scenario: ScenarioParameters,
    pub target_year: i32,
    pub total: f64,
    pub total_male: f64,
    pub total_female: f64,
    /// Share aged 65 and over
    pub share_65_plus: f64,
    pub population: PopulationSnapshot,
}

/// Age group index of "65 to 69 years"
pub const AGE_GROUP_65: usize = 13;

/// Pre-loaded runner for projecting many scenarios
///
/// # Example
/// ```ignore
/// let runner = ScenarioRunner::new(engine);
/// let grid = ScenarioRunner::grid(&[-20.0, 0.0, 20.0], &[0.0], &[-50.0, 0.0, 50.0]);
/// let results = runner.run_sweep(&base, 2025, 2050, &grid);
/// ```
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    engine: ProjectionEngine,
}

impl ScenarioRunner {
    pub fn new(engine: ProjectionEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &ProjectionEngine {
        &self.engine
    }

    /// Project one scenario from `base_year` to `target_year`
    pub fn run(
        &self,
        base: &PopulationSnapshot,
        base_year: i32,
        target_year: i32,
        scenario: &ScenarioParameters,
    ) -> SweepResult {
        let years = (target_year - base_year).max(0) as u32;
        let population = self.engine.project_from(base, scenario, years);
        SweepResult {
            scenario: *scenario,
            target_year,
            total: population.total(),
            total_male: population.total_male(),
            total_female: population.total_female(),
            share_65_plus: population.share_at_or_above(AGE_GROUP_65),
            population,
        }
    }

    /// Project every scenario in parallel; results keep the input order
    pub fn run_sweep(
        &self,
        base: &PopulationSnapshot,
        base_year: i32,
        target_year: i32,
        scenarios: &[ScenarioParameters],
    ) -> Vec<SweepResult> {
        scenarios
            .par_iter()
            .map(|scenario| self.run(base, base_year, target_year, scenario))
            .collect()
    }

    /// Cartesian product of fertility x mortality x migration percentages
    pub fn grid(fertility: &[f64], mortality: &[f64], migration: &[f64]) -> Vec<ScenarioParameters> {
        let mut scenarios = Vec::with_capacity(fertility.len() * mortality.len() * migration.len());
        for &f in fertility {
            for &m in mortality {
                for &g in migration {
                    scenarios.push(ScenarioParameters::new(f, m, g));
                }
            }
        }
        scenarios
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::{FertilityRateTable, MigrationDistribution, MortalityRateTable};
    use crate::population::{Sex, NUM_AGE_GROUPS};
    use approx::assert_relative_eq;

    fn test_engine(config: EngineConfig) -> ProjectionEngine {
        let mut per_1000 = [0.0; NUM_AGE_GROUPS];
        for group in 3..=9 {
            per_1000[group] = 40.0;
        }
        let rates: [f64; NUM_AGE_GROUPS] = std::array::from_fn(|i| 1.0 + 12.0 * i as f64);
        let tables = RateTables::new(
            MortalityRateTable::new(rates, rates),
            FertilityRateTable::from_per_1000(per_1000),
            MigrationDistribution::from_counts([1.0; NUM_AGE_GROUPS], [1.0; NUM_AGE_GROUPS]),
        );
        ProjectionEngine::new(tables, config)
    }

    fn test_population(scale: f64) -> PopulationSnapshot {
        PopulationSnapshot::new([scale; NUM_AGE_GROUPS], [scale; NUM_AGE_GROUPS])
    }

    fn test_gateway() -> ScenarioGateway {
        let mut observed = ObservedPopulation::new();
        observed.insert(2024, test_population(90_000.0));
        observed.insert(2025, test_population(100_000.0));
        ScenarioGateway::new(test_engine(EngineConfig::default()), observed)
    }

    #[test]
    fn test_multipliers() {
        let scenario = ScenarioParameters::new(-150.0, 25.0, -50.0);
        assert_eq!(scenario.fertility_multiplier(), 0.0);
        assert_eq!(scenario.mortality_multiplier(), 1.25);
        assert_eq!(scenario.migration_multiplier(), 0.5);
        assert!(!scenario.is_conventional());
        assert!(ScenarioParameters::neutral().is_neutral());
    }

    #[test]
    fn test_sanitized_and_keys() {
        let odd = ScenarioParameters::new(f64::NAN, f64::INFINITY, -0.0);
        let clean = odd.sanitized();
        assert_eq!(clean.fertility, 0.0);
        assert_eq!(clean.mortality, MAX_SCENARIO_PCT);
        assert_eq!(odd.key(), ScenarioParameters::new(0.0, MAX_SCENARIO_PCT, 0.0).key());
        assert_ne!(ScenarioParameters::neutral().key(), ScenarioParameters::new(0.0, 0.0, 1.0).key());
    }

    #[test]
    fn test_from_targets() {
        let engine = test_engine(EngineConfig::default());
        // 7 bands at 40 per 1,000 => baseline TFR 1.4
        assert_relative_eq!(engine.tables().fertility.tfr(), 1.4, epsilon = 1e-12);

        let targets = ScenarioTargets {
            tfr: Some(2.1),
            life_expectancy_change: Some(2.0),
            net_migration: Some(600_000.0),
        };
        let scenario = ScenarioParameters::from_targets(&targets, engine.tables(), engine.config());

        assert_relative_eq!(scenario.fertility, 50.0, epsilon = 1e-9);
        assert_relative_eq!(scenario.mortality_multiplier(), (-0.12f64).exp(), epsilon = 1e-12);
        assert_relative_eq!(scenario.migration, 50.0, epsilon = 1e-9);

        // One year of projection reproduces the migration target exactly
        let (_, diagnostics) = engine.project_one_year(&test_population(1_000.0), &scenario);
        assert_eq!(diagnostics.adjusted_net_migration, 600_000.0);
        assert_relative_eq!(diagnostics.adjusted_tfr, 2.1, epsilon = 1e-12);
    }

    #[test]
    fn test_partial_targets_keep_percentages() {
        let engine = test_engine(EngineConfig::default());
        let targets = ScenarioTargets {
            net_migration: Some(200_000.0),
            ..ScenarioTargets::default()
        };
        let scenario =
            ScenarioParameters::new(10.0, -5.0, 30.0).with_targets(&targets, engine.tables(), engine.config());

        assert_eq!(scenario.fertility, 10.0);
        assert_eq!(scenario.mortality, -5.0);
        assert_relative_eq!(scenario.migration, -50.0, epsilon = 1e-9);
        assert!(ScenarioTargets::default().is_empty());

        let zero_baseline = EngineConfig {
            baseline_net_migration: 0.0,
            ..EngineConfig::default()
        };
        let unchanged = ScenarioParameters::from_targets(&targets, engine.tables(), &zero_baseline);
        assert_eq!(unchanged.migration, 0.0);
    }

    #[test]
    fn test_scenario_json() {
        let scenario: ScenarioParameters = serde_json::from_str(r#"{"fertility": 10, "migration": -20}"#).unwrap();
        assert_eq!(scenario, ScenarioParameters::new(10.0, 0.0, -20.0));
    }

    #[test]
    fn test_observed_years_ignore_scenario() {
        let mut gateway = test_gateway();
        let extreme = ScenarioParameters::new(300.0, 500.0, -100.0);

        assert_eq!(gateway.classify(2025), YearClass::Observed);
        assert_eq!(gateway.classify(1990), YearClass::Observed);
        assert_eq!(gateway.apply_scenarios(&extreme, 2024), Some(test_population(90_000.0)));
        assert_eq!(gateway.apply_scenarios(&extreme, 2025), Some(test_population(100_000.0)));
        assert!(gateway.cache().is_empty());

        // Observed range, but no snapshot stored for the year
        assert!(gateway.apply_scenarios(&extreme, 2000).is_none());
    }

    #[test]
    fn test_projected_years_use_engine() {
        let mut gateway = test_gateway();
        let scenario = ScenarioParameters::new(10.0, 0.0, 0.0);

        assert_eq!(gateway.classify(2026), YearClass::Projected);
        let projected = gateway.apply_scenarios(&scenario, 2030).unwrap();
        let expected = gateway.engine().project_from(&test_population(100_000.0), &scenario, 5);
        assert_eq!(projected, expected);
        assert_eq!(gateway.cache().len(), 1);

        gateway.apply_scenarios(&scenario, 2030).unwrap();
        assert_eq!(gateway.cache().cache_hits, 1);
    }

    #[test]
    fn test_year_diagnostics() {
        let mut gateway = test_gateway();
        let scenario = ScenarioParameters::new(0.0, 0.0, 25.0);

        assert!(gateway.year_diagnostics(&scenario, 2025).is_none());

        let diagnostics = gateway.year_diagnostics(&scenario, 2028).unwrap();
        let population = gateway.apply_scenarios(&scenario, 2028).unwrap();
        assert_eq!(diagnostics.end_population, population.total());
        assert_eq!(diagnostics.adjusted_net_migration, 500_000.0);
    }

    #[test]
    fn test_year_diagnostics_at_minimum_year() {
        let mut gateway = ScenarioGateway::new(test_engine(EngineConfig::default()), ObservedPopulation::new());
        assert!(gateway.year_diagnostics(&ScenarioParameters::neutral(), i32::MIN).is_none());
    }

    #[test]
    fn test_projection_horizon_enforced() {
        let config = EngineConfig {
            max_projection_years: 10,
            ..EngineConfig::default()
        };
        let mut observed = ObservedPopulation::new();
        observed.insert(2025, test_population(100_000.0));
        let mut gateway = ScenarioGateway::new(test_engine(config), observed);
        let scenario = ScenarioParameters::neutral();

        assert!(gateway.apply_scenarios(&scenario, 2035).is_some());
        assert!(gateway.apply_scenarios(&scenario, 2036).is_none());
        assert!(gateway.apply_scenarios(&scenario, i32::MAX).is_none());
        assert!(gateway.baseline_global_mortality_rate(i32::MAX).is_none());
        assert_eq!(gateway.cache().len(), 1);
    }

    #[test]
    fn test_gateway_cache_bounded_by_config() {
        let config = EngineConfig {
            max_cached_projections: 3,
            ..EngineConfig::default()
        };
        let mut observed = ObservedPopulation::new();
        observed.insert(2025, test_population(100_000.0));
        let mut gateway = ScenarioGateway::new(test_engine(config), observed);

        for migration in 0..10 {
            let scenario = ScenarioParameters::new(0.0, 0.0, migration as f64);
            gateway.apply_scenarios(&scenario, 2026).unwrap();
            assert!(gateway.cache().len() <= 3);
        }
    }

    #[test]
    fn test_last_observed_override() {
        let config = EngineConfig {
            last_observed_year: Some(2024),
            ..EngineConfig::default()
        };
        let mut observed = ObservedPopulation::new();
        observed.insert(2024, test_population(90_000.0));
        observed.insert(2025, test_population(100_000.0));
        let mut gateway = ScenarioGateway::new(test_engine(config), observed);

        assert_eq!(gateway.classify(2025), YearClass::Projected);
        let projected = gateway.apply_scenarios(&ScenarioParameters::neutral(), 2025).unwrap();
        assert_ne!(projected, test_population(100_000.0));
    }

    #[test]
    fn test_no_observed_data() {
        let mut gateway = ScenarioGateway::new(test_engine(EngineConfig::default()), ObservedPopulation::new());
        assert_eq!(gateway.classify(2025), YearClass::Projected);
        assert!(gateway.apply_scenarios(&ScenarioParameters::neutral(), 2030).is_none());
        assert!(gateway.baseline_global_mortality_rate(2030).is_none());
    }

    #[test]
    fn test_baseline_rate_ignores_active_scenario() {
        let mut gateway = test_gateway();

        // Populate the cache with an adjusted path first
        gateway.apply_scenarios(&ScenarioParameters::new(0.0, 80.0, 0.0), 2035).unwrap();
        let baseline = gateway.baseline_global_mortality_rate(2035).unwrap();

        let neutral = ScenarioParameters::neutral();
        let neutral_pop = gateway.engine().project_from(&test_population(100_000.0), &neutral, 10);
        let expected = gateway.engine().calculate_global_mortality_rate(&neutral_pop, &neutral);
        assert_eq!(baseline, expected);
    }

    #[test]
    fn test_replacing_data_clears_cache() {
        let mut gateway = test_gateway();
        let scenario = ScenarioParameters::neutral();

        let before = gateway.apply_scenarios(&scenario, 2027).unwrap();
        assert_eq!(gateway.cache().len(), 1);

        let mut observed = ObservedPopulation::new();
        observed.insert(2025, test_population(50_000.0));
        gateway.replace_observed(observed);
        assert!(gateway.cache().is_empty());

        let after = gateway.apply_scenarios(&scenario, 2027).unwrap();
        assert!(after.total() < before.total());

        gateway.replace_rate_tables(RateTables::default());
        assert!(gateway.cache().is_empty());

        gateway.apply_scenarios(&scenario, 2027).unwrap();
        gateway.clear_projection_cache();
        assert!(gateway.cache().is_empty());
    }

    #[test]
    fn test_run_sweep_matches_single_runs() {
        let runner = ScenarioRunner::new(test_engine(EngineConfig::default()));
        let base = test_population(100_000.0);
        let grid = ScenarioRunner::grid(&[-20.0, 0.0, 20.0], &[0.0, 10.0], &[0.0]);
        assert_eq!(grid.len(), 6);

        let results = runner.run_sweep(&base, 2025, 2045, &grid);
        assert_eq!(results.len(), 6);

        for (scenario, result) in grid.iter().zip(&results) {
            assert_eq!(&result.scenario, scenario);
            assert_eq!(result.population, runner.run(&base, 2025, 2045, scenario).population);
        }

        // Higher fertility, same mortality: more people
        assert!(results[4].total > results[0].total);
        assert!(results[4].population.get(0, Sex::Female) > results[0].population.get(0, Sex::Female));
    }
}
