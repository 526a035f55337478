//! Population Projection - cohort-component engine for scenario analysis
//!
//! This library provides:
//! - Observed population snapshots by five-year age group and sex
//! - Mortality, fertility and migration rate tables loaded from CSV
//! - A deterministic year-step projection (mortality, aging, births, migration)
//! - Memoized projection to a target year and an observed/projected gateway
//! - Parallel scenario sweeps

pub mod assumptions;
pub mod config;
pub mod error;
pub mod model;
pub mod population;
pub mod projection;
pub mod scenario;

// Re-export commonly used types
pub use assumptions::RateTables;
pub use config::EngineConfig;
pub use error::{LoadError, LoadReport};
pub use model::ModelData;
pub use population::{ObservedPopulation, PopulationSnapshot, Sex};
pub use projection::{ProjectionCache, ProjectionEngine, ProjectionStep, YearDiagnostics};
pub use scenario::{
    ScenarioGateway, ScenarioParameters, ScenarioRunner, ScenarioTargets, SweepResult, YearClass,
};
