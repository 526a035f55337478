//! Cohort-component projection: one module per component, plus the year-step engine

pub mod aging;
pub mod cache;
mod diagnostics;
mod engine;
pub mod fertility;
pub mod migration;
pub mod mortality;

pub use aging::{age_population, age_survivors};
pub use cache::{CacheKey, ProjectionCache};
pub use diagnostics::{ProjectionStep, YearDiagnostics};
pub use engine::ProjectionEngine;
pub use fertility::{compute_births, BirthOutcome};
pub use migration::{distribute_migration, MigrationOutcome};
pub use mortality::{apply_mortality, MortalityOutcome};
