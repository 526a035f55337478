//! Per-year projection output structures

use crate::population::PopulationSnapshot;
use serde::{Deserialize, Serialize};

/// Diagnostics for one projected year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearDiagnostics {
    /// Births before infant mortality
    pub births: f64,

    /// Infants surviving into group 0
    pub surviving_infants: f64,

    /// Deaths among the population alive at the start of the year
    pub deaths: f64,

    /// Scenario-adjusted TFR
    pub adjusted_tfr: f64,

    /// Scenario-adjusted scalar net migration
    pub adjusted_net_migration: f64,

    /// Net migrants actually distributed after per-cohort rounding
    pub distributed_net_migration: f64,

    /// `1 + mortality% / 100`
    pub mortality_multiplier: f64,

    /// Deaths per 1,000 of the start-of-year population (weighted)
    pub global_mortality_rate: f64,

    /// Population at the start of the year
    pub start_population: f64,

    /// Population at the end of the year
    pub end_population: f64,
}

impl YearDiagnostics {
    /// Population change over the year
    pub fn net_change(&self) -> f64 {
        self.end_population - self.start_population
    }
}

/// One year of a projected series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionStep {
    pub year: i32,
    pub population: PopulationSnapshot,
    pub diagnostics: YearDiagnostics,
}
