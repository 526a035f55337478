//! Loading a complete model from a data directory
//!
//! A data directory holds the three rate tables, the observed population
//! (`observed_population.csv`, or `observed_population.json` when no CSV is
//! present) and an optional `engine_config.json`.

use crate::assumptions::loader::read_source;
use crate::assumptions::RateTables;
use crate::config::{EngineConfig, ENGINE_CONFIG_FILE};
use crate::error::{LoadError, LoadReport};
use crate::population::loader::OBSERVED_POPULATION_FILE;
use crate::population::ObservedPopulation;
use crate::projection::ProjectionEngine;
use crate::scenario::{ScenarioGateway, ScenarioRunner};
use log::info;
use std::path::{Path, PathBuf};

/// Observed population in model JSON form
pub const OBSERVED_POPULATION_JSON_FILE: &str = "observed_population.json";

/// Everything needed to build an engine and a gateway
#[derive(Debug, Clone)]
pub struct ModelData {
    pub tables: RateTables,
    pub observed: ObservedPopulation,
    pub config: EngineConfig,
    pub report: LoadReport,
}

enum ObservedSource {
    Csv(PathBuf),
    Json(PathBuf),
}

fn observed_source(dir: &Path) -> ObservedSource {
    let csv = dir.join(OBSERVED_POPULATION_FILE);
    let json = dir.join(OBSERVED_POPULATION_JSON_FILE);
    if !csv.exists() && json.exists() {
        ObservedSource::Json(json)
    } else {
        ObservedSource::Csv(csv)
    }
}

impl ModelData {
    /// Load synchronously
    pub fn from_dir(dir: &Path) -> Result<Self, LoadError> {
        let (tables, table_report) = RateTables::from_dir(dir)?;
        let (observed, observed_report) = match observed_source(dir) {
            ObservedSource::Csv(path) => ObservedPopulation::from_csv_path(path)?,
            ObservedSource::Json(path) => ObservedPopulation::from_json_path(path)?,
        };
        let config = EngineConfig::from_dir_or_default(dir)?;

        Ok(Self::assemble(tables, observed, config, table_report.merge(observed_report)))
    }

    /// Load with async file reads; the result is used synchronously
    pub async fn load(dir: &Path) -> Result<Self, LoadError> {
        let (tables, table_report) = RateTables::load(dir).await?;

        let (observed, observed_report) = match observed_source(dir) {
            ObservedSource::Csv(path) => {
                let contents = read_source(&path).await?;
                ObservedPopulation::from_csv_reader(contents.as_bytes(), &path.display().to_string())?
            }
            ObservedSource::Json(path) => {
                let contents = read_source(&path).await?;
                ObservedPopulation::from_json_str(&contents)?
            }
        };

        let config_path = dir.join(ENGINE_CONFIG_FILE);
        let config = if tokio::fs::try_exists(&config_path).await.unwrap_or(false) {
            EngineConfig::from_json_str(&read_source(&config_path).await?)?
        } else {
            EngineConfig::default()
        };

        Ok(Self::assemble(tables, observed, config, table_report.merge(observed_report)))
    }

    fn assemble(tables: RateTables, observed: ObservedPopulation, config: EngineConfig, report: LoadReport) -> Self {
        info!(
            "model loaded: {} observed years (last {:?}), {} rows read, {} skipped",
            observed.len(),
            observed.last_observed_year(),
            report.rows_read,
            report.rows_skipped
        );
        Self {
            tables,
            observed,
            config,
            report,
        }
    }

    pub fn engine(&self) -> ProjectionEngine {
        ProjectionEngine::new(self.tables.clone(), self.config.clone())
    }

    pub fn runner(&self) -> ScenarioRunner {
        ScenarioRunner::new(self.engine())
    }

    pub fn into_gateway(self) -> ScenarioGateway {
        let engine = ProjectionEngine::new(self.tables, self.config);
        ScenarioGateway::new(engine, self.observed)
    }
}
