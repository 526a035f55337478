//! AWS Lambda handler for scenario projections
//!
//! Accepts `{fertility, mortality, migration, year}` as JSON, optionally with
//! `tfr`, `life_expectancy_change` or `net_migration` targets, and returns the
//! population for that year, observed or projected. Model data is loaded once
//! per container from `POPULATION_DATA_DIR` (default `data`); the projection
//! cache lives for the lifetime of the container.

use chrono::{DateTime, Utc};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use population_projection::assumptions::loader::DEFAULT_DATA_PATH;
use population_projection::scenario::AGE_GROUP_65;
use population_projection::{
    ModelData, PopulationSnapshot, ScenarioGateway, ScenarioParameters, ScenarioTargets, YearClass,
    YearDiagnostics,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Input for one projection
#[derive(Debug, Deserialize)]
pub struct ProjectionRequest {
    /// Fertility adjustment in percent (default: 0)
    #[serde(default)]
    pub fertility: f64,

    /// Mortality adjustment in percent (default: 0)
    #[serde(default)]
    pub mortality: f64,

    /// Migration adjustment in percent (default: 0)
    #[serde(default)]
    pub migration: f64,

    /// Requested calendar year
    pub year: i32,

    /// Optional targets (`tfr`, `life_expectancy_change`, `net_migration`)
    /// that override the matching percentages
    #[serde(flatten)]
    pub targets: ScenarioTargets,
}

/// Output from the projection
#[derive(Debug, Serialize)]
pub struct ProjectionResponse {
    pub year: i32,
    pub classification: YearClass,
    pub scenario: ScenarioParameters,
    pub population: PopulationSnapshot,
    pub total: f64,
    pub total_male: f64,
    pub total_female: f64,
    pub share_65_plus: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<YearDiagnostics>,
    pub baseline_global_mortality_rate: Option<f64>,
    pub generated_at: DateTime<Utc>,
    pub execution_time_ms: u64,
}

fn respond(gateway: &mut ScenarioGateway, request: &ProjectionRequest) -> Result<ProjectionResponse, String> {
    let start = std::time::Instant::now();
    let scenario = ScenarioParameters::new(request.fertility, request.mortality, request.migration).with_targets(
        &request.targets,
        gateway.engine().tables(),
        gateway.engine().config(),
    );
    let classification = gateway.classify(request.year);

    let population = gateway.apply_scenarios(&scenario, request.year).ok_or_else(|| {
        format!(
            "no population available for {} (no observed base, or more than {} years past it)",
            request.year,
            gateway.engine().config().max_projection_years
        )
    })?;
    let diagnostics = gateway.year_diagnostics(&scenario, request.year);
    let baseline_global_mortality_rate = gateway.baseline_global_mortality_rate(request.year);

    Ok(ProjectionResponse {
        year: request.year,
        classification,
        scenario,
        total: population.total(),
        total_male: population.total_male(),
        total_female: population.total_female(),
        share_65_plus: population.share_at_or_above(AGE_GROUP_65),
        population,
        diagnostics,
        baseline_global_mortality_rate,
        generated_at: Utc::now(),
        execution_time_ms: start.elapsed().as_millis() as u64,
    })
}

/// Lambda handler function
async fn handler(
    gateway: Arc<Mutex<ScenarioGateway>>,
    event: LambdaEvent<ProjectionRequest>,
) -> Result<ProjectionResponse, Error> {
    let (request, _context) = event.into_parts();
    log::info!(
        "request: year {} fertility {}% mortality {}% migration {}%",
        request.year,
        request.fertility,
        request.mortality,
        request.migration
    );

    let mut gateway = gateway.lock().map_err(|_| "projection state is unavailable")?;
    let response = respond(&mut gateway, &request)?;
    Ok(response)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();

    let data_dir = std::env::var("POPULATION_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_PATH));
    let model = ModelData::load(&data_dir).await?;
    let gateway = Arc::new(Mutex::new(model.into_gateway()));

    run(service_fn(move |event| handler(Arc::clone(&gateway), event))).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn request(year: i32, fertility: f64) -> ProjectionRequest {
        ProjectionRequest {
            fertility,
            mortality: 0.0,
            migration: 0.0,
            year,
            targets: ScenarioTargets::default(),
        }
    }

    fn shipped_gateway() -> ScenarioGateway {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("data");
        ModelData::from_dir(&dir).unwrap().into_gateway()
    }

    #[test]
    fn test_request_defaults() {
        let request: ProjectionRequest = serde_json::from_str(r#"{"year": 2030}"#).unwrap();
        assert_eq!(request.year, 2030);
        assert_eq!(request.fertility, 0.0);
        assert!(serde_json::from_str::<ProjectionRequest>(r#"{"fertility": 10}"#).is_err());
    }

    #[test]
    fn test_respond_observed_and_projected() {
        let mut gateway = shipped_gateway();

        let observed = respond(
            &mut gateway,
            &request(2025, 50.0),
        )
        .unwrap();
        assert_eq!(observed.classification, YearClass::Observed);
        assert!(observed.diagnostics.is_none());

        let projected = respond(
            &mut gateway,
            &request(2030, 0.0),
        )
        .unwrap();
        assert_eq!(projected.classification, YearClass::Projected);
        assert_eq!(projected.diagnostics.as_ref().unwrap().end_population, projected.total);

        let json = serde_json::to_value(&projected).unwrap();
        assert_eq!(json["classification"], "Projected");
        assert!(json["baseline_global_mortality_rate"].is_number());
    }

    #[test]
    fn test_request_targets() {
        let request: ProjectionRequest =
            serde_json::from_str(r#"{"year": 2030, "fertility": 5, "net_migration": 200000}"#).unwrap();
        assert_eq!(request.targets.net_migration, Some(200_000.0));
        assert_eq!(request.targets.tfr, None);

        let mut gateway = shipped_gateway();
        let response = respond(&mut gateway, &request).unwrap();
        assert_eq!(response.scenario.fertility, 5.0);
        assert!((response.scenario.migration + 50.0).abs() < 1e-9);
        assert_eq!(response.diagnostics.unwrap().adjusted_net_migration, 200_000.0);
    }

    #[test]
    fn test_far_future_year_rejected() {
        let mut gateway = shipped_gateway();
        let err = respond(&mut gateway, &request(i32::MAX, 0.0)).unwrap_err();
        assert!(err.contains("no population available"));
        assert!(gateway.cache().is_empty());
    }
}
