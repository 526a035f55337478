//! Population Projection CLI
//!
//! Command-line interface for projecting a population under fertility,
//! mortality and migration scenarios

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{info, warn};
use population_projection::assumptions::loader::DEFAULT_DATA_PATH;
use population_projection::population::AGE_GROUP_LABELS;
use population_projection::scenario::AGE_GROUP_65;
use population_projection::{
    EngineConfig, ModelData, PopulationSnapshot, ScenarioParameters, ScenarioRunner, ScenarioTargets, Sex,
    YearClass,
};
use serde::Serialize;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(author, version, about = "Cohort-component population projection")]
struct Cli {
    /// Directory holding rate tables and observed population
    #[arg(long, global = true, default_value = DEFAULT_DATA_PATH)]
    data_dir: PathBuf,

    /// Engine config JSON (defaults to engine_config.json in the data directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override baseline annual net migration
    #[arg(long, global = true, allow_negative_numbers = true)]
    baseline_migration: Option<f64>,

    /// Override male share of births
    #[arg(long, global = true)]
    male_birth_share: Option<f64>,

    /// Override the last observed year
    #[arg(long, global = true)]
    last_observed_year: Option<i32>,

    /// Write CSV here instead of stdout
    #[arg(long, short, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Population by age group and sex for one year
    Project {
        #[arg(long)]
        year: i32,

        #[command(flatten)]
        scenario: ScenarioArgs,
    },
    /// Annual totals and diagnostics up to a target year
    Series {
        #[arg(long)]
        to: i32,

        #[command(flatten)]
        scenario: ScenarioArgs,
    },
    /// Totals for every combination of scenario values
    Sweep {
        #[arg(long)]
        year: i32,

        /// Fertility adjustments in percent, comma separated
        #[arg(long, value_delimiter = ',', allow_negative_numbers = true, default_values_t = [0.0])]
        fertility: Vec<f64>,

        /// Mortality adjustments in percent, comma separated
        #[arg(long, value_delimiter = ',', allow_negative_numbers = true, default_values_t = [0.0])]
        mortality: Vec<f64>,

        /// Migration adjustments in percent, comma separated
        #[arg(long, value_delimiter = ',', allow_negative_numbers = true, default_values_t = [0.0])]
        migration: Vec<f64>,
    },
}

#[derive(Args)]
struct ScenarioArgs {
    /// Fertility adjustment in percent
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    fertility: f64,

    /// Mortality adjustment in percent
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    mortality: f64,

    /// Migration adjustment in percent
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    migration: f64,

    /// Target total fertility rate (overrides --fertility)
    #[arg(long)]
    tfr: Option<f64>,

    /// Change in life expectancy at birth in years (overrides --mortality)
    #[arg(long, allow_negative_numbers = true)]
    life_expectancy_change: Option<f64>,

    /// Target annual net migration (overrides --migration)
    #[arg(long, allow_negative_numbers = true)]
    net_migration: Option<f64>,
}

impl ScenarioArgs {
    fn parameters(&self, model: &ModelData) -> ScenarioParameters {
        let targets = ScenarioTargets {
            tfr: self.tfr,
            life_expectancy_change: self.life_expectancy_change,
            net_migration: self.net_migration,
        };
        let scenario = ScenarioParameters::new(self.fertility, self.mortality, self.migration)
            .with_targets(&targets, &model.tables, &model.config);
        if !targets.is_empty() {
            info!(
                "targets resolved to fertility {:.3}%, mortality {:.3}%, migration {:.3}%",
                scenario.fertility, scenario.mortality, scenario.migration
            );
        }
        scenario
    }
}

#[derive(Serialize)]
struct PopulationRow {
    year: i32,
    age_group: &'static str,
    sex: &'static str,
    population: f64,
}

#[derive(Serialize)]
struct SeriesRow {
    year: i32,
    total: f64,
    male: f64,
    female: f64,
    share_65_plus: f64,
    births: f64,
    surviving_infants: f64,
    deaths: f64,
    net_migration: f64,
    global_mortality_rate: f64,
}

#[derive(Serialize)]
struct SweepRow {
    fertility: f64,
    mortality: f64,
    migration: f64,
    year: i32,
    total: f64,
    male: f64,
    female: f64,
    share_65_plus: f64,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let model = load_model(&cli)?;
    let mut writer = csv_writer(cli.output.as_deref())?;

    match &cli.cmd {
        Command::Project { year, scenario } => {
            let scenario = scenario.parameters(&model);
            run_project(model, *year, &scenario, &mut writer)?
        }
        Command::Series { to, scenario } => run_series(&model, *to, &scenario.parameters(&model), &mut writer)?,
        Command::Sweep {
            year,
            fertility,
            mortality,
            migration,
        } => run_sweep(&model, *year, fertility, mortality, migration, &mut writer)?,
    }

    writer.flush().context("flushing CSV output")?;
    if let Some(path) = &cli.output {
        eprintln!("Results written to: {}", path.display());
    }
    eprintln!("Generated at {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
    Ok(())
}

fn load_model(cli: &Cli) -> Result<ModelData> {
    let mut model = ModelData::from_dir(&cli.data_dir)
        .with_context(|| format!("loading model data from {}", cli.data_dir.display()))?;

    if let Some(path) = &cli.config {
        model.config = EngineConfig::from_json_path(path)
            .with_context(|| format!("loading engine config from {}", path.display()))?;
    }
    if let Some(migration) = cli.baseline_migration {
        model.config.baseline_net_migration = migration;
    }
    if let Some(share) = cli.male_birth_share {
        model.config.male_birth_share = share;
    }
    if let Some(year) = cli.last_observed_year {
        model.config.last_observed_year = Some(year);
    }
    model.config.validate().context("invalid engine config")?;

    if model.report.rows_skipped > 0 {
        warn!("{} malformed rows were skipped while loading", model.report.rows_skipped);
    }
    Ok(model)
}

fn csv_writer(output: Option<&Path>) -> Result<csv::Writer<Box<dyn Write>>> {
    let sink: Box<dyn Write> = match output {
        Some(path) => Box::new(File::create(path).with_context(|| format!("creating {}", path.display()))?),
        None => Box::new(io::stdout()),
    };
    Ok(csv::Writer::from_writer(sink))
}

/// Base year and snapshot for projections that bypass the gateway
fn projection_base(model: &ModelData) -> Result<(i32, PopulationSnapshot)> {
    let base_year = model
        .config
        .last_observed_year
        .or_else(|| model.observed.last_observed_year())
        .ok_or_else(|| anyhow!("no observed population in the data directory"))?;
    let base = model
        .observed
        .get(base_year)
        .cloned()
        .ok_or_else(|| anyhow!("no observed population for {}", base_year))?;
    Ok((base_year, base))
}

/// Reject targets past the configured projection horizon
fn check_horizon(model: &ModelData, base_year: i32, target_year: i32) -> Result<()> {
    let horizon = model.config.max_projection_years;
    if i64::from(target_year) - i64::from(base_year) > i64::from(horizon) {
        return Err(anyhow!(
            "target year {} is more than {} years past the base year {}",
            target_year,
            horizon,
            base_year
        ));
    }
    Ok(())
}

fn run_project(
    model: ModelData,
    year: i32,
    scenario: &ScenarioParameters,
    writer: &mut csv::Writer<Box<dyn Write>>,
) -> Result<()> {
    let mut gateway = model.into_gateway();
    let class = gateway.classify(year);
    info!("{} classified as {:?}", year, class);

    let population = gateway
        .apply_scenarios(scenario, year)
        .ok_or_else(|| anyhow!("no population available for {}", year))?;

    for sex in Sex::ALL {
        for (age_group, label) in AGE_GROUP_LABELS.into_iter().enumerate() {
            writer.serialize(PopulationRow {
                year,
                age_group: label,
                sex: sex.as_str(),
                population: population.get(age_group, sex),
            })?;
        }
    }

    eprintln!("{} ({:?})", year, class);
    eprintln!("  Total:  {:.0}", population.total());
    eprintln!("  Male:   {:.0}", population.total_male());
    eprintln!("  Female: {:.0}", population.total_female());
    eprintln!("  65+:    {:.2}%", population.share_at_or_above(AGE_GROUP_65) * 100.0);

    if class == YearClass::Projected {
        if let Some(diagnostics) = gateway.year_diagnostics(scenario, year) {
            eprintln!("  Births:        {:.0}", diagnostics.births);
            eprintln!("  Deaths:        {:.0}", diagnostics.deaths);
            eprintln!("  Net migration: {:.0}", diagnostics.adjusted_net_migration);
            eprintln!("  Adjusted TFR:  {:.3}", diagnostics.adjusted_tfr);
        }
    }
    if let Some(rate) = gateway.baseline_global_mortality_rate(year) {
        eprintln!("  Baseline deaths per 1,000: {:.2}", rate);
    }
    Ok(())
}

fn run_series(
    model: &ModelData,
    target_year: i32,
    scenario: &ScenarioParameters,
    writer: &mut csv::Writer<Box<dyn Write>>,
) -> Result<()> {
    let (base_year, base) = projection_base(model)?;
    if target_year <= base_year {
        return Err(anyhow!("target year {} must follow the base year {}", target_year, base_year));
    }
    check_horizon(model, base_year, target_year)?;

    let start = Instant::now();
    let steps = model.engine().project_series(&base, base_year, scenario, target_year);
    info!("projected {} years in {:?}", steps.len(), start.elapsed());

    for step in &steps {
        writer.serialize(SeriesRow {
            year: step.year,
            total: step.population.total(),
            male: step.population.total_male(),
            female: step.population.total_female(),
            share_65_plus: step.population.share_at_or_above(AGE_GROUP_65),
            births: step.diagnostics.births,
            surviving_infants: step.diagnostics.surviving_infants,
            deaths: step.diagnostics.deaths,
            net_migration: step.diagnostics.adjusted_net_migration,
            global_mortality_rate: step.diagnostics.global_mortality_rate,
        })?;
    }
    Ok(())
}

fn run_sweep(
    model: &ModelData,
    target_year: i32,
    fertility: &[f64],
    mortality: &[f64],
    migration: &[f64],
    writer: &mut csv::Writer<Box<dyn Write>>,
) -> Result<()> {
    let (base_year, base) = projection_base(model)?;
    if target_year < base_year {
        return Err(anyhow!("target year {} precedes the base year {}", target_year, base_year));
    }
    check_horizon(model, base_year, target_year)?;

    let grid = ScenarioRunner::grid(fertility, mortality, migration);
    let start = Instant::now();
    let results = model.runner().run_sweep(&base, base_year, target_year, &grid);
    info!("{} scenarios projected in {:?}", results.len(), start.elapsed());

    for result in &results {
        writer.serialize(SweepRow {
            fertility: result.scenario.fertility,
            mortality: result.scenario.mortality,
            migration: result.scenario.migration,
            year: result.target_year,
            total: result.total,
            male: result.total_male,
            female: result.total_female,
            share_65_plus: result.share_65_plus,
        })?;
    }
    Ok(())
}
