//! CSV-based rate table loader
//!
//! Loads reference rate tables from CSV files in a data directory. Rates are
//! read as published (per 1,000) and converted where the engine expects
//! another unit.

use super::{FertilityRateTable, MigrationDistribution, MortalityRateTable};
use crate::error::{LoadError, LoadReport};
use crate::population::loader::read_rows;
use crate::population::{age_group_index, Sex, NUM_AGE_GROUPS};
use log::info;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Default path to the data directory
pub const DEFAULT_DATA_PATH: &str = "data";

pub const MORTALITY_RATES_FILE: &str = "mortality_rates.csv";
pub const FERTILITY_RATES_FILE: &str = "fertility_rates.csv";
pub const MIGRATION_DISTRIBUTION_FILE: &str = "migration_distribution.csv";

#[derive(Debug, Deserialize)]
struct MortalityRow {
    #[serde(alias = "Age group", alias = "AgeGroup", alias = "age")]
    age_group: String,
    #[serde(alias = "Sex", alias = "Gender")]
    sex: String,
    #[serde(alias = "rate", alias = "Value", alias = "VALUE")]
    rate_per_1000: f64,
}

#[derive(Debug, Deserialize)]
struct FertilityRow {
    #[serde(alias = "Age group", alias = "AgeGroup", alias = "age")]
    age_group: String,
    #[serde(alias = "rate", alias = "Value", alias = "VALUE")]
    rate_per_1000: f64,
}

#[derive(Debug, Deserialize)]
struct MigrationRow {
    #[serde(alias = "Age group", alias = "AgeGroup", alias = "age")]
    age_group: String,
    #[serde(alias = "Sex", alias = "Gender")]
    sex: String,
    #[serde(alias = "Value", alias = "VALUE", alias = "migrants")]
    net_migrants: f64,
}

fn open(path: &Path) -> Result<File, LoadError> {
    File::open(path).map_err(|e| LoadError::io(path, e))
}

/// Load mortality rates (`age_group,sex,rate_per_1000`)
pub fn load_mortality_rates_from_reader<R: Read>(
    reader: R,
    source: &str,
) -> Result<(MortalityRateTable, LoadReport), LoadError> {
    let mut table = MortalityRateTable::empty();

    let report = read_rows(reader, source, |row: MortalityRow| {
        match (age_group_index(&row.age_group), Sex::parse(&row.sex)) {
            (Some(age_group), Some(sex)) => table.set_rate(age_group, sex, row.rate_per_1000),
            _ => false,
        }
    })?;

    info!(
        "{}: loaded {} mortality rates, {} cohorts fall back to default",
        source,
        report.rows_read,
        table.missing_entries()
    );

    Ok((table, report))
}

/// Load mortality rates from `mortality_rates.csv` in a data directory
pub fn load_mortality_rates(dir: &Path) -> Result<(MortalityRateTable, LoadReport), LoadError> {
    let path = dir.join(MORTALITY_RATES_FILE);
    load_mortality_rates_from_reader(open(&path)?, &path.display().to_string())
}

/// Load ASFRs (`age_group,rate_per_1000`)
///
/// Rates for non-reproductive age groups are ignored; the row still counts
/// as read since its label is valid.
pub fn load_fertility_rates_from_reader<R: Read>(
    reader: R,
    source: &str,
) -> Result<(FertilityRateTable, LoadReport), LoadError> {
    let mut table = FertilityRateTable::default();

    let report = read_rows(reader, source, |row: FertilityRow| {
        let Some(age_group) = age_group_index(&row.age_group) else {
            return false;
        };
        if !row.rate_per_1000.is_finite() || row.rate_per_1000 < 0.0 {
            return false;
        }
        table.set_rate(age_group, row.rate_per_1000 / 1000.0);
        true
    })?;

    info!("{}: loaded ASFR table, baseline TFR {:.3}", source, table.tfr());

    Ok((table, report))
}

/// Load ASFRs from `fertility_rates.csv` in a data directory
pub fn load_fertility_rates(dir: &Path) -> Result<(FertilityRateTable, LoadReport), LoadError> {
    let path = dir.join(FERTILITY_RATES_FILE);
    load_fertility_rates_from_reader(open(&path)?, &path.display().to_string())
}

/// Load reference-period net migrant counts (`age_group,sex,net_migrants`)
/// and derive shares
pub fn load_migration_distribution_from_reader<R: Read>(
    reader: R,
    source: &str,
) -> Result<(MigrationDistribution, LoadReport), LoadError> {
    let mut male = [0.0; NUM_AGE_GROUPS];
    let mut female = [0.0; NUM_AGE_GROUPS];

    let report = read_rows(reader, source, |row: MigrationRow| {
        let (Some(age_group), Some(sex)) = (age_group_index(&row.age_group), Sex::parse(&row.sex)) else {
            return false;
        };
        if !row.net_migrants.is_finite() {
            return false;
        }
        match sex {
            Sex::Male => male[age_group] += row.net_migrants,
            Sex::Female => female[age_group] += row.net_migrants,
        }
        true
    })?;

    let distribution = MigrationDistribution::from_counts(male, female);
    info!(
        "{}: loaded migration distribution from {} net migrants",
        source,
        distribution.grand_total()
    );

    Ok((distribution, report))
}

/// Load the migration distribution from `migration_distribution.csv` in a data directory
pub fn load_migration_distribution(dir: &Path) -> Result<(MigrationDistribution, LoadReport), LoadError> {
    let path = dir.join(MIGRATION_DISTRIBUTION_FILE);
    load_migration_distribution_from_reader(open(&path)?, &path.display().to_string())
}

/// Read a whole source file asynchronously
pub async fn read_source(path: &Path) -> Result<String, LoadError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| LoadError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::DEFAULT_MORTALITY_RATE_PER_1000;
    use approx::assert_relative_eq;

    #[test]
    fn test_load_mortality_with_gaps() {
        let csv = "\
age_group,sex,rate_per_1000
\"0 to 4 years\",Males,1.1
\"0 to 4 years\",Females,0.9
\"100 years and over\",Females,350.5
\"Ages unknown\",Females,3.0
\"5 to 9 years\",Females,
\"5 to 9 years\",Males,-2
";
        let (table, report) = load_mortality_rates_from_reader(csv.as_bytes(), "mortality").unwrap();

        assert_eq!(report.rows_read, 3);
        assert_eq!(report.rows_skipped, 3);
        assert_eq!(table.rate(0, Sex::Male), 1.1);
        assert_eq!(table.rate(20, Sex::Female), 350.5);
        assert_eq!(table.rate(1, Sex::Female), DEFAULT_MORTALITY_RATE_PER_1000);
        assert_eq!(table.rate(1, Sex::Male), DEFAULT_MORTALITY_RATE_PER_1000);
    }

    #[test]
    fn test_load_fertility_per_1000() {
        let csv = "\
age_group,rate_per_1000
\"15 to 19 years\",4.0
\"20 to 24 years\",26.0
\"30 to 34 years\",100.0
\"50 to 54 years\",0.5
\"Total\",1.4
";
        let (table, report) = load_fertility_rates_from_reader(csv.as_bytes(), "asfr").unwrap();

        assert_eq!(report.rows_read, 4);
        assert_eq!(report.rows_skipped, 1);
        assert_relative_eq!(table.rate(3), 0.004, epsilon = 1e-12);
        assert_relative_eq!(table.rate(6), 0.1, epsilon = 1e-12);
        assert_eq!(table.rate(10), 0.0);
        assert_relative_eq!(table.tfr(), 5.0 * 0.130, epsilon = 1e-12);
    }

    #[test]
    fn test_later_zero_row_clears_rate() {
        let csv = "\
age_group,rate_per_1000
\"30 to 34 years\",100.0
\"30 to 34 years\",0
";
        let (table, report) = load_fertility_rates_from_reader(csv.as_bytes(), "asfr").unwrap();

        assert_eq!(report.rows_read, 2);
        assert_eq!(table.rate(6), 0.0);
        assert_eq!(table.tfr(), 0.0);
    }

    #[test]
    fn test_load_migration_counts() {
        let csv = "\
age_group,sex,net_migrants
\"25 to 29 years\",Males,6000
\"25 to 29 years\",Females,4000
\"65 to 69 years\",Males,-500
\"65 to 69 years\",Males,500
\"70 to 74 years\",Other,100
";
        let (dist, report) = load_migration_distribution_from_reader(csv.as_bytes(), "migration").unwrap();

        assert_eq!(report.rows_read, 4);
        assert_eq!(report.rows_skipped, 1);
        assert!(dist.is_normalized());
        assert_relative_eq!(dist.share(5, Sex::Male), 0.6, epsilon = 1e-12);
        assert_eq!(dist.share(13, Sex::Male), 0.0);
        assert_eq!(dist.grand_total(), 10_000.0);
    }

    #[test]
    fn test_missing_directory() {
        let result = load_mortality_rates(Path::new("no/such/dir"));
        assert!(matches!(result, Err(LoadError::Io { .. })));
    }
}
