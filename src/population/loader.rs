//! Load observed population snapshots from long-format CSV or model JSON

use super::{age_group_index, PopulationSnapshot, Sex, NUM_AGE_GROUPS};
use crate::error::{LoadError, LoadReport};
use csv::{ReaderBuilder, Trim};
use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Default file name for observed population in a data directory
pub const OBSERVED_POPULATION_FILE: &str = "observed_population.csv";

/// Deserialize every row of a headed CSV source
///
/// Rows that fail to deserialize, or that `accept` rejects, are counted as
/// skipped. Only I/O failures abort the read.
pub(crate) fn read_rows<R, T, F>(reader: R, source: &str, mut accept: F) -> Result<LoadReport, LoadError>
where
    R: Read,
    T: DeserializeOwned,
    F: FnMut(T) -> bool,
{
    let mut csv_reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);
    let mut report = LoadReport::default();

    for result in csv_reader.deserialize::<T>() {
        match result {
            Ok(row) => {
                if accept(row) {
                    report.accept()
                } else {
                    report.skip()
                }
            }
            Err(err) if err.is_io_error() => return Err(err.into()),
            Err(err) => {
                warn!("{}: skipping malformed row: {}", source, err);
                report.skip();
            }
        }
    }

    if report.rows_skipped > 0 {
        warn!(
            "{}: {} rows read, {} rows skipped",
            source, report.rows_read, report.rows_skipped
        );
    }

    Ok(report)
}

/// Raw CSV row: one cohort count for one year
#[derive(Debug, Deserialize)]
struct ObservedRow {
    #[serde(alias = "Year", alias = "REF_DATE")]
    year: i32,
    #[serde(alias = "Age group", alias = "AgeGroup", alias = "age")]
    age_group: String,
    #[serde(alias = "Sex", alias = "Gender")]
    sex: String,
    #[serde(alias = "Value", alias = "VALUE", alias = "population")]
    value: f64,
}

/// Snapshot entry in the model JSON file
#[derive(Debug, Deserialize)]
struct JsonSnapshot {
    male: Vec<Option<f64>>,
    female: Vec<Option<f64>>,
}

impl JsonSnapshot {
    fn into_snapshot(self) -> Option<PopulationSnapshot> {
        fn to_vector(values: Vec<Option<f64>>) -> Option<[f64; NUM_AGE_GROUPS]> {
            if values.len() != NUM_AGE_GROUPS {
                return None;
            }
            let mut out = [0.0; NUM_AGE_GROUPS];
            for (cell, value) in out.iter_mut().zip(values) {
                match value {
                    Some(v) if v.is_finite() && v >= 0.0 => *cell = v,
                    _ => return None,
                }
            }
            Some(out)
        }

        Some(PopulationSnapshot::new(to_vector(self.male)?, to_vector(self.female)?))
    }
}

#[derive(Debug, Deserialize)]
struct JsonModelFile {
    observed: BTreeMap<String, JsonSnapshot>,
}

/// Immutable store of observed population snapshots by calendar year
#[derive(Debug, Clone, Default)]
pub struct ObservedPopulation {
    snapshots: BTreeMap<i32, PopulationSnapshot>,
}

impl ObservedPopulation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the snapshot for a year
    pub fn insert(&mut self, year: i32, snapshot: PopulationSnapshot) {
        self.snapshots.insert(year, snapshot);
    }

    /// Snapshot for a year, if observed
    pub fn get(&self, year: i32) -> Option<&PopulationSnapshot> {
        self.snapshots.get(&year)
    }

    /// Latest year with observed data
    pub fn last_observed_year(&self) -> Option<i32> {
        self.snapshots.keys().next_back().copied()
    }

    /// Observed years in ascending order
    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.snapshots.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Load from a long-format CSV file (`year,age_group,sex,value`)
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<(Self, LoadReport), LoadError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| LoadError::io(path, e))?;
        Self::from_csv_reader(file, &path.display().to_string())
    }

    /// Load from any reader producing long-format CSV
    pub fn from_csv_reader<R: Read>(reader: R, source: &str) -> Result<(Self, LoadReport), LoadError> {
        let mut store = Self::new();

        let report = read_rows(reader, source, |row: ObservedRow| {
            let (Some(age_group), Some(sex)) = (age_group_index(&row.age_group), Sex::parse(&row.sex)) else {
                return false;
            };
            if !row.value.is_finite() || row.value < 0.0 {
                return false;
            }
            store
                .snapshots
                .entry(row.year)
                .or_default()
                .set(age_group, sex, row.value);
            true
        })?;

        info!(
            "{}: loaded observed population for {} years ({} rows)",
            source,
            store.len(),
            report.rows_read
        );

        Ok((store, report))
    }

    /// Load from model JSON (`{"observed": {"2025": {"male": [...], "female": [...]}}}`)
    pub fn from_json_str(json: &str) -> Result<(Self, LoadReport), LoadError> {
        let model: JsonModelFile = serde_json::from_str(json)?;
        let mut store = Self::new();
        let mut report = LoadReport::default();

        for (year, raw) in model.observed {
            match (year.trim().parse::<i32>(), raw.into_snapshot()) {
                (Ok(year), Some(snapshot)) => {
                    store.insert(year, snapshot);
                    report.accept();
                }
                _ => {
                    warn!("observed population: skipping malformed snapshot for year {}", year);
                    report.skip();
                }
            }
        }

        Ok((store, report))
    }

    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<(Self, LoadReport), LoadError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| LoadError::io(path, e))?;
        Self::from_json_str(&contents)
    }
}
