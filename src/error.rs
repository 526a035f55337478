//! Load-time errors and row-level load reporting
//!
//! Only structural failures surface as `LoadError`. Rows that cannot be
//! parsed are skipped and counted in a `LoadReport`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read CSV data: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl LoadError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LoadError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Outcome of reading a tabular source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Rows accepted into the table
    pub rows_read: usize,

    /// Rows dropped because they failed to parse or named an unknown age group/sex
    pub rows_skipped: usize,
}

impl LoadReport {
    pub(crate) fn accept(&mut self) {
        self.rows_read += 1;
    }

    pub(crate) fn skip(&mut self) {
        self.rows_skipped += 1;
    }

    /// Combine reports from several sources
    pub fn merge(self, other: LoadReport) -> LoadReport {
        LoadReport {
            rows_read: self.rows_read + other.rows_read,
            rows_skipped: self.rows_skipped + other.rows_skipped,
        }
    }
}
