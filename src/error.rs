use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the cross-validation engine.
///
/// Only loading, configuration and report writing can fail. Problems found
/// while comparing the two sources are findings, not errors.
#[derive(Debug, Error)]
pub enum Error {
    /// The tabular source could not be read or parsed.
    #[error("Failed to load tabular source {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The nested metrics document is not valid JSON.
    #[error("Failed to parse nested metrics {path}: {source}")]
    NestedParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid tolerance for '{key}': {value} (must be a non-negative number)")]
    InvalidTolerance { key: &'static str, value: f64 },

    #[error("Failed to render report: {0}")]
    Render(#[from] serde_json::Error),

    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failure inside a single check or anomaly detector.
///
/// Never escapes the engine: the validator turns it into a critical outcome
/// and the anomaly detectors turn it into an issue line.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CheckError {
    #[error("missing column '{0}' in tabular source")]
    MissingColumn(&'static str),

    #[error("missing nested value at '{0}'")]
    MissingPath(String),

    #[error("no data: {0}")]
    NoData(String),
}
