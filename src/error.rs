// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Every failure the parsers, engines and writers can report.
#[derive(Debug, Error)]
pub enum ClasparError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not read filter thresholds file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid filter thresholds: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    #[error("filter section `{0}` is missing from the configuration")]
    MissingSection(String),

    #[error("required filters missing from `{section}`: {}", .missing.join(", "))]
    MissingFilters {
        section: String,
        missing: Vec<String>,
    },

    #[error("sample record is missing key `{0}`")]
    MissingRecordKey(String),

    #[error("{table} data is missing expected field `{field}`")]
    MissingField { table: &'static str, field: String },

    #[error("malformed {table} row {row}: {message}")]
    MalformedRow {
        table: &'static str,
        row: usize,
        message: String,
    },

    #[error("invalid containment index {value:?} in row {row}")]
    InvalidContainmentIndex { row: usize, value: String },

    #[error("cannot parse samplesheet: {0}")]
    Samplesheet(String),

    #[error("analysis record failed validation: {}", .0.join("; "))]
    InvalidAnalysis(Vec<String>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, ClasparError>;
