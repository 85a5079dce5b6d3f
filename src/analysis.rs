//src/analysis.rs

use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::str::FromStr;

use crate::error::Result;
use crate::summary::ResultListing;

pub const PIPELINE_NAME: &str = "ClasPar";
pub const PACKAGE_NAME: &str = env!("CARGO_PKG_NAME");
pub const PACKAGE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Server the analysis is recorded against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Server {
    Mscape,
    Synthscape,
}

impl Server {
    pub const NAMES: [&'static str; 2] = ["mscape", "synthscape"];
}

impl FromStr for Server {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "mscape" => Ok(Server::Mscape),
            "synthscape" => Ok(Server::Synthscape),
            other => Err(format!("unknown server '{}'", other)),
        }
    }
}

impl fmt::Display for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Server::Mscape => f.write_str("mscape"),
            Server::Synthscape => f.write_str("synthscape"),
        }
    }
}

/// Everything one pipeline hands over for its analysis record.
pub struct AnalysisFields<'a, T: Serialize> {
    /// `bacteria`, `virus`, ...
    pub domain: &'a str,
    /// `kraken`, `sylph`, `viral aligner`
    pub classifier: &'a str,
    pub sample_id: &'a str,
    pub thresholds: &'a T,
    pub headline: &'a str,
    pub results: &'a ResultListing,
    pub server: Server,
}

/// Outcome of checking an assembled record's required fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationStatus {
    Passed,
    Failed(Vec<String>),
}

impl ValidationStatus {
    pub fn is_passed(&self) -> bool {
        matches!(self, ValidationStatus::Passed)
    }
}

/// The analysis record written for each pipeline of a sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRecord {
    pub name: String,
    pub description: String,
    pub pipeline_name: String,
    pub pipeline_version: String,
    pub package_name: String,
    pub methods: Value,
    pub result: String,
    pub results: Value,
    pub sample_id: String,
    pub server: Server,
}

impl AnalysisRecord {
    /// Build the record and check it. A record that fails validation is still
    /// returned so it can be inspected.
    pub fn assemble<T: Serialize>(fields: AnalysisFields<'_, T>) -> (Self, ValidationStatus) {
        let mut problems = Vec::new();

        let methods = serde_json::to_value(fields.thresholds).unwrap_or_else(|e| {
            problems.push(format!("methods could not be serialized: {}", e));
            Value::Null
        });
        let results = serde_json::to_value(fields.results).unwrap_or_else(|e| {
            problems.push(format!("results could not be serialized: {}", e));
            Value::Null
        });

        let record = Self {
            name: format!("{}-classifier-parser", fields.domain),
            description: format!(
                "This is an analysis to parse and filter the {} classifications from {}",
                fields.domain, fields.classifier
            ),
            pipeline_name: PIPELINE_NAME.to_string(),
            pipeline_version: PACKAGE_VERSION.to_string(),
            package_name: PACKAGE_NAME.to_string(),
            methods,
            result: fields.headline.to_string(),
            results,
            sample_id: fields.sample_id.to_string(),
            server: fields.server,
        };

        problems.extend(record.missing_fields());
        let status = if problems.is_empty() {
            ValidationStatus::Passed
        } else {
            for p in &problems {
                log::error!("Analysis record for {}: {}", record.name, p);
            }
            ValidationStatus::Failed(problems)
        };
        (record, status)
    }

    fn missing_fields(&self) -> Vec<String> {
        let mut missing = Vec::new();
        let required = [
            ("name", self.name.trim_end_matches("-classifier-parser")),
            ("sample_id", self.sample_id.as_str()),
            ("result", self.result.as_str()),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                missing.push(format!("required field `{}` is empty", field));
            }
        }
        match &self.methods {
            Value::Object(m) if !m.is_empty() => {}
            _ => missing.push("methods must be a non-empty mapping of thresholds".to_string()),
        }
        if !self.results.is_object() {
            missing.push("results must be a mapping".to_string());
        }
        missing
    }

    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}
