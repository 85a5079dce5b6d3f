//src/sample.rs

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::Path;

use crate::error::{ClasparError, Result};
use crate::reader::open_text;
use crate::types::{AlignmentRecord, ClassifierRecord, ContainmentRecord};

pub const CLASSIFIER_CALLS: &str = "classifier_calls";
pub const SYLPH_RESULTS: &str = "sylph_results";
pub const ALIGNMENT_RESULTS: &str = "alignment_results";

/// Samplesheet column holding the sample record JSON.
pub const SAMPLESHEET_JSON_COLUMN: &str = "full_Onyx_json";

/// The three classifier tables of one sample. Any of them may be empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleTables {
    pub classifier_calls: Vec<ClassifierRecord>,
    pub sylph_results: Vec<ContainmentRecord>,
    pub alignment_results: Vec<AlignmentRecord>,
}

impl SampleTables {
    /// Extract the tables from a sample record object.
    pub fn from_record(record: &Value) -> Result<Self> {
        let classifier_calls = parse_rows(
            CLASSIFIER_CALLS,
            table(record, CLASSIFIER_CALLS)?,
            ClassifierRecord::FIELDS,
        )?;
        let sylph_results = parse_rows(
            SYLPH_RESULTS,
            table(record, SYLPH_RESULTS)?,
            ContainmentRecord::FIELDS,
        )?;
        let alignment_results = parse_rows(
            ALIGNMENT_RESULTS,
            table(record, ALIGNMENT_RESULTS)?,
            AlignmentRecord::FIELDS,
        )?;

        log::info!(
            "Sample record has {} classifier calls, {} sylph results and {} alignment results",
            classifier_calls.len(),
            sylph_results.len(),
            alignment_results.len()
        );

        Ok(Self {
            classifier_calls,
            sylph_results,
            alignment_results,
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::from_record(&serde_json::from_str(json)?)
    }

    /// Read a sample record from a JSON file (plain or `.gz`).
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let record: Value = serde_json::from_reader(open_text(path)?)?;
        Self::from_record(&record)
    }

    /// Read the sample record from a tab-separated samplesheet. The JSON is
    /// taken from the `full_Onyx_json` column, or from the second column of a
    /// two-column sheet; only the first data row is used.
    pub fn from_samplesheet<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .from_reader(open_text(path)?);

        let headers = reader.headers()?.clone();
        let column = match headers.iter().position(|h| h == SAMPLESHEET_JSON_COLUMN) {
            Some(idx) => idx,
            None if headers.len() == 2 => 1,
            None => {
                return Err(ClasparError::Samplesheet(format!(
                    "expected a '{}' column or exactly two columns, found {}",
                    SAMPLESHEET_JSON_COLUMN,
                    headers.len()
                )))
            }
        };

        let row = reader
            .records()
            .next()
            .ok_or_else(|| ClasparError::Samplesheet("no sample rows".to_string()))??;
        let json = row
            .get(column)
            .ok_or_else(|| ClasparError::Samplesheet("sample row is too short".to_string()))?;

        Self::from_json_str(json)
    }
}

fn table<'v>(record: &'v Value, key: &str) -> Result<&'v [Value]> {
    match record.get(key) {
        Some(Value::Array(rows)) => Ok(rows),
        Some(Value::Null) => Ok(&[][..]),
        Some(_) => Err(ClasparError::Samplesheet(format!("`{}` is not a list of rows", key))),
        None => {
            log::error!("Could not find key {} in sample record.", key);
            Err(ClasparError::MissingRecordKey(key.to_string()))
        }
    }
}

/// Deserialize every row of a table, reporting the first missing column by
/// name before any type errors.
pub fn parse_rows<T: DeserializeOwned>(
    table: &'static str,
    rows: &[Value],
    required: &[&str],
) -> Result<Vec<T>> {
    let mut parsed = Vec::with_capacity(rows.len());
    for (row, value) in rows.iter().enumerate() {
        let fields = value.as_object().ok_or_else(|| ClasparError::MalformedRow {
            table,
            row,
            message: "row is not an object".to_string(),
        })?;

        if let Some(field) = required.iter().find(|f| !fields.contains_key(**f)) {
            log::error!("The {} data is missing expected column: {}", table, field);
            return Err(ClasparError::MissingField {
                table,
                field: field.to_string(),
            });
        }

        let record = T::deserialize(value).map_err(|e| ClasparError::MalformedRow {
            table,
            row,
            message: e.to_string(),
        })?;
        parsed.push(record);
    }
    Ok(parsed)
}
