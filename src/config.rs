//src/config.rs

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::path::Path;

use crate::error::{ClasparError, Result};

pub const KRAKEN_SECTION: &str = "kraken_bacterial_filters";
pub const SYLPH_SECTION: &str = "sylph_filters";
pub const VIRAL_ALIGNER_SECTION: &str = "viral_aligner_filters";

/// Thresholds shipped with the crate, used when no config file is given.
const BUNDLED_THRESHOLDS: &str = include_str!("../data/filter_thresholds.yaml");

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KrakenThresholds {
    /// Minimum reads (clade count) for a species.
    #[serde(rename = "READ_THRESHOLD")]
    pub read_threshold: u64,
    /// Highest accepted rank of a species within its genus.
    #[serde(rename = "GENUS_RANK_THRESHOLD")]
    pub genus_rank_threshold: u32,
    /// Minimum share (percent) of the genus reads held by the species.
    #[serde(rename = "GENUS_READ_PCT_THRESHOLD")]
    pub genus_read_pct_threshold: f64,
}

impl KrakenThresholds {
    pub const FILTERS: &'static [&'static str] = &[
        "READ_THRESHOLD",
        "GENUS_RANK_THRESHOLD",
        "GENUS_READ_PCT_THRESHOLD",
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SylphThresholds {
    #[serde(rename = "CONTAINMENT_INDEX_THRESHOLD")]
    pub containment_index_threshold: f64,
    #[serde(rename = "EFFECTIVE_COVERAGE_THRESHOLD")]
    pub effective_coverage_threshold: f64,
}

impl SylphThresholds {
    pub const FILTERS: &'static [&'static str] = &[
        "CONTAINMENT_INDEX_THRESHOLD",
        "EFFECTIVE_COVERAGE_THRESHOLD",
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViralAlignerThresholds {
    #[serde(rename = "EVENNESS_VALUE")]
    pub evenness_value: f64,
    #[serde(rename = "COVERAGE_1X")]
    pub coverage_1x: f64,
    #[serde(rename = "UNIQUELY_MAPPED_READS")]
    pub uniquely_mapped_reads: f64,
    #[serde(rename = "MEAN_READ_IDENTITY")]
    pub mean_read_identity: f64,
    #[serde(rename = "MEAN_ALIGNMENT_LENGTH")]
    pub mean_alignment_length: f64,
}

impl ViralAlignerThresholds {
    pub const FILTERS: &'static [&'static str] = &[
        "EVENNESS_VALUE",
        "COVERAGE_1X",
        "UNIQUELY_MAPPED_READS",
        "MEAN_READ_IDENTITY",
        "MEAN_ALIGNMENT_LENGTH",
    ];
}

/// Filter thresholds for all three pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FilterConfig {
    pub kraken_bacterial_filters: KrakenThresholds,
    pub sylph_filters: SylphThresholds,
    pub viral_aligner_filters: ViralAlignerThresholds,
}

impl FilterConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ClasparError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn bundled() -> Result<Self> {
        Self::from_yaml_str(BUNDLED_THRESHOLDS)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let root: Mapping = serde_yaml::from_str(content)?;
        Ok(Self {
            kraken_bacterial_filters: section(&root, KRAKEN_SECTION, KrakenThresholds::FILTERS)?,
            sylph_filters: section(&root, SYLPH_SECTION, SylphThresholds::FILTERS)?,
            viral_aligner_filters: section(
                &root,
                VIRAL_ALIGNER_SECTION,
                ViralAlignerThresholds::FILTERS,
            )?,
        })
    }
}

fn section<T: DeserializeOwned>(root: &Mapping, name: &str, filters: &[&str]) -> Result<T> {
    let value = root
        .get(name)
        .ok_or_else(|| ClasparError::MissingSection(name.to_string()))?;

    let provided: Vec<String> = match value {
        Value::Mapping(m) => m
            .keys()
            .filter_map(|k| k.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    };
    check_filters(name, filters, &provided)?;

    Ok(serde_yaml::from_value(value.clone())?)
}

/// Compare the filters a section provides with the ones a pipeline expects.
/// Extra filters are only logged; any missing filter is an error.
pub fn check_filters(section: &str, expected: &[&str], provided: &[String]) -> Result<()> {
    for f in provided {
        if !expected.contains(&f.as_str()) {
            log::info!("Filter '{}' is not set to be used.", f);
        }
    }

    let missing: Vec<String> = expected
        .iter()
        .filter(|f| !provided.iter().any(|p| p == *f))
        .map(|f| f.to_string())
        .collect();
    for f in &missing {
        log::error!("Filter '{}' has not been provided and is required. Exiting.", f);
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ClasparError::MissingFilters {
            section: section.to_string(),
            missing,
        })
    }
}
