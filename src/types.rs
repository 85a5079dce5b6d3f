//src/types.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric taxon identifier (NCBI-style).
pub type TaxId = u32;

/// Taxon id Kraken uses for reads it could not classify; carries no taxonomy.
pub const UNCLASSIFIED_TAXID: TaxId = 0;

/// A snapshot of one taxonomy node, as returned by a [`crate::taxdb::Taxonomy`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxonRecord {
    pub taxid: TaxId,
    pub parent_taxid: TaxId,
    pub name: String,
    pub rank: String,
}

/// Rank code from a Kraken report (`G`, `S`, `G1`, `D`, `U`, ...).
/// Only genus and species rows take part in the analysis; everything else is
/// carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RawRank {
    Genus,
    Species,
    Other(String),
}

impl From<String> for RawRank {
    fn from(code: String) -> Self {
        match code.trim() {
            "G" => RawRank::Genus,
            "S" => RawRank::Species,
            _ => RawRank::Other(code),
        }
    }
}

impl From<RawRank> for String {
    fn from(rank: RawRank) -> Self {
        rank.to_string()
    }
}

impl fmt::Display for RawRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawRank::Genus => f.write_str("G"),
            RawRank::Species => f.write_str("S"),
            RawRank::Other(code) => f.write_str(code),
        }
    }
}

/// Taxonomic rank of a containment reference genome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum TaxonRank {
    Species,
    Strain,
    Other(String),
}

impl From<&str> for TaxonRank {
    fn from(rank: &str) -> Self {
        match rank.trim().to_ascii_lowercase().as_str() {
            "species" => TaxonRank::Species,
            "strain" => TaxonRank::Strain,
            _ => TaxonRank::Other(rank.to_string()),
        }
    }
}

impl From<TaxonRank> for String {
    fn from(rank: TaxonRank) -> Self {
        rank.to_string()
    }
}

impl fmt::Display for TaxonRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaxonRank::Species => f.write_str("species"),
            TaxonRank::Strain => f.write_str("strain"),
            TaxonRank::Other(rank) => f.write_str(rank),
        }
    }
}

/// Outcome of a threshold rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Low,
}

impl Confidence {
    pub fn from_pass(pass: bool) -> Self {
        if pass {
            Confidence::High
        } else {
            Confidence::Low
        }
    }

    pub fn is_high(self) -> bool {
        self == Confidence::High
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::High => f.write_str("high"),
            Confidence::Low => f.write_str("low"),
        }
    }
}

/// One row of a Kraken classification report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierRecord {
    #[serde(deserialize_with = "de::taxid")]
    pub taxon_id: TaxId,
    pub raw_rank: RawRank,
    pub count_direct: u64,
    pub count_descendants: u64,
    pub human_readable: String,
}

impl ClassifierRecord {
    pub const FIELDS: &'static [&'static str] = &[
        "taxon_id",
        "raw_rank",
        "count_direct",
        "count_descendants",
        "human_readable",
    ];
}

/// A containment index as it arrives: either already numeric, or text such as
/// `"0.85"` or `"6023/6081"` that still has to be parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContainmentValue {
    Number(f64),
    Text(String),
}

impl fmt::Display for ContainmentValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainmentValue::Number(v) => write!(f, "{}", v),
            ContainmentValue::Text(s) => f.write_str(s),
        }
    }
}

/// One row of a Sylph genome-containment report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainmentRecord {
    #[serde(default, deserialize_with = "de::optional_taxid")]
    pub taxon_id: Option<TaxId>,
    #[serde(default)]
    pub human_readable: String,
    pub containment_index: Option<ContainmentValue>,
    pub effective_coverage: Option<f64>,
}

impl ContainmentRecord {
    pub const FIELDS: &'static [&'static str] = &[
        "taxon_id",
        "human_readable",
        "containment_index",
        "effective_coverage",
    ];
}

/// One row of the viral aligner results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentRecord {
    #[serde(deserialize_with = "de::taxid")]
    pub taxon_id: TaxId,
    pub human_readable: String,
    pub evenness_value: f64,
    pub coverage_1x: f64,
    pub uniquely_mapped_reads: f64,
    pub mean_read_identity: f64,
    pub mean_alignment_length: f64,
}

impl AlignmentRecord {
    pub const FIELDS: &'static [&'static str] = &[
        "taxon_id",
        "human_readable",
        "evenness_value",
        "coverage_1x",
        "uniquely_mapped_reads",
        "mean_read_identity",
        "mean_alignment_length",
    ];
}

/// Taxon id deserializers that accept integers, integral floats and numeric
/// strings, since upstream tables are not consistent about it.
mod de {
    use super::TaxId;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Int(u64),
        Float(f64),
        Text(String),
    }

    fn convert<E: Error>(raw: RawId) -> Result<Option<TaxId>, E> {
        match raw {
            RawId::Int(v) => TaxId::try_from(v)
                .map(Some)
                .map_err(|_| E::custom(format!("taxon id {} out of range", v))),
            RawId::Float(v) if v >= 0.0 && v.fract() == 0.0 && v <= TaxId::MAX as f64 => {
                Ok(Some(v as TaxId))
            }
            RawId::Float(v) => Err(E::custom(format!("invalid taxon id {}", v))),
            RawId::Text(s) => {
                let s = s.trim();
                if s.is_empty() {
                    Ok(None)
                } else {
                    s.parse::<TaxId>()
                        .map(Some)
                        .map_err(|_| E::custom(format!("invalid taxon id {:?}", s)))
                }
            }
        }
    }

    pub fn optional_taxid<'de, D: Deserializer<'de>>(d: D) -> Result<Option<TaxId>, D::Error> {
        match Option::<RawId>::deserialize(d)? {
            Some(raw) => convert(raw),
            None => Ok(None),
        }
    }

    pub fn taxid<'de, D: Deserializer<'de>>(d: D) -> Result<TaxId, D::Error> {
        optional_taxid(d)?.ok_or_else(|| D::Error::custom("taxon id is empty"))
    }
}
