//src/summary.rs

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;

use crate::bacteria::{ContainmentSummary, KrakenTables, SpeciesSummary};
use crate::types::{AlignmentRecord, TaxId};

/// Passing taxa keyed by their position (0-based) among the passing rows.
pub type ResultListing = BTreeMap<usize, ResultEntry>;

/// One passing taxon in a result listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultEntry {
    pub human_readable: String,
    pub taxon_id: Option<TaxId>,
    /// Column name and value of the rank, when the pipeline reports one.
    pub rank: Option<(&'static str, String)>,
}

impl Serialize for ResultEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.rank.is_some() { 3 } else { 2 };
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("human_readable", &self.human_readable)?;
        map.serialize_entry("taxon_id", &self.taxon_id)?;
        if let Some((column, value)) = &self.rank {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// Headline sentence plus the listing of passing taxa for one pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub headline: String,
    pub results: ResultListing,
}

impl Summary {
    pub fn passed(&self) -> usize {
        self.results.len()
    }
}

/// A rated output row that can appear in a result listing.
pub trait Rated {
    fn is_high(&self) -> bool;
    fn result_entry(&self) -> ResultEntry;
}

impl Rated for SpeciesSummary {
    fn is_high(&self) -> bool {
        self.kraken_confidence.is_high()
    }

    fn result_entry(&self) -> ResultEntry {
        ResultEntry {
            human_readable: self.human_readable.clone(),
            taxon_id: Some(self.taxon_id),
            rank: Some(("raw_rank", self.raw_rank.to_string())),
        }
    }
}

impl Rated for ContainmentSummary {
    fn is_high(&self) -> bool {
        self.sylph_confidence.is_high()
    }

    fn result_entry(&self) -> ResultEntry {
        ResultEntry {
            human_readable: self.human_readable.clone(),
            taxon_id: self.taxon_id,
            rank: Some((
                "taxon_rank",
                self.taxon_rank
                    .as_ref()
                    .map(|r| r.to_string())
                    .unwrap_or_default(),
            )),
        }
    }
}

/// Listing of the high-confidence rows, in table order.
pub fn high_confidence<R: Rated>(rows: &[R]) -> ResultListing {
    rows.iter()
        .filter(|r| r.is_high())
        .map(Rated::result_entry)
        .enumerate()
        .collect()
}

pub fn kraken_summary(sample_id: &str, tables: &KrakenTables) -> Summary {
    let results = high_confidence(&tables.species);
    let headline = format!(
        "Sample {} has {} high confidence bacterial species classified by Kraken (out of {} total assignments).",
        sample_id,
        results.len(),
        tables.species.len()
    );
    Summary { headline, results }
}

pub fn sylph_summary(sample_id: &str, rows: &[ContainmentSummary]) -> Summary {
    let results = high_confidence(rows);
    let headline = format!(
        "Sample {} has {} high confidence bacterial (and archaeal) species classified by Sylph.",
        sample_id,
        results.len()
    );
    Summary { headline, results }
}

/// The viral aligner has no rating: every row that passed the filters is listed.
pub fn viral_aligner_summary(sample_id: &str, total: usize, passed: &[AlignmentRecord]) -> Summary {
    let headline = format!(
        "Sample {} has {} viral taxa classified by the Viral Aligner that passed the filters (out of a total of {}).",
        sample_id,
        passed.len(),
        total
    );
    let results = passed
        .iter()
        .map(|r| ResultEntry {
            human_readable: r.human_readable.clone(),
            taxon_id: Some(r.taxon_id),
            rank: None,
        })
        .enumerate()
        .collect();
    Summary { headline, results }
}
