pub mod kraken;
pub mod sylph;

pub use kraken::{GenusRankMode, GenusSummary, KrakenEngine, KrakenTables, SpeciesSummary};
pub use sylph::{parse_containment_index, ContainmentSummary, SylphEngine};

use super::taxdb::Taxonomy;
use super::types::{TaxId, TaxonRecord, UNCLASSIFIED_TAXID};

/// Taxonomy context attached to a Kraken report row.
#[derive(Debug, Clone, PartialEq)]
pub struct Enrichment {
    pub is_bacteria: bool,
    pub parent_record: Option<TaxonRecord>,
    pub parent_human_readable: String,
}

impl Enrichment {
    /// Look up a taxon's bacterial status and parent. The unclassified id
    /// never reaches the taxonomy.
    pub fn resolve<T: Taxonomy + ?Sized>(taxonomy: &T, taxon_id: TaxId) -> Self {
        if taxon_id == UNCLASSIFIED_TAXID {
            return Self {
                is_bacteria: false,
                parent_record: None,
                parent_human_readable: String::new(),
            };
        }

        let parent_record = taxonomy.get_parent_record(taxon_id);
        let parent_human_readable = parent_record
            .as_ref()
            .map(|p| p.name.clone())
            .unwrap_or_default();
        Self {
            is_bacteria: taxonomy.is_bacteria(taxon_id),
            parent_record,
            parent_human_readable,
        }
    }

    pub fn parent_taxon_id(&self) -> Option<TaxId> {
        self.parent_record.as_ref().map(|p| p.taxid)
    }
}
