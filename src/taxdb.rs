//src/taxdb.rs

use ahash::AHashMap;
use parking_lot::RwLock;
use std::io::{self, BufRead};
use std::path::Path;
use std::sync::Arc;

use crate::reader::open_text;
use crate::types::{TaxId, TaxonRecord};

pub type ParentMap = AHashMap<TaxId, TaxId>;
pub type NameMap = AHashMap<TaxId, String>;
pub type RankMap = AHashMap<TaxId, String>;

/// NCBI taxon id of the Bacteria superkingdom.
pub const BACTERIA_TAXID: TaxId = 2;

/// Read-only taxonomy queries the engines need.
///
/// Unknown ids are not errors: lookups return `None` (or `false`) and the
/// caller treats the taxon as having no metadata.
pub trait Taxonomy {
    fn get_record(&self, taxid: TaxId) -> Option<TaxonRecord>;

    fn get_parent_record(&self, taxid: TaxId) -> Option<TaxonRecord>;

    fn is_bacteria(&self, taxid: TaxId) -> bool;

    /// The closest ancestor (or the taxon itself) with rank `genus`.
    /// For unclassified or complex taxa this is not necessarily the parent,
    /// and may not exist at all.
    fn get_genus_taxid(&self, taxid: TaxId) -> Option<TaxId>;

    /// The closest ancestor (or the taxon itself) with rank `species`.
    fn get_species_taxid(&self, taxid: TaxId) -> Option<TaxId>;
}

/// Taxonomy backed by a taxDB file in the format:
/// ```text
/// <taxid>\t<parentid>\t<taxname>\t<rank>
/// ```
/// Lineages are computed on first use and memoized, so one instance should be
/// built per run and shared between the pipelines.
pub struct TaxDb {
    parent_map: ParentMap,
    name_map: NameMap,
    rank_map: RankMap,
    lineages: RwLock<AHashMap<TaxId, Arc<[TaxId]>>>,
}

impl TaxDb {
    /// Load a taxDB file (plain or `.gz`).
    pub fn open<P: AsRef<Path>>(filepath: P) -> io::Result<Self> {
        let taxdb = Self::from_reader(open_text(&filepath)?)?;
        log::info!(
            "Loaded {} taxa from {}",
            taxdb.len(),
            filepath.as_ref().display()
        );
        Ok(taxdb)
    }

    pub fn from_reader<R: BufRead>(reader: R) -> io::Result<Self> {
        let mut parent_map = ParentMap::new();
        let mut name_map = NameMap::new();
        let mut rank_map = RankMap::new();

        for line_result in reader.lines() {
            let line = line_result?;
            // Expecting 4 tab-separated fields: taxid, parentid, taxname, rank
            // e.g. "2   131567   Bacteria   superkingdom"
            let parts: Vec<&str> = line.split('\t').collect();

            // Skip malformed lines
            if parts.len() < 4 {
                continue;
            }

            let taxid: TaxId = parts[0].trim().parse().unwrap_or(0);
            let parentid: TaxId = parts[1].trim().parse().unwrap_or(0);

            if taxid != 0 {
                parent_map.insert(taxid, parentid);
                name_map.insert(taxid, parts[2].trim().to_string());
                rank_map.insert(taxid, parts[3].trim().to_string());
            }
        }

        Ok(Self {
            parent_map,
            name_map,
            rank_map,
            lineages: RwLock::new(AHashMap::new()),
        })
    }

    pub fn len(&self) -> usize {
        self.parent_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent_map.is_empty()
    }

    /// Path from `taxid` up to the root, starting with `taxid` itself.
    /// Empty for ids the taxonomy does not know.
    pub fn lineage(&self, taxid: TaxId) -> Arc<[TaxId]> {
        if let Some(cached) = self.lineages.read().get(&taxid) {
            return Arc::clone(cached);
        }

        let mut path = Vec::new();
        let mut current = taxid;
        while let Some(&parent) = self.parent_map.get(&current) {
            path.push(current);
            // Root points at itself (or at 0); also guards against cycles
            if parent == current || parent == 0 || path.contains(&parent) {
                break;
            }
            current = parent;
        }

        let lineage: Arc<[TaxId]> = Arc::from(path);
        self.lineages.write().insert(taxid, Arc::clone(&lineage));
        lineage
    }

    fn first_with_rank(&self, taxid: TaxId, rank: &str) -> Option<TaxId> {
        self.lineage(taxid).iter().copied().find(|id| {
            self.rank_map
                .get(id)
                .map(|r| r.eq_ignore_ascii_case(rank))
                .unwrap_or(false)
        })
    }
}

impl Taxonomy for TaxDb {
    fn get_record(&self, taxid: TaxId) -> Option<TaxonRecord> {
        let parent_taxid = *self.parent_map.get(&taxid)?;
        Some(TaxonRecord {
            taxid,
            parent_taxid,
            name: self.name_map.get(&taxid).cloned().unwrap_or_default(),
            rank: self.rank_map.get(&taxid).cloned().unwrap_or_default(),
        })
    }

    fn get_parent_record(&self, taxid: TaxId) -> Option<TaxonRecord> {
        let parent = *self.parent_map.get(&taxid)?;
        if parent == taxid {
            return None;
        }
        self.get_record(parent)
    }

    fn is_bacteria(&self, taxid: TaxId) -> bool {
        self.lineage(taxid).contains(&BACTERIA_TAXID)
    }

    fn get_genus_taxid(&self, taxid: TaxId) -> Option<TaxId> {
        self.first_with_rank(taxid, "genus")
    }

    fn get_species_taxid(&self, taxid: TaxId) -> Option<TaxId> {
        self.first_with_rank(taxid, "species")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::small_taxdb;

    #[test]
    fn parses_and_skips_malformed_lines() {
        let text = "1\t1\troot\tno rank\nnot a line\n0\t1\tzero\tno rank\n2\t1\tBacteria\tsuperkingdom\n";
        let taxdb = TaxDb::from_reader(text.as_bytes()).unwrap();
        assert_eq!(taxdb.len(), 2);
        assert_eq!(taxdb.get_record(2).unwrap().name, "Bacteria");
    }

    #[test]
    fn lineage_runs_to_root_and_is_memoized() {
        let taxdb = small_taxdb();
        let lineage = taxdb.lineage(1410656);
        assert_eq!(lineage.first(), Some(&1410656));
        assert_eq!(lineage.last(), Some(&1));
        assert!(Arc::ptr_eq(&lineage, &taxdb.lineage(1410656)));
        assert!(taxdb.lineage(999_999_999).is_empty());
    }

    #[test]
    fn parent_records() {
        let taxdb = small_taxdb();
        let parent = taxdb.get_parent_record(139).unwrap();
        assert_eq!(parent.taxid, 64895);
        assert_eq!(parent.name, "Borreliella");

        let parent = taxdb.get_parent_record(1410656).unwrap();
        assert_eq!(parent.taxid, 859);
        assert_eq!(parent.name, "Fusobacterium necrophorum");

        assert!(taxdb.get_parent_record(1).is_none());
        assert!(taxdb.get_parent_record(424242).is_none());
    }

    #[test]
    fn bacteria_membership() {
        let taxdb = small_taxdb();
        assert!(taxdb.is_bacteria(139));
        assert!(taxdb.is_bacteria(1410656));
        assert!(!taxdb.is_bacteria(3052230));
        assert!(!taxdb.is_bacteria(424242));
    }

    #[test]
    fn genus_and_species_lookups() {
        let taxdb = small_taxdb();
        // Subspecies resolves through its species to the genus
        assert_eq!(taxdb.get_species_taxid(1410656), Some(859));
        assert_eq!(taxdb.get_genus_taxid(1410656), Some(848));
        // A strain resolves to its species
        assert_eq!(taxdb.get_species_taxid(1121296), Some(1526));
        // Species under an unclassified family-level node has no genus
        assert_eq!(taxdb.get_genus_taxid(1869212), None);
        assert_eq!(taxdb.get_genus_taxid(848), Some(848));
    }
}
