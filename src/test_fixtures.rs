// Shared fixtures for the unit tests.

use serde_json::{json, Value};
use std::cell::Cell;

use crate::config::{KrakenThresholds, SylphThresholds, ViralAlignerThresholds};
use crate::taxdb::{TaxDb, Taxonomy};
use crate::types::{
    AlignmentRecord, ClassifierRecord, ContainmentRecord, ContainmentValue, RawRank, TaxId,
    TaxonRecord,
};

const SMALL_TAXDB: &[(TaxId, TaxId, &str, &str)] = &[
    (1, 1, "root", "no rank"),
    (131567, 1, "cellular organisms", "no rank"),
    (2, 131567, "Bacteria", "superkingdom"),
    (10239, 1, "Viruses", "superkingdom"),
    // Borreliella
    (1643685, 2, "Borreliaceae", "family"),
    (64895, 1643685, "Borreliella", "genus"),
    (139, 64895, "Borreliella burgdorferi", "species"),
    // Fusobacterium
    (203491, 2, "Fusobacteriaceae", "family"),
    (848, 203491, "Fusobacterium", "genus"),
    (851, 848, "Fusobacterium nucleatum", "species"),
    (859, 848, "Fusobacterium necrophorum", "species"),
    (860, 848, "Fusobacterium mortiferum", "species"),
    (1410656, 859, "Fusobacterium necrophorum subsp. funduliforme", "subspecies"),
    // Bordetella
    (506, 2, "Alcaligenaceae", "family"),
    (517, 506, "Bordetella", "genus"),
    (520, 517, "Bordetella pertussis", "species"),
    // Mycoplasmoides
    (2093, 2, "Mycoplasmataceae", "family"),
    (2767358, 2093, "Mycoplasmoides", "genus"),
    (2104, 2767358, "Mycoplasmoides pneumoniae", "species"),
    // species without a genus
    (563835, 2, "Chitinophagaceae", "family"),
    (1869212, 563835, "Chitinophagaceae bacterium", "species"),
    // strain
    (186803, 2, "Lachnospiraceae", "family"),
    (1526, 186803, "[Clostridium] aminophilum", "species"),
    (1121296, 1526, "[Clostridium] aminophilum DSM 10710", "strain"),
    // viruses
    (11102, 10239, "Hepacivirus", "genus"),
    (3052230, 11102, "Hepacivirus hominis", "species"),
    (2788787, 10239, "unclassified Caudoviricetes", "no rank"),
    (2696357, 2788787, "Caudoviricetes sp.", "species"),
];

fn taxdb_from(lines: &[(TaxId, TaxId, String, String)]) -> TaxDb {
    let text: String = lines
        .iter()
        .map(|(id, parent, name, rank)| format!("{}\t{}\t{}\t{}\n", id, parent, name, rank))
        .collect();
    TaxDb::from_reader(text.as_bytes()).unwrap()
}

pub fn small_taxdb() -> TaxDb {
    let lines: Vec<_> = SMALL_TAXDB
        .iter()
        .map(|&(id, parent, name, rank)| (id, parent, name.to_string(), rank.to_string()))
        .collect();
    taxdb_from(&lines)
}

/// Counts every taxonomy query it forwards.
pub struct CountingTaxonomy<'a> {
    inner: &'a TaxDb,
    calls: Cell<usize>,
}

impl<'a> CountingTaxonomy<'a> {
    pub fn new(inner: &'a TaxDb) -> Self {
        Self { inner, calls: Cell::new(0) }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    fn tick(&self) {
        self.calls.set(self.calls.get() + 1);
    }
}

impl Taxonomy for CountingTaxonomy<'_> {
    fn get_record(&self, taxid: TaxId) -> Option<TaxonRecord> {
        self.tick();
        self.inner.get_record(taxid)
    }

    fn get_parent_record(&self, taxid: TaxId) -> Option<TaxonRecord> {
        self.tick();
        self.inner.get_parent_record(taxid)
    }

    fn is_bacteria(&self, taxid: TaxId) -> bool {
        self.tick();
        self.inner.is_bacteria(taxid)
    }

    fn get_genus_taxid(&self, taxid: TaxId) -> Option<TaxId> {
        self.tick();
        self.inner.get_genus_taxid(taxid)
    }

    fn get_species_taxid(&self, taxid: TaxId) -> Option<TaxId> {
        self.tick();
        self.inner.get_species_taxid(taxid)
    }
}

pub fn kraken_thresholds() -> KrakenThresholds {
    KrakenThresholds {
        read_threshold: 10,
        genus_rank_threshold: 3,
        genus_read_pct_threshold: 20.0,
    }
}

pub fn sylph_thresholds() -> SylphThresholds {
    SylphThresholds {
        containment_index_threshold: 0.2,
        effective_coverage_threshold: 1.0,
    }
}

pub fn viral_thresholds() -> ViralAlignerThresholds {
    ViralAlignerThresholds {
        evenness_value: 25.0,
        coverage_1x: 25.0,
        uniquely_mapped_reads: 0.0,
        mean_read_identity: 90.0,
        mean_alignment_length: 500.0,
    }
}

pub fn record(taxon_id: TaxId, rank: &str, direct: u64, descendants: u64, name: &str) -> ClassifierRecord {
    ClassifierRecord {
        taxon_id,
        raw_rank: RawRank::from(rank.to_string()),
        count_direct: direct,
        count_descendants: descendants,
        human_readable: name.to_string(),
    }
}

pub fn containment(
    taxon_id: Option<TaxId>,
    name: &str,
    containment_index: f64,
    effective_coverage: f64,
) -> ContainmentRecord {
    ContainmentRecord {
        taxon_id,
        human_readable: name.to_string(),
        containment_index: Some(ContainmentValue::Number(containment_index)),
        effective_coverage: Some(effective_coverage),
    }
}

pub fn alignment(
    taxon_id: TaxId,
    name: &str,
    evenness_value: f64,
    coverage_1x: f64,
    uniquely_mapped_reads: f64,
    mean_read_identity: f64,
    mean_alignment_length: f64,
) -> AlignmentRecord {
    AlignmentRecord {
        taxon_id,
        human_readable: name.to_string(),
        evenness_value,
        coverage_1x,
        uniquely_mapped_reads,
        mean_read_identity,
        mean_alignment_length,
    }
}

pub struct KrakenScenario {
    pub taxdb: TaxDb,
    pub records: Vec<ClassifierRecord>,
}

/// A report with 80 bacterial species in 56 genera, 14 of which hold more
/// than one species, laid out like a Kraken report (genus row, then its
/// species). Species clade reads per genus:
///
/// - 42 genera with one species of 50 reads (genus 60)
/// - 6 genera with `[60, 40]` (genus 100): the runner-up is high confidence
/// - 6 genera with `[80, 15, 5]` (genus 100)
/// - 2 genera with `[90, 9, 9, 9]` (genus 120)
///
/// plus rows that must not reach the tables: a genus without species, a
/// species whose genus row is missing, viral rows and unclassified reads.
pub fn kraken_scenario() -> KrakenScenario {
    let mut lines: Vec<(TaxId, TaxId, String, String)> = vec![
        (1, 1, "root".into(), "no rank".into()),
        (2, 1, "Bacteria".into(), "superkingdom".into()),
        (5000, 2, "Exampleaceae".into(), "family".into()),
        (10239, 1, "Viruses".into(), "superkingdom".into()),
        (11102, 10239, "Hepacivirus".into(), "genus".into()),
        (3052230, 11102, "Hepacivirus hominis".into(), "species".into()),
    ];
    let mut records = vec![
        record(0, "U", 900, 900, "unclassified"),
        record(1, "R", 10, 9000, "root"),
        record(2, "D", 5, 8000, "Bacteria"),
        record(5000, "F", 0, 7900, "Exampleaceae"),
    ];

    let mut layouts: Vec<(u64, Vec<u64>)> = Vec::new();
    layouts.extend(std::iter::repeat((10, vec![50])).take(42));
    layouts.extend(std::iter::repeat((0, vec![60, 40])).take(6));
    layouts.extend(std::iter::repeat((0, vec![80, 15, 5])).take(6));
    layouts.extend(std::iter::repeat((3, vec![90, 9, 9, 9])).take(2));

    for (g, (direct, species)) in layouts.iter().enumerate() {
        let genus_id = 10_000 + g as TaxId;
        let genus_name = format!("Genus{}", g);
        lines.push((genus_id, 5000, genus_name.clone(), "genus".into()));

        let total: u64 = direct + species.iter().sum::<u64>();
        records.push(record(genus_id, "G", *direct, total, &genus_name));

        for (s, reads) in species.iter().enumerate() {
            let species_id = 1_000_000 + genus_id * 10 + s as TaxId;
            let species_name = format!("{} species{}", genus_name, s);
            lines.push((species_id, genus_id, species_name.clone(), "species".into()));
            records.push(record(species_id, "S", *reads, *reads, &species_name));
        }
    }

    // genus with no species rows
    lines.push((9000, 5000, "Lonelygenus".into(), "genus".into()));
    records.push(record(9000, "G", 40, 40, "Lonelygenus"));
    // species whose genus is not in the report
    lines.push((9100, 5000, "Absentgenus".into(), "genus".into()));
    lines.push((9101, 9100, "Absentgenus alone".into(), "species".into()));
    records.push(record(9101, "S", 70, 70, "Absentgenus alone"));
    // subspecies rows are not species rows
    lines.push((9102, 9101, "Absentgenus alone subsp. a".into(), "subspecies".into()));
    records.push(record(9102, "S1", 30, 30, "Absentgenus alone subsp. a"));
    // viral rows
    records.push(record(11102, "G", 0, 500, "Hepacivirus"));
    records.push(record(3052230, "S", 500, 500, "Hepacivirus hominis"));

    KrakenScenario {
        taxdb: taxdb_from(&lines),
        records,
    }
}

/// A sample record with a few rows in each table.
pub fn sample_record_json() -> Value {
    json!({
        "climb_id": "ID-12345678",
        "classifier_calls": [
            {"taxon_id": 848, "raw_rank": "G", "count_direct": 5, "count_descendants": 100,
             "human_readable": "Fusobacterium", "classifier": "kraken2"},
            {"taxon_id": 859, "raw_rank": "S", "count_direct": 30, "count_descendants": 30,
             "human_readable": "Fusobacterium necrophorum", "classifier": "kraken2"},
            {"taxon_id": 851, "raw_rank": "S", "count_direct": 65, "count_descendants": 65,
             "human_readable": "Fusobacterium nucleatum", "classifier": "kraken2"}
        ],
        "sylph_results": [
            {"taxon_id": 1869212, "human_readable": "Chitinophagaceae bacterium",
             "containment_index": "512/1024", "effective_coverage": 3.2},
            {"taxon_id": 520, "human_readable": "Bordetella pertussis",
             "containment_index": 0.91, "effective_coverage": 14.0},
            {"taxon_id": "2104", "human_readable": "Mycoplasmoides pneumoniae",
             "containment_index": "0.2", "effective_coverage": 1.0}
        ],
        "alignment_results": [
            {"taxon_id": 3052230, "human_readable": "Hepacivirus hominis",
             "evenness_value": 80.0, "coverage_1x": 95.0, "uniquely_mapped_reads": 300,
             "mean_read_identity": 99.1, "mean_alignment_length": 1200.0},
            {"taxon_id": 2696357, "human_readable": "Caudoviricetes sp.",
             "evenness_value": 10.0, "coverage_1x": 5.0, "uniquely_mapped_reads": 3,
             "mean_read_identity": 97.0, "mean_alignment_length": 300.0}
        ]
    })
}
