// src/bacteria/kraken.rs

use ahash::AHashMap;
use serde::Serialize;
use std::cmp::Ordering;

use super::{Enrichment, Taxonomy};
use crate::config::KrakenThresholds;
use crate::filter::{passes_all, Criterion};
use crate::types::{ClassifierRecord, Confidence, RawRank, TaxId};

/// What rank the most abundant species of a genus receives.
///
/// Historically the rank was taken from the species *above* each row, so the
/// top species of every genus was left without a rank and could never pass
/// `GENUS_RANK_THRESHOLD`. `Shifted` keeps that behaviour, `ZeroBased` ranks
/// the top species 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenusRankMode {
    #[default]
    Shifted,
    ZeroBased,
}

/// A bacterial genus row of the Kraken report with its species aggregates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenusSummary {
    pub taxon_id: TaxId,
    pub raw_rank: RawRank,
    pub count_direct: u64,
    pub count_descendants: u64,
    pub human_readable: String,
    pub is_bacteria: bool,
    pub parent_taxon_id: Option<TaxId>,
    pub parent_human_readable: String,
    /// Share of the genus reads that were assigned further down, at species level.
    pub prop_species: Option<f64>,
    pub genus_level_reads: u64,
    pub total_species_identified: u64,
    pub filtered_species_identified: u64,
}

/// A bacterial species row of the Kraken report, placed within its genus.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeciesSummary {
    pub taxon_id: TaxId,
    pub raw_rank: RawRank,
    pub count_direct: u64,
    pub count_descendants: u64,
    pub human_readable: String,
    pub is_bacteria: bool,
    pub parent_taxon_id: Option<TaxId>,
    pub parent_human_readable: String,
    pub genus_id: TaxId,
    pub genus_level_reads: u64,
    pub total_species_identified: u64,
    pub filtered_species_identified: u64,
    pub pct_genus_reads: Option<f64>,
    pub order_in_genus: Option<u32>,
    pub kraken_confidence: Confidence,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct KrakenTables {
    pub species: Vec<SpeciesSummary>,
    pub genus: Vec<GenusSummary>,
}

impl KrakenTables {
    pub fn is_empty(&self) -> bool {
        self.species.is_empty() && self.genus.is_empty()
    }
}

/// Scores Kraken species calls using the read count, the rank within the
/// genus and the share of the genus reads.
pub struct KrakenEngine<'a, T: Taxonomy + ?Sized> {
    taxonomy: &'a T,
    thresholds: KrakenThresholds,
    rank_mode: GenusRankMode,
}

impl<'a, T: Taxonomy + ?Sized> KrakenEngine<'a, T> {
    pub fn new(taxonomy: &'a T, thresholds: KrakenThresholds) -> Self {
        Self {
            taxonomy,
            thresholds,
            rank_mode: GenusRankMode::default(),
        }
    }

    pub fn with_rank_mode(mut self, rank_mode: GenusRankMode) -> Self {
        self.rank_mode = rank_mode;
        self
    }

    pub fn thresholds(&self) -> &KrakenThresholds {
        &self.thresholds
    }

    /// Build the species and genus tables for one Kraken report.
    /// The input is only read; both tables are empty for an empty report.
    pub fn process(&self, records: &[ClassifierRecord]) -> KrakenTables {
        if records.is_empty() {
            return KrakenTables::default();
        }

        // 1) Parent taxonomy for every row
        let enriched: Vec<(&ClassifierRecord, Enrichment)> = records
            .iter()
            .map(|record| {
                if record.count_descendants < record.count_direct {
                    log::warn!(
                        "Taxon {} has fewer clade reads ({}) than direct reads ({})",
                        record.taxon_id,
                        record.count_descendants,
                        record.count_direct
                    );
                }
                (record, Enrichment::resolve(self.taxonomy, record.taxon_id))
            })
            .collect();

        // 2) Bacterial genus rows
        let genus_rows: Vec<&(&ClassifierRecord, Enrichment)> = enriched
            .iter()
            .filter(|(r, e)| r.raw_rank == RawRank::Genus && e.is_bacteria)
            .collect();

        // 3) Bacterial species rows, each with its genus
        let species_rows: Vec<(&ClassifierRecord, &Enrichment, TaxId)> = enriched
            .iter()
            .filter(|(r, e)| r.raw_rank == RawRank::Species && e.is_bacteria)
            .filter_map(|(r, e)| match self.taxonomy.get_genus_taxid(r.taxon_id) {
                Some(genus_id) => Some((*r, e, genus_id)),
                None => {
                    log::debug!("Species {} ({}) has no genus", r.taxon_id, r.human_readable);
                    None
                }
            })
            .collect();

        // 4) Species counts per genus
        let mut total_species: AHashMap<TaxId, u64> = AHashMap::new();
        let mut filtered_species: AHashMap<TaxId, u64> = AHashMap::new();
        for (record, _, genus_id) in &species_rows {
            *total_species.entry(*genus_id).or_default() += 1;
            if record.count_descendants >= self.thresholds.read_threshold {
                *filtered_species.entry(*genus_id).or_default() += 1;
            }
        }

        // 5) Genus table: only genera with at least one species
        let genus: Vec<GenusSummary> = genus_rows
            .iter()
            .filter_map(|(record, enrichment)| {
                let total = *total_species.get(&record.taxon_id)?;
                Some(GenusSummary {
                    taxon_id: record.taxon_id,
                    raw_rank: record.raw_rank.clone(),
                    count_direct: record.count_direct,
                    count_descendants: record.count_descendants,
                    human_readable: record.human_readable.clone(),
                    is_bacteria: enrichment.is_bacteria,
                    parent_taxon_id: enrichment.parent_taxon_id(),
                    parent_human_readable: enrichment.parent_human_readable.clone(),
                    prop_species: ratio(record.count_direct, record.count_descendants)
                        .map(|direct| 1.0 - direct),
                    genus_level_reads: record.count_descendants,
                    total_species_identified: total,
                    filtered_species_identified: filtered_species
                        .get(&record.taxon_id)
                        .copied()
                        .unwrap_or(0),
                })
            })
            .collect();

        let mut genus_index: AHashMap<TaxId, &GenusSummary> = AHashMap::new();
        for g in &genus {
            genus_index.entry(g.taxon_id).or_insert(g);
        }

        // 6) + 7) Species table: only species whose genus is in the genus table
        let mut species: Vec<SpeciesSummary> = species_rows
            .iter()
            .filter_map(|(record, enrichment, genus_id)| {
                let g = genus_index.get(genus_id)?;
                Some(SpeciesSummary {
                    taxon_id: record.taxon_id,
                    raw_rank: record.raw_rank.clone(),
                    count_direct: record.count_direct,
                    count_descendants: record.count_descendants,
                    human_readable: record.human_readable.clone(),
                    is_bacteria: enrichment.is_bacteria,
                    parent_taxon_id: enrichment.parent_taxon_id(),
                    parent_human_readable: enrichment.parent_human_readable.clone(),
                    genus_id: *genus_id,
                    genus_level_reads: g.genus_level_reads,
                    total_species_identified: g.total_species_identified,
                    filtered_species_identified: g.filtered_species_identified,
                    pct_genus_reads: ratio(record.count_descendants, g.genus_level_reads)
                        .map(|r| r * 100.0),
                    order_in_genus: None,
                    kraken_confidence: Confidence::Low,
                })
            })
            .collect();

        // 8) Rank within genus, 9) confidence
        let orders = rank_within_genus(&species, self.rank_mode);
        for (row, order) in species.iter_mut().zip(orders) {
            row.order_in_genus = order;
            row.kraken_confidence = rate_species(
                &self.thresholds,
                row.count_descendants,
                row.order_in_genus,
                row.pct_genus_reads,
            );
        }

        log::info!(
            "Kraken: {} bacterial species across {} genera",
            species.len(),
            genus.len()
        );

        KrakenTables { species, genus }
    }
}

/// High when the species has enough reads, is among the top species of its
/// genus and holds a large enough share of the genus reads.
pub fn rate_species(
    thresholds: &KrakenThresholds,
    count_descendants: u64,
    order_in_genus: Option<u32>,
    pct_genus_reads: Option<f64>,
) -> Confidence {
    Confidence::from_pass(passes_all(&[
        Criterion::at_least(
            "count_descendants",
            Some(count_descendants as f64),
            thresholds.read_threshold as f64,
        ),
        Criterion::at_most(
            "order_in_genus",
            order_in_genus.map(f64::from),
            f64::from(thresholds.genus_rank_threshold),
        ),
        Criterion::at_least(
            "pct_genus_reads",
            pct_genus_reads,
            thresholds.genus_read_pct_threshold,
        ),
    ]))
}

fn ratio(numerator: u64, denominator: u64) -> Option<f64> {
    if denominator == 0 {
        None
    } else {
        Some(numerator as f64 / denominator as f64)
    }
}

/// Rank of every row within its genus by descending `pct_genus_reads`.
/// The sort is stable, so ties keep their input order; undefined
/// percentages go last.
fn rank_within_genus(rows: &[SpeciesSummary], mode: GenusRankMode) -> Vec<Option<u32>> {
    let mut sorted: Vec<usize> = (0..rows.len()).collect();
    sorted.sort_by(|&a, &b| match (rows[a].pct_genus_reads, rows[b].pct_genus_reads) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    let mut seen: AHashMap<TaxId, u32> = AHashMap::new();
    let mut orders = vec![None; rows.len()];
    for idx in sorted {
        let position = seen.entry(rows[idx].genus_id).or_insert(0);
        orders[idx] = match mode {
            GenusRankMode::ZeroBased => Some(*position),
            GenusRankMode::Shifted => position.checked_sub(1),
        };
        *position += 1;
    }
    orders
}
