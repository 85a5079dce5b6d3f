// src/bacteria/sylph.rs

use serde::Serialize;

use super::Taxonomy;
use crate::config::SylphThresholds;
use crate::error::{ClasparError, Result};
use crate::filter::{passes_all, Criterion};
use crate::types::{Confidence, ContainmentRecord, ContainmentValue, TaxId, TaxonRank};

/// A Sylph result normalised to species level and rated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContainmentSummary {
    pub taxon_id: Option<TaxId>,
    pub human_readable: String,
    pub taxon_rank: Option<TaxonRank>,
    pub containment_index: Option<ContainmentValue>,
    /// `containment_index` as a number.
    pub cont_ind_eval: Option<f64>,
    pub effective_coverage: Option<f64>,
    pub species_id: Option<TaxId>,
    pub species_human_readable: Option<String>,
    /// Not always the parent of the species, and absent for unclassified
    /// species and complexes.
    pub genus_id: Option<TaxId>,
    pub sylph_confidence: Confidence,
}

/// Scores Sylph genome-containment calls by containment index and
/// effective coverage.
pub struct SylphEngine<'a, T: Taxonomy + ?Sized> {
    taxonomy: &'a T,
    thresholds: SylphThresholds,
}

impl<'a, T: Taxonomy + ?Sized> SylphEngine<'a, T> {
    pub fn new(taxonomy: &'a T, thresholds: SylphThresholds) -> Self {
        Self { taxonomy, thresholds }
    }

    pub fn thresholds(&self) -> &SylphThresholds {
        &self.thresholds
    }

    /// Normalise every row to species level and rate it. Fails as a whole if
    /// any containment index is not a plain number or `matched/total` fraction.
    pub fn process(&self, records: &[ContainmentRecord]) -> Result<Vec<ContainmentSummary>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let mut rows = Vec::with_capacity(records.len());
        for (row, record) in records.iter().enumerate() {
            let taxon_rank = record
                .taxon_id
                .and_then(|id| self.taxonomy.get_record(id))
                .map(|r| TaxonRank::from(r.rank.as_str()));

            let (species_id, species_human_readable) =
                self.species_level(record, taxon_rank.as_ref());

            let genus_id = species_id.and_then(|id| self.taxonomy.get_genus_taxid(id));

            let cont_ind_eval = match &record.containment_index {
                Some(value) => Some(containment_value(value).ok_or_else(|| {
                    ClasparError::InvalidContainmentIndex {
                        row,
                        value: value.to_string(),
                    }
                })?),
                None => None,
            };

            let sylph_confidence = if species_id.is_some() {
                rate_containment(&self.thresholds, cont_ind_eval, record.effective_coverage)
            } else {
                Confidence::Low
            };

            rows.push(ContainmentSummary {
                taxon_id: record.taxon_id,
                human_readable: record.human_readable.clone(),
                taxon_rank,
                containment_index: record.containment_index.clone(),
                cont_ind_eval,
                effective_coverage: record.effective_coverage,
                species_id,
                species_human_readable,
                genus_id,
                sylph_confidence,
            });
        }

        log::info!("Sylph: {} containment results processed", rows.len());
        Ok(rows)
    }

    /// Species id and name for a row: species pass through, strains are
    /// mapped to their species, anything else has no species.
    fn species_level(
        &self,
        record: &ContainmentRecord,
        rank: Option<&TaxonRank>,
    ) -> (Option<TaxId>, Option<String>) {
        match (record.taxon_id, rank) {
            (Some(id), Some(TaxonRank::Species)) => (Some(id), Some(record.human_readable.clone())),
            (Some(id), Some(TaxonRank::Strain)) => {
                match self
                    .taxonomy
                    .get_species_taxid(id)
                    .and_then(|species| self.taxonomy.get_record(species))
                {
                    Some(species) => (Some(species.taxid), Some(species.name)),
                    None => {
                        log::warn!("Could not resolve the species of strain {}", id);
                        (None, None)
                    }
                }
            }
            (id, rank) => {
                log::warn!(
                    "Taxon ID returned rank other than species or strain: ({:?}, {})",
                    id,
                    rank.map(|r| r.to_string()).unwrap_or_default()
                );
                (None, None)
            }
        }
    }
}

/// High when both the containment index and the effective coverage reach
/// their thresholds.
pub fn rate_containment(
    thresholds: &SylphThresholds,
    containment_index: Option<f64>,
    effective_coverage: Option<f64>,
) -> Confidence {
    Confidence::from_pass(passes_all(&[
        Criterion::at_least(
            "containment_index",
            containment_index,
            thresholds.containment_index_threshold,
        ),
        Criterion::at_least(
            "effective_coverage",
            effective_coverage,
            thresholds.effective_coverage_threshold,
        ),
    ]))
}

fn containment_value(value: &ContainmentValue) -> Option<f64> {
    match value {
        ContainmentValue::Number(v) if v.is_finite() && *v >= 0.0 => Some(*v),
        ContainmentValue::Number(_) => None,
        ContainmentValue::Text(text) => parse_containment_index(text),
    }
}

/// Strictly parse a containment index written as a decimal (`"0.85"`) or as
/// a `matched/total` fraction (`"6023/6081"`). Anything else is rejected.
pub fn parse_containment_index(text: &str) -> Option<f64> {
    fn number(s: &str) -> Option<f64> {
        let v: f64 = s.trim().parse().ok()?;
        (v.is_finite() && v >= 0.0).then_some(v)
    }

    match text.split_once('/') {
        Some((matched, total)) => {
            let matched = number(matched)?;
            let total = number(total)?;
            (total > 0.0).then(|| matched / total)
        }
        None => number(text),
    }
}
