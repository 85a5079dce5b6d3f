use crate::config::ViralAlignerThresholds;
use crate::filter::{passes_all, Criterion};
use crate::types::AlignmentRecord;

/// Keeps the viral aligner results that reach every threshold.
pub struct ViralAlignerFilter {
    thresholds: ViralAlignerThresholds,
}

impl ViralAlignerFilter {
    pub fn new(thresholds: ViralAlignerThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &ViralAlignerThresholds {
        &self.thresholds
    }

    pub fn passes(&self, record: &AlignmentRecord) -> bool {
        let t = &self.thresholds;
        passes_all(&[
            Criterion::at_least("evenness_value", Some(record.evenness_value), t.evenness_value),
            Criterion::at_least("coverage_1x", Some(record.coverage_1x), t.coverage_1x),
            Criterion::at_least(
                "uniquely_mapped_reads",
                Some(record.uniquely_mapped_reads),
                t.uniquely_mapped_reads,
            ),
            Criterion::at_least(
                "mean_read_identity",
                Some(record.mean_read_identity),
                t.mean_read_identity,
            ),
            Criterion::at_least(
                "mean_alignment_length",
                Some(record.mean_alignment_length),
                t.mean_alignment_length,
            ),
        ])
    }

    /// Rows that pass, in input order.
    pub fn filter(&self, records: &[AlignmentRecord]) -> Vec<AlignmentRecord> {
        let passed: Vec<AlignmentRecord> = records
            .iter()
            .filter(|r| self.passes(r))
            .cloned()
            .collect();
        log::info!(
            "Viral aligner: {} of {} taxa passed the filters",
            passed.len(),
            records.len()
        );
        passed
    }
}
