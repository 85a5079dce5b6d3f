// src/lib.rs
pub mod analysis;
pub mod bacteria;
pub mod config;
pub mod error;
pub mod export;
pub mod filter;
pub mod reader;
pub mod sample;
pub mod summary;
pub mod taxdb;
pub mod types;
pub mod virus;

#[cfg(test)]
mod test_fixtures;

use serde::Serialize;
use std::path::{Path, PathBuf};

pub use crate::analysis::{AnalysisFields, AnalysisRecord, Server, ValidationStatus};
pub use crate::bacteria::{
    ContainmentSummary, GenusRankMode, KrakenEngine, KrakenTables, SylphEngine,
};
pub use crate::config::FilterConfig;
pub use crate::error::{ClasparError, Result};
pub use crate::sample::SampleTables;
pub use crate::summary::Summary;
pub use crate::taxdb::{TaxDb, Taxonomy};
pub use crate::virus::ViralAlignerFilter;

use crate::export::write_table_csv;
use crate::summary::{kraken_summary, sylph_summary, viral_aligner_summary};
use crate::types::AlignmentRecord;

/// Everything parsed and filtered for one sample: the detail tables of each
/// pipeline and their summaries.
pub struct SampleResults {
    pub sample_id: String,
    pub server: Server,
    pub thresholds: FilterConfig,

    pub kraken: KrakenTables,
    pub kraken_summary: Summary,

    pub sylph: Vec<ContainmentSummary>,
    pub sylph_summary: Summary,

    /// Viral aligner rows that passed every filter
    pub viral_aligner: Vec<AlignmentRecord>,
    pub viral_aligner_summary: Summary,
}

impl SampleResults {
    /// One validated analysis record per pipeline, keyed by the output file
    /// stem it is written under.
    pub fn analysis_records(&self) -> Result<Vec<(String, AnalysisRecord)>> {
        let id = self.sample_id.as_str();
        let mut records = Vec::with_capacity(3);

        records.push((
            format!("{}_kraken_bacteria_analysis_fields", id),
            self.analysis_record(
                "bacteria",
                "kraken",
                &self.thresholds.kraken_bacterial_filters,
                &self.kraken_summary,
            )?,
        ));
        records.push((
            format!("{}_sylph_analysis_fields", id),
            self.analysis_record(
                "bacteria",
                "sylph",
                &self.thresholds.sylph_filters,
                &self.sylph_summary,
            )?,
        ));
        records.push((
            format!("{}_viral_aligner_analysis_fields", id),
            self.analysis_record(
                "virus",
                "viral aligner",
                &self.thresholds.viral_aligner_filters,
                &self.viral_aligner_summary,
            )?,
        ));
        Ok(records)
    }

    fn analysis_record<T: Serialize>(
        &self,
        domain: &str,
        classifier: &str,
        thresholds: &T,
        summary: &Summary,
    ) -> Result<AnalysisRecord> {
        let (record, status) = AnalysisRecord::assemble(AnalysisFields {
            domain,
            classifier,
            sample_id: &self.sample_id,
            thresholds,
            headline: &summary.headline,
            results: &summary.results,
            server: self.server,
        });
        match status {
            ValidationStatus::Passed => Ok(record),
            ValidationStatus::Failed(problems) => Err(ClasparError::InvalidAnalysis(problems)),
        }
    }

    /// Write the analysis records as JSON and the detail tables as CSV into
    /// `output_dir`. Returns the paths written.
    pub fn write_outputs<P: AsRef<Path>>(&self, output_dir: P) -> Result<Vec<PathBuf>> {
        let dir = output_dir.as_ref();
        let id = self.sample_id.as_str();

        // Validate all three before writing anything
        let records = self.analysis_records()?;

        let mut written = Vec::new();
        for (stem, record) in &records {
            let path = dir.join(format!("{}.json", stem));
            record.write_json(&path)?;
            written.push(path);
        }

        written.push(write_table_csv(
            &self.kraken.species,
            dir,
            &format!("{}_kraken_bacteria_species", id),
        )?);
        written.push(write_table_csv(
            &self.kraken.genus,
            dir,
            &format!("{}_kraken_bacteria_genus", id),
        )?);
        written.push(write_table_csv(
            &self.sylph,
            dir,
            &format!("{}_sylph_results", id),
        )?);
        written.push(write_table_csv(
            &self.viral_aligner,
            dir,
            &format!("{}_filtered_viral_aligner_results", id),
        )?);

        log::info!("Wrote {} output files to {}", written.len(), dir.display());
        Ok(written)
    }
}

/// Run the Kraken, Sylph and viral aligner pipelines over one sample.
pub fn parse_sample<T: Taxonomy + ?Sized>(
    sample_id: &str,
    tables: &SampleTables,
    config: &FilterConfig,
    taxonomy: &T,
    rank_mode: GenusRankMode,
    server: Server,
) -> Result<SampleResults> {
    // 1) Kraken bacterial classifications
    log::info!("Parsing Kraken results for sample {}", sample_id);
    let kraken = KrakenEngine::new(taxonomy, config.kraken_bacterial_filters)
        .with_rank_mode(rank_mode)
        .process(&tables.classifier_calls);
    let kraken_summary = kraken_summary(sample_id, &kraken);
    log::info!("{}", kraken_summary.headline);

    // 2) Sylph containment results
    log::info!("Parsing Sylph results for sample {}", sample_id);
    let sylph = SylphEngine::new(taxonomy, config.sylph_filters).process(&tables.sylph_results)?;
    let sylph_summary = sylph_summary(sample_id, &sylph);
    log::info!("{}", sylph_summary.headline);

    // 3) Viral aligner results
    log::info!("Parsing viral aligner results for sample {}", sample_id);
    let viral_aligner =
        ViralAlignerFilter::new(config.viral_aligner_filters).filter(&tables.alignment_results);
    let viral_aligner_summary =
        viral_aligner_summary(sample_id, tables.alignment_results.len(), &viral_aligner);
    log::info!("{}", viral_aligner_summary.headline);

    Ok(SampleResults {
        sample_id: sample_id.to_string(),
        server,
        thresholds: *config,
        kraken,
        kraken_summary,
        sylph,
        sylph_summary,
        viral_aligner,
        viral_aligner_summary,
    })
}
