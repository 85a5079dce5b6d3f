use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Write a table as `<results_dir>/<filename>.csv` with a header row.
/// An empty table produces an empty file.
pub fn write_table_csv<T: Serialize, P: AsRef<Path>>(
    rows: &[T],
    results_dir: P,
    filename: &str,
) -> Result<PathBuf> {
    let path = results_dir.as_ref().join(format!("{}.csv", filename));
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_path(&path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    log::debug!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bacteria::SylphEngine;
    use crate::test_fixtures::{containment, small_taxdb, sylph_thresholds};

    #[test]
    fn writes_header_and_rows() {
        let taxdb = small_taxdb();
        let rows = SylphEngine::new(&taxdb, sylph_thresholds())
            .process(&[
                containment(Some(520), "Bordetella pertussis", 0.9, 12.0),
                containment(None, "", 0.1, 0.5),
            ])
            .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_table_csv(&rows, dir.path(), "ID-1_sylph_results").unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "taxon_id,human_readable,taxon_rank,containment_index,cont_ind_eval,effective_coverage,species_id,species_human_readable,genus_id,sylph_confidence"
        );
        assert_eq!(
            lines.next().unwrap(),
            "520,Bordetella pertussis,species,0.9,0.9,12.0,520,Bordetella pertussis,517,high"
        );
        assert_eq!(lines.next().unwrap(), ",,,0.1,0.1,0.5,,,,low");
        assert!(lines.next().is_none());
    }

    #[test]
    fn empty_table_writes_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let rows: Vec<crate::types::AlignmentRecord> = Vec::new();
        let path = write_table_csv(&rows, dir.path(), "empty").unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "");
    }
}
