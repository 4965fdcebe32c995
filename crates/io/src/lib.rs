//! `avstamning-io` — file ingestion and workbook emission around the
//! reconciliation engine.

pub mod error;
pub mod ingest;
pub mod workbook;

use std::path::Path;

use avstamning_engine::{build_combined, reconcile, RunSummary};

pub use error::{Error, IngestError, OutputError};
pub use ingest::IngestStats;

/// Everything one file-to-file run produces.
#[derive(Debug)]
pub struct ReconciliationRun {
    pub bytes: Vec<u8>,
    pub summary: RunSummary,
    pub bank_stats: IngestStats,
    pub bokf_stats: IngestStats,
}

/// Load both inputs, run the cascade, emit the combined workbook.
pub fn run_reconciliation(bank_path: &Path, bokf_path: &Path) -> Result<ReconciliationRun, Error> {
    let (bank, bank_stats) = ingest::load_bank(bank_path)?;
    let (bokf, bokf_stats) = ingest::load_bokf(bokf_path)?;

    let recon = reconcile(&bank, &bokf);
    let rows = build_combined(&bank, &bokf, &recon.stamps);
    let bytes = workbook::write_combined_workbook(&rows)?;

    Ok(ReconciliationRun { bytes, summary: recon.summary, bank_stats, bokf_stats })
}

/// Programmatic entry point: workbook bytes only.
pub fn build_output_workbook_bytes(bank_path: &Path, bokf_path: &Path) -> Result<Vec<u8>, Error> {
    run_reconciliation(bank_path, bokf_path).map(|run| run.bytes)
}
