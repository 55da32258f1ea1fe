//! Reporting and export module.
//!
//! Two durable artifacts besides the snapshot: the append-only credential
//! CSV and the per-batch summary text, kept consistent with the store
//! after every committed batch.

mod export;
mod summary;

pub use export::*;
pub use summary::*;

use crate::models::{OutputConfig, PersonaRecord, Result};
use crate::store::CorpusStore;
use std::path::PathBuf;

/// Bundles both reporting artifacts behind one per-batch call.
pub struct Reporter {
    exporter: CredentialExporter,
    summary_path: PathBuf,
}

impl Reporter {
    pub fn new(output: &OutputConfig) -> Self {
        Self {
            exporter: CredentialExporter::new(&output.export_path, output.extended_export),
            summary_path: output.summary_path.clone(),
        }
    }

    /// Append newly accepted records and rewrite the summary.
    pub fn record_batch(
        &self,
        new_records: &[PersonaRecord],
        store: &CorpusStore,
        target: usize,
    ) -> Result<()> {
        self.exporter.append(new_records)?;
        write_summary(&self.summary_path, store, target)
    }
}
