//! Upload ingestion: CSV parsing and merging into the roster.
//!
//! [`parse_upload`] turns one CSV text into [`PatientRecord`]s without
//! touching any stored state. [`merge_record`] then decides how each record
//! combines with one already loaded under the same id.
//!
//! [`PatientRecord`]: vitalwatch_types::PatientRecord

mod csv;
mod error;
mod merge;

pub use csv::{parse_upload, ParsedUpload, CSV_FORMAT, ID_COLUMN, OFFSET_COLUMN};
pub use error::IngestError;
pub use merge::{merge_record, MergeOutcome, MergePolicy};

/// Counts reported after an upload has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct IngestSummary {
    /// Distinct patients in the upload.
    pub patients: usize,
    pub rows: usize,
    pub skipped_rows: usize,
    pub added: usize,
    pub replaced: usize,
    pub appended: usize,
}

impl IngestSummary {
    /// Count one merge outcome.
    pub fn record(&mut self, outcome: MergeOutcome) {
        match outcome {
            MergeOutcome::Added => self.added += 1,
            MergeOutcome::Replaced => self.replaced += 1,
            MergeOutcome::Appended => self.appended += 1,
        }
    }
}

impl std::fmt::Display for IngestSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} patients from {} rows ({} new, {} replaced, {} appended",
            self.patients, self.rows, self.added, self.replaced, self.appended
        )?;
        if self.skipped_rows > 0 {
            write!(f, ", {} rows skipped", self.skipped_rows)?;
        }
        f.write_str(")")
    }
}
