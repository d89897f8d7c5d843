//! Error types for upload ingestion.

use thiserror::Error;

/// Errors that reject an upload as a whole.
///
/// A rejected upload leaves previously loaded patients untouched. Individual
/// bad rows are not errors; they are skipped and counted.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The upload has no header row.
    #[error("Upload is empty")]
    Empty,

    /// A required column is absent from the header.
    #[error("Missing required column: {0}")]
    MissingColumn(&'static str),

    /// The upload could not be read.
    #[error("Failed to read upload: {0}")]
    Io(#[from] std::io::Error),
}
