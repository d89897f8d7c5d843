//! Data source abstraction for receiving patient uploads.
//!
//! An upload is the raw text of one CSV file. Sources only deliver text;
//! parsing and merging happen in the [`Session`](crate::Session) so that a
//! rejected upload never leaves the roster half-updated.

mod channel;
mod file;

pub use channel::ChannelSource;
pub use file::FileSource;

use std::fmt::Debug;

/// One uploaded CSV document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Upload {
    /// Where the upload came from (file name, channel label).
    pub origin: String,
    /// The CSV text.
    pub content: String,
}

impl Upload {
    pub fn new(origin: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            content: content.into(),
        }
    }
}

/// Trait for receiving uploads from various sources.
///
/// # Example
///
/// ```
/// use vitalwatch::{DataSource, FileSource};
///
/// let mut source = FileSource::new("patients.csv");
/// if let Some(upload) = source.poll() {
///     println!("Got {} bytes from {}", upload.content.len(), upload.origin);
/// }
/// ```
pub trait DataSource: Send + Debug {
    /// Poll for a new upload.
    ///
    /// Returns `Some(upload)` if new data is available, `None` otherwise.
    /// This method should be non-blocking.
    fn poll(&mut self) -> Option<Upload>;

    /// Returns a human-readable description of the source.
    ///
    /// Used for display in the TUI status bar.
    fn description(&self) -> &str;

    /// Returns the error message if the last poll failed.
    fn error(&self) -> Option<&str>;
}
