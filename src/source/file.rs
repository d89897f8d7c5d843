//! File-based data source.
//!
//! Polls a CSV file and delivers its content whenever it changes.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::debug;

use super::{DataSource, Upload};

/// A data source that re-reads a CSV file when its modification time moves.
///
/// Exporting a fresh extract over the same path is enough to upload it again.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    description: String,
    last_error: Option<String>,
    last_modified: Option<SystemTime>,
}

impl FileSource {
    /// Create a new file source for the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("file: {}", path.display());
        Self {
            path,
            description,
            last_error: None,
            last_modified: None,
        }
    }

    /// Returns the path being watched.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn get_modified_time(&self) -> Option<SystemTime> {
        fs::metadata(&self.path).ok()?.modified().ok()
    }

    fn read_file(&mut self) -> Option<Upload> {
        match fs::read_to_string(&self.path) {
            Ok(content) => {
                self.last_error = None;
                Some(Upload::new(self.path.display().to_string(), content))
            }
            Err(e) => {
                self.last_error = Some(format!("Read error: {}", e));
                None
            }
        }
    }
}

impl DataSource for FileSource {
    fn poll(&mut self) -> Option<Upload> {
        let current_modified = self.get_modified_time();

        let file_changed = match (&self.last_modified, &current_modified) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(last), Some(current)) => current > last,
        };

        if file_changed {
            if let Some(upload) = self.read_file() {
                debug!(path = %self.path.display(), bytes = upload.content.len(), "Read upload");
                self.last_modified = current_modified;
                return Some(upload);
            }
        }

        None
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Seek, Write};
    use tempfile::NamedTempFile;

    const SAMPLE: &str = "patientunitstayid,itemoffset,Heart Rate\n141168,0,92\n";

    #[test]
    fn test_file_source_new() {
        let source = FileSource::new("/tmp/patients.csv");
        assert_eq!(source.path(), Path::new("/tmp/patients.csv"));
        assert_eq!(source.description(), "file: /tmp/patients.csv");
        assert!(source.error().is_none());
    }

    #[test]
    fn test_file_source_poll_reads_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", SAMPLE).unwrap();

        let mut source = FileSource::new(file.path());

        let upload = source.poll().unwrap();
        assert_eq!(upload.content, SAMPLE);
        assert_eq!(upload.origin, file.path().display().to_string());

        // Unchanged file yields nothing
        assert!(source.poll().is_none());
    }

    #[test]
    fn test_file_source_detects_changes() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", SAMPLE).unwrap();

        let mut source = FileSource::new(file.path());
        let _ = source.poll();

        std::thread::sleep(std::time::Duration::from_millis(10));
        file.rewind().unwrap();
        write!(file, "patientunitstayid,itemoffset\n999,5\n").unwrap();
        file.flush().unwrap();

        // May be flaky on filesystems with coarse mtime resolution
        if let Some(upload) = source.poll() {
            assert!(upload.content.contains("999"));
        }
    }

    #[test]
    fn test_file_source_missing_file() {
        let mut source = FileSource::new("/nonexistent/path/patients.csv");

        assert!(source.poll().is_none());
        assert!(source.error().unwrap().contains("Read error"));
    }
}
