use allot_core::{AllocationRecord, AllotError};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Backing JSON file of allocation records.
///
/// There is no in-memory copy: every call to [`DatasetSource::load`] reads
/// and parses the file again, so edits on disk are visible to the next query.
#[derive(Debug, Clone)]
pub struct DatasetSource {
    path: PathBuf,
}

impl DatasetSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the file, surfacing any failure.
    pub fn try_load(&self) -> Result<Vec<AllocationRecord>, AllotError> {
        let raw = fs::read_to_string(&self.path)?;
        let records: Vec<AllocationRecord> = serde_json::from_str(&raw)?;
        debug!(path = %self.path.display(), records = records.len(), "Dataset loaded");
        Ok(records)
    }

    /// Read the file, falling back to an empty dataset when it is missing,
    /// unreadable or not a JSON array of objects.
    pub fn load(&self) -> Vec<AllocationRecord> {
        match self.try_load() {
            Ok(records) => records,
            Err(AllotError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                warn!(path = %self.path.display(), "Data file not found, using empty dataset");
                Vec::new()
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to load data file, using empty dataset");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_loads_as_empty() {
        let source = DatasetSource::new("/nonexistent/allocations.json");
        assert!(source.load().is_empty());
        assert!(matches!(source.try_load(), Err(AllotError::Io(_))));
    }

    #[test]
    fn invalid_json_loads_as_empty() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let source = DatasetSource::new(file.path());
        assert!(source.load().is_empty());
        assert!(matches!(source.try_load(), Err(AllotError::Serde(_))));
    }

    #[test]
    fn top_level_object_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"ProjectCode":"P1"}}"#).unwrap();
        assert!(DatasetSource::new(file.path()).load().is_empty());
    }

    #[test]
    fn every_load_rereads_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, r#"[{"ProjectCode":"P1"}]"#).unwrap();
        let source = DatasetSource::new(&path);
        assert_eq!(source.load().len(), 1);

        fs::write(&path, r#"[{"ProjectCode":"P1"},{"ProjectCode":"P2"}]"#).unwrap();
        assert_eq!(source.load().len(), 2);
    }
}
