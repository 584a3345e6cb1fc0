//! Persistence abstraction for encoded aggregates.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, instrument};

use crate::aggregates::dict;
use crate::aggregates::registry::{self, AggregateValue};
use crate::errors::{ChronostatError, Result};

/// Storage for encoded aggregate dictionaries, keyed by name.
///
/// Implementations persist whole dictionary trees atomically under a caller
/// chosen name. Saving never overwrites: a report run that would clobber an
/// existing result is a scheduling bug and must fail loudly.
pub trait ReportStore: Send + Sync {
    /// Saves an encoded dictionary under `name`.
    ///
    /// Fails with [`ChronostatError::DestinationExists`] if `name` is
    /// already taken.
    fn save(&self, name: &str, value: &Value) -> Result<()>;

    /// Loads and decodes the aggregate saved under `name`.
    fn load(&self, name: &str) -> Result<AggregateValue>;

    /// Lists all saved names, ordered by name.
    fn list(&self) -> Result<Vec<String>>;

    /// Deletes the aggregate saved under `name`, if present.
    fn delete(&self, name: &str) -> Result<()>;
}

/// File system implementation of [`ReportStore`].
///
/// Stores each aggregate as one JSON file directly under the base directory:
/// ```text
/// base_path/
/// ├── X1_CAL-PCALX_2015-03.json
/// └── X1_CAL-PCALY_2015-03.json
/// ```
pub struct FileSystemReportStore {
    base_path: PathBuf,
}

impl FileSystemReportStore {
    /// Creates a store rooted at `base_path`, creating the directory if
    /// needed.
    pub fn new<P: AsRef<Path>>(base_path: P) -> Result<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.base_path.join(format!("{name}.json"))
    }
}

impl ReportStore for FileSystemReportStore {
    #[instrument(skip(self, value))]
    fn save(&self, name: &str, value: &Value) -> Result<()> {
        dict::validate_tree(value)?;
        let path = self.file_path(name);
        if path.exists() {
            return Err(ChronostatError::DestinationExists(path));
        }
        let encoded = serde_json::to_vec_pretty(value)?;
        std::fs::write(&path, encoded)?;
        debug!(path = %path.display(), "saved aggregate");
        Ok(())
    }

    #[instrument(skip(self))]
    fn load(&self, name: &str) -> Result<AggregateValue> {
        let path = self.file_path(name);
        let raw = std::fs::read(&path)?;
        let value: Value = serde_json::from_slice(&raw)?;
        dict::validate_tree(&value)?;
        let decoded = registry::decode(&value)?;
        debug!(path = %path.display(), class = decoded.class_tag(), "loaded aggregate");
        Ok(decoded)
    }

    #[instrument(skip(self))]
    fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.base_path)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        debug!(count = names.len(), "listed saved aggregates");
        Ok(names)
    }

    #[instrument(skip(self))]
    fn delete(&self, name: &str) -> Result<()> {
        let path = self.file_path(name);
        if path.exists() {
            std::fs::remove_file(&path)?;
            debug!(path = %path.display(), "deleted aggregate");
        }
        Ok(())
    }
}
