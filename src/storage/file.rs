//! File-based review storage for bibly.
//!
//! References and history are stored as two JSON files in the bibly home
//! directory (`~/.bibly/` by default). Atomic writes are achieved via temp
//! file + rename pattern. Records that fail to parse are skipped with a
//! warning so one bad entry never hides the rest of the collection.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::bibly_home;
use crate::core::Reference;
use crate::error::{BiblyError, Result};
use crate::history::ReviewHistoryItem;
use crate::storage::ReviewStore;

/// File name of the reference collection.
pub const REFERENCES_FILE: &str = "references.json";

/// File name of the review history.
pub const HISTORY_FILE: &str = "history.json";

/// File-based review storage.
#[derive(Debug, Clone)]
pub struct FileReviewStore {
    /// Directory holding the JSON files.
    dir: PathBuf,
}

impl FileReviewStore {
    /// Create a store in the default home directory.
    ///
    /// Uses `~/.bibly/` or `$BIBLY_HOME/`.
    pub fn new() -> Result<Self> {
        let dir = bibly_home().ok_or_else(|| {
            BiblyError::config("Could not determine bibly home directory (no home directory)")
        })?;
        Self::with_dir(dir)
    }

    /// Create a store in a custom directory, creating it if needed.
    pub fn with_dir(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();

        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|e| BiblyError::storage(&dir, e))?;
        }

        Ok(Self { dir })
    }

    /// Path of the references file.
    pub fn references_path(&self) -> PathBuf {
        self.dir.join(REFERENCES_FILE)
    }

    /// Path of the history file.
    pub fn history_path(&self) -> PathBuf {
        self.dir.join(HISTORY_FILE)
    }

    fn temp_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!(".{}.tmp", name))
    }

    /// Read a JSON array, treating a missing or blank file as empty.
    fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<Vec<T>> {
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(path).map_err(|e| BiblyError::storage(path, e))?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&content)
            .map_err(|e| BiblyError::serde(format!("{}: {}", path.display(), e)))
    }

    /// Read a JSON array record by record, skipping records that do not parse.
    fn read_records<T: DeserializeOwned>(&self, path: &Path) -> Result<Vec<T>> {
        let values: Vec<serde_json::Value> = self.read_json(path)?;
        let records = values
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| match serde_json::from_value(value) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        index,
                        error = %e,
                        "skipping unreadable record"
                    );
                    None
                }
            })
            .collect();
        Ok(records)
    }

    /// Write a JSON value atomically using temp file + rename.
    fn atomic_write<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<()> {
        let final_path = self.dir.join(name);
        let temp_path = self.temp_path(name);

        let json = serde_json::to_string_pretty(value)?;

        {
            let mut file =
                fs::File::create(&temp_path).map_err(|e| BiblyError::storage(&temp_path, e))?;
            file.write_all(json.as_bytes())
                .map_err(|e| BiblyError::storage(&temp_path, e))?;
            file.sync_all()
                .map_err(|e| BiblyError::storage(&temp_path, e))?;
        }

        // Rename temp file to final path (atomic on POSIX)
        fs::rename(&temp_path, &final_path).map_err(|e| BiblyError::storage(&final_path, e))?;

        Ok(())
    }
}

impl ReviewStore for FileReviewStore {
    fn load_references(&self) -> Result<Vec<Reference>> {
        self.read_records(&self.references_path())
    }

    fn save_references(&self, references: &[Reference]) -> Result<()> {
        self.atomic_write(REFERENCES_FILE, references)
    }

    fn load_history(&self) -> Result<Vec<ReviewHistoryItem>> {
        self.read_records(&self.history_path())
    }

    fn save_history(&self, history: &[ReviewHistoryItem]) -> Result<()> {
        self.atomic_write(HISTORY_FILE, history)
    }
}
