//! Document persistence layer.
//!
//! Each profile owns two JSON documents under the injected data directory:
//! the raw history and the hourly summary log. The "default" profile uses the
//! unsuffixed file names, every other profile gets a `-<name>` suffix. The
//! profile registry lives in `profiles.json` next to them.
//!
//! Writes go to a `.tmp` sibling first and are renamed into place, so a
//! reader never observes a half-written document. There is no cross-process
//! lock: the design assumes a single collector process, and overlapping
//! writers race with last-writer-wins semantics.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{QuotawatchError, Result};
use crate::models::{HistoryDocument, SummaryDocument};

#[derive(Debug, Clone)]
pub struct DocumentStore {
    data_dir: PathBuf,
}

impl DocumentStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn history_path(&self, profile: &str) -> PathBuf {
        self.data_dir.join(document_name("history", profile))
    }

    pub fn summary_path(&self, profile: &str) -> PathBuf {
        self.data_dir.join(document_name("summary", profile))
    }

    pub fn profiles_path(&self) -> PathBuf {
        self.data_dir.join("profiles.json")
    }

    pub fn load_history(&self, profile: &str) -> Result<HistoryDocument> {
        self.read_document(&self.history_path(profile))
    }

    pub fn save_history(&self, profile: &str, doc: &HistoryDocument) -> Result<()> {
        self.write_document(&self.history_path(profile), doc)
    }

    pub fn load_summaries(&self, profile: &str) -> Result<SummaryDocument> {
        self.read_document(&self.summary_path(profile))
    }

    pub fn save_summaries(&self, profile: &str, doc: &SummaryDocument) -> Result<()> {
        self.write_document(&self.summary_path(profile), doc)
    }

    /// Remove a profile's history and summary documents. Missing files are
    /// fine; deletion is idempotent.
    pub fn remove_profile_documents(&self, profile: &str) -> Result<()> {
        for path in [self.history_path(profile), self.summary_path(profile)] {
            match fs::remove_file(&path) {
                Ok(()) => debug!(path = %path.display(), "Removed profile document"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Read a document, returning the empty default when the file does not
    /// exist. A file that exists but fails to parse is corrupt and the error
    /// is propagated; callers must not silently fall back to an empty
    /// document there.
    pub fn read_document<T>(&self, path: &Path) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(T::default());
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&content).map_err(|source| QuotawatchError::CorruptData {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Atomic write: serialize to `<path>.tmp`, then rename into place.
    pub fn write_document<T: Serialize>(&self, path: &Path, doc: &T) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(doc)?;
        let tmp_path = tmp_sibling(path);
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, path)?;
        debug!(path = %path.display(), "Persisted document");
        Ok(())
    }
}

fn document_name(kind: &str, profile: &str) -> String {
    if profile == "default" {
        format!("{}.json", kind)
    } else {
        format!("{}-{}.json", kind, profile)
    }
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
