//! File-system storage — the default adapter.
//!
//! Stores the document in a single file. Writes go to a uniquely named
//! sibling temporary file that is then renamed over the target, so readers
//! never observe a half-written document and two adapters on the same path
//! never share a temporary file.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tempfile::Builder;
use tracing::{debug, info};

use super::{Fetched, StorageAdapter, StorageError, EMPTY_DOCUMENT};


/// Persists settings to one file on disk.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStorage {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn write_file(&self, data: &[u8]) -> Result<(), StorageError> {
        let mut tmp = Builder::new()
            .prefix(&temp_prefix(&self.path))
            .suffix(".tmp")
            .tempfile_in(parent_dir(&self.path))
            .map_err(|e| self.io_error(e))?;
        tmp.write_all(data).map_err(|e| self.io_error(e))?;
        // A failed rename drops (and removes) the temporary file.
        tmp.persist(&self.path).map_err(|e| self.io_error(e.error))?;
        Ok(())
    }
}

impl StorageAdapter for FileStorage {
    fn fetch(&self) -> Result<Fetched, StorageError> {
        let _guard = self.lock.lock();

        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "initializing empty settings file");
                self.write_file(EMPTY_DOCUMENT)?;
                return Ok(Fetched::Empty);
            }
            Err(e) => return Err(self.io_error(e)),
        };

        debug!(path = %self.path.display(), bytes = data.len(), "fetched settings");
        Ok(Fetched::from_bytes(data))
    }

    fn persist(&self, data: &[u8]) -> Result<(), StorageError> {
        let _guard = self.lock.lock();
        debug!(path = %self.path.display(), bytes = data.len(), "persisting settings");
        self.write_file(data)
    }
}


/// `settings.json` → `.settings.json.`; a random part and `.tmp` follow.
fn temp_prefix(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!(".{}.", name)
}

/// Temporary files live beside the target so the final rename never
/// crosses file systems.
fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
