//! Storage backends for serialized settings.
//!
//! Provides the `StorageAdapter` trait and implementations for the file
//! system (production default) and memory (testing and embedding). Adapters
//! move opaque bytes only; encoding and decoding belong to the settings root.

pub mod file;
pub mod memory;

use std::path::PathBuf;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// The canonical representation of a store with nothing in it.
pub const EMPTY_DOCUMENT: &[u8] = b"{}";


/// Outcome of a successful fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched {
    /// Nothing has been persisted yet (or only the canonical empty
    /// document). The caller should start from an empty tree.
    Empty,
    /// Previously persisted bytes, verbatim.
    Data(Vec<u8>),
}

impl Fetched {
    /// Classify raw stored bytes: zero-length or canonical-empty is `Empty`.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        if data.is_empty() || data == EMPTY_DOCUMENT {
            Fetched::Empty
        } else {
            Fetched::Data(data)
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Fetched::Empty)
    }
}


#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}


/// Raw byte persistence for one settings identity.
///
/// Implementations must tolerate concurrent `fetch`/`persist` calls from
/// several threads. Nothing here coordinates across processes.
pub trait StorageAdapter: Send + Sync {
    /// Retrieve the persisted bytes. First use initializes empty backing
    /// storage and reports `Fetched::Empty`.
    fn fetch(&self) -> Result<Fetched, StorageError>;

    /// Replace the backing storage with `data`.
    fn persist(&self, data: &[u8]) -> Result<(), StorageError>;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapters_are_object_safe() {
        let memory = MemoryStorage::new();
        let _: &dyn StorageAdapter = &memory;
    }

    #[test]
    fn classify_fetched_bytes() {
        assert_eq!(Fetched::from_bytes(Vec::new()), Fetched::Empty);
        assert_eq!(Fetched::from_bytes(b"{}".to_vec()), Fetched::Empty);
        assert_eq!(
            Fetched::from_bytes(b"{ }".to_vec()),
            Fetched::Data(b"{ }".to_vec())
        );
    }
}
