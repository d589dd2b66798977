//! In-memory storage for testing and embedding.
//!
//! Holds the last persisted bytes and counts calls, making it easy to write
//! deterministic tests for code that persists settings.

use parking_lot::Mutex;

use super::{Fetched, StorageAdapter, StorageError, EMPTY_DOCUMENT};


#[derive(Debug, Default)]
struct State {
    data: Option<Vec<u8>>,
    fetches: usize,
    persists: usize,
}

/// A storage adapter that keeps everything in memory.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    state: Mutex<State>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        MemoryStorage::default()
    }

    /// Create storage that already holds `data`, as if persisted earlier.
    pub fn with_data(data: impl Into<Vec<u8>>) -> Self {
        MemoryStorage {
            state: Mutex::new(State {
                data: Some(data.into()),
                ..State::default()
            }),
        }
    }

    /// The currently stored bytes, if anything has been stored.
    pub fn contents(&self) -> Option<Vec<u8>> {
        self.state.lock().data.clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.state.lock().fetches
    }

    pub fn persist_count(&self) -> usize {
        self.state.lock().persists
    }
}

impl StorageAdapter for MemoryStorage {
    fn fetch(&self) -> Result<Fetched, StorageError> {
        let mut state = self.state.lock();
        state.fetches += 1;
        let Some(data) = state.data.clone() else {
            state.data = Some(EMPTY_DOCUMENT.to_vec());
            return Ok(Fetched::Empty);
        };
        Ok(Fetched::from_bytes(data))
    }

    fn persist(&self, data: &[u8]) -> Result<(), StorageError> {
        let mut state = self.state.lock();
        state.persists += 1;
        state.data = Some(data.to_vec());
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_fetch_initializes_empty() {
        let mem = MemoryStorage::new();
        assert!(mem.contents().is_none());
        assert_eq!(mem.fetch().unwrap(), Fetched::Empty);
        assert_eq!(mem.contents().unwrap(), b"{}");
        assert_eq!(mem.fetch_count(), 1);
    }

    #[test]
    fn persist_then_fetch() {
        let mem = MemoryStorage::new();
        mem.persist(b"abc").unwrap();
        assert_eq!(mem.fetch().unwrap(), Fetched::Data(b"abc".to_vec()));
        assert_eq!(mem.persist_count(), 1);
    }

    #[test]
    fn with_data_preloads() {
        let mem = MemoryStorage::with_data("{}");
        assert!(mem.fetch().unwrap().is_empty());
    }
}
