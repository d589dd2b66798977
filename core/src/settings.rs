//! The settings root: a tree plus identity, output format and storage.
//!
//! `Settings::open` fetches from the configured storage adapter (a file
//! named after the identity unless told otherwise) and decodes the
//! document; `persist` snapshots the whole tree and hands the encoded bytes
//! back to the adapter.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Result, SettingsError};
use crate::namespace::{DataTree, Tree, TreeDocument};
use crate::storage::{Fetched, FileStorage, StorageAdapter};


/// How documents are written out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    /// Single line, no insignificant whitespace.
    #[default]
    Compact,
    /// Human-readable, one tab per nesting level.
    Indented,
}

impl Format {
    pub fn encode(self, doc: &TreeDocument) -> Result<Vec<u8>> {
        match self {
            Format::Compact => serde_json::to_vec(doc).map_err(SettingsError::Encode),
            Format::Indented => {
                let mut buf = Vec::new();
                let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
                let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
                doc.serialize(&mut ser).map_err(SettingsError::Encode)?;
                Ok(buf)
            }
        }
    }
}

/// Decode a stored document. Either format is accepted.
pub fn decode(bytes: &[u8]) -> Result<TreeDocument> {
    serde_json::from_slice(bytes).map_err(SettingsError::Decode)
}


/// Construction options for [`Settings`].
#[derive(Default)]
pub struct SettingsOptions {
    storage: Option<Arc<dyn StorageAdapter>>,
    format: Format,
}

impl SettingsOptions {
    pub fn new() -> Self {
        SettingsOptions::default()
    }

    /// Use `storage` instead of a file named after the identity.
    pub fn storage(mut self, storage: Arc<dyn StorageAdapter>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    /// Shorthand for `format(Format::Indented)` when `pretty` is set.
    pub fn pretty(self, pretty: bool) -> Self {
        if pretty {
            self.format(Format::Indented)
        } else {
            self.format(Format::Compact)
        }
    }
}


/// The root of a settings store.
///
/// Only one `Settings` should write a given identity within a process;
/// nothing guards against several processes sharing a backing file.
pub struct Settings {
    identity: String,
    format: Format,
    storage: Arc<dyn StorageAdapter>,
    root: Tree,
    /// Serializes `persist` so an older snapshot never lands after a newer one.
    persist_gate: Mutex<()>,
}

impl Settings {
    /// Open the store for `identity`, loading whatever the storage adapter
    /// holds. Malformed stored bytes are an error.
    pub fn open(identity: impl Into<String>, options: SettingsOptions) -> Result<Self> {
        let identity = identity.into();
        let storage: Arc<dyn StorageAdapter> = match options.storage {
            Some(storage) => storage,
            None => Arc::new(FileStorage::new(identity.as_str())),
        };

        let root = match storage.fetch()? {
            Fetched::Empty => {
                info!(identity = %identity, "starting with empty settings");
                Tree::new()
            }
            Fetched::Data(bytes) => {
                let doc = decode(&bytes)?;
                debug!(identity = %identity, leaves = doc.leaf_count(), "loaded settings");
                Tree::from_document(doc)
            }
        };

        Ok(Settings {
            identity,
            format: options.format,
            storage,
            root,
            persist_gate: Mutex::new(()),
        })
    }

    /// Open `identity` as a file with default options.
    pub fn open_file(identity: impl Into<String>) -> Result<Self> {
        Settings::open(identity, SettingsOptions::new())
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn root(&self) -> &Tree {
        &self.root
    }

    pub fn storage(&self) -> &Arc<dyn StorageAdapter> {
        &self.storage
    }

    /// Encode a consistent snapshot of the whole tree.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.format.encode(&self.root.to_document())
    }

    /// Write the current tree through the storage adapter. Adapter errors
    /// are returned as-is; there is no retry.
    ///
    /// No node lock is held while the adapter runs.
    pub fn persist(&self) -> Result<()> {
        let _gate = self.persist_gate.lock();
        let bytes = self.to_bytes()?;
        debug!(identity = %self.identity, bytes = bytes.len(), "persisting");
        self.storage.persist(&bytes)?;
        Ok(())
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("identity", &self.identity)
            .field("format", &self.format)
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl DataTree for Settings {
    fn get_string(&self, key: &str) -> Result<String> {
        self.root.get_string(key)
    }

    fn set_string(&self, key: &str, value: &str) {
        self.root.set_string(key, value)
    }

    fn get_int(&self, key: &str) -> Result<i32> {
        self.root.get_int(key)
    }

    fn set_int(&self, key: &str, value: i32) {
        self.root.set_int(key, value)
    }

    fn get_int64(&self, key: &str) -> Result<i64> {
        self.root.get_int64(key)
    }

    fn set_int64(&self, key: &str, value: i64) {
        self.root.set_int64(key, value)
    }

    fn incr_int64(&self, key: &str) -> i64 {
        self.root.incr_int64(key)
    }

    fn decr_int64(&self, key: &str) -> i64 {
        self.root.decr_int64(key)
    }

    fn delete(&self, key: &str) {
        self.root.delete(key)
    }

    fn delete_tree(&self, key: &str) {
        self.root.delete_tree(key)
    }

    fn get_tree(&self, key: &str) -> Tree {
        self.root.get_tree(key)
    }

    fn has_tree(&self, key: &str) -> bool {
        self.root.has_tree(key)
    }

    fn has_leaf(&self, key: &str) -> bool {
        self.root.has_leaf(key)
    }

    fn get_leaves(&self) -> HashMap<String, String> {
        self.root.get_leaves()
    }

    fn get_trees(&self) -> HashMap<String, Tree> {
        self.root.get_trees()
    }

    fn handle(&self) -> Tree {
        self.root.clone()
    }
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, StorageError};
    use std::thread;
    use tempfile::TempDir;

    fn open_memory(storage: &Arc<MemoryStorage>) -> Settings {
        let options = SettingsOptions::new().storage(storage.clone());
        Settings::open("mem", options).unwrap()
    }

    struct FailingStorage;

    impl StorageAdapter for FailingStorage {
        fn fetch(&self) -> std::result::Result<Fetched, StorageError> {
            Ok(Fetched::Empty)
        }

        fn persist(&self, _data: &[u8]) -> std::result::Result<(), StorageError> {
            Err(StorageError::Io {
                path: "unwritable".into(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            })
        }
    }

    // --- Construction ---

    #[test]
    fn open_on_empty_storage_starts_empty() {
        let storage = Arc::new(MemoryStorage::new());
        let settings = open_memory(&storage);
        assert!(settings.root().is_empty());
        assert_eq!(storage.fetch_count(), 1);
        assert_eq!(settings.identity(), "mem");
    }

    #[test]
    fn open_decodes_existing_document() {
        let storage = Arc::new(MemoryStorage::with_data(
            r#"{"Branches":{"server":{"Leaves":{"port":"80"}}},"Leaves":{"name":"x"}}"#,
        ));
        let settings = open_memory(&storage);
        assert_eq!(settings.get_string("name").unwrap(), "x");
        assert_eq!(settings.get_tree("server").get_int("port").unwrap(), 80);
    }

    #[test]
    fn open_rejects_malformed_document() {
        let storage = Arc::new(MemoryStorage::with_data("not json"));
        let options = SettingsOptions::new().storage(storage);
        let err = Settings::open("bad", options).unwrap_err();
        assert!(matches!(err, SettingsError::Decode(_)));
    }

    // --- Persistence ---

    #[test]
    fn empty_store_round_trips_to_empty() {
        let storage = Arc::new(MemoryStorage::new());
        open_memory(&storage).persist().unwrap();

        let reopened = open_memory(&storage);
        assert_eq!(reopened.root().to_document(), TreeDocument::default());
    }

    #[test]
    fn populated_store_round_trips() {
        let storage = Arc::new(MemoryStorage::new());
        let settings = open_memory(&storage);
        settings.set_string("title", "say \"hi\"");
        settings.get_tree("server").set_int("port", 8080);
        settings
            .get_tree("server")
            .get_tree("display name")
            .set_string("x", "");
        settings.get_tree("empty");
        settings.persist().unwrap();

        let reopened = open_memory(&storage);
        assert_eq!(reopened.root().to_document(), settings.root().to_document());
        assert_eq!(reopened.to_bytes().unwrap(), settings.to_bytes().unwrap());
    }

    #[test]
    fn compact_and_indented_output() {
        let storage = Arc::new(MemoryStorage::new());
        let settings = open_memory(&storage);
        settings.set_string("a", "1");
        assert_eq!(
            settings.to_bytes().unwrap(),
            br#"{"Branches":{},"Leaves":{"a":"1"}}"#
        );

        let pretty = Settings::open(
            "pretty",
            SettingsOptions::new().storage(storage.clone()).pretty(true),
        )
        .unwrap();
        pretty.set_string("a", "1");
        let text = String::from_utf8(pretty.to_bytes().unwrap()).unwrap();
        assert_eq!(text, "{\n\t\"Branches\": {},\n\t\"Leaves\": {\n\t\t\"a\": \"1\"\n\t}\n}");
        assert_eq!(decode(text.as_bytes()).unwrap(), pretty.root().to_document());
    }

    #[test]
    fn persist_propagates_storage_error() {
        let options = SettingsOptions::new().storage(Arc::new(FailingStorage));
        let settings = Settings::open("x", options).unwrap();
        let err = settings.persist().unwrap_err();
        assert!(matches!(err, SettingsError::Storage(_)));
    }

    #[test]
    fn default_storage_is_file_named_by_identity() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.json");
        let identity = path.to_string_lossy().into_owned();

        let settings = Settings::open_file(identity.as_str()).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"{}");
        settings.get_tree("db").set_string("host", "localhost");
        settings.persist().unwrap();

        let reopened = Settings::open_file(identity).unwrap();
        assert_eq!(
            reopened.get_tree("db").get_string("host").unwrap(),
            "localhost"
        );
    }

    #[test]
    fn concurrent_mutation_and_persist() {
        let storage = Arc::new(MemoryStorage::new());
        let settings = open_memory(&storage);
        thread::scope(|s| {
            for w in 0..4 {
                let settings = &settings;
                s.spawn(move || {
                    let branch = settings.get_tree(&format!("w{}", w));
                    for _ in 0..200 {
                        branch.incr_int64("n");
                        settings.incr_int64("total");
                    }
                });
            }
            for _ in 0..10 {
                settings.persist().unwrap();
            }
        });
        settings.persist().unwrap();

        let reopened = open_memory(&storage);
        assert_eq!(reopened.get_int64("total").unwrap(), 800);
        for w in 0..4 {
            assert_eq!(reopened.get_tree(&format!("w{}", w)).get_int64("n").unwrap(), 200);
        }
    }
}
