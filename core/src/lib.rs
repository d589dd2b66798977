//! Embeddable hierarchical key/value settings store.
//!
//! Settings live in a tree of named branches, each holding string leaves,
//! addressed with dotted paths such as `server."display name".port`. The
//! whole tree is persisted as one JSON document through a pluggable
//! [`StorageAdapter`](storage::StorageAdapter).
//!
//! ```no_run
//! use appsettings_core::{DataTree, KeyPath, Settings};
//!
//! # fn main() -> appsettings_core::Result<()> {
//! let settings = Settings::open_file("appsettings.json")?;
//! let path: KeyPath = "server.\"display name\".port".parse()?;
//! let (node, leaf) = path.resolve(&settings);
//! node.set_int(leaf, 8080);
//! settings.persist()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`namespace`] — path parsing, the concurrent tree, document shape
//! - [`storage`] — storage adapter trait, file and memory adapters
//! - [`settings`] — the settings root and its options
//! - [`command`] — typed commands and their executor

pub mod command;
pub mod error;
pub mod namespace;
pub mod settings;
pub mod storage;

pub use command::{execute, Command};
pub use error::{Result, SettingsError};
pub use namespace::{parse_path, DataTree, KeyPath, PathError, Tree, TreeDocument};
pub use settings::{Format, Settings, SettingsOptions};
pub use storage::{Fetched, FileStorage, MemoryStorage, StorageAdapter, StorageError};
