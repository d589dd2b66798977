//! Hierarchical key space — dotted path addressing over a tree of branches
//! and string leaves.
//!
//! Provides the path tokenizer and parser (e.g. `server."display name".port`),
//! the concurrent tree itself, and the document shape it serializes to.

pub mod document;
pub mod lexer;
pub mod path;
pub mod tree;

pub use document::TreeDocument;
pub use path::{parse_path, KeyPath, PathError};
pub use tree::{DataTree, Tree};
