//! Serialized shape of a settings tree.
//!
//! Every node is an object with two maps:
//!
//! ```json
//! {"Branches": {"server": {"Branches": {}, "Leaves": {"port": "80"}}}, "Leaves": {}}
//! ```
//!
//! A missing or `null` map decodes as empty, so a document written by hand
//! (or by an older writer that dropped empty collections) loads cleanly.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};


/// Owned, lock-free copy of a tree. Maps are ordered so output is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeDocument {
    #[serde(rename = "Branches", default, deserialize_with = "null_as_empty")]
    pub branches: BTreeMap<String, TreeDocument>,
    #[serde(rename = "Leaves", default, deserialize_with = "null_as_empty")]
    pub leaves: BTreeMap<String, String>,
}

impl TreeDocument {
    /// True if the node has neither leaves nor branches.
    pub fn is_empty(&self) -> bool {
        self.branches.is_empty() && self.leaves.is_empty()
    }

    /// Total leaves in this node and all descendants.
    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
            + self
                .branches
                .values()
                .map(TreeDocument::leaf_count)
                .sum::<usize>()
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
