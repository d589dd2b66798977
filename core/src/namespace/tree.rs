//! The settings tree.
//!
//! A [`Tree`] is a cheap, clonable handle to one node. Each node holds two
//! independent maps, leaves (name → string value) and branches (name → child
//! node), guarded by the node's own mutex. There is no lock spanning the
//! whole tree: walking `a.b.c` locks `a`, releases it, then locks `a.b`, and
//! so on. Concurrent deletes and re-creates along a path therefore resolve
//! as last-writer-wins rather than as an isolated transaction.
//!
//! Branches are created lazily by [`DataTree::get_tree`], which never fails.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::lock_api::ArcMutexGuard;
use parking_lot::{Mutex, RawMutex};
use tracing::trace;

use super::document::TreeDocument;
use crate::error::{Result, SettingsError};


/// The operation set shared by every node, including the settings root.
pub trait DataTree {
    /// Leaf value, or `SettingsError::UndefinedKey` if absent.
    fn get_string(&self, key: &str) -> Result<String>;
    /// Insert or replace a leaf.
    fn set_string(&self, key: &str, value: &str);

    fn get_int(&self, key: &str) -> Result<i32>;
    fn set_int(&self, key: &str, value: i32);
    fn get_int64(&self, key: &str) -> Result<i64>;
    fn set_int64(&self, key: &str, value: i64);

    /// Add one to a 64-bit leaf and return the new value. An absent or
    /// non-numeric leaf counts as zero.
    fn incr_int64(&self, key: &str) -> i64;
    /// Subtract one; same rules as `incr_int64`.
    fn decr_int64(&self, key: &str) -> i64;

    /// Remove a leaf. No-op if absent.
    fn delete(&self, key: &str);
    /// Remove a branch and everything beneath it. No-op if absent.
    fn delete_tree(&self, key: &str);

    /// The named branch, created empty if it does not exist yet.
    fn get_tree(&self, key: &str) -> Tree;
    fn has_tree(&self, key: &str) -> bool;
    fn has_leaf(&self, key: &str) -> bool;

    /// Copy of the direct leaves.
    fn get_leaves(&self) -> HashMap<String, String>;
    /// Handles to the direct branches.
    fn get_trees(&self) -> HashMap<String, Tree>;

    /// A handle to this node itself.
    fn handle(&self) -> Tree;
}


#[derive(Debug, Default)]
struct Node {
    leaves: HashMap<String, String>,
    branches: HashMap<String, Tree>,
}

type HeldNode = ArcMutexGuard<RawMutex, Node>;


/// Handle to a tree node. Clones refer to the same node.
///
/// A handle obtained before its branch was removed with `delete_tree` keeps
/// working but is detached: nothing written through it is reachable from
/// the root any more.
#[derive(Debug, Clone, Default)]
pub struct Tree {
    node: Arc<Mutex<Node>>,
}

impl Tree {
    /// Create an empty, unattached node.
    pub fn new() -> Self {
        Tree::default()
    }

    /// True if both handles refer to the same node.
    pub fn ptr_eq(a: &Tree, b: &Tree) -> bool {
        Arc::ptr_eq(&a.node, &b.node)
    }

    /// Number of direct leaves plus direct branches.
    pub fn len(&self) -> usize {
        let node = self.node.lock();
        node.leaves.len() + node.branches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The existing branch `key`, if any. Never creates one.
    pub fn find_tree(&self, key: &str) -> Option<Tree> {
        self.node.lock().branches.get(key).cloned()
    }

    /// Build a tree from its serialized shape.
    pub fn from_document(doc: TreeDocument) -> Self {
        let node = Node {
            leaves: doc.leaves.into_iter().collect(),
            branches: doc
                .branches
                .into_iter()
                .map(|(name, child)| (name, Tree::from_document(child)))
                .collect(),
        };
        Tree {
            node: Arc::new(Mutex::new(node)),
        }
    }

    /// Capture a consistent copy of this node and everything beneath it.
    ///
    /// Locks are taken parent-before-child and all of them are held until
    /// the capture is complete, so the result reflects a single moment.
    /// Every other operation holds at most one node lock, which keeps this
    /// ordering deadlock-free.
    pub fn to_document(&self) -> TreeDocument {
        let mut held: Vec<HeldNode> = Vec::new();
        let root = self.node.lock_arc();
        let doc = capture(&root, &mut held);
        drop(held);
        doc
    }

    fn adjust(&self, key: &str, delta: i64) -> i64 {
        let mut node = self.node.lock();
        let current = node
            .leaves
            .get(key)
            .and_then(|text| text.parse::<i64>().ok())
            .unwrap_or(0);
        let next = current.wrapping_add(delta);
        node.leaves.insert(key.to_string(), next.to_string());
        next
    }

    fn parse_leaf<N: std::str::FromStr<Err = std::num::ParseIntError>>(
        &self,
        key: &str,
    ) -> Result<N> {
        let text = self.get_string(key)?;
        text.parse().map_err(|source| SettingsError::Format {
            key: key.to_string(),
            source,
        })
    }
}

fn capture(node: &Node, held: &mut Vec<HeldNode>) -> TreeDocument {
    let mut branches = BTreeMap::new();
    for (name, child) in &node.branches {
        let guard = child.node.lock_arc();
        branches.insert(name.clone(), capture(&guard, held));
        held.push(guard);
    }
    TreeDocument {
        branches,
        leaves: node
            .leaves
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    }
}

impl DataTree for Tree {
    fn get_string(&self, key: &str) -> Result<String> {
        self.node
            .lock()
            .leaves
            .get(key)
            .cloned()
            .ok_or_else(|| SettingsError::UndefinedKey(key.to_string()))
    }

    fn set_string(&self, key: &str, value: &str) {
        self.node
            .lock()
            .leaves
            .insert(key.to_string(), value.to_string());
    }

    fn get_int(&self, key: &str) -> Result<i32> {
        self.parse_leaf(key)
    }

    fn set_int(&self, key: &str, value: i32) {
        self.set_string(key, &value.to_string());
    }

    fn get_int64(&self, key: &str) -> Result<i64> {
        self.parse_leaf(key)
    }

    fn set_int64(&self, key: &str, value: i64) {
        self.set_string(key, &value.to_string());
    }

    fn incr_int64(&self, key: &str) -> i64 {
        self.adjust(key, 1)
    }

    fn decr_int64(&self, key: &str) -> i64 {
        self.adjust(key, -1)
    }

    fn delete(&self, key: &str) {
        self.node.lock().leaves.remove(key);
    }

    fn delete_tree(&self, key: &str) {
        self.node.lock().branches.remove(key);
    }

    fn get_tree(&self, key: &str) -> Tree {
        let mut node = self.node.lock();
        if let Some(existing) = node.branches.get(key) {
            return existing.clone();
        }
        trace!(branch = key, "creating branch");
        let child = Tree::new();
        node.branches.insert(key.to_string(), child.clone());
        child
    }

    fn has_tree(&self, key: &str) -> bool {
        self.node.lock().branches.contains_key(key)
    }

    fn has_leaf(&self, key: &str) -> bool {
        self.node.lock().leaves.contains_key(key)
    }

    fn get_leaves(&self) -> HashMap<String, String> {
        self.node.lock().leaves.clone()
    }

    fn get_trees(&self) -> HashMap<String, Tree> {
        self.node.lock().branches.clone()
    }

    fn handle(&self) -> Tree {
        self.clone()
    }
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
