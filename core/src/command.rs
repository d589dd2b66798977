//! Command — the typed interface for every operation on a settings store.
//!
//! Front ends build a `Command` and hand it to [`execute`], which parses all
//! paths up front, applies the operation, and persists once at the end for
//! commands that mutate. A malformed path anywhere in the arguments aborts
//! the command before anything is changed.
//!
//! | Command | Effect |
//! |---------|--------|
//! | `get` | print each leaf value, one per line |
//! | `set` | upsert each key/value pair |
//! | `delete` | remove each leaf |
//! | `delete_tree` | remove each branch and everything under it |
//! | `incr` / `decr` | adjust each 64-bit counter, print the new values |
//! | `list` | print the leaves and branches of one node |

use std::fmt::Write;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SettingsError};
use crate::namespace::path::write_segment;
use crate::namespace::{DataTree, KeyPath};
use crate::settings::Settings;


/// A typed settings operation.
///
/// Serializes as internally-tagged JSON, e.g.
/// `{"command": "set", "pairs": [["a.b", "1"]]}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    Get { keys: Vec<String> },
    Set { pairs: Vec<(String, String)> },
    Delete { keys: Vec<String> },
    DeleteTree { keys: Vec<String> },
    Incr { keys: Vec<String> },
    Decr { keys: Vec<String> },
    List {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<String>,
    },
}

impl Command {
    /// Build a `Set` from a flat `key value key value ...` argument list.
    pub fn set_from_args(args: &[String]) -> Result<Command> {
        if args.len() % 2 != 0 {
            return Err(SettingsError::OddArguments);
        }
        let pairs = args
            .chunks_exact(2)
            .map(|pair| (pair[0].clone(), pair[1].clone()))
            .collect();
        Ok(Command::Set { pairs })
    }

    /// True if executing this command changes the store.
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Command::Get { .. } | Command::List { .. })
    }
}


/// Run `cmd` against `settings` and return its printable output (possibly
/// empty). Mutating commands persist before returning. A `get` that hits
/// an undefined key returns only the error, not the values before it.
pub fn execute(settings: &Settings, cmd: &Command) -> Result<String> {
    let output = match cmd {
        Command::Get { keys } => {
            let paths = parse_all(keys.iter())?;
            let mut lines = Vec::with_capacity(paths.len());
            for (raw, path) in keys.iter().zip(&paths) {
                lines.push(get_leaf(settings, raw, path)?);
            }
            lines.join("\n")
        }
        Command::Set { pairs } => {
            let paths = parse_all(pairs.iter().map(|(k, _)| k))?;
            for (path, (_, value)) in paths.iter().zip(pairs) {
                let (node, leaf) = path.resolve(settings);
                node.set_string(leaf, value);
            }
            String::new()
        }
        Command::Delete { keys } => {
            for path in parse_all(keys.iter())? {
                let (node, leaf) = path.resolve(settings);
                node.delete(leaf);
            }
            String::new()
        }
        Command::DeleteTree { keys } => {
            for path in parse_all(keys.iter())? {
                let (node, leaf) = path.resolve(settings);
                node.delete_tree(leaf);
            }
            String::new()
        }
        Command::Incr { keys } => adjust_all(settings, keys, 1)?,
        Command::Decr { keys } => adjust_all(settings, keys, -1)?,
        Command::List { path } => list(settings, path.as_deref())?,
    };

    if cmd.is_mutating() {
        debug!(identity = settings.identity(), "command mutated store");
        settings.persist()?;
    }
    Ok(output)
}


fn parse_all<'a, I>(raw: I) -> Result<Vec<KeyPath>>
where
    I: Iterator<Item = &'a String>,
{
    raw.map(|s| KeyPath::parse(s).map_err(SettingsError::from))
        .collect()
}

/// Read a leaf without creating any branch on the way. Misses report the
/// path as the caller wrote it.
fn get_leaf(settings: &Settings, raw: &str, path: &KeyPath) -> Result<String> {
    let undefined = || SettingsError::UndefinedKey(raw.to_string());
    let (node, leaf) = path.lookup(settings).ok_or_else(undefined)?;
    node.get_string(leaf).map_err(|e| match e {
        SettingsError::UndefinedKey(_) => undefined(),
        other => other,
    })
}

fn adjust_all(settings: &Settings, keys: &[String], delta: i64) -> Result<String> {
    let mut lines = Vec::with_capacity(keys.len());
    for path in parse_all(keys.iter())? {
        let (node, leaf) = path.resolve(settings);
        let value = if delta >= 0 {
            node.incr_int64(leaf)
        } else {
            node.decr_int64(leaf)
        };
        lines.push(value.to_string());
    }
    Ok(lines.join("\n"))
}

/// `name = value` for each leaf, then `name.` for each branch, both sorted.
fn list(settings: &Settings, path: Option<&str>) -> Result<String> {
    let node = match path {
        None => settings.handle(),
        Some(raw) => match KeyPath::parse(raw)?.lookup_tree(settings) {
            Some(node) => node,
            None => return Ok(String::new()),
        },
    };

    let mut leaves: Vec<(String, String)> = node.get_leaves().into_iter().collect();
    leaves.sort();
    let mut branches: Vec<String> = node.get_trees().into_keys().collect();
    branches.sort();

    let mut out = String::new();
    for (name, value) in leaves {
        if !out.is_empty() {
            out.push('\n');
        }
        let _ = write_segment(&mut out, &name);
        let _ = write!(out, " = {}", value);
    }
    for name in branches {
        if !out.is_empty() {
            out.push('\n');
        }
        let _ = write_segment(&mut out, &name);
        out.push('.');
    }
    Ok(out)
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
