//! Dotted key paths.
//!
//! Parses paths like `server."display name".port` into a [`KeyPath`]: an
//! ordered, non-empty list of decoded segments. All segments but the last
//! name branches; the last names a leaf (or, for tree deletion, a branch).
//!
//! Grammar: `STRING (SEPARATOR STRING)*`. A segment is a bare identifier
//! (letters, ASCII digits, `_`; not starting with `_`) or a double-quoted
//! literal in which `\"` stands for a literal quote.

use std::fmt;
use std::str::FromStr;

use super::lexer::{Scanner, TokenKind};
use super::tree::{DataTree, Tree};


/// Why a path string was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("empty path")]
    Empty,

    #[error("invalid path at '{found}' (offset {position})")]
    Unexpected { position: usize, found: String },

    #[error("unterminated quoted segment at offset {position}")]
    Unterminated { position: usize },

    #[error("path ends with a separator (offset {position})")]
    TrailingSeparator { position: usize },
}

impl PathError {
    /// Byte offset in the input where parsing failed, if any.
    pub fn position(&self) -> Option<usize> {
        match self {
            PathError::Empty => None,
            PathError::Unexpected { position, .. }
            | PathError::Unterminated { position }
            | PathError::TrailingSeparator { position } => Some(*position),
        }
    }
}


/// A parsed dotted path. Always holds at least one segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPath {
    segments: Vec<String>,
}

/// Parse a dotted path into its decoded segments.
pub fn parse_path(input: &str) -> Result<Vec<String>, PathError> {
    KeyPath::parse(input).map(KeyPath::into_segments)
}

impl KeyPath {
    /// Parse `input`, rejecting anything outside the path grammar.
    pub fn parse(input: &str) -> Result<Self, PathError> {
        let mut segments = Vec::new();
        let mut expect_segment = true;
        let mut last_separator = 0;

        for token in Scanner::new(input) {
            match (token.kind, expect_segment) {
                (TokenKind::Str(value), true) => {
                    segments.push(value);
                    expect_segment = false;
                }
                (TokenKind::Separator, false) => {
                    last_separator = token.position;
                    expect_segment = true;
                }
                (TokenKind::Eof, _) => break,
                (TokenKind::Unterminated, _) => {
                    return Err(PathError::Unterminated {
                        position: token.position,
                    });
                }
                (TokenKind::Illegal(ch), _) => {
                    return Err(PathError::Unexpected {
                        position: token.position,
                        found: ch.to_string(),
                    });
                }
                (TokenKind::Str(_), false) | (TokenKind::Separator, true) => {
                    return Err(PathError::Unexpected {
                        position: token.position,
                        found: snippet(input, token.position),
                    });
                }
            }
        }

        if segments.is_empty() {
            return Err(PathError::Empty);
        }
        if expect_segment {
            return Err(PathError::TrailingSeparator {
                position: last_separator,
            });
        }
        Ok(KeyPath { segments })
    }

    /// Build a path from already-decoded segments. `None` if empty.
    pub fn from_segments<I, S>(segments: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            None
        } else {
            Some(KeyPath { segments })
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn into_segments(self) -> Vec<String> {
        self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always false: a path has at least one segment.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The branch segments leading to the last one.
    pub fn parent(&self) -> &[String] {
        &self.segments[..self.segments.len() - 1]
    }

    /// The last segment.
    pub fn leaf(&self) -> &str {
        &self.segments[self.segments.len() - 1]
    }

    /// Walk from `root` to the branch holding the last segment, creating
    /// intermediate branches as needed. Returns that branch and the last
    /// segment.
    ///
    /// Each step locks one node at a time; the walk as a whole is not
    /// atomic with respect to concurrent deletes along the path.
    pub fn resolve<T: DataTree + ?Sized>(&self, root: &T) -> (Tree, &str) {
        let mut parent = self.parent().iter();
        let mut node = match parent.next() {
            Some(first) => root.get_tree(first),
            None => root.handle(),
        };
        for segment in parent {
            node = node.get_tree(segment);
        }
        (node, self.leaf())
    }

    /// Like [`resolve`](Self::resolve) but never creates branches: `None`
    /// as soon as an intermediate branch is missing.
    pub fn lookup<T: DataTree + ?Sized>(&self, root: &T) -> Option<(Tree, &str)> {
        let mut node = root.handle();
        for segment in self.parent() {
            node = node.find_tree(segment)?;
        }
        Some((node, self.leaf()))
    }

    /// Walk every segment as a branch without creating any. Used to look
    /// up a whole branch by path.
    pub fn lookup_tree<T: DataTree + ?Sized>(&self, root: &T) -> Option<Tree> {
        let (parent, leaf) = self.lookup(root)?;
        parent.find_tree(leaf)
    }
}

impl FromStr for KeyPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KeyPath::parse(s)
    }
}

impl fmt::Display for KeyPath {
    /// Bare identifiers print as-is; anything else is quoted.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write_segment(f, segment)?;
        }
        Ok(())
    }
}


/// Write one segment, quoting it unless it lexes as a bare identifier.
pub(crate) fn write_segment(f: &mut impl fmt::Write, segment: &str) -> fmt::Result {
    if is_bare(segment) {
        f.write_str(segment)
    } else {
        write!(f, "\"{}\"", segment.replace('"', "\\\""))
    }
}

fn is_bare(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first.is_ascii_digit() => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphabetic() || c.is_ascii_digit() || c == '_')
}

/// A short excerpt of the input starting at `position`, for error messages.
fn snippet(input: &str, position: usize) -> String {
    input[position..].chars().take(16).collect()
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
