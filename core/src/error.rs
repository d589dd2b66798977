use std::num::ParseIntError;

use crate::namespace::PathError;
use crate::storage::StorageError;

// ---------------------------------------------------------------------------
// Settings errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// A leaf lookup missed. Expected; callers are meant to check for it.
    #[error("undefined key: {0}")]
    UndefinedKey(String),

    /// A leaf exists but is not an integer of the requested width.
    #[error("value of '{key}' is not a valid integer: {source}")]
    Format {
        key: String,
        #[source]
        source: ParseIntError,
    },

    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Fetched bytes are not a settings document.
    #[error("malformed settings document: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("failed to encode settings: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("arguments must be an even number of key and value pairs")]
    OddArguments,
}

impl SettingsError {
    pub fn is_undefined_key(&self) -> bool {
        matches!(self, SettingsError::UndefinedKey(_))
    }
}

pub type Result<T> = std::result::Result<T, SettingsError>;
