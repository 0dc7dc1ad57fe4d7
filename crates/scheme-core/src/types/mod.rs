//! # Core Type Definitions
//!
//! Shared vocabulary of the scheme model:
//! - Key components (`Key`)
//! - The record identity capability (`Identifiable`)
//! - Error types (`SchemeError`)
//!
//! Key components are opaque strings. No numeric comparison or ordering is
//! implied; equality is exact string equality.

mod identity;

pub use identity::{Identifiable, default_scope, pluralize, snake_case};

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// KEY
// =============================================================================

/// One component of a label: a primary-key value, a scope override, or a
/// fully rendered label key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Key(pub String);

impl Key {
    /// Create a new key from a string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length of the key text in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Key {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&String> for Key {
    fn from(s: &String) -> Self {
        Self(s.clone())
    }
}

impl From<&Key> for Key {
    fn from(k: &Key) -> Self {
        k.clone()
    }
}

macro_rules! key_from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Key {
                fn from(n: $t) -> Self {
                    Self(n.to_string())
                }
            }
        )*
    };
}

key_from_integer!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the scheme model.
///
/// - No silent failures
/// - Identity derivation and parsing return `Result<T, SchemeError>`
/// - The model never panics; all errors are recoverable
#[derive(Debug, Error)]
pub enum SchemeError {
    /// The text does not contain a well-formed `(scope:[keys])` group.
    #[error("Label parse failed: {0}")]
    LabelParse(String),

    /// A data extraction destination or payload decoding target has the wrong type.
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// The type the operation requires.
        expected: String,
        /// The type it was given.
        found: String,
    },

    /// A record yields no primary-key values and cannot be addressed.
    #[error("Invalid record: no primary-key values for scope '{scope}'")]
    InvalidRecord {
        /// The scope the record would have been placed under.
        scope: String,
    },

    /// A payload could not be re-encoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(String),

    /// Configuration could not be read or is malformed.
    #[error("Config error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for SchemeError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

// =============================================================================
// TESTS
// =============================================================================
