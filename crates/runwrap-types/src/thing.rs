//! Thing — an in-memory value with a file-backed representation.
//!
//! External tools only speak files. A `Thing` is any value that can cross
//! that boundary: either it already lives on disk (`Path`, "file-backed")
//! or it exists only in memory ("detached") and must be materialized into a
//! scratch directory before a call. Codecs in the kernel decide how each
//! variant is written out and loaded back.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A domain value that may be passed to, or loaded from, an external tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Thing {
    /// File-backed: the value already has a path on disk. Passed through to
    /// the tool unchanged, never copied into the scratch directory.
    Path(PathBuf),
    /// Detached plain text.
    Text(String),
    /// Detached structured value.
    Json(serde_json::Value),
    /// Detached raw bytes.
    Bytes(Vec<u8>),
}

impl Thing {
    /// The backing path, if this value is already file-backed.
    pub fn backing_path(&self) -> Option<&Path> {
        match self {
            Thing::Path(p) => Some(p),
            _ => None,
        }
    }

    /// True if this value exists only in memory and needs staging.
    pub fn is_detached(&self) -> bool {
        self.backing_path().is_none()
    }

    /// The text content, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Thing::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The JSON content, if this is a structured value.
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Thing::Json(v) => Some(v),
            _ => None,
        }
    }
}

impl From<String> for Thing {
    fn from(s: String) -> Self {
        Thing::Text(s)
    }
}

impl From<&str> for Thing {
    fn from(s: &str) -> Self {
        Thing::Text(s.to_string())
    }
}

impl From<PathBuf> for Thing {
    fn from(p: PathBuf) -> Self {
        Thing::Path(p)
    }
}

impl From<serde_json::Value> for Thing {
    fn from(v: serde_json::Value) -> Self {
        Thing::Json(v)
    }
}
