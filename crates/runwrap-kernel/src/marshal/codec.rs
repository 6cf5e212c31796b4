//! Thing codecs — how detached values cross the file boundary.
//!
//! A codec knows one on-disk representation: whether a path looks like
//! something it can read, how to load it back into a [`Thing`], and how to
//! write a detached value out for staging. The marshaller holds a list of
//! codecs; list order is the output-type preference.

use std::path::{Path, PathBuf};

use runwrap_types::Thing;

use crate::error::{RunError, RunResult};

/// One on-disk representation of a [`Thing`].
pub trait ThingCodec: Send + Sync {
    /// File extension this codec reads and writes, without the dot.
    fn extension(&self) -> &'static str;

    /// Whether a path looks like something this codec can load.
    fn can_handle(&self, path: &Path) -> bool {
        path.extension().and_then(|e| e.to_str()) == Some(self.extension())
    }

    /// Load a file back into memory. Only called for paths this codec
    /// claims via [`can_handle`]; a parse failure is a marshalling error.
    ///
    /// [`can_handle`]: ThingCodec::can_handle
    fn load(&self, path: &Path) -> RunResult<Thing>;

    /// Write a detached value into the scratch directory and return the
    /// staged path. Returns `None` when the value is not this codec's to
    /// stage (another codec in the list may claim it).
    fn materialize(&self, scratch: &Path, name: &str, value: &Thing) -> RunResult<Option<PathBuf>>;
}

/// Plain-text representation (`.txt`). Also stages raw byte values.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextCodec;

impl ThingCodec for TextCodec {
    fn extension(&self) -> &'static str {
        "txt"
    }

    fn load(&self, path: &Path) -> RunResult<Thing> {
        Ok(Thing::Text(std::fs::read_to_string(path)?))
    }

    fn materialize(&self, scratch: &Path, name: &str, value: &Thing) -> RunResult<Option<PathBuf>> {
        let bytes: &[u8] = match value {
            Thing::Text(s) => s.as_bytes(),
            Thing::Bytes(b) => b,
            _ => return Ok(None),
        };
        let path = scratch.join(format!("{}.{}", name, self.extension()));
        std::fs::write(&path, bytes)?;
        Ok(Some(path))
    }
}

/// Structured representation (`.json`).
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl ThingCodec for JsonCodec {
    fn extension(&self) -> &'static str {
        "json"
    }

    fn load(&self, path: &Path) -> RunResult<Thing> {
        let text = std::fs::read_to_string(path)?;
        let value = serde_json::from_str(&text).map_err(|e| {
            RunError::Marshal(format!("cannot parse {} as json: {e}", path.display()))
        })?;
        Ok(Thing::Json(value))
    }

    fn materialize(&self, scratch: &Path, name: &str, value: &Thing) -> RunResult<Option<PathBuf>> {
        let Thing::Json(json) = value else {
            return Ok(None);
        };
        let path = scratch.join(format!("{}.{}", name, self.extension()));
        let text = serde_json::to_string(json)
            .map_err(|e| RunError::Marshal(format!("cannot serialize `{name}`: {e}")))?;
        std::fs::write(&path, text)?;
        Ok(Some(path))
    }
}
