//! MarshalContext — the scratch directory shared by a marshalling chain.
//!
//! The outermost marshalled call constructs the context and owns the
//! scratch directory; nested calls in the same chain receive a handle and
//! borrow it. `TempDir` deletes the directory when the last handle drops,
//! so staged inputs and generated outputs never outlive the top-level
//! call, on any exit path.
//!
//! Load and prefix targets are recorded here rather than on the wrapped
//! function: sibling marshallers in one chain look the targets up by name
//! and agree on paths without sharing any mutable global state.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::TempDir;

use crate::error::RunResult;

#[derive(Debug, Default)]
struct Targets {
    loads: Vec<(String, PathBuf)>,
    prefix: Option<(String, PathBuf)>,
}

/// Scratch directory and target registry for one marshalling chain.
pub struct MarshalContext {
    scratch: TempDir,
    targets: Mutex<Targets>,
}

impl std::fmt::Debug for MarshalContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarshalContext")
            .field("scratch", &self.scratch.path())
            .finish()
    }
}

impl MarshalContext {
    /// Create a fresh context owning a new scratch directory.
    pub fn new() -> RunResult<Self> {
        Ok(Self {
            scratch: TempDir::new()?,
            targets: Mutex::new(Targets::default()),
        })
    }

    /// The scratch directory path.
    pub fn path(&self) -> &Path {
        self.scratch.path()
    }

    /// Allocate (or look up) the deterministic path for a named load
    /// target. A nested marshaller asking for the same name gets the same
    /// path, so every codec in the chain loads the same file.
    pub(crate) fn register_load(&self, name: &str, extension: &str) -> PathBuf {
        let mut targets = self.targets.lock().expect("marshal targets poisoned");
        if let Some((_, path)) = targets.loads.iter().find(|(n, _)| n == name) {
            return path.clone();
        }
        let path = self.path().join(format!("{name}.{extension}"));
        targets.loads.push((name.to_string(), path.clone()));
        path
    }

    /// Allocate (or look up) the base path substituted for the output
    /// prefix argument. Only the first registration allocates; the chain
    /// shares one prefix.
    pub(crate) fn register_prefix(&self, name: &str) -> PathBuf {
        let mut targets = self.targets.lock().expect("marshal targets poisoned");
        if let Some((_, path)) = &targets.prefix {
            return path.clone();
        }
        let path = self.path().join(name);
        targets.prefix = Some((name.to_string(), path.clone()));
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scratch_is_deleted_on_drop() {
        let ctx = MarshalContext::new().unwrap();
        let path = ctx.path().to_path_buf();
        std::fs::write(path.join("staged.txt"), "x").unwrap();
        assert!(path.exists());
        drop(ctx);
        assert!(!path.exists());
    }

    #[test]
    fn load_targets_are_deterministic_and_shared() {
        let ctx = MarshalContext::new().unwrap();
        let first = ctx.register_load("out", "txt");
        let again = ctx.register_load("out", "json");
        assert_eq!(first, again); // same name, same path, whoever asks
        assert_eq!(first, ctx.path().join("out.txt"));

        let other = ctx.register_load("other", "txt");
        assert_ne!(first, other);
    }

    #[test]
    fn one_prefix_per_chain() {
        let ctx = MarshalContext::new().unwrap();
        let base = ctx.register_prefix("outbase");
        assert_eq!(base, ctx.path().join("outbase"));
        assert_eq!(ctx.register_prefix("ignored"), base);
    }
}
