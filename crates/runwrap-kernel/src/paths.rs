//! Executable resolution across tool prefixes and `PATH`.
//!
//! Installations are located through environment variables, checked in
//! precedence order:
//!
//! 1. `RUNWRAP_PREFIX` — explicit override, tools live directly under it
//! 2. `RUNWRAP_DEVDIR` — development tree, tools under `<dir>/bin/`
//! 3. `RUNWRAP_DIR` — installed tree, tools under `<dir>/bin/`
//! 4. `PATH`
//!
//! Names containing a `/` bypass the search and are treated as paths
//! (relative ones resolved against the current directory).

use std::path::{Path, PathBuf};

use crate::error::{RunError, RunResult};

/// Override prefix: `<dir>/<tool>`.
pub const PREFIX_VAR: &str = "RUNWRAP_PREFIX";
/// Development installation: `<dir>/bin/<tool>`.
pub const DEVDIR_VAR: &str = "RUNWRAP_DEVDIR";
/// Base installation: `<dir>/bin/<tool>`.
pub const DIR_VAR: &str = "RUNWRAP_DIR";
/// Default output kind used when materializing detached values.
pub const OUTPUT_TYPE_VAR: &str = "RUNWRAP_OUTPUT_TYPE";

/// Search locations for external tools, usually read from the environment.
#[derive(Debug, Clone, Default)]
pub struct ToolPrefixes {
    /// Checked first; tools live directly under this directory.
    pub prefix: Option<PathBuf>,
    /// Checked second; tools live under `<devdir>/bin/`.
    pub devdir: Option<PathBuf>,
    /// Checked third; tools live under `<dir>/bin/`.
    pub dir: Option<PathBuf>,
}

impl ToolPrefixes {
    pub fn from_env() -> Self {
        Self {
            prefix: std::env::var_os(PREFIX_VAR).map(PathBuf::from),
            devdir: std::env::var_os(DEVDIR_VAR).map(PathBuf::from),
            dir: std::env::var_os(DIR_VAR).map(PathBuf::from),
        }
    }

    fn candidates<'a>(&'a self, name: &'a str) -> impl Iterator<Item = PathBuf> + 'a {
        let direct = self.prefix.as_ref().map(|p| p.join(name));
        let dev = self.devdir.as_ref().map(|p| p.join("bin").join(name));
        let base = self.dir.as_ref().map(|p| p.join("bin").join(name));
        direct.into_iter().chain(dev).chain(base)
    }
}

/// Resolve a tool name to an executable path using the environment's
/// prefixes and `PATH`.
pub fn resolve_tool(name: &str) -> RunResult<PathBuf> {
    let path_var = std::env::var("PATH").unwrap_or_default();
    resolve_tool_with(name, &ToolPrefixes::from_env(), &path_var)
}

/// Resolve a tool name against explicit prefixes and a `PATH` string.
///
/// Fails with [`RunError::ToolNotFound`] before any process is spawned.
pub fn resolve_tool_with(name: &str, prefixes: &ToolPrefixes, path_var: &str) -> RunResult<PathBuf> {
    // Slash means "this is a path, not a name to search for".
    if name.contains('/') {
        let candidate = if Path::new(name).is_absolute() {
            PathBuf::from(name)
        } else {
            std::env::current_dir()?.join(name)
        };
        if candidate.is_file() {
            return Ok(candidate);
        }
        return Err(RunError::ToolNotFound(name.to_string()));
    }

    for candidate in prefixes.candidates(name) {
        if is_executable(&candidate) {
            return Ok(candidate);
        }
    }

    resolve_in_path(name, path_var).ok_or_else(|| RunError::ToolNotFound(name.to_string()))
}

/// Walk a colon-separated `PATH` string looking for an executable file.
pub fn resolve_in_path(name: &str, path_var: &str) -> Option<PathBuf> {
    for dir in path_var.split(':') {
        if dir.is_empty() {
            continue;
        }
        let candidate = Path::new(dir).join(name);
        if is_executable(&candidate) {
            return Some(candidate);
        }
    }
    None
}

fn is_executable(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        match path.metadata() {
            Ok(metadata) => metadata.permissions().mode() & 0o111 != 0,
            Err(_) => false,
        }
    }

    #[cfg(not(unix))]
    {
        true
    }
}

/// Default file extension for materialized values, selected by
/// `RUNWRAP_OUTPUT_TYPE` (`text` or `json`; anything else falls back to
/// `text`). Domain code uses this to name staged files; the kernel treats
/// the variable as opaque configuration.
pub fn default_extension() -> &'static str {
    match std::env::var(OUTPUT_TYPE_VAR).as_deref() {
        Ok("json") | Ok("JSON") => "json",
        _ => "txt",
    }
}
