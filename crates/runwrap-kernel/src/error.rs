//! Error taxonomy for the kernel.

use thiserror::Error;

/// Result type for kernel operations.
pub type RunResult<T> = Result<T, RunError>;

/// Kernel errors.
///
/// `Config` and `ToolNotFound` are raised before any process is spawned.
/// `Process` is raised only after the child has exited and both streams have
/// been fully captured, so it always carries complete diagnostic context.
/// `Marshal` is raised after scratch-directory cleanup has been scheduled.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("command exited with code {code}")]
    Process {
        code: i32,
        stdout: String,
        stderr: String,
    },

    #[error("tool not found: {0}")]
    ToolNotFound(String),

    #[error("marshalling failed: {0}")]
    Marshal(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl RunError {
    /// The child exit code, if this is a process failure.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            RunError::Process { code, .. } => Some(*code),
            _ => None,
        }
    }
}
