//! ExecutionResult — the structured result of a completed external command.

use serde::{Deserialize, Serialize};

use crate::command::Command;
use crate::job::JobId;

/// The result of running an external command to completion.
///
/// Streams are `None` unless the caller asked for them to be captured;
/// the exit code is always present.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Captured standard output, if requested.
    pub stdout: Option<String>,
    /// Captured standard error, if requested.
    pub stderr: Option<String>,
    /// Exit code. 0 means success.
    pub code: i32,
}

impl ExecutionResult {
    /// A result with both streams captured.
    pub fn from_output(code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            stdout: Some(stdout.into()),
            stderr: Some(stderr.into()),
            code,
        }
    }

    /// A successful result carrying only stdout.
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            stdout: Some(stdout.into()),
            stderr: None,
            code: 0,
        }
    }

    /// True if the command exited with code 0.
    pub fn ok(&self) -> bool {
        self.code == 0
    }
}

/// What came back from an `execute` call.
///
/// Normal execution completes a process and yields an [`ExecutionResult`];
/// submission hands the command to a queue and yields a [`JobId`] without
/// waiting; command-only mode skips execution and yields the rendered
/// [`Command`] for inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Outcome {
    /// The process ran locally and exited.
    Ran(ExecutionResult),
    /// The command was handed to a submitter; the job may still be running.
    Submitted(JobId),
    /// Command-only mode: the command that would have run.
    Command(Command),
}

impl Outcome {
    /// The completed result, if this outcome ran locally.
    pub fn ran(&self) -> Option<&ExecutionResult> {
        match self {
            Outcome::Ran(res) => Some(res),
            _ => None,
        }
    }

    /// The job identifier, if this outcome was submitted.
    pub fn submitted(&self) -> Option<&JobId> {
        match self {
            Outcome::Submitted(id) => Some(id),
            _ => None,
        }
    }

    /// The rendered command, if this outcome was command-only.
    pub fn command(&self) -> Option<&Command> {
        match self {
            Outcome::Command(cmd) => Some(cmd),
            _ => None,
        }
    }
}

impl From<ExecutionResult> for Outcome {
    fn from(res: ExecutionResult) -> Self {
        Outcome::Ran(res)
    }
}
