//! Execution contexts — how a built command actually gets dispatched.
//!
//! A context carries an execution mode and is passed down explicitly;
//! there is no process-global "dry run" switch. Three modes:
//!
//! * `Normal` — resolve the tool and run (or submit) it.
//! * `DryRun` — record the command in the context's log and return a
//!   synthetic successful result.
//! * `CommandOnly` — return the command itself without touching the
//!   filesystem or spawning anything.

use std::path::Path;
use std::sync::{Arc, Mutex};

use runwrap_types::{Command, ExecutionResult, Outcome};

use crate::error::{RunError, RunResult};
use crate::paths::{ToolPrefixes, resolve_tool_with};
use crate::runner::{LogConfig, RunOptions, run};
use crate::submit::{SubmitOptions, Submitter};

/// How a context dispatches commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecMode {
    Normal,
    DryRun,
    CommandOnly,
}

/// Per-call execution request: runner options plus optional queue
/// submission. Submission and command-only mode are mutually exclusive —
/// there is no command to return once a job has been handed to a queue.
#[derive(Debug, Default)]
pub struct ExecRequest {
    pub options: RunOptions,
    pub submit: Option<SubmitOptions>,
}

impl ExecRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// A request that runs locally with the given options.
    pub fn with_options(options: RunOptions) -> Self {
        Self {
            options,
            submit: None,
        }
    }

    /// A request that submits to a queue instead of running locally.
    pub fn submit(options: SubmitOptions) -> Self {
        Self {
            options: RunOptions::default(),
            submit: Some(options),
        }
    }

    /// A request that runs locally without teeing anything.
    pub fn quiet() -> Self {
        Self::with_options(RunOptions {
            log: LogConfig::silent(),
            ..RunOptions::default()
        })
    }
}

/// Dispatches built commands according to its [`ExecMode`].
///
/// Contexts are cheap to clone; clones share the dry-run log, so a
/// context can be handed to nested helpers and the caller still sees
/// every recorded command.
#[derive(Clone)]
pub struct ExecutionContext {
    mode: ExecMode,
    prefixes: ToolPrefixes,
    submitter: Option<Arc<dyn Submitter>>,
    recorded: Arc<Mutex<Vec<(Command, Option<SubmitOptions>)>>>,
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("mode", &self.mode)
            .field("prefixes", &self.prefixes)
            .field("submitter", &self.submitter.is_some())
            .finish()
    }
}

impl ExecutionContext {
    /// A normal context using the environment's tool prefixes.
    pub fn new() -> Self {
        Self::with_mode(ExecMode::Normal)
    }

    /// A context that records commands instead of running them.
    pub fn dry_run() -> Self {
        Self::with_mode(ExecMode::DryRun)
    }

    /// A context that returns commands instead of running them.
    pub fn command_only() -> Self {
        Self::with_mode(ExecMode::CommandOnly)
    }

    fn with_mode(mode: ExecMode) -> Self {
        Self {
            mode,
            prefixes: ToolPrefixes::from_env(),
            submitter: None,
            recorded: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Attach a queue submitter; required for requests that submit.
    pub fn with_submitter(mut self, submitter: Arc<dyn Submitter>) -> Self {
        self.submitter = Some(submitter);
        self
    }

    /// Override the tool search prefixes (mostly for tests).
    pub fn with_prefixes(mut self, prefixes: ToolPrefixes) -> Self {
        self.prefixes = prefixes;
        self
    }

    pub fn mode(&self) -> ExecMode {
        self.mode
    }

    pub fn is_dry_run(&self) -> bool {
        self.mode == ExecMode::DryRun
    }

    pub fn is_command_only(&self) -> bool {
        self.mode == ExecMode::CommandOnly
    }

    /// Commands recorded by dry-run dispatches, oldest first.
    pub fn recorded(&self) -> Vec<(Command, Option<SubmitOptions>)> {
        self.recorded.lock().expect("dry-run log poisoned").clone()
    }

    /// Assert that an input file exists before a command is built around
    /// it. A no-op in command-only mode, where callers only want the
    /// command line and the inputs may not exist yet.
    pub fn require_file(&self, path: &Path) -> RunResult<()> {
        if self.is_command_only() || path.exists() {
            Ok(())
        } else {
            Err(RunError::Config(format!(
                "required input does not exist: {}",
                path.display()
            )))
        }
    }

    /// Build a command with `build` and dispatch it according to this
    /// context's mode.
    ///
    /// The builder receives the context so it can call [`require_file`]
    /// and friends with the right mode in effect.
    ///
    /// [`require_file`]: ExecutionContext::require_file
    pub async fn execute<F>(&self, build: F, request: ExecRequest) -> RunResult<Outcome>
    where
        F: FnOnce(&ExecutionContext) -> RunResult<Command>,
    {
        if request.submit.is_some() && self.is_command_only() {
            return Err(RunError::Config(
                "cannot combine queue submission with command-only mode".into(),
            ));
        }

        let command = build(self)?;

        match self.mode {
            ExecMode::CommandOnly => Ok(Outcome::Command(command)),
            ExecMode::DryRun => {
                tracing::debug!(command = %command, "dry run, recording");
                self.recorded
                    .lock()
                    .expect("dry-run log poisoned")
                    .push((command.clone(), request.submit.clone()));
                Ok(Outcome::Ran(ExecutionResult {
                    stdout: Some(command.to_string()),
                    stderr: None,
                    code: 0,
                }))
            }
            ExecMode::Normal => {
                if let Some(submit) = &request.submit {
                    let submitter = self.submitter.as_ref().ok_or_else(|| {
                        RunError::Config("submission requested but no submitter configured".into())
                    })?;
                    let id = submitter.submit(&command, submit).await?;
                    tracing::info!(command = %command, job = %id, "submitted");
                    return Ok(Outcome::Submitted(id));
                }

                let program = command
                    .program()
                    .ok_or_else(|| RunError::Config("cannot run an empty command".into()))?;
                let path_var = std::env::var("PATH").unwrap_or_default();
                let resolved = resolve_tool_with(program, &self.prefixes, &path_var)?;
                let command = command.with_program(resolved.display().to_string());

                run(&command, request.options).await.map(Outcome::Ran)
            }
        }
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Run `f` with a fresh dry-run context and return its result alongside
/// everything the context recorded.
pub async fn with_dry_run<F, Fut, T>(f: F) -> (T, Vec<(Command, Option<SubmitOptions>)>)
where
    F: FnOnce(ExecutionContext) -> Fut,
    Fut: std::future::Future<Output = T>,
{
    let ctx = ExecutionContext::dry_run();
    let recorded = ctx.recorded.clone();
    let value = f(ctx).await;
    let log = recorded.lock().expect("dry-run log poisoned").clone();
    (value, log)
}
