//! Process execution with capture, tee, and caller-supplied sinks.
//!
//! Every run captures stdout and stderr into two private temp files,
//! whether or not the caller wants them back — behavior stays consistent
//! for huge outputs and for callers that only care about the exit code.
//! On top of the capture, streams can be *teed* into the calling process's
//! own stdout/stderr for live progress, and duplicated into caller sinks.
//!
//! ```text
//!                         ┌──▶ capture file ──▶ ExecutionResult.stdout
//!   child stdout ──▶ tee ─┼──▶ our stdout            (live, default on)
//!                         └──▶ caller file sink      (live)
//!   caller callback sink ◀── full text, once, after exit
//! ```

use std::process::Stdio;

use tokio::process::Command as TokioCommand;

use runwrap_types::{Command, ExecutionResult};

use crate::error::{RunError, RunResult};
use crate::stream::{BoxSink, forward};

/// A caller-supplied destination for a child stream.
pub enum OutputSink {
    /// Streamed live, chunk by chunk, as the child produces output.
    File(std::fs::File),
    /// Invoked exactly once after the child has exited, with the full
    /// captured text — a callback never has to handle partial data.
    Callback(Box<dyn FnMut(&str) + Send>),
}

impl OutputSink {
    /// Convenience constructor for callback sinks.
    pub fn callback(f: impl FnMut(&str) + Send + 'static) -> Self {
        OutputSink::Callback(Box::new(f))
    }
}

impl std::fmt::Debug for OutputSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputSink::File(_) => f.write_str("OutputSink::File"),
            OutputSink::Callback(_) => f.write_str("OutputSink::Callback"),
        }
    }
}

/// Where output goes beyond the private capture files.
#[derive(Debug)]
pub struct LogConfig {
    /// Duplicate the child's stdout/stderr onto the calling process's own
    /// stdout/stderr while it runs. On by default: long-running tools stay
    /// visible without giving up capture.
    pub tee: bool,
    /// Extra destination for the child's stdout.
    pub stdout: Option<OutputSink>,
    /// Extra destination for the child's stderr.
    pub stderr: Option<OutputSink>,
    /// Receives the rendered command line (one line) before the child is
    /// spawned.
    pub cmd: Option<OutputSink>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            tee: true,
            stdout: None,
            stderr: None,
            cmd: None,
        }
    }
}

impl LogConfig {
    /// A config that writes nothing anywhere beyond the capture files.
    pub fn silent() -> Self {
        Self {
            tee: false,
            ..Self::default()
        }
    }
}

/// Options for a single [`run`] call.
#[derive(Debug)]
pub struct RunOptions {
    /// Return captured stdout in the result.
    pub capture_stdout: bool,
    /// Return captured stderr in the result.
    pub capture_stderr: bool,
    /// Treat a non-zero exit code as an error (default). When false the
    /// exit code is returned in the result instead.
    pub check: bool,
    /// Extra environment variables for the child.
    pub env: Vec<(String, String)>,
    /// Working directory for the child.
    pub cwd: Option<std::path::PathBuf>,
    /// Tee/sink configuration.
    pub log: LogConfig,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            capture_stdout: true,
            capture_stderr: true,
            check: true,
            env: Vec::new(),
            cwd: None,
            log: LogConfig::default(),
        }
    }
}

/// Run a command to completion and return its captured output.
///
/// Fails with [`RunError::Process`] when the child exits non-zero and
/// `check` is set; the error carries the exit code and both captured
/// streams, because it is raised only after the forwarders have drained
/// everything.
pub async fn run(command: &Command, mut options: RunOptions) -> RunResult<ExecutionResult> {
    let program = command
        .program()
        .ok_or_else(|| RunError::Config("cannot run an empty command".into()))?;

    tracing::debug!(command = %command, "running");
    log_command(command, options.log.cmd.as_mut())?;

    // Private capture files. NamedTempFile deletes on drop, so every exit
    // path below — including decode failures — cleans them up.
    let stdout_capture = tempfile::NamedTempFile::new()?;
    let stderr_capture = tempfile::NamedTempFile::new()?;

    let mut child = {
        let mut cmd = TokioCommand::new(program);
        cmd.args(command.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for (key, value) in &options.env {
            cmd.env(key, value);
        }
        if let Some(cwd) = &options.cwd {
            cmd.current_dir(cwd);
        }
        cmd.spawn().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => RunError::ToolNotFound(program.to_string()),
            _ => RunError::Io(e),
        })?
    };

    // stdout/stderr were set to piped() above, so take() returns Some.
    let child_stdout = child
        .stdout
        .take()
        .ok_or_else(|| RunError::Config("child stdout not piped".into()))?;
    let child_stderr = child
        .stderr
        .take()
        .ok_or_else(|| RunError::Config("child stderr not piped".into()))?;

    let mut stdout_sinks: Vec<BoxSink> =
        vec![Box::new(tokio::fs::File::from_std(stdout_capture.reopen()?))];
    let mut stderr_sinks: Vec<BoxSink> =
        vec![Box::new(tokio::fs::File::from_std(stderr_capture.reopen()?))];

    if options.log.tee {
        stdout_sinks.push(Box::new(tokio::io::stdout()));
        stderr_sinks.push(Box::new(tokio::io::stderr()));
    }

    // File sinks stream live; callback sinks wait for the full text.
    let mut stdout_callback = None;
    match options.log.stdout.take() {
        Some(OutputSink::File(f)) => stdout_sinks.push(Box::new(tokio::fs::File::from_std(f))),
        Some(OutputSink::Callback(cb)) => stdout_callback = Some(cb),
        None => {}
    }
    let mut stderr_callback = None;
    match options.log.stderr.take() {
        Some(OutputSink::File(f)) => stderr_sinks.push(Box::new(tokio::fs::File::from_std(f))),
        Some(OutputSink::Callback(cb)) => stderr_callback = Some(cb),
        None => {}
    }

    let stdout_task = forward(child_stdout, stdout_sinks);
    let stderr_task = forward(child_stderr, stderr_sinks);

    // Join both forwarders before waiting on the child: they drain output
    // that is still buffered after the process has already exited.
    stdout_task
        .await
        .map_err(|e| RunError::Config(format!("stdout forwarder panicked: {e}")))??;
    stderr_task
        .await
        .map_err(|e| RunError::Config(format!("stderr forwarder panicked: {e}")))??;

    let status = child.wait().await?;
    let code = status.code().unwrap_or(-1);

    let stdout = read_capture(stdout_capture.path())?;
    let stderr = read_capture(stderr_capture.path())?;

    if let Some(cb) = stdout_callback.as_mut() {
        cb(&stdout);
    }
    if let Some(cb) = stderr_callback.as_mut() {
        cb(&stderr);
    }

    tracing::debug!(code, "command finished");

    if options.check && code != 0 {
        return Err(RunError::Process {
            code,
            stdout,
            stderr,
        });
    }

    Ok(ExecutionResult {
        stdout: options.capture_stdout.then_some(stdout),
        stderr: options.capture_stderr.then_some(stderr),
        code,
    })
}

fn log_command(command: &Command, sink: Option<&mut OutputSink>) -> RunResult<()> {
    use std::io::Write;

    let line = format!("{}\n", command);
    match sink {
        Some(OutputSink::File(f)) => f.write_all(line.as_bytes())?,
        Some(OutputSink::Callback(cb)) => cb(&line),
        None => {}
    }
    Ok(())
}

fn read_capture(path: &std::path::Path) -> RunResult<String> {
    let bytes = std::fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
