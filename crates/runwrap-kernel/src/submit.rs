//! The cluster-submission boundary.
//!
//! Queue internals are somebody else's problem: the kernel only knows how
//! to hand a command to a [`Submitter`] and get back a [`JobId`] without
//! waiting for the tool to finish. Helpers for reading a finished job's
//! output files and for blocking until held jobs complete live here too.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use runwrap_types::{Command, JobId};

use crate::context::{ExecRequest, ExecutionContext};
use crate::error::{RunError, RunResult};

/// Options forwarded to the queue when submitting a job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmitOptions {
    /// Job name, used to derive output file names.
    pub job_name: Option<String>,
    /// Queue to submit to.
    pub queue: Option<String>,
    /// Memory request, in the queue's own units.
    pub ram: Option<String>,
    /// Directory the queue writes `<name>.o<id>` / `<name>.e<id>` files to.
    pub logdir: Option<PathBuf>,
    /// Jobs that must finish before this one starts.
    pub job_hold: Vec<JobId>,
}

impl SubmitOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn job_name(mut self, name: impl Into<String>) -> Self {
        self.job_name = Some(name.into());
        self
    }

    pub fn queue(mut self, queue: impl Into<String>) -> Self {
        self.queue = Some(queue.into());
        self
    }

    pub fn hold_on<I, J>(mut self, jobs: I) -> Self
    where
        I: IntoIterator<Item = J>,
        J: Into<JobId>,
    {
        self.job_hold.extend(jobs.into_iter().map(Into::into));
        self
    }
}

/// Hands a command to a job queue and returns immediately.
///
/// Implementations wrap whatever submission tool the site uses; the kernel
/// never waits on a submitted job and never inspects the identifier.
#[async_trait]
pub trait Submitter: Send + Sync {
    async fn submit(&self, command: &Command, options: &SubmitOptions) -> RunResult<JobId>;
}

/// Read the output files a finished job left behind.
///
/// Queues conventionally write `<name>.o<id>` and `<name>.e<id>` into the
/// log directory. Returns `(stdout, stderr)`, each `None` when the
/// corresponding file does not exist (the job may still be running).
pub fn job_output(id: &JobId, dir: &Path) -> RunResult<(Option<String>, Option<String>)> {
    let stdout = find_job_file(dir, &format!(".o{}", id))?;
    let stderr = find_job_file(dir, &format!(".e{}", id))?;
    Ok((stdout, stderr))
}

fn find_job_file(dir: &Path, suffix: &str) -> RunResult<Option<String>> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.ends_with(suffix) {
            return Ok(Some(std::fs::read_to_string(entry.path())?));
        }
    }
    Ok(None)
}

/// Default poll interval for [`hold`].
pub const HOLD_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Block until all of `jobs` have completed.
///
/// Submits a trivial `touch <sentinel>` job held on `jobs`, then sleeps and
/// polls until the sentinel file appears — there is no push notification
/// from the queue. The sentinel is removed before returning. In dry-run
/// mode the submission is recorded and the call returns immediately.
pub async fn hold(
    ctx: &ExecutionContext,
    jobs: &[JobId],
    sentinel: &Path,
    interval: Duration,
) -> RunResult<()> {
    if jobs.is_empty() {
        return Err(RunError::Config("hold called with no jobs".into()));
    }

    let command = Command::new(["touch".to_string(), sentinel.display().to_string()]);
    let options = SubmitOptions::new().hold_on(jobs.iter().cloned());

    ctx.execute(|_| Ok(command.clone()), ExecRequest::submit(options))
        .await?;

    if ctx.is_dry_run() {
        return Ok(());
    }

    while !sentinel.exists() {
        tokio::time::sleep(interval).await;
    }
    std::fs::remove_file(sentinel)?;
    Ok(())
}
