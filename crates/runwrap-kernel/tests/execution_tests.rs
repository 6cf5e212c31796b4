//! Tests for execution modes against real external commands.
//!
//! These exercise the full path from an `ExecutionContext` down to a
//! spawned `/bin/sh`, plus the modes that deliberately avoid spawning
//! anything (dry-run, command-only) and the queue-submission seam.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use runwrap_kernel::{
    Command, ExecRequest, ExecutionContext, JobId, LogConfig, OutputSink, RunError, RunOptions,
    SubmitOptions, Submitter, hold, job_output, with_dry_run,
};

fn sh(script: &str) -> Command {
    Command::new(["/bin/sh", "-c", script])
}

fn quiet() -> ExecRequest {
    ExecRequest::quiet()
}

// ============================================================================
// Normal Mode
// ============================================================================

#[tokio::test]
async fn runs_and_captures() {
    let ctx = ExecutionContext::new();
    let outcome = ctx
        .execute(|_| Ok(sh("echo hello")), quiet())
        .await
        .unwrap();
    let result = outcome.ran().unwrap();
    assert_eq!(result.stdout.as_deref(), Some("hello\n"));
    assert_eq!(result.code, 0);
}

#[tokio::test]
async fn nonzero_exit_raises_with_full_context() {
    let ctx = ExecutionContext::new();
    let err = ctx
        .execute(|_| Ok(sh("echo oops >&2; exit 7")), quiet())
        .await
        .unwrap_err();
    match err {
        RunError::Process { code, stderr, .. } => {
            assert_eq!(code, 7);
            assert_eq!(stderr, "oops\n");
        }
        other => panic!("expected process error, got {other:?}"),
    }
}

#[tokio::test]
async fn nonzero_exit_returned_when_not_checking() {
    let ctx = ExecutionContext::new();
    let request = ExecRequest::with_options(RunOptions {
        check: false,
        log: LogConfig::silent(),
        ..RunOptions::default()
    });
    let outcome = ctx.execute(|_| Ok(sh("exit 7")), request).await.unwrap();
    assert_eq!(outcome.ran().unwrap().code, 7);
}

#[tokio::test]
async fn bare_names_resolve_through_path() {
    // `sh` without a slash goes through PATH resolution.
    let ctx = ExecutionContext::new();
    let outcome = ctx
        .execute(|_| Ok(Command::new(["sh", "-c", "echo resolved"])), quiet())
        .await
        .unwrap();
    assert_eq!(outcome.ran().unwrap().stdout.as_deref(), Some("resolved\n"));
}

#[tokio::test]
async fn callback_sink_sees_everything_once() {
    let seen = Arc::new(Mutex::new(Vec::<String>::new()));
    let seen2 = seen.clone();

    let request = ExecRequest::with_options(RunOptions {
        log: LogConfig {
            tee: false,
            stdout: Some(OutputSink::callback(move |text| {
                seen2.lock().unwrap().push(text.to_string());
            })),
            stderr: None,
            cmd: None,
        },
        ..RunOptions::default()
    });

    ExecutionContext::new()
        .execute(|_| Ok(sh("echo one; echo two")), request)
        .await
        .unwrap();

    assert_eq!(seen.lock().unwrap().as_slice(), &["one\ntwo\n".to_string()]);
}

// ============================================================================
// Dry-Run Mode
// ============================================================================

#[tokio::test]
async fn dry_run_records_n_commands_and_spawns_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("ran");
    let script = format!("touch {}", marker.display());

    let ctx = ExecutionContext::dry_run();
    for _ in 0..5 {
        let script = script.clone();
        let outcome = ctx.execute(|_| Ok(sh(&script)), quiet()).await.unwrap();
        assert_eq!(outcome.ran().unwrap().code, 0);
    }

    assert_eq!(ctx.recorded().len(), 5);
    assert!(!marker.exists(), "dry run must not spawn processes");
}

#[tokio::test]
async fn dry_run_synthetic_stdout_is_the_command_line() {
    let ctx = ExecutionContext::dry_run();
    let outcome = ctx
        .execute(|_| Ok(Command::new(["tool", "-x", "1"])), quiet())
        .await
        .unwrap();
    assert_eq!(outcome.ran().unwrap().stdout.as_deref(), Some("tool -x 1"));
}

#[tokio::test]
async fn scoped_dry_run_helper_collects_the_log() {
    let ((), log) = with_dry_run(|ctx| async move {
        ctx.execute(|_| Ok(sh("echo a")), quiet()).await.unwrap();
        ctx.execute(|_| Ok(sh("echo b")), quiet()).await.unwrap();
    })
    .await;
    assert_eq!(log.len(), 2);
}

// ============================================================================
// Command-Only Mode
// ============================================================================

#[tokio::test]
async fn command_only_returns_tokens_without_running() {
    let ctx = ExecutionContext::command_only();
    let outcome = ctx
        .execute(|_| Ok(Command::new(["tool", "in.txt", "out.txt"])), quiet())
        .await
        .unwrap();
    assert_eq!(
        outcome.command().unwrap().tokens(),
        &["tool", "in.txt", "out.txt"]
    );
}

#[tokio::test]
async fn command_only_suppresses_input_preconditions() {
    // Inspecting a command must not require its inputs to exist.
    let ctx = ExecutionContext::command_only();
    let outcome = ctx
        .execute(
            |ctx| {
                ctx.require_file(Path::new("/no/such/input.nii"))?;
                Ok(Command::new(["tool", "/no/such/input.nii"]))
            },
            quiet(),
        )
        .await
        .unwrap();
    assert!(outcome.command().is_some());
}

// ============================================================================
// Submission
// ============================================================================

/// Submitter that actually runs each submitted command in the background,
/// the way a queue eventually would.
struct LocalQueue {
    count: Mutex<u64>,
}

impl LocalQueue {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            count: Mutex::new(0),
        })
    }
}

#[async_trait]
impl Submitter for LocalQueue {
    async fn submit(&self, command: &Command, _options: &SubmitOptions) -> Result<JobId, RunError> {
        let mut count = self.count.lock().unwrap();
        *count += 1;
        let id = JobId::from(count.to_string());

        let tokens: Vec<String> = command.tokens().to_vec();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            let _ = tokio::process::Command::new(&tokens[0])
                .args(&tokens[1..])
                .status()
                .await;
        });
        Ok(id)
    }
}

#[tokio::test]
async fn submission_returns_immediately_with_a_job_id() {
    let ctx = ExecutionContext::new().with_submitter(LocalQueue::new());
    let outcome = ctx
        .execute(
            |_| Ok(sh("sleep 0.1")),
            ExecRequest::submit(SubmitOptions::new().job_name("snooze")),
        )
        .await
        .unwrap();
    assert_eq!(outcome.submitted().unwrap(), &JobId::from("1"));
}

#[tokio::test]
async fn hold_waits_for_the_sentinel() {
    let dir = tempfile::tempdir().unwrap();
    let sentinel = dir.path().join("done");

    let ctx = ExecutionContext::new().with_submitter(LocalQueue::new());
    let id = ctx
        .execute(|_| Ok(sh("true")), ExecRequest::submit(SubmitOptions::new()))
        .await
        .unwrap()
        .submitted()
        .unwrap()
        .clone();

    hold(&ctx, &[id], &sentinel, Duration::from_millis(10))
        .await
        .unwrap();
    // hold consumed the sentinel after the touch job created it
    assert!(!sentinel.exists());
}

#[tokio::test]
async fn hold_in_dry_run_records_and_returns() {
    let ctx = ExecutionContext::dry_run();
    let sentinel = Path::new("/no/such/sentinel");
    hold(
        &ctx,
        &[JobId::from("1")],
        sentinel,
        Duration::from_millis(10),
    )
    .await
    .unwrap();
    assert_eq!(ctx.recorded().len(), 1);
}

#[tokio::test]
async fn hold_with_no_jobs_is_an_error() {
    let ctx = ExecutionContext::dry_run();
    let err = hold(&ctx, &[], Path::new("/tmp/x"), Duration::from_millis(10))
        .await
        .unwrap_err();
    assert!(matches!(err, RunError::Config(_)));
}

#[tokio::test]
async fn job_output_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("snooze.o42"), "job stdout\n").unwrap();

    let (stdout, stderr) = job_output(&JobId::from("42"), dir.path()).unwrap();
    assert_eq!(stdout.as_deref(), Some("job stdout\n"));
    assert!(stderr.is_none());
}
