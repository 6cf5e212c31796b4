//! Tests for value marshalling around real external commands.
//!
//! A target function builds a `/bin/sh` command from the resolved argument
//! list; the marshaller stages detached inputs into the scratch directory
//! beforehand and loads requested outputs back afterwards.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde_json::json;

use runwrap_kernel::{
    CallArgs, CallOutput, Command, ExecRequest, ExecutionContext, JsonCodec, Marshaller, RunError,
    TextCodec, Thing,
};

fn sh(script: &str) -> Command {
    Command::new(["/bin/sh", "-c", script])
}

fn text_marshaller() -> Marshaller {
    Marshaller::new().with_codec(Arc::new(TextCodec))
}

/// Look an argument up by name in the resolved list.
fn arg<'a>(resolved: &'a [(String, String)], name: &str) -> &'a str {
    &resolved
        .iter()
        .find(|(n, _)| n == name)
        .unwrap_or_else(|| panic!("no argument `{name}`"))
        .1
}

// ============================================================================
// Round Trips Through Real Commands
// ============================================================================

#[tokio::test]
async fn detached_input_flows_through_a_real_tool() {
    let exec = ExecutionContext::new();
    let args = CallArgs::new()
        .input("src", Thing::from("upper me"))
        .load("dst");

    let results = text_marshaller()
        .run(&exec, None, args, ExecRequest::quiet(), |_, resolved| {
            let script = format!(
                "tr a-z A-Z < {} > {}",
                arg(resolved, "src"),
                arg(resolved, "dst")
            );
            Ok(sh(&script))
        })
        .await
        .unwrap();

    assert_eq!(results.get("dst"), Some(&Thing::from("UPPER ME")));
    assert_eq!(results.raw().ran().unwrap().code, 0);
}

#[tokio::test]
async fn staged_input_round_trips_unchanged() {
    let exec = ExecutionContext::new();
    let args = CallArgs::new()
        .input("src", Thing::from("same bytes\n"))
        .load("dst");

    let results = text_marshaller()
        .run(&exec, None, args, ExecRequest::quiet(), |_, resolved| {
            Ok(Command::new([
                "/bin/cp",
                arg(resolved, "src"),
                arg(resolved, "dst"),
            ]))
        })
        .await
        .unwrap();

    assert_eq!(results.get("dst"), Some(&Thing::from("same bytes\n")));
}

#[tokio::test]
async fn missing_optional_output_is_none_not_an_error() {
    let exec = ExecutionContext::new();
    let args = CallArgs::new().load("wanted").load("optional");

    let results = text_marshaller()
        .run(&exec, None, args, ExecRequest::quiet(), |_, resolved| {
            let script = format!("echo made > {}", arg(resolved, "wanted"));
            Ok(sh(&script))
        })
        .await
        .unwrap();

    assert_eq!(results.get("wanted"), Some(&Thing::from("made\n")));
    assert_eq!(results.entry("optional"), Some(&None));
}

#[tokio::test]
async fn tool_failure_propagates_before_loading() {
    let exec = ExecutionContext::new();
    let args = CallArgs::new().load("out");

    let err = text_marshaller()
        .run(&exec, None, args, ExecRequest::quiet(), |_, _| {
            Ok(sh("exit 7"))
        })
        .await
        .unwrap_err();
    assert!(matches!(err, RunError::Process { code: 7, .. }));
}

// ============================================================================
// Output-Prefix Families
// ============================================================================

#[tokio::test]
async fn prefix_family_loads_recognized_files_only() {
    let exec = ExecutionContext::new();
    let scratch: Arc<Mutex<Option<PathBuf>>> = Arc::new(Mutex::new(None));
    let scratch2 = scratch.clone();

    let results = text_marshaller()
        .call(
            &exec,
            None,
            CallArgs::new().load_prefix("out"),
            |ctx, resolved| {
                let exec = exec.clone();
                async move {
                    *scratch2.lock().unwrap() = Some(ctx.path().to_path_buf());
                    let base = arg(&resolved, "out").to_string();
                    let script = format!(
                        "echo aye > {base}.a.txt; echo bee > {base}.b.txt; echo log > {base}.log"
                    );
                    let outcome = exec
                        .execute(move |_| Ok(sh(&script)), ExecRequest::quiet())
                        .await?;
                    Ok(CallOutput::Outcome(outcome))
                }
            },
        )
        .await
        .unwrap();

    assert_eq!(results.get("a"), Some(&Thing::from("aye\n")));
    assert_eq!(results.get("b"), Some(&Thing::from("bee\n")));
    // .log is an auxiliary artifact, silently skipped
    assert!(results.entry("log").is_none());

    // no scratch files remain on disk afterwards
    let scratch = scratch.lock().unwrap().take().unwrap();
    assert!(!scratch.exists());
}

// ============================================================================
// Chained Marshallers
// ============================================================================

#[tokio::test]
async fn chained_marshallers_share_one_scratch_directory() {
    let exec = ExecutionContext::new();
    let outer = Marshaller::new().with_codec(Arc::new(JsonCodec));
    let inner_marshaller = text_marshaller();

    let dirs: Arc<Mutex<Vec<PathBuf>>> = Arc::new(Mutex::new(Vec::new()));
    let dirs2 = dirs.clone();

    let results = outer
        .call(
            &exec,
            None,
            CallArgs::new().load("stats"),
            |ctx, outer_resolved| {
                let exec = exec.clone();
                let inner_marshaller = inner_marshaller.clone();
                let dirs = dirs2.clone();
                async move {
                    dirs.lock().unwrap().push(ctx.path().to_path_buf());
                    let nested = inner_marshaller
                        .call(
                            &exec,
                            Some(ctx),
                            CallArgs::new().load("report"),
                            |ctx, inner_resolved| {
                                let exec = exec.clone();
                                let dirs = dirs.clone();
                                async move {
                                    dirs.lock().unwrap().push(ctx.path().to_path_buf());
                                    let script = format!(
                                        "echo '{{\"n\": 3}}' > {}; echo done > {}",
                                        arg(&outer_resolved, "stats"),
                                        arg(&inner_resolved, "report")
                                    );
                                    let outcome = exec
                                        .execute(move |_| Ok(sh(&script)), ExecRequest::quiet())
                                        .await?;
                                    Ok(CallOutput::Outcome(outcome))
                                }
                            },
                        )
                        .await?;
                    Ok(CallOutput::Results(nested))
                }
            },
        )
        .await
        .unwrap();

    // one directory, seen by both links in the chain
    let dirs = dirs.lock().unwrap();
    assert_eq!(dirs.len(), 2);
    assert_eq!(dirs[0], dirs[1]);
    // deleted exactly once, after the outer call returned
    assert!(!dirs[0].exists());

    // each marshaller loaded its own output with its own codec
    assert_eq!(results.get("stats"), Some(&Thing::Json(json!({"n": 3}))));
    assert_eq!(results.get("report"), Some(&Thing::from("done\n")));
}

// ============================================================================
// Mode Incompatibilities
// ============================================================================

#[tokio::test]
async fn command_only_with_marshalling_fails_fast() {
    let exec = ExecutionContext::command_only();

    let err = text_marshaller()
        .run(
            &exec,
            None,
            CallArgs::new().input("src", Thing::from("x")),
            ExecRequest::quiet(),
            |_, _| Ok(Command::new(["true"])),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RunError::Config(_)));
}

#[tokio::test]
async fn command_only_without_marshalling_inspects_the_command() {
    let exec = ExecutionContext::command_only();
    let results = text_marshaller()
        .run(
            &exec,
            None,
            CallArgs::new().pass("input", "/data/in.txt"),
            ExecRequest::quiet(),
            |_, resolved| Ok(Command::new(["tool", arg(resolved, "input")])),
        )
        .await
        .unwrap();
    assert_eq!(
        results.raw().command().unwrap().tokens(),
        &["tool", "/data/in.txt"]
    );
}

// ============================================================================
// Dry-Run Interaction
// ============================================================================

#[tokio::test]
async fn dry_run_marshalled_call_records_the_command() {
    let exec = ExecutionContext::dry_run();
    let args = CallArgs::new()
        .input("src", Thing::from("content"))
        .load("dst");

    let results = text_marshaller()
        .run(&exec, None, args, ExecRequest::quiet(), |_, resolved| {
            Ok(Command::new([
                "/bin/cp",
                arg(resolved, "src"),
                arg(resolved, "dst"),
            ]))
        })
        .await
        .unwrap();

    // nothing ran, so the requested output was never produced
    assert_eq!(results.entry("dst"), Some(&None));
    assert_eq!(exec.recorded().len(), 1);
    assert!(exec.recorded()[0].0.to_string().starts_with("/bin/cp"));
}
