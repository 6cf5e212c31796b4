//! runwrap CLI entry point.
//!
//! Usage:
//!   runwrap <tool> [args...]         # Run a tool, passing its exit code through
//!   runwrap -c '<command line>'      # Whole command as one quoted string
//!   runwrap --cmdonly <tool> ...     # Print the command that would run
//!   runwrap --dry-run <tool> ...     # Record and print without running

use std::env;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use runwrap_kernel::{
    ExecRequest, ExecutionContext, LogConfig, Outcome, RunOptions, prepare_args,
};

fn main() -> ExitCode {
    // Initialize tracing (respects RUST_LOG env var)
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("runwrap: {e}");
            ExitCode::FAILURE
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Mode {
    Normal,
    DryRun,
    CommandOnly,
}

#[derive(Debug)]
struct CliOptions {
    mode: Mode,
    quiet: bool,
    check: bool,
    env: Vec<(String, String)>,
    tokens: Vec<String>,
}

fn run() -> Result<ExitCode> {
    let args: Vec<String> = env::args().skip(1).collect();

    if args.is_empty() {
        print_help();
        return Ok(ExitCode::FAILURE);
    }

    let mut options = CliOptions {
        mode: Mode::Normal,
        quiet: false,
        check: false,
        env: Vec::new(),
        tokens: Vec::new(),
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--help" | "-h" => {
                print_help();
                return Ok(ExitCode::SUCCESS);
            }
            "--version" | "-V" => {
                println!("runwrap {}", env!("CARGO_PKG_VERSION"));
                return Ok(ExitCode::SUCCESS);
            }
            "-c" => {
                let line = iter.next().context("-c requires a command argument")?;
                options.tokens = prepare_args(&line);
            }
            "--quiet" | "-q" => options.quiet = true,
            "--check" => options.check = true,
            "--dry-run" => options.mode = Mode::DryRun,
            "--cmdonly" => options.mode = Mode::CommandOnly,
            "--env" | "-e" => {
                let pair = iter.next().context("--env requires a KEY=VALUE argument")?;
                let (key, value) = pair
                    .split_once('=')
                    .with_context(|| format!("--env expects KEY=VALUE, got `{pair}`"))?;
                options.env.push((key.to_string(), value.to_string()));
            }
            "--" => {
                options.tokens.extend(iter);
                break;
            }
            _ if arg.starts_with('-') && options.tokens.is_empty() => {
                bail!("unknown option `{arg}` (run `runwrap --help` for usage)");
            }
            _ => {
                // First bare token starts the command; everything after it
                // belongs to the tool.
                options.tokens.push(arg);
                options.tokens.extend(iter);
                break;
            }
        }
    }

    if options.tokens.is_empty() {
        bail!("no command given (run `runwrap --help` for usage)");
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(execute(options))
}

async fn execute(options: CliOptions) -> Result<ExitCode> {
    let ctx = match options.mode {
        Mode::Normal => ExecutionContext::new(),
        Mode::DryRun => ExecutionContext::dry_run(),
        Mode::CommandOnly => ExecutionContext::command_only(),
    };

    let run_options = RunOptions {
        // The child's streams go straight to ours via tee; nothing needs
        // capturing unless we must report a failure.
        capture_stdout: false,
        capture_stderr: options.check,
        check: options.check,
        env: options.env.clone(),
        cwd: None,
        log: if options.quiet {
            LogConfig::silent()
        } else {
            LogConfig::default()
        },
    };

    let command = runwrap_kernel::Command::new(options.tokens.clone());
    let outcome = ctx
        .execute(move |_| Ok(command), ExecRequest::with_options(run_options))
        .await?;

    match outcome {
        Outcome::Command(cmd) => {
            println!("{cmd}");
            Ok(ExitCode::SUCCESS)
        }
        Outcome::Ran(result) if options.mode == Mode::DryRun => {
            for (cmd, _) in ctx.recorded() {
                println!("{cmd}");
            }
            debug_assert!(result.ok());
            Ok(ExitCode::SUCCESS)
        }
        Outcome::Ran(result) => {
            // Pass the tool's exit code through as our own.
            Ok(ExitCode::from(result.code.clamp(0, 255) as u8))
        }
        Outcome::Submitted(id) => {
            println!("{id}");
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_help() {
    println!(
        r#"runwrap v{} — run external tools with capture, tee, and dry-run

Usage:
  runwrap [OPTIONS] <tool> [args...]
  runwrap [OPTIONS] -c '<command line>'
  runwrap [OPTIONS] -- <tool> [args...]

Options:
  -c <line>        Whole command as one quoted string
  -q, --quiet      Do not tee the tool's output to this terminal
      --check      Treat a non-zero tool exit as an error
      --dry-run    Record and print the command without running it
      --cmdonly    Print the command that would run, without running it
  -e, --env K=V    Extra environment variable for the tool (repeatable)
  -h, --help       Show this help
  -V, --version    Show version

The tool is located via RUNWRAP_PREFIX, RUNWRAP_DEVDIR/bin,
RUNWRAP_DIR/bin, then PATH. By default the tool's exit code becomes
runwrap's own exit code.

Examples:
  runwrap mytool input.dat out.dat     # run, tee output live
  runwrap --dry-run mytool in out      # show what would run
  runwrap -e MODE=fast -- mytool --verbose in out
"#,
        env!("CARGO_PKG_VERSION")
    );
}
