//! runwrap-kernel: the core of runwrap.
//!
//! This crate provides:
//!
//! - **argfmt**: Named options → ordered command tokens, per style convention
//! - **stream**: Forwarder tasks copying a child stream to N sinks
//! - **runner**: Process spawning with capture, tee, and caller sinks
//! - **context**: Per-call execution modes — run, dry-run, submit, inspect
//! - **submit**: The cluster-submission boundary and job helpers
//! - **paths**: Executable resolution across tool prefixes and `PATH`
//! - **builder**: Fluent per-tool command builder
//! - **marshal**: Thing staging and output loading around wrapped calls

pub mod argfmt;
pub mod builder;
pub mod context;
pub mod error;
pub mod marshal;
pub mod paths;
pub mod runner;
pub mod stream;
pub mod submit;

pub use argfmt::{ArgSpec, ArgStyle, ArgValue, Args, SeqSep, ValueOverride, format_args, prepare_args};
pub use builder::ToolBuilder;
pub use context::{ExecMode, ExecRequest, ExecutionContext, with_dry_run};
pub use error::{RunError, RunResult};
pub use marshal::{CallArgs, CallOutput, CallValue, JsonCodec, MarshalContext, Marshaller, Results, TextCodec, ThingCodec};
pub use paths::{ToolPrefixes, default_extension, resolve_tool, resolve_tool_with};
pub use runner::{LogConfig, OutputSink, RunOptions, run};
pub use stream::forward;
pub use submit::{Submitter, SubmitOptions, hold, job_output};

// Re-export the leaf types so most callers need only this crate.
pub use runwrap_types::{Command, ExecutionResult, JobId, JobStatus, Outcome, Thing};
