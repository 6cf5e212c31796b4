//! Thing marshalling — staging values in, loading outputs back out.
//!
//! External tools read and write files; callers hold in-memory values. A
//! [`Marshaller`] bridges the two around a wrapped call: detached input
//! [`Thing`]s are staged into a scratch directory, output arguments marked
//! for loading are rewritten to scratch paths, the wrapped call runs, and
//! whatever the tool produced comes back loaded in a [`Results`].
//!
//! Chained marshallers (one per codec family wrapping the same call) share
//! a single [`MarshalContext`]: the outermost call creates it, nested calls
//! receive a handle and reuse its scratch directory and target paths.

mod codec;
mod context;
mod results;

pub use codec::{JsonCodec, TextCodec, ThingCodec};
pub use context::MarshalContext;
pub use results::Results;

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use runwrap_types::{Command, Outcome, Thing};

use crate::context::{ExecRequest, ExecutionContext};
use crate::error::{RunError, RunResult};
use crate::paths::default_extension;

/// One argument of a marshalled call.
#[derive(Debug, Clone, PartialEq)]
pub enum CallValue {
    /// Passed through to the wrapped call unchanged.
    Pass(String),
    /// An input value; staged to a file if detached, its path passed on.
    Input(Thing),
    /// An output to be written by the tool and loaded back afterwards.
    Load,
}

/// Ordered argument list for a marshalled call.
#[derive(Debug, Clone, Default)]
pub struct CallArgs {
    entries: Vec<(String, CallValue)>,
    prefix: Option<String>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// A plain value the marshaller does not touch.
    pub fn pass(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.push((name.into(), CallValue::Pass(value.into())));
        self
    }

    /// An input value. File-backed Things pass their path through; detached
    /// ones are staged into the scratch directory.
    pub fn input(mut self, name: impl Into<String>, value: impl Into<Thing>) -> Self {
        self.entries.push((name.into(), CallValue::Input(value.into())));
        self
    }

    /// An output argument: rewritten to a scratch path and loaded back
    /// after the call.
    pub fn load(mut self, name: impl Into<String>) -> Self {
        self.entries.push((name.into(), CallValue::Load));
        self
    }

    /// An output-prefix argument: rewritten to a scratch base path; every
    /// recognized file the tool writes under `<base>.*` is loaded back.
    pub fn load_prefix(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.prefix = Some(name.clone());
        self.entries.push((name, CallValue::Load));
        self
    }

    /// True if any argument needs staging or loading.
    pub fn has_marshalling(&self) -> bool {
        self.entries
            .iter()
            .any(|(_, v)| !matches!(v, CallValue::Pass(_)))
    }
}

/// What a marshalled target hands back: either the outcome of a direct
/// execution, or the results of a nested marshalled call in a chain.
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutput {
    Outcome(Outcome),
    Results(Results),
}

impl From<Outcome> for CallOutput {
    fn from(o: Outcome) -> Self {
        CallOutput::Outcome(o)
    }
}

impl From<Results> for CallOutput {
    fn from(r: Results) -> Self {
        CallOutput::Results(r)
    }
}

/// Stages inputs and loads outputs around a wrapped call.
///
/// Codec list order is the output-type preference: load targets are named
/// with the first codec's extension, and loading tries codecs in order.
#[derive(Clone, Default)]
pub struct Marshaller {
    codecs: Vec<Arc<dyn ThingCodec>>,
}

impl std::fmt::Debug for Marshaller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Marshaller")
            .field("codecs", &self.codecs.len())
            .finish()
    }
}

impl Marshaller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a codec; earlier codecs are preferred.
    pub fn with_codec(mut self, codec: Arc<dyn ThingCodec>) -> Self {
        self.codecs.push(codec);
        self
    }

    /// Text and JSON codecs, with `RUNWRAP_OUTPUT_TYPE` picking which one
    /// names the load targets.
    pub fn standard() -> Self {
        let m = Self::new();
        if default_extension() == "json" {
            m.with_codec(Arc::new(JsonCodec)).with_codec(Arc::new(TextCodec))
        } else {
            m.with_codec(Arc::new(TextCodec)).with_codec(Arc::new(JsonCodec))
        }
    }

    fn preferred_extension(&self) -> &'static str {
        self.codecs
            .first()
            .map(|c| c.extension())
            .unwrap_or_else(|| default_extension())
    }

    /// Marshal a call. The target receives the context handle (for nested
    /// marshallers in the chain) and the resolved `(name, value)` argument
    /// list, and returns either an execution outcome or nested results.
    ///
    /// Scratch lifecycle: a fresh directory is created unless `parent` is
    /// given, and deleted when the outermost handle drops — on success,
    /// error, or early return alike.
    pub async fn call<F, Fut>(
        &self,
        exec: &ExecutionContext,
        parent: Option<Arc<MarshalContext>>,
        args: CallArgs,
        target: F,
    ) -> RunResult<Results>
    where
        F: FnOnce(Arc<MarshalContext>, Vec<(String, String)>) -> Fut,
        Fut: Future<Output = RunResult<CallOutput>>,
    {
        let marshalling = args.has_marshalling();
        if marshalling && exec.is_command_only() {
            return Err(RunError::Config(
                "value marshalling is incompatible with command-only mode".into(),
            ));
        }

        let ctx = match parent {
            Some(ctx) => ctx,
            None => Arc::new(MarshalContext::new()?),
        };

        let mut resolved = Vec::with_capacity(args.entries.len());
        let mut load_targets = Vec::new();
        let mut prefix_target = None;

        for (name, value) in args.entries {
            match value {
                CallValue::Pass(s) => resolved.push((name, s)),
                CallValue::Input(thing) => {
                    let path = match thing.backing_path() {
                        Some(p) => p.to_path_buf(),
                        None => self.stage(ctx.path(), &name, &thing)?,
                    };
                    resolved.push((name, path.display().to_string()));
                }
                CallValue::Load => {
                    if args.prefix.as_deref() == Some(name.as_str()) {
                        let base = ctx.register_prefix(&name);
                        resolved.push((name.clone(), base.display().to_string()));
                        prefix_target = Some((name, base));
                    } else {
                        let path = ctx.register_load(&name, self.preferred_extension());
                        resolved.push((name.clone(), path.display().to_string()));
                        load_targets.push((name, path));
                    }
                }
            }
        }

        // Scratch cleanup needs no code on the error path: the context
        // handle drops right here.
        let output = target(ctx.clone(), resolved).await?;

        let mut results = match output {
            CallOutput::Outcome(outcome) => Results::new(outcome),
            CallOutput::Results(inner) => inner,
        };

        if marshalling && matches!(results.raw(), Outcome::Submitted(_)) {
            return Err(RunError::Config(
                "value marshalling is incompatible with queue submission".into(),
            ));
        }

        for (name, path) in load_targets {
            if path.exists() {
                let thing = self.load_required(&path)?;
                results.record(name, Some(thing));
            } else {
                // The tool chose not to produce this output.
                results.record(name, None);
            }
        }

        if let Some((arg_name, base)) = prefix_target {
            self.load_prefix_family(&mut results, &arg_name, &base)?;
        }

        Ok(results)
    }

    /// Convenience for the common case: the target is a pure command
    /// builder and this call dispatches it through `exec`.
    ///
    /// Fails fast, before anything is staged, when queue submission is
    /// requested together with marshalled arguments — there is no process
    /// completion to load outputs from.
    pub async fn run<F>(
        &self,
        exec: &ExecutionContext,
        parent: Option<Arc<MarshalContext>>,
        args: CallArgs,
        request: ExecRequest,
        build: F,
    ) -> RunResult<Results>
    where
        F: FnOnce(&ExecutionContext, &[(String, String)]) -> RunResult<Command>,
    {
        if request.submit.is_some() && args.has_marshalling() {
            return Err(RunError::Config(
                "value marshalling is incompatible with queue submission".into(),
            ));
        }

        self.call(exec, parent, args, |_, resolved| async move {
            let outcome = exec
                .execute(|ctx| build(ctx, &resolved), request)
                .await?;
            Ok(CallOutput::Outcome(outcome))
        })
        .await
    }

    fn stage(&self, scratch: &Path, name: &str, value: &Thing) -> RunResult<std::path::PathBuf> {
        for codec in &self.codecs {
            if let Some(path) = codec.materialize(scratch, name, value)? {
                return Ok(path);
            }
        }
        Err(RunError::Marshal(format!(
            "no codec can stage input `{name}`"
        )))
    }

    /// Load an explicit target path. The file exists; a codec must claim
    /// and parse it.
    fn load_required(&self, path: &Path) -> RunResult<Thing> {
        for codec in &self.codecs {
            if codec.can_handle(path) {
                return codec.load(path);
            }
        }
        Err(RunError::Marshal(format!(
            "no codec recognizes output {}",
            path.display()
        )))
    }

    /// Glob the scratch directory for `<base>.*`, loading every file some
    /// codec recognizes. Unrecognized files are auxiliary artifacts of the
    /// tool, not data outputs, and are skipped.
    fn load_prefix_family(
        &self,
        results: &mut Results,
        arg_name: &str,
        base: &Path,
    ) -> RunResult<()> {
        let stem = base
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .ok_or_else(|| RunError::Marshal("output prefix has no file name".into()))?;
        let dir = base.parent().unwrap_or_else(|| Path::new("."));
        let leader = format!("{stem}.");

        let mut matched = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if let Some(rest) = file_name.strip_prefix(&leader) {
                matched.push((rest.to_string(), entry.path()));
            }
        }
        matched.sort();

        for (rest, path) in matched {
            let Some(codec) = self.codecs.iter().find(|c| c.can_handle(&path)) else {
                tracing::debug!(file = %path.display(), "skipping unrecognized output");
                continue;
            };
            let key = match rest.rsplit_once('.') {
                Some((head, _ext)) if !head.is_empty() => head.to_string(),
                // The whole remainder was the extension: the tool wrote
                // exactly `<base>.<ext>`, keyed under the argument name.
                _ => arg_name.to_string(),
            };
            results.record(key, Some(codec.load(&path)?));
        }
        Ok(())
    }
}
