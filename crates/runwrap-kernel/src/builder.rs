//! Fluent per-tool command builder.
//!
//! Some external tools read a little pipeline language from their argument
//! list (`calc in.txt -add 5 -mul 2 out.txt`). `ToolBuilder` accumulates
//! those operations in order and renders them into a [`Command`], so caller
//! code reads like the pipeline it describes.

use runwrap_types::{Command, Outcome};

use crate::argfmt::{ArgSpec, Args, format_args};
use crate::context::{ExecRequest, ExecutionContext};
use crate::error::RunResult;

/// Accumulates a tool invocation as an ordered list of operations.
#[derive(Debug, Clone)]
pub struct ToolBuilder {
    tokens: Vec<String>,
}

impl ToolBuilder {
    pub fn new(tool: impl Into<String>) -> Self {
        Self {
            tokens: vec![tool.into()],
        }
    }

    /// Append one positional token.
    pub fn arg(mut self, token: impl Into<String>) -> Self {
        self.tokens.push(token.into());
        self
    }

    /// Append several positional tokens.
    pub fn args<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tokens.extend(tokens.into_iter().map(Into::into));
        self
    }

    /// Append a bare flag token.
    pub fn flag(self, flag: impl Into<String>) -> Self {
        self.arg(flag)
    }

    /// Append an operation: a flag followed by its operands.
    pub fn op<I, S>(mut self, flag: impl Into<String>, operands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        self.tokens.push(flag.into());
        self.tokens
            .extend(operands.into_iter().map(|v| v.to_string()));
        self
    }

    /// Append named options rendered through an [`ArgSpec`].
    pub fn options(mut self, args: &Args, spec: &ArgSpec) -> RunResult<Self> {
        self.tokens.extend(format_args(args, spec)?);
        Ok(self)
    }

    /// Render the accumulated operations into a command.
    pub fn command(&self) -> Command {
        Command::new(self.tokens.iter().cloned())
    }

    /// Dispatch the built command through an execution context.
    pub async fn run(self, ctx: &ExecutionContext, request: ExecRequest) -> RunResult<Outcome> {
        ctx.execute(move |_| Ok(self.command()), request).await
    }
}
