//! Command — an ordered, immutable sequence of argv tokens.

use serde::{Deserialize, Serialize};

/// A fully rendered command line: the executable followed by its arguments.
///
/// Immutable once built. Wrapper functions produce a `Command`, the process
/// runner consumes it. The first token is the program name; it may be a bare
/// name (resolved against the configured tool prefixes and `PATH` at
/// execution time) or a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    tokens: Vec<String>,
}

impl Command {
    /// Build a command from an iterator of tokens.
    ///
    /// An empty token list is representable but will be rejected by the
    /// runner before any process is spawned.
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    /// The program token, if any.
    pub fn program(&self) -> Option<&str> {
        self.tokens.first().map(String::as_str)
    }

    /// The argument tokens (everything after the program).
    pub fn args(&self) -> &[String] {
        if self.tokens.is_empty() {
            &[]
        } else {
            &self.tokens[1..]
        }
    }

    /// All tokens in order.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// A copy of this command with the program token replaced.
    ///
    /// Used by the kernel after executable resolution: the bare tool name is
    /// swapped for the resolved path while the arguments stay untouched.
    pub fn with_program(&self, program: impl Into<String>) -> Self {
        let mut tokens = self.tokens.clone();
        if tokens.is_empty() {
            tokens.push(program.into());
        } else {
            tokens[0] = program.into();
        }
        Self { tokens }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tokens.join(" "))
    }
}

impl From<Vec<String>> for Command {
    fn from(tokens: Vec<String>) -> Self {
        Self { tokens }
    }
}

impl From<Command> for Vec<String> {
    fn from(cmd: Command) -> Self {
        cmd.tokens
    }
}
