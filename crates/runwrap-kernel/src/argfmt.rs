//! Named options → ordered command tokens.
//!
//! External tools disagree about flag syntax: `-v 3`, `--verbose 3`,
//! `-v=3`, `--verbose=3`, multi-valued flags as repeated tokens or one
//! joined token. [`ArgSpec`] captures one tool's convention; [`format_args`]
//! renders an ordered option list against it:
//!
//! ```
//! use runwrap_kernel::argfmt::{format_args, ArgSpec, ArgStyle, Args};
//!
//! let spec = ArgSpec::new(ArgStyle::Dash);
//! let args = Args::new().set("mask", true).set("c", vec![10, 20, 30]);
//! let tokens = format_args(&args, &spec).unwrap();
//! assert_eq!(tokens, ["-mask", "true", "-c", "10", "20", "30"]);
//! ```
//!
//! Boolean flags that take no value use the [`ValueOverride`] sentinels:
//! `ShowIfTrue` emits the bare flag only when the bound value is truthy,
//! `HideIfTrue` only when it is falsy.

use std::collections::HashMap;

use crate::error::{RunError, RunResult};

/// Flag style convention for a tool's options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgStyle {
    /// `-name val ...`
    Dash,
    /// `--name val ...`
    DoubleDash,
    /// `-name=val`
    DashEquals,
    /// `--name=val`
    DoubleDashEquals,
}

impl ArgStyle {
    fn prefix(self) -> &'static str {
        match self {
            ArgStyle::Dash | ArgStyle::DashEquals => "-",
            ArgStyle::DoubleDash | ArgStyle::DoubleDashEquals => "--",
        }
    }

    fn uses_equals(self) -> bool {
        matches!(self, ArgStyle::DashEquals | ArgStyle::DoubleDashEquals)
    }
}

/// How a multi-valued option is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeqSep {
    /// Each value is its own token: `-c 10 20 30`.
    #[default]
    Space,
    /// One token containing the space-separated values. When the command is
    /// rendered to a shell string this token needs quoting, hence the name.
    Quote,
    /// One token with values joined by the given delimiter: `-c 10,20,30`.
    Char(char),
}

/// Per-option value override in an [`ArgSpec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueOverride {
    /// Replace the bound value with a fixed literal.
    Literal(String),
    /// Emit the bare flag when the bound value is truthy, else nothing.
    ShowIfTrue,
    /// Emit the bare flag when the bound value is falsy, else nothing.
    HideIfTrue,
}

/// An option value accepted by the formatter.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Seq(Vec<String>),
}

impl ArgValue {
    /// Truthiness, used by the show/hide sentinels. Mirrors what shell
    /// wrappers expect: false, zero, and empty values are falsy.
    pub fn truthy(&self) -> bool {
        match self {
            ArgValue::Bool(b) => *b,
            ArgValue::Int(i) => *i != 0,
            ArgValue::Float(f) => *f != 0.0,
            ArgValue::Str(s) => !s.is_empty(),
            ArgValue::Seq(v) => !v.is_empty(),
        }
    }

    fn render(&self) -> Vec<String> {
        match self {
            ArgValue::Bool(b) => vec![b.to_string()],
            ArgValue::Int(i) => vec![i.to_string()],
            ArgValue::Float(f) => vec![f.to_string()],
            ArgValue::Str(s) => vec![s.clone()],
            ArgValue::Seq(v) => v.clone(),
        }
    }
}

impl From<bool> for ArgValue {
    fn from(b: bool) -> Self {
        ArgValue::Bool(b)
    }
}

impl From<i64> for ArgValue {
    fn from(i: i64) -> Self {
        ArgValue::Int(i)
    }
}

impl From<i32> for ArgValue {
    fn from(i: i32) -> Self {
        ArgValue::Int(i as i64)
    }
}

impl From<f64> for ArgValue {
    fn from(f: f64) -> Self {
        ArgValue::Float(f)
    }
}

impl From<&str> for ArgValue {
    fn from(s: &str) -> Self {
        ArgValue::Str(s.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(s: String) -> Self {
        ArgValue::Str(s)
    }
}

impl<T: ToString> From<Vec<T>> for ArgValue {
    fn from(v: Vec<T>) -> Self {
        ArgValue::Seq(v.into_iter().map(|x| x.to_string()).collect())
    }
}

/// Insertion-ordered option list.
///
/// Token order within one `format_args` call follows insertion order, so a
/// fixed input produces a reproducible command line.
#[derive(Debug, Clone, Default)]
pub struct Args {
    entries: Vec<(String, ArgValue)>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind an option to a value.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.entries.push((name.into(), value.into()));
        self
    }

    /// Bind an option only if the value is present. Absent options emit no
    /// tokens at all.
    pub fn set_opt<V: Into<ArgValue>>(self, name: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(v) => self.set(name, v),
            None => self,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, ArgValue)> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Describes how one tool's named options become tokens.
#[derive(Debug, Clone)]
pub struct ArgSpec {
    style: ArgStyle,
    value_sep: SeqSep,
    char_style: Option<ArgStyle>,
    char_sep: Option<SeqSep>,
    name_map: HashMap<String, String>,
    value_map: HashMap<String, ValueOverride>,
}

impl ArgSpec {
    pub fn new(style: ArgStyle) -> Self {
        Self {
            style,
            value_sep: SeqSep::default(),
            char_style: None,
            char_sep: None,
            name_map: HashMap::new(),
            value_map: HashMap::new(),
        }
    }

    /// Separator used for multi-valued options.
    pub fn value_sep(mut self, sep: SeqSep) -> Self {
        self.value_sep = sep;
        self
    }

    /// Style used for single-character option names. Lets one call mix
    /// GNU-style long options with short options (`--name=value` with
    /// `-x val`).
    pub fn char_style(mut self, style: ArgStyle) -> Self {
        self.char_style = Some(style);
        self
    }

    /// Separator used for multi-valued single-character options.
    pub fn char_sep(mut self, sep: SeqSep) -> Self {
        self.char_sep = Some(sep);
        self
    }

    /// Map an option name to the flag name actually emitted.
    pub fn map_name(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.name_map.insert(from.into(), to.into());
        self
    }

    /// Override the value emitted for an option (keyed by the emitted flag
    /// name, after name mapping).
    pub fn map_value(mut self, name: impl Into<String>, over: ValueOverride) -> Self {
        self.value_map.insert(name.into(), over);
        self
    }

    fn style_for(&self, name: &str) -> (ArgStyle, SeqSep) {
        if name.chars().count() == 1 {
            (
                self.char_style.unwrap_or(self.style),
                self.char_sep.unwrap_or(self.value_sep),
            )
        } else {
            (self.style, self.value_sep)
        }
    }

    fn validate(&self) -> RunResult<()> {
        let pairs = [
            (self.style, self.value_sep),
            (
                self.char_style.unwrap_or(self.style),
                self.char_sep.unwrap_or(self.value_sep),
            ),
        ];
        for (style, sep) in pairs {
            if style.uses_equals() && sep == SeqSep::Space {
                return Err(RunError::Config(format!(
                    "cannot combine {:?} style with a space value separator",
                    style
                )));
            }
        }
        Ok(())
    }
}

/// Render an ordered option list against a spec.
///
/// Fails fast with [`RunError::Config`] for separator combinations that
/// cannot be represented unambiguously (an `=` style with a space
/// separator), before any process could be spawned.
pub fn format_args(args: &Args, spec: &ArgSpec) -> RunResult<Vec<String>> {
    spec.validate()?;

    let mut tokens = Vec::new();

    for (name, value) in args.iter() {
        let mapped = spec.name_map.get(name).map(String::as_str).unwrap_or(name);
        let (style, sep) = spec.style_for(mapped);
        let flag = format!("{}{}", style.prefix(), mapped);

        match spec.value_map.get(mapped) {
            Some(ValueOverride::ShowIfTrue) => {
                // Sentinels key off the original value's truthiness and
                // bypass value rendering entirely.
                if value.truthy() {
                    tokens.push(flag);
                }
            }
            Some(ValueOverride::HideIfTrue) => {
                if !value.truthy() {
                    tokens.push(flag);
                }
            }
            Some(ValueOverride::Literal(lit)) => {
                push_option(&mut tokens, flag, vec![lit.clone()], style, sep);
            }
            None => {
                push_option(&mut tokens, flag, value.render(), style, sep);
            }
        }
    }

    Ok(tokens)
}

fn push_option(tokens: &mut Vec<String>, flag: String, values: Vec<String>, style: ArgStyle, sep: SeqSep) {
    let joined = match sep {
        SeqSep::Space | SeqSep::Quote => values.join(" "),
        SeqSep::Char(c) => values.join(&c.to_string()),
    };

    if style.uses_equals() {
        tokens.push(format!("{}={}", flag, joined));
    } else {
        tokens.push(flag);
        match sep {
            SeqSep::Space => tokens.extend(values),
            SeqSep::Quote | SeqSep::Char(_) => tokens.push(joined),
        }
    }
}

/// Split a single command string into tokens, honouring quotes.
///
/// `abc "woop woop"` → `["abc", "woop woop"]`. Used by entry points that
/// accept a whole command line as one string.
pub fn prepare_args(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut in_token = false;

    for ch in line.chars() {
        match quote {
            Some(q) => {
                if ch == q {
                    quote = None;
                } else {
                    current.push(ch);
                }
            }
            None => match ch {
                '"' | '\'' => {
                    quote = Some(ch);
                    in_token = true;
                }
                c if c.is_whitespace() => {
                    if in_token {
                        tokens.push(std::mem::take(&mut current));
                        in_token = false;
                    }
                }
                c => {
                    current.push(c);
                    in_token = true;
                }
            },
        }
    }
    if in_token {
        tokens.push(current);
    }

    tokens
}
