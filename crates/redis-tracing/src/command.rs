//! Command descriptors as seen by hooks.

use std::fmt;

/// Outcome of a command that did not produce a regular reply
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// The key does not exist. An expected miss, not a failure.
    #[error("redis: nil")]
    Nil,

    /// Error reply sent by the server, e.g. `WRONGTYPE ...`
    #[error("{0}")]
    Reply(String),

    #[error("connection error: {0}")]
    Connection(String),

    /// A hook refused to let the command through
    #[error("hook error: {0}")]
    Hook(String),
}

impl CommandError {
    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }
}

/// A single command argument
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Nil,
    Str(String),
    Bytes(Vec<u8>),
    Int(i64),
    Uint(u64),
    Float(f64),
    Bool(bool),
}

impl Arg {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => f.write_str("<nil>"),
            Self::Str(s) => f.write_str(s),
            Self::Bytes(b) => f.write_str(&String::from_utf8_lossy(b)),
            Self::Int(n) => write!(f, "{n}"),
            Self::Uint(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Arg {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<&[u8]> for Arg {
    fn from(value: &[u8]) -> Self {
        Self::Bytes(value.to_vec())
    }
}

impl From<Vec<u8>> for Arg {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<i64> for Arg {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Arg {
    fn from(value: i32) -> Self {
        Self::Int(value as i64)
    }
}

impl From<u64> for Arg {
    fn from(value: u64) -> Self {
        Self::Uint(value)
    }
}

impl From<usize> for Arg {
    fn from(value: usize) -> Self {
        Self::Uint(value as u64)
    }
}

impl From<f64> for Arg {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Arg {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<T: Into<Arg>> From<Option<T>> for Arg {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Nil, Into::into)
    }
}

/// A command plus, once it has run, its error
#[derive(Debug, Clone, PartialEq)]
pub struct Cmd {
    args: Vec<Arg>,
    err: Option<CommandError>,
}

impl Cmd {
    /// Start a command whose first argument is `name`
    pub fn new(name: impl Into<Arg>) -> Self {
        Self {
            args: vec![name.into()],
            err: None,
        }
    }

    pub fn from_args(args: Vec<Arg>) -> Self {
        Self { args, err: None }
    }

    /// Append an argument
    pub fn arg(mut self, arg: impl Into<Arg>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Lowercased command name, empty when the first argument is not a string
    pub fn name(&self) -> String {
        self.args
            .first()
            .and_then(Arg::as_str)
            .map(str::to_lowercase)
            .unwrap_or_default()
    }

    /// Name including the subcommand for container commands like `cluster info`
    pub fn full_name(&self) -> String {
        let name = self.name();
        match name.as_str() {
            "cluster" | "command" => match self.args.get(1).and_then(Arg::as_str) {
                Some(sub) => format!("{name} {sub}"),
                None => name,
            },
            _ => name,
        }
    }

    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    pub fn err(&self) -> Option<&CommandError> {
        self.err.as_ref()
    }

    pub fn set_err(&mut self, err: Option<CommandError>) {
        self.err = err;
    }
}
