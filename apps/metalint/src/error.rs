//! Crate-wide error type.
//!
//! Only configuration-level failures are errors. Everything that goes wrong
//! while a tool runs (missing binary, timeout, crash, unparsable output) is
//! surfaced as data on the tool's `ToolResult` instead.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown tool '{0}'")]
    UnknownTool(String),

    #[error("tool '{0}' is already registered")]
    DuplicateTool(String),

    #[error("invalid option for {tool}: {message}")]
    InvalidOption { tool: String, message: String },

    #[error("invalid glob pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("invalid config {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    #[error("{tool} failed the version gate: {message}")]
    VersionGate { tool: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Exit status the CLI uses when this error aborts a run.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::VersionGate { .. } => 1,
            _ => 2,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
