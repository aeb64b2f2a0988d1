//! Per-tool output parsers.
//!
//! Each parser is a pure function from the tool's raw output to an ordered
//! list of [`Issue`]s. An empty or whitespace-only input always parses to an
//! empty list; output a parser cannot make sense of is a [`ParseError`].

pub mod json;
pub mod text;

use crate::models::Issue;

/// Signature shared by every parser in the capability table.
pub type ParseFn = fn(&str) -> Result<Vec<Issue>, ParseError>;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("invalid JSON output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unexpected output shape: {0}")]
    Shape(String),
}

pub use json::{parse_hadolint, parse_ruff, parse_shellcheck};
pub use text::{
    parse_black, parse_darglint, parse_generic, parse_prettier, parse_pydoclint, parse_rustfmt,
    parse_yamllint,
};
