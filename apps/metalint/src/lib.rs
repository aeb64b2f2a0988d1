//! metalint core library.
//!
//! This crate runs external linters and formatters ("tools") over a set of
//! paths, normalizes their heterogeneous output into one issue model and
//! renders a single report.
//!
//! High-level modules:
//! - `exclude`: file discovery with run-wide excludes and an ignore file.
//! - `registry` / `builtin`: the tool table and the tools shipped by default.
//! - `scheduler`: priority ordering and conflict resolution.
//! - `version`: minimum-version gate run before a tool executes.
//! - `prepare`: per-tool file set, working directory, timeout and options.
//! - `execute`: per-file / batch subprocess runs, fix flow, aggregation.
//! - `runner`: one invocation end to end.
//! - `parsers`: tool output to [`models::Issue`] records.
//! - `formatters` / `output`: output styles and report printing.
//! - `config` / `cli`: configuration resolution and argument parsing.
pub mod builtin;
pub mod cli;
pub mod config;
pub mod error;
pub mod exclude;
pub mod execute;
pub mod formatters;
pub mod models;
pub mod output;
pub mod parsers;
pub mod prepare;
pub mod process;
pub mod registry;
pub mod runner;
pub mod scheduler;
pub mod utils;
pub mod version;

pub use error::{Error, Result};
