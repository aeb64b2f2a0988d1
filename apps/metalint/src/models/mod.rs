//! Shared data models: issues, per-tool results and tool definitions.

pub mod tool;

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
/// Normalized severity shared by every tool.
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    /// Map a tool-specific severity label onto the shared scale.
    ///
    /// Unknown labels are treated as warnings; a tool that reports something
    /// we cannot classify still reported a finding.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "error" | "err" | "e" | "fatal" | "critical" | "high" => Severity::Error,
            "info" | "information" | "note" | "notice" | "style" | "convention" | "c"
            | "refactor" | "r" | "hint" | "low" => Severity::Info,
            _ => Severity::Warning,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Code used for a file whose subprocess exceeded its timeout.
pub const TIMEOUT_CODE: &str = "TIMEOUT";
/// Code used for a subprocess that could not be run or crashed.
pub const EXEC_CODE: &str = "EXEC";
/// Code used for output that the tool's parser rejected.
pub const PARSE_CODE: &str = "PARSE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// A single normalized finding reported by a tool.
pub struct Issue {
    pub file: String,
    pub line: Option<usize>,
    pub column: Option<usize>,
    pub code: String,
    pub message: String,
    pub severity: Severity,
    pub fixable: bool,
}

impl Issue {
    pub fn new(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line: None,
            column: None,
            code: String::new(),
            message: message.into(),
            severity: Severity::Error,
            fixable: false,
        }
    }

    pub fn at(mut self, line: Option<usize>, column: Option<usize>) -> Self {
        self.line = line;
        self.column = column;
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn fixable(mut self, fixable: bool) -> Self {
        self.fixable = fixable;
        self
    }

    /// Synthetic record for a subprocess that hit its timeout.
    pub fn timeout(file: impl Into<String>, timeout_secs: u64) -> Self {
        Self::new(
            file,
            format!("Skipped: execution timed out ({timeout_secs}s limit exceeded)"),
        )
        .with_code(TIMEOUT_CODE)
    }

    /// Synthetic record for a subprocess that failed to produce usable output.
    pub fn execution_failure(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(file, message).with_code(EXEC_CODE)
    }

    /// Synthetic record for output the parser could not understand.
    pub fn parse_failure(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(file, message).with_code(PARSE_CODE)
    }

    /// True for the records the executor adds on its own behalf.
    pub fn is_synthetic(&self) -> bool {
        matches!(self.code.as_str(), TIMEOUT_CODE | EXEC_CODE | PARSE_CODE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
/// Why a tool produced a result without really running.
pub enum SkipReason {
    /// Dropped by the scheduler in favor of a higher-priority tool.
    Conflict { winner: String },
    NotInPath,
    CommandFailed,
    NoVersionParsed,
    BelowMinimum { found: String, required: String },
    Timeout,
    OsError,
}

impl SkipReason {
    /// Whether the skip came from the version gate (affects the exit code).
    pub fn is_version_gate(&self) -> bool {
        !matches!(self, SkipReason::Conflict { .. })
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Conflict { winner } => write!(f, "conflict (with {winner})"),
            SkipReason::NotInPath => f.write_str("not-in-path"),
            SkipReason::CommandFailed => f.write_str("command-failed"),
            SkipReason::NoVersionParsed => f.write_str("no-version-parsed"),
            SkipReason::BelowMinimum { found, required } => {
                write!(f, "below-minimum ({found} < {required})")
            }
            SkipReason::Timeout => f.write_str("timeout"),
            SkipReason::OsError => f.write_str("os-error"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
/// Before/after accounting for a fix run.
pub struct FixCounts {
    pub initial: usize,
    pub fixed: usize,
    pub remaining: usize,
}

impl FixCounts {
    /// Counts for one check → fix → re-check cycle.
    ///
    /// A fix that introduced findings raises the baseline so that
    /// `initial == fixed + remaining` still holds.
    pub fn from_recheck(initial: usize, remaining: usize) -> Self {
        let fixed = initial.saturating_sub(remaining);
        Self {
            initial: fixed + remaining,
            fixed,
            remaining,
        }
    }

    /// Counts when the fix or the re-check could not complete.
    pub fn unresolved(initial: usize) -> Self {
        Self {
            initial,
            fixed: 0,
            remaining: initial,
        }
    }

    pub fn add(&mut self, other: FixCounts) {
        self.initial += other.initial;
        self.fixed += other.fixed;
        self.remaining += other.remaining;
    }
}

#[derive(Debug, Clone, Serialize)]
/// Aggregated outcome of running one tool over its file set.
pub struct ToolResult {
    pub name: String,
    pub success: bool,
    pub output: Option<String>,
    pub issues: Vec<Issue>,
    pub issues_count: usize,
    pub initial_issues_count: Option<usize>,
    pub fixed_issues_count: Option<usize>,
    pub remaining_issues_count: Option<usize>,
    pub formatted_output: Option<String>,
    pub skipped: bool,
    pub skip_reason: Option<SkipReason>,
}

impl ToolResult {
    /// A result for a tool that ran; `issues_count` follows `issues`.
    pub fn new(name: impl Into<String>, success: bool, issues: Vec<Issue>) -> Self {
        let issues_count = issues.len();
        Self {
            name: name.into(),
            success,
            output: None,
            issues,
            issues_count,
            initial_issues_count: None,
            fixed_issues_count: None,
            remaining_issues_count: None,
            formatted_output: None,
            skipped: false,
            skip_reason: None,
        }
    }

    /// A successful, empty result carrying only a message.
    pub fn message(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, true, Vec::new()).with_output(Some(message.into()))
    }

    /// A result for a tool that never executed.
    pub fn skipped(name: impl Into<String>, reason: SkipReason, message: impl Into<String>) -> Self {
        let mut res = Self::message(name, message);
        res.skipped = true;
        res.skip_reason = Some(reason);
        res
    }

    pub fn with_output(mut self, output: Option<String>) -> Self {
        self.output = output.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn with_fix_counts(mut self, counts: FixCounts) -> Self {
        self.initial_issues_count = Some(counts.initial);
        self.fixed_issues_count = Some(counts.fixed);
        self.remaining_issues_count = Some(counts.remaining);
        self
    }

    pub fn with_formatted_output(mut self, text: String) -> Self {
        self.formatted_output = Some(text);
        self
    }

    /// True when the version gate (not a conflict) kept this tool from running.
    pub fn is_version_skip(&self) -> bool {
        self.skip_reason
            .as_ref()
            .map(SkipReason::is_version_gate)
            .unwrap_or(false)
    }
}
