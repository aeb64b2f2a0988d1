//! Static description of an external tool.
//!
//! A `ToolDefinition` is created once when the tool is registered and never
//! mutated afterwards. Per-run knobs (timeouts, option overrides) live in
//! `prepare::RunOptions` instead.

use serde_json::Value as Json;
use std::collections::BTreeMap;
use std::ops::BitOr;

/// Tool-specific options: the declared defaults merged with user overrides.
pub type ToolOptions = BTreeMap<String, Json>;

/// Timeout used when a definition does not declare one.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
/// Bitset of the roles a tool plays.
pub struct ToolCategory(u8);

impl ToolCategory {
    pub const LINTER: Self = Self(1);
    pub const FORMATTER: Self = Self(1 << 1);
    pub const TYPE_CHECKER: Self = Self(1 << 2);
    pub const SECURITY: Self = Self(1 << 3);
    pub const DOCS: Self = Self(1 << 4);

    const LABELS: [(ToolCategory, &'static str); 5] = [
        (Self::LINTER, "linter"),
        (Self::FORMATTER, "formatter"),
        (Self::TYPE_CHECKER, "type-checker"),
        (Self::SECURITY, "security"),
        (Self::DOCS, "docs"),
    ];

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub fn contains(self, other: Self) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    pub fn labels(self) -> Vec<&'static str> {
        Self::LABELS
            .iter()
            .filter(|(cat, _)| self.contains(*cat))
            .map(|(_, label)| *label)
            .collect()
    }
}

impl BitOr for ToolCategory {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// How a tool is invoked over its discovered files.
pub enum ExecutionMode {
    /// One subprocess per file, so one bad file cannot abort the others.
    #[default]
    PerFile,
    /// One subprocess for the whole file set (project-wide analysis).
    Batch,
    /// One subprocess that finds its own files (e.g. `cargo fmt`).
    Project,
}

impl ExecutionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionMode::PerFile => "per-file",
            ExecutionMode::Batch => "batch",
            ExecutionMode::Project => "project",
        }
    }
}

#[derive(Debug, Clone, Default)]
/// Immutable metadata for one registered tool.
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub can_check: bool,
    pub can_fix: bool,
    pub category: ToolCategory,
    /// Include globs, matched against file names (e.g. `*.py`).
    pub file_patterns: Vec<String>,
    /// Higher runs earlier and wins conflicts.
    pub priority: i32,
    pub conflicts_with: Vec<String>,
    /// Config files the tool reads on its own (informational).
    pub native_configs: Vec<String>,
    pub version_command: Vec<String>,
    /// Regex with one capture group for the version; generic fallback if absent.
    pub version_pattern: Option<String>,
    pub min_version: Option<String>,
    pub install_hint: Option<String>,
    pub default_options: ToolOptions,
    pub default_timeout: u64,
    pub mode: ExecutionMode,
    /// Run from the invocation root instead of the files' common parent.
    pub run_from_root: bool,
}

impl ToolDefinition {
    /// Whether `other` is declared as a conflict (ids compared normalized).
    pub fn conflicts_with(&self, other: &str) -> bool {
        let other = normalize_tool_id(other);
        self.conflicts_with
            .iter()
            .any(|c| normalize_tool_id(c) == other)
    }

    pub fn supports(&self, fix: bool) -> bool {
        if fix {
            self.can_fix
        } else {
            self.can_check
        }
    }

    pub fn effective_timeout(&self) -> u64 {
        if self.default_timeout == 0 {
            DEFAULT_TIMEOUT_SECS
        } else {
            self.default_timeout
        }
    }

    pub fn install_hint(&self) -> String {
        self.install_hint
            .clone()
            .unwrap_or_else(|| format!("Install {} and ensure it is in PATH", self.name))
    }
}

/// Canonical form of a tool id: lowercase, `-` folded into `_`.
pub fn normalize_tool_id(id: &str) -> String {
    id.trim().to_ascii_lowercase().replace('-', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_bitset() {
        let cat = ToolCategory::LINTER | ToolCategory::FORMATTER;
        assert!(cat.contains(ToolCategory::LINTER));
        assert!(!cat.contains(ToolCategory::SECURITY));
        assert_eq!(cat.labels(), vec!["linter", "formatter"]);
        assert!(!ToolCategory::default().contains(ToolCategory::default()));
    }

    #[test]
    fn conflicts_compare_normalized_ids() {
        let def = ToolDefinition {
            name: "pydoclint".into(),
            conflicts_with: vec!["Dar-Glint".into()],
            ..Default::default()
        };
        assert!(def.conflicts_with("dar_glint"));
        assert!(!def.conflicts_with("ruff"));
    }
}
