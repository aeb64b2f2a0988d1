//! Rendering of normalized issues into output styles.
//!
//! A tool's [`TableDescriptor`] projects its issues into ordered columns and
//! rows; an [`OutputStyle`] turns those into text. Styles are looked up by
//! key through a [`FormatRegistry`], which creates each style on first use
//! and falls back to the grid style for keys it does not know.

pub mod github;
pub mod json;
pub mod markup;
pub mod table;
pub mod text;

use crate::models::Issue;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use tracing::debug;

pub use table::{Column, IssueTable, TableDescriptor, FILE_TABLE, LINE_TABLE, LINT_TABLE};

/// Text the table styles print for an empty row set.
pub const NO_ISSUES: &str = "No issues found.";
pub const FIXABLE_SECTION: &str = "Auto-fixable issues";
pub const UNFIXABLE_SECTION: &str = "Not auto-fixable issues";

/// Turns a table into text.
pub trait OutputStyle: Send + Sync {
    fn format(&self, columns: &[&str], rows: &[Vec<String>]) -> String;

    /// Same as `format`, for output that can name the reporting tool.
    fn format_for_tool(&self, _tool: &str, columns: &[&str], rows: &[Vec<String>]) -> String {
        self.format(columns, rows)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    Plain,
    #[default]
    Grid,
    Markdown,
    Html,
    Json,
    Csv,
    Github,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 7] = [
        OutputFormat::Plain,
        OutputFormat::Grid,
        OutputFormat::Markdown,
        OutputFormat::Html,
        OutputFormat::Json,
        OutputFormat::Csv,
        OutputFormat::Github,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Plain => "plain",
            OutputFormat::Grid => "grid",
            OutputFormat::Markdown => "markdown",
            OutputFormat::Html => "html",
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Github => "github",
        }
    }

    /// Resolve a user-supplied key; unknown keys become grid.
    pub fn resolve(key: &str) -> Self {
        key.parse().unwrap_or_else(|_| {
            debug!(format = key, "unknown output format, using grid");
            OutputFormat::Grid
        })
    }

    fn index(self) -> usize {
        self as usize
    }

    fn create(self) -> Box<dyn OutputStyle> {
        match self {
            OutputFormat::Plain => Box::new(text::PlainStyle),
            OutputFormat::Grid => Box::new(text::GridStyle),
            OutputFormat::Markdown => Box::new(text::MarkdownStyle),
            OutputFormat::Html => Box::new(markup::HtmlStyle),
            OutputFormat::Json => Box::new(json::JsonStyle),
            OutputFormat::Csv => Box::new(markup::CsvStyle),
            OutputFormat::Github => Box::new(github::GithubStyle),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plain" | "text" => Ok(OutputFormat::Plain),
            "grid" => Ok(OutputFormat::Grid),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "html" => Ok(OutputFormat::Html),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            "github" | "github-actions" => Ok(OutputFormat::Github),
            other => Err(format!("unknown output format '{other}'")),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lazily-created, cached style instances keyed by [`OutputFormat`].
pub struct FormatRegistry {
    slots: [OnceLock<Box<dyn OutputStyle>>; OutputFormat::ALL.len()],
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatRegistry {
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| OnceLock::new()),
        }
    }

    pub fn style(&self, format: OutputFormat) -> &dyn OutputStyle {
        self.slots[format.index()]
            .get_or_init(|| format.create())
            .as_ref()
    }

    /// Style for a raw key, falling back to grid.
    pub fn get(&self, key: &str) -> &dyn OutputStyle {
        self.style(OutputFormat::resolve(key))
    }

    /// Whether a style instance has been created yet.
    pub fn is_cached(&self, format: OutputFormat) -> bool {
        self.slots[format.index()].get().is_some()
    }
}

/// Format one table with a style.
pub fn render(columns: &[&str], rows: &[Vec<String>], style: &dyn OutputStyle) -> String {
    style.format(columns, rows)
}

/// A tool's columns and rows with a trailing `Fixable` column.
pub fn fixable_table(table: &dyn TableDescriptor, issues: &[Issue]) -> (Vec<&'static str>, Vec<Vec<String>>) {
    let mut columns = table.columns();
    let mut rows = table.rows(issues);
    if !columns.contains(&Column::Fixable.header()) {
        columns.push(Column::Fixable.header());
        for (row, issue) in rows.iter_mut().zip(issues) {
            row.push(Column::Fixable.cell(issue));
        }
    }
    (columns, rows)
}

/// Render one tool's issues.
///
/// JSON always carries a `fixable` value per issue. Table styles split the
/// issues into an auto-fixable and a not-auto-fixable section when the tool
/// can fix and at least one issue is fixable. CSV and GitHub output stay flat.
pub fn render_issues(
    tool: &str,
    issues: &[Issue],
    table: &dyn TableDescriptor,
    format: OutputFormat,
    registry: &FormatRegistry,
    can_fix: bool,
) -> String {
    let style = registry.style(format);

    if format == OutputFormat::Json {
        let (columns, rows) = fixable_table(table, issues);
        return style.format_for_tool(tool, &columns, &rows);
    }

    let columns = table.columns();
    let flat = matches!(format, OutputFormat::Csv | OutputFormat::Github);
    if flat || !can_fix || !issues.iter().any(|i| i.fixable) {
        return style.format_for_tool(tool, &columns, &table.rows(issues));
    }

    let (fixable, rest): (Vec<Issue>, Vec<Issue>) =
        issues.iter().cloned().partition(|i| i.fixable);
    let mut sections = Vec::new();
    for (label, group) in [(FIXABLE_SECTION, fixable), (UNFIXABLE_SECTION, rest)] {
        if group.is_empty() {
            continue;
        }
        let body = style.format_for_tool(tool, &columns, &table.rows(&group));
        sections.push(format!("{label}\n{body}"));
    }
    sections.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_format_falls_back_to_grid() {
        let reg = FormatRegistry::new();
        assert_eq!(OutputFormat::resolve("yaml"), OutputFormat::Grid);
        let rows = vec![vec!["a.py".to_string()]];
        assert_eq!(
            reg.get("yaml").format(&["File"], &rows),
            reg.style(OutputFormat::Grid).format(&["File"], &rows)
        );
        assert_eq!(OutputFormat::resolve("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::resolve("Markdown"), OutputFormat::Markdown);
    }

    #[test]
    fn styles_are_created_lazily_and_cached() {
        let reg = FormatRegistry::new();
        assert!(!reg.is_cached(OutputFormat::Csv));
        let a = reg.style(OutputFormat::Csv) as *const dyn OutputStyle as *const ();
        let b = reg.get("CSV") as *const dyn OutputStyle as *const ();
        assert!(reg.is_cached(OutputFormat::Csv));
        assert_eq!(a, b);
        assert!(!reg.is_cached(OutputFormat::Html));
    }

    #[test]
    fn empty_rows_per_style() {
        let reg = FormatRegistry::new();
        for format in OutputFormat::ALL {
            let out = render(&["File"], &[], reg.style(format));
            match format {
                OutputFormat::Plain | OutputFormat::Grid => assert_eq!(out, NO_ISSUES),
                OutputFormat::Json => assert!(out.contains("\"total_issues\": 0")),
                _ => assert_eq!(out, "", "{format}"),
            }
        }
    }

    #[test]
    fn fixable_sections_come_first() {
        let reg = FormatRegistry::new();
        let issues = vec![
            Issue::new("a.py", "unused").with_code("F401"),
            Issue::new("b.py", "sort").with_code("I001").fixable(true),
        ];
        let out = render_issues("ruff", &issues, &LINT_TABLE, OutputFormat::Plain, &reg, true);
        let fix_at = out.find(FIXABLE_SECTION).unwrap();
        let rest_at = out.find(UNFIXABLE_SECTION).unwrap();
        assert!(fix_at < rest_at);
        assert!(out[fix_at..rest_at].contains("I001"));
        assert!(out[rest_at..].contains("F401"));

        let flat = render_issues("ruff", &issues, &LINT_TABLE, OutputFormat::Plain, &reg, false);
        assert!(!flat.contains(FIXABLE_SECTION));

        let json = render_issues("ruff", &issues, &LINT_TABLE, OutputFormat::Json, &reg, true);
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        let listed = &v["results"]["tools"]["ruff"]["issues"];
        assert_eq!(listed.as_array().map(Vec::len), Some(2));
        assert_eq!(listed[1]["fixable"], serde_json::json!(true));
    }

    #[test]
    fn json_lists_fixable_even_for_check_only_tools() {
        let reg = FormatRegistry::new();
        let issues = vec![Issue::new("a.py", "bad type").at(Some(2), None).with_code("E1")];
        let json = render_issues("mypy", &issues, &LINE_TABLE, OutputFormat::Json, &reg, false);
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["results"]["tools"]["mypy"]["issues"][0]["fixable"], serde_json::json!(false));
    }

    #[test]
    fn machine_styles_skip_fixable_sections() {
        let reg = FormatRegistry::new();
        let issues = vec![
            Issue::new("a.py", "unused").with_code("F401"),
            Issue::new("b.py", "sort").with_code("I001").fixable(true),
        ];
        for format in [OutputFormat::Csv, OutputFormat::Github] {
            let out = render_issues("ruff", &issues, &LINT_TABLE, format, &reg, true);
            assert!(!out.contains(FIXABLE_SECTION), "{format}");
            assert!(!out.contains(UNFIXABLE_SECTION), "{format}");
        }
    }
}
