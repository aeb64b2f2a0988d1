//! Projection of issues into display rows.

use crate::models::Issue;

/// Ordered columns plus the rows a tool's issues project into.
pub trait TableDescriptor: Sync {
    fn columns(&self) -> Vec<&'static str>;
    fn rows(&self, issues: &[Issue]) -> Vec<Vec<String>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    File,
    Line,
    Column,
    Code,
    Severity,
    Message,
    Fixable,
}

impl Column {
    pub fn header(self) -> &'static str {
        match self {
            Column::File => "File",
            Column::Line => "Line",
            Column::Column => "Column",
            Column::Code => "Code",
            Column::Severity => "Severity",
            Column::Message => "Message",
            Column::Fixable => "Fixable",
        }
    }

    /// Missing values render as an empty cell.
    pub fn cell(self, issue: &Issue) -> String {
        fn opt(n: Option<usize>) -> String {
            n.map(|n| n.to_string()).unwrap_or_default()
        }
        match self {
            Column::File => issue.file.clone(),
            Column::Line => opt(issue.line),
            Column::Column => opt(issue.column),
            Column::Code => issue.code.clone(),
            Column::Severity => issue.severity.to_string(),
            Column::Message => issue.message.clone(),
            Column::Fixable => issue.fixable.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
/// A table made of a fixed column list.
pub struct IssueTable {
    columns: &'static [Column],
}

impl IssueTable {
    pub const fn new(columns: &'static [Column]) -> Self {
        Self { columns }
    }
}

impl TableDescriptor for IssueTable {
    fn columns(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.header()).collect()
    }

    fn rows(&self, issues: &[Issue]) -> Vec<Vec<String>> {
        issues
            .iter()
            .map(|issue| self.columns.iter().map(|c| c.cell(issue)).collect())
            .collect()
    }
}

/// Linters with positions and severities (ruff, shellcheck, yamllint, ...).
pub static LINT_TABLE: IssueTable = IssueTable::new(&[
    Column::File,
    Column::Line,
    Column::Column,
    Column::Code,
    Column::Severity,
    Column::Message,
]);

/// Tools that report a line but no column (mypy, docstring checkers).
pub static LINE_TABLE: IssueTable = IssueTable::new(&[
    Column::File,
    Column::Line,
    Column::Code,
    Column::Severity,
    Column::Message,
]);

/// Formatters that only name files.
pub static FILE_TABLE: IssueTable =
    IssueTable::new(&[Column::File, Column::Code, Column::Message]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_follow_columns() {
        let issue = Issue::new("a.py", "bad").at(Some(3), None).with_code("X1");
        let rows = LINE_TABLE.rows(&[issue]);
        assert_eq!(LINE_TABLE.columns(), vec!["File", "Line", "Code", "Severity", "Message"]);
        assert_eq!(rows, vec![vec!["a.py", "3", "X1", "error", "bad"]]);
        let rows = LINT_TABLE.rows(&[Issue::new("b", "m")]);
        assert_eq!(rows[0][1], "");
        assert_eq!(rows[0][2], "");
    }
}
