//! Plain-text table styles.

use super::{OutputStyle, NO_ISSUES};
use comfy_table::presets::{ASCII_FULL, NOTHING};
use comfy_table::{CellAlignment, ContentArrangement, Table, TableComponent};

fn cell(row: &[String], i: usize) -> &str {
    row.get(i).map(String::as_str).unwrap_or("")
}

/// A column is numeric when it has at least one value and every value parses.
fn is_numeric(rows: &[Vec<String>], i: usize) -> bool {
    let mut cells = rows.iter().map(|r| cell(r, i)).filter(|c| !c.is_empty()).peekable();
    cells.peek().is_some() && cells.all(|c| c.parse::<f64>().is_ok())
}

fn build_table(preset: &str, columns: &[&str], rows: &[Vec<String>]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(preset)
        .set_content_arrangement(ContentArrangement::Disabled)
        .set_header(columns.to_vec());
    for row in rows {
        table.add_row((0..columns.len()).map(|i| cell(row, i)).collect::<Vec<_>>());
    }
    table
}

#[derive(Debug, Default)]
/// Left-aligned columns under a dashed rule.
pub struct PlainStyle;

impl OutputStyle for PlainStyle {
    fn format(&self, columns: &[&str], rows: &[Vec<String>]) -> String {
        if rows.is_empty() {
            return NO_ISSUES.to_string();
        }
        let mut table = build_table(NOTHING, columns, rows);
        table
            .set_style(TableComponent::HeaderLines, '-')
            .set_style(TableComponent::MiddleHeaderIntersections, '-');
        table
            .to_string()
            .lines()
            .map(str::trim_end)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Default)]
/// Boxed table in the `tabulate` "grid" layout; numeric columns align right.
pub struct GridStyle;

impl OutputStyle for GridStyle {
    fn format(&self, columns: &[&str], rows: &[Vec<String>]) -> String {
        if rows.is_empty() {
            return NO_ISSUES.to_string();
        }
        let mut table = build_table(ASCII_FULL, columns, rows);
        for i in (0..columns.len()).filter(|&i| is_numeric(rows, i)) {
            if let Some(column) = table.column_mut(i) {
                column.set_cell_alignment(CellAlignment::Right);
            }
        }
        table.to_string()
    }
}

#[derive(Debug, Default)]
/// GitHub-flavored pipe table.
pub struct MarkdownStyle;

impl OutputStyle for MarkdownStyle {
    fn format(&self, columns: &[&str], rows: &[Vec<String>]) -> String {
        if rows.is_empty() {
            return String::new();
        }
        let escape = |s: &str| s.replace('|', "\\|").replace('\n', " ");
        let mut out = vec![
            format!("| {} |", columns.join(" | ")),
            format!("|{}|", vec!["---"; columns.len()].join("|")),
        ];
        for row in rows {
            let cells: Vec<String> = (0..columns.len()).map(|i| escape(cell(row, i))).collect();
            out.push(format!("| {} |", cells.join(" | ")));
        }
        out.join("\n")
    }
}
