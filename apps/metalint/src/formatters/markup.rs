//! HTML and CSV styles.

use super::OutputStyle;
use std::borrow::Cow;

fn cell(row: &[String], i: usize) -> &str {
    row.get(i).map(String::as_str).unwrap_or("")
}

/// Escape `& < > " '` in cell text.
fn escape(text: &str) -> Cow<'_, str> {
    html_escape::encode_quoted_attribute(text)
}

#[derive(Debug, Default)]
pub struct HtmlStyle;

impl OutputStyle for HtmlStyle {
    fn format(&self, columns: &[&str], rows: &[Vec<String>]) -> String {
        if rows.is_empty() {
            return String::new();
        }
        let mut out = vec!["<table>".to_string(), "  <thead>".into(), "    <tr>".into()];
        for col in columns {
            out.push(format!("      <th>{}</th>", escape(col)));
        }
        out.extend(["    </tr>", "  </thead>", "  <tbody>"].map(String::from));
        for row in rows {
            out.push("    <tr>".into());
            for i in 0..columns.len() {
                out.push(format!("      <td>{}</td>", escape(cell(row, i))));
            }
            out.push("    </tr>".into());
        }
        out.extend(["  </tbody>", "</table>"].map(String::from));
        out.join("\n")
    }
}

/// Quote a field when it contains a delimiter, quote or line break.
fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[derive(Debug, Default)]
pub struct CsvStyle;

impl OutputStyle for CsvStyle {
    fn format(&self, columns: &[&str], rows: &[Vec<String>]) -> String {
        if rows.is_empty() {
            return String::new();
        }
        let mut out = vec![columns.iter().map(|c| csv_field(c)).collect::<Vec<_>>().join(",")];
        for row in rows {
            out.push(
                (0..columns.len())
                    .map(|i| csv_field(cell(row, i)))
                    .collect::<Vec<_>>()
                    .join(","),
            );
        }
        out.join("\n")
    }
}
