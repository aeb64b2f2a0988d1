//! GitHub Actions workflow-command annotations.

use super::OutputStyle;
use crate::models::Severity;

fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn escape_property(value: &str) -> String {
    escape_data(value).replace(':', "%3A").replace(',', "%2C")
}

#[derive(Debug, Default)]
pub struct GithubStyle;

impl GithubStyle {
    fn annotate(&self, tool: Option<&str>, columns: &[&str], rows: &[Vec<String>]) -> String {
        let index = |name: &str| {
            columns
                .iter()
                .position(|c| c.eq_ignore_ascii_case(name))
        };
        let (file, line, col, code_at, sev, msg) = (
            index("file"),
            index("line"),
            index("column"),
            index("code"),
            index("severity"),
            index("message"),
        );
        let get = |row: &Vec<String>, i: Option<usize>| -> String {
            i.and_then(|i| row.get(i)).cloned().unwrap_or_default()
        };

        let mut lines = Vec::with_capacity(rows.len());
        for row in rows {
            let level = match get(row, sev).as_str() {
                "" => "warning",
                s => match Severity::from_label(s) {
                    Severity::Error => "error",
                    Severity::Warning => "warning",
                    Severity::Info => "notice",
                },
            };
            let mut props = Vec::new();
            let f = get(row, file);
            if !f.is_empty() {
                props.push(format!("file={}", escape_property(&f)));
            }
            let l = get(row, line);
            if !l.is_empty() {
                props.push(format!("line={l}"));
            }
            let c = get(row, col);
            if !c.is_empty() {
                props.push(format!("col={c}"));
            }
            let code = get(row, code_at);
            let title = match (tool, code.is_empty()) {
                (Some(t), false) => Some(format!("{t}({code})")),
                (Some(t), true) => Some(t.to_string()),
                (None, false) => Some(code),
                (None, true) => None,
            };
            if let Some(t) = title {
                props.push(format!("title={}", escape_property(&t)));
            }
            lines.push(format!(
                "::{level} {}::{}",
                props.join(","),
                escape_data(&get(row, msg))
            ));
        }
        lines.join("\n")
    }
}

impl OutputStyle for GithubStyle {
    fn format(&self, columns: &[&str], rows: &[Vec<String>]) -> String {
        self.annotate(None, columns, rows)
    }

    fn format_for_tool(&self, tool: &str, columns: &[&str], rows: &[Vec<String>]) -> String {
        self.annotate(Some(tool), columns, rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotations_carry_location_and_level() {
        let rows = vec![
            vec!["a.py".to_string(), "3".into(), "7".into(), "F401".into(), "error".into(), "unused\n100%".into()],
            vec!["b.py".to_string(), "".into(), "".into(), "".into(), "info".into(), "note".into()],
        ];
        let cols = ["File", "Line", "Column", "Code", "Severity", "Message"];
        let out = GithubStyle.format_for_tool("ruff", &cols, &rows);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "::error file=a.py,line=3,col=7,title=ruff(F401)::unused%0A100%25");
        assert_eq!(lines[1], "::notice file=b.py,title=ruff::note");
        assert_eq!(GithubStyle.format(&cols, &[]), "");
    }
}
