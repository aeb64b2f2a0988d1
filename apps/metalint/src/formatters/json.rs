//! Structured JSON style and the multi-tool report envelope.

use super::OutputStyle;
use serde_json::{json, Map, Value as Json};

pub const FORMAT_VERSION: &str = "1.0";

/// Metadata block stamped on every JSON document.
pub fn metadata() -> Map<String, Json> {
    let mut m = Map::new();
    m.insert("timestamp".into(), json!(chrono::Local::now().to_rfc3339()));
    m.insert("format_version".into(), json!(FORMAT_VERSION));
    m
}

fn normalize(column: &str) -> String {
    column.trim().to_ascii_lowercase().replace(' ', "_")
}

fn typed(column: &str, value: &str) -> Json {
    if value.is_empty() {
        return Json::Null;
    }
    match column {
        "line" | "column" => value
            .parse::<u64>()
            .map(Json::from)
            .unwrap_or_else(|_| json!(value)),
        "fixable" => match value {
            "true" => Json::Bool(true),
            "false" => Json::Bool(false),
            other => json!(other),
        },
        _ => json!(value),
    }
}

fn count_by(issues: &[Map<String, Json>], key: &str) -> Option<Json> {
    if !issues.iter().any(|i| i.contains_key(key)) {
        return None;
    }
    let mut counts = Map::new();
    for issue in issues {
        let label = match issue.get(key) {
            Some(Json::String(s)) => s.clone(),
            _ => "unknown".to_string(),
        };
        let n = counts.get(&label).and_then(Json::as_u64).unwrap_or(0);
        counts.insert(label, json!(n + 1));
    }
    Some(Json::Object(counts))
}

#[derive(Debug, Default)]
pub struct JsonStyle;

impl JsonStyle {
    /// `{metadata, summary, issues}` for one tool's rows.
    pub fn tool_object(&self, columns: &[&str], rows: &[Vec<String>]) -> Json {
        let names: Vec<String> = columns.iter().map(|c| normalize(c)).collect();
        let issues: Vec<Map<String, Json>> = rows
            .iter()
            .map(|row| {
                names
                    .iter()
                    .enumerate()
                    .map(|(i, name)| {
                        let value = row.get(i).map(|v| typed(name, v)).unwrap_or(Json::Null);
                        (name.clone(), value)
                    })
                    .collect()
            })
            .collect();

        let mut summary = Map::new();
        summary.insert("total_issues".into(), json!(issues.len()));
        summary.insert("has_issues".into(), json!(!issues.is_empty()));
        if !issues.is_empty() {
            for (key, field) in [("by_severity", "severity"), ("by_file", "file"), ("by_code", "code")] {
                if let Some(counts) = count_by(&issues, field) {
                    summary.insert(key.into(), counts);
                }
            }
        }
        json!({
            "metadata": metadata(),
            "summary": summary,
            "issues": issues,
        })
    }
}

impl OutputStyle for JsonStyle {
    fn format(&self, columns: &[&str], rows: &[Vec<String>]) -> String {
        serde_json::to_string_pretty(&self.tool_object(columns, rows)).unwrap()
    }

    fn format_for_tool(&self, tool: &str, columns: &[&str], rows: &[Vec<String>]) -> String {
        let obj = self.tool_object(columns, rows);
        let mut tools = Map::new();
        tools.insert(tool.to_string(), obj);
        serde_json::to_string_pretty(&report(tools, rows.len(), 0)).unwrap()
    }
}

/// Envelope for a whole run: `{"results": {metadata, summary, tools}}`.
pub fn report(tools: Map<String, Json>, total_issues: usize, skipped_tools: usize) -> Json {
    let mut meta = metadata();
    meta.insert("format".into(), json!("json"));
    json!({
        "results": {
            "metadata": meta,
            "summary": {
                "total_tools": tools.len(),
                "total_issues": total_issues,
                "has_issues": total_issues > 0,
                "skipped_tools": skipped_tools,
            },
            "tools": tools,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issues_are_typed() {
        let rows = vec![
            vec!["a.py".to_string(), "3".into(), "".into(), "E1".into(), "error".into(), "true".into()],
            vec!["a.py".to_string(), "".into(), "".into(), "E1".into(), "warning".into(), "false".into()],
        ];
        let obj = JsonStyle.tool_object(&["File", "Line", "Column", "Code", "Severity", "Fixable"], &rows);
        let first = &obj["issues"][0];
        assert_eq!(first["line"], json!(3));
        assert!(first["column"].is_null());
        assert_eq!(first["fixable"], json!(true));
        assert!(obj["issues"][1]["line"].is_null());
        assert_eq!(obj["summary"]["total_issues"], json!(2));
        assert_eq!(obj["summary"]["has_issues"], json!(true));
        assert_eq!(obj["summary"]["by_file"]["a.py"], json!(2));
        assert_eq!(obj["summary"]["by_code"]["E1"], json!(2));
        assert_eq!(obj["summary"]["by_severity"]["warning"], json!(1));
        assert_eq!(obj["metadata"]["format_version"], json!("1.0"));
    }

    #[test]
    fn empty_rows_have_no_groupings() {
        let obj = JsonStyle.tool_object(&["File"], &[]);
        assert_eq!(obj["summary"]["has_issues"], json!(false));
        assert!(obj["summary"].get("by_file").is_none());
        assert_eq!(obj["issues"], json!([]));
    }

    #[test]
    fn single_tool_envelope() {
        let text = JsonStyle.format_for_tool("ruff", &["File"], &[vec!["x.py".into()]]);
        let v: Json = serde_json::from_str(&text).unwrap();
        assert_eq!(v["results"]["summary"]["total_tools"], json!(1));
        assert_eq!(v["results"]["tools"]["ruff"]["issues"][0]["file"], json!("x.py"));
    }
}
