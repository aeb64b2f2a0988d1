//! Parsers for tools that report JSON.

use super::ParseError;
use crate::models::{Issue, Severity};
use serde::Deserialize;

#[derive(Deserialize)]
struct RuffLocation {
    row: usize,
    column: usize,
}

#[derive(Deserialize)]
struct RuffItem {
    filename: String,
    location: RuffLocation,
    #[serde(default)]
    code: Option<String>,
    message: String,
    #[serde(default)]
    fix: Option<serde_json::Value>,
}

/// `ruff check --output-format json`.
pub fn parse_ruff(output: &str) -> Result<Vec<Issue>, ParseError> {
    let trimmed = output.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let items: Vec<RuffItem> = serde_json::from_str(trimmed)?;
    Ok(items
        .into_iter()
        .map(|it| {
            // Ruff reports syntax errors without a rule code.
            let code = it.code.unwrap_or_else(|| "E999".to_string());
            let severity = if code.starts_with('E') || code.starts_with('F') {
                Severity::Error
            } else {
                Severity::Warning
            };
            Issue::new(it.filename, it.message)
                .at(Some(it.location.row), Some(it.location.column))
                .with_code(code)
                .with_severity(severity)
                .fixable(it.fix.is_some_and(|f| !f.is_null()))
        })
        .collect())
}

#[derive(Deserialize)]
struct ShellcheckItem {
    #[serde(default)]
    file: String,
    #[serde(default)]
    line: usize,
    #[serde(default)]
    column: usize,
    #[serde(default = "default_level")]
    level: String,
    #[serde(default)]
    code: serde_json::Value,
    #[serde(default)]
    message: String,
    #[serde(default)]
    fix: Option<serde_json::Value>,
}

fn default_level() -> String {
    "error".to_string()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ShellcheckReport {
    Json1 { comments: Vec<ShellcheckItem> },
    Json(Vec<ShellcheckItem>),
}

/// `shellcheck --format json1` (the older `json` array form is accepted too).
pub fn parse_shellcheck(output: &str) -> Result<Vec<Issue>, ParseError> {
    let trimmed = output.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let items = match serde_json::from_str::<ShellcheckReport>(trimmed)? {
        ShellcheckReport::Json1 { comments } => comments,
        ShellcheckReport::Json(items) => items,
    };
    Ok(items
        .into_iter()
        .map(|it| {
            let code = match &it.code {
                serde_json::Value::Number(n) => format!("SC{n}"),
                serde_json::Value::String(s) => s.clone(),
                _ => String::new(),
            };
            Issue::new(it.file, it.message)
                .at(Some(it.line), Some(it.column))
                .with_code(code)
                .with_severity(Severity::from_label(&it.level))
                .fixable(it.fix.is_some_and(|f| !f.is_null()))
        })
        .collect())
}

#[derive(Deserialize)]
struct HadolintItem {
    file: String,
    line: usize,
    #[serde(default)]
    column: Option<usize>,
    code: String,
    message: String,
    level: String,
}

/// `hadolint --format json`.
pub fn parse_hadolint(output: &str) -> Result<Vec<Issue>, ParseError> {
    let trimmed = output.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let items: Vec<HadolintItem> = serde_json::from_str(trimmed)?;
    Ok(items
        .into_iter()
        .map(|it| {
            Issue::new(it.file, it.message)
                .at(Some(it.line), it.column)
                .with_code(it.code)
                .with_severity(Severity::from_label(&it.level))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ruff_items_with_fix_are_fixable() {
        let raw = r#"[
          {"filename":"a.py","location":{"row":3,"column":1},"end_location":{"row":3,"column":9},
           "code":"F401","message":"`os` imported but unused","fix":{"applicability":"safe"}},
          {"filename":"a.py","location":{"row":9,"column":5},"end_location":{"row":9,"column":6},
           "code":"N802","message":"bad name","fix":null}
        ]"#;
        let issues = parse_ruff(raw).unwrap();
        assert_eq!(issues.len(), 2);
        assert!(issues[0].fixable);
        assert_eq!(issues[0].severity, Severity::Error);
        assert!(!issues[1].fixable);
        assert_eq!(issues[1].line, Some(9));
        assert!(parse_ruff("  ").unwrap().is_empty());
        assert!(parse_ruff("[]").unwrap().is_empty());
    }

    #[test]
    fn ruff_garbage_is_an_error() {
        assert!(parse_ruff("error: unexpected argument").is_err());
    }

    #[test]
    fn shellcheck_accepts_both_shapes() {
        let json1 = r#"{"comments":[{"file":"x.sh","line":2,"column":6,"level":"warning","code":2086,"message":"Double quote"}]}"#;
        let issues = parse_shellcheck(json1).unwrap();
        assert_eq!(issues[0].code, "SC2086");
        assert_eq!(issues[0].severity, Severity::Warning);
        let json = r#"[{"file":"y.sh","line":1,"column":1,"level":"style","code":2006,"message":"Use $()"}]"#;
        let issues = parse_shellcheck(json).unwrap();
        assert_eq!(issues[0].severity, Severity::Info);
    }

    #[test]
    fn hadolint_levels() {
        let raw = r#"[{"file":"Dockerfile","line":4,"column":1,"code":"DL3008","message":"Pin versions","level":"warning"}]"#;
        let issues = parse_hadolint(raw).unwrap();
        assert_eq!(issues[0].code, "DL3008");
        assert_eq!(issues[0].column, Some(1));
    }
}
