//! Output rendering for check/fmt runs and the tool listing.
//!
//! Table styles print one section per tool followed by a summary table in the
//! same style. CSV prints a single table with a leading `Tool` column. JSON
//! prints the multi-tool report document. The `compose_*`
//! functions are pure so they can be tested without capturing stdout.

use crate::formatters::json::{self as json_style, JsonStyle};
use crate::formatters::{
    fixable_table, render, render_issues, Column, FormatRegistry, OutputFormat, TableDescriptor,
    LINT_TABLE, NO_ISSUES,
};
use crate::models::ToolResult;
use crate::registry::ToolRegistry;
use crate::runner::{Action, RunReport};
use owo_colors::OwoColorize;
use serde_json::{json, Map, Value as JsonVal};

/// Colors only for human table styles, and never with `NO_COLOR`.
pub fn use_colors(format: OutputFormat) -> bool {
    matches!(
        format,
        OutputFormat::Plain | OutputFormat::Grid | OutputFormat::Markdown
    ) && std::env::var_os("NO_COLOR").is_none()
}

/// Machine formats print the issue tables only.
fn decorated(format: OutputFormat) -> bool {
    !matches!(format, OutputFormat::Csv | OutputFormat::Github)
}

fn table_for<'r>(tools: &'r ToolRegistry, name: &str) -> (&'r dyn TableDescriptor, bool) {
    match tools.get(name) {
        Ok(entry) => (entry.plugin.table, entry.definition.can_fix),
        Err(_) => (&LINT_TABLE as &dyn TableDescriptor, false),
    }
}

/// Fill `formatted_output` on every result that carries issues.
pub fn attach_formatted(
    report: &mut RunReport,
    tools: &ToolRegistry,
    format: OutputFormat,
    styles: &FormatRegistry,
) {
    for result in report.results.iter_mut().filter(|r| !r.issues.is_empty()) {
        let (table, can_fix) = table_for(tools, &result.name);
        let text = render_issues(&result.name, &result.issues, table, format, styles, can_fix);
        result.formatted_output = Some(text);
    }
}

fn status(result: &ToolResult) -> &'static str {
    if result.skipped {
        "SKIP"
    } else if result.success {
        "PASS"
    } else {
        "FAIL"
    }
}

/// One tool's section: header, rendered issues, tool text.
pub fn compose_tool_text(result: &ToolResult, action: Action, format: OutputFormat, color: bool) -> String {
    let mut parts = Vec::new();
    if decorated(format) {
        let header = format!("▶ {} ({})", result.name, action.as_str());
        parts.push(if color {
            header.cyan().bold().to_string()
        } else {
            header
        });
    }
    if let Some(rendered) = result.formatted_output.as_deref().filter(|s| !s.is_empty()) {
        parts.push(rendered.to_string());
    }
    if !decorated(format) {
        return parts.join("\n");
    }
    match (&result.output, result.skipped) {
        (Some(text), true) => {
            let notice = format!("⏭  {text}");
            parts.push(if color {
                notice.yellow().to_string()
            } else {
                notice
            });
        }
        (Some(text), false) => parts.push(text.clone()),
        (None, _) if result.issues.is_empty() => parts.push(NO_ISSUES.to_string()),
        (None, _) => {}
    }
    parts.join("\n")
}

/// Summary table columns and rows; fix runs add the fix counts.
pub fn summary_table(report: &RunReport) -> (Vec<&'static str>, Vec<Vec<String>>) {
    let fix = report.action.is_fix();
    let mut columns = vec!["Tool", "Status", "Issues"];
    if fix {
        columns.extend(["Fixed", "Remaining"]);
    }
    let count = |n: Option<usize>| n.map(|n| n.to_string()).unwrap_or_default();
    let rows = report
        .results
        .iter()
        .map(|r| {
            let mut row = vec![r.name.clone(), status(r).to_string(), r.issues_count.to_string()];
            if fix {
                row.push(count(r.fixed_issues_count));
                row.push(count(r.remaining_issues_count));
            }
            row
        })
        .collect();
    (columns, rows)
}

/// Issue columns of the combined CSV table, shared by every tool.
const CSV_COLUMNS: [Column; 7] = [
    Column::File,
    Column::Line,
    Column::Column,
    Column::Code,
    Column::Severity,
    Column::Message,
    Column::Fixable,
];

/// One table holding every tool's issues, each row led by the tool name.
pub fn csv_table(report: &RunReport) -> (Vec<&'static str>, Vec<Vec<String>>) {
    let mut columns = vec!["Tool"];
    columns.extend(CSV_COLUMNS.iter().map(|c| c.header()));
    let rows = report
        .results
        .iter()
        .flat_map(|r| {
            r.issues.iter().map(move |issue| {
                let mut row = vec![r.name.clone()];
                row.extend(CSV_COLUMNS.iter().map(|c| c.cell(issue)));
                row
            })
        })
        .collect();
    (columns, rows)
}

/// Everything a table style prints for a run.
pub fn compose_report_text(report: &RunReport, format: OutputFormat, styles: &FormatRegistry, color: bool) -> String {
    if format == OutputFormat::Csv {
        let (columns, rows) = csv_table(report);
        return render(&columns, &rows, styles.style(format));
    }
    let mut sections: Vec<String> = report
        .results
        .iter()
        .map(|r| compose_tool_text(r, report.action, format, color))
        .filter(|s| !s.is_empty())
        .collect();
    if decorated(format) && !report.is_empty() {
        let (columns, rows) = summary_table(report);
        let title = if color {
            "Summary".bold().to_string()
        } else {
            "Summary".to_string()
        };
        sections.push(format!("{title}\n{}", render(&columns, &rows, styles.style(format))));
    }
    sections.join("\n\n")
}

/// The per-tool JSON object plus run metadata for that tool.
fn tool_json(result: &ToolResult, tools: &ToolRegistry) -> JsonVal {
    let (table, _) = table_for(tools, &result.name);
    let (columns, rows) = fixable_table(table, &result.issues);
    let mut obj = JsonStyle.tool_object(&columns, &rows);
    if let JsonVal::Object(map) = &mut obj {
        map.insert("success".into(), json!(result.success));
        map.insert("skipped".into(), json!(result.skipped));
        map.insert(
            "skip_reason".into(),
            json!(result.skip_reason.as_ref().map(|r| r.to_string())),
        );
        map.insert("issues_count".into(), json!(result.issues_count));
        if result.initial_issues_count.is_some() {
            map.insert("initial_issues_count".into(), json!(result.initial_issues_count));
            map.insert("fixed_issues_count".into(), json!(result.fixed_issues_count));
            map.insert("remaining_issues_count".into(), json!(result.remaining_issues_count));
        }
        map.insert("output".into(), json!(result.output));
    }
    obj
}

/// Compose the multi-tool JSON report (pure) for testing/snapshot purposes.
pub fn compose_report_json(report: &RunReport, tools: &ToolRegistry) -> JsonVal {
    let mut per_tool = Map::new();
    for result in &report.results {
        per_tool.insert(result.name.clone(), tool_json(result, tools));
    }
    let mut doc = json_style::report(per_tool, report.total_issues(), report.skipped_tools());
    if let Some(meta) = doc["results"]["metadata"].as_object_mut() {
        meta.insert("action".into(), json!(report.action.as_str()));
    }
    doc
}

/// Print a finished run in the requested format.
pub fn print_report(report: &mut RunReport, tools: &ToolRegistry, format: OutputFormat) {
    if format == OutputFormat::Json {
        println!(
            "{}",
            serde_json::to_string_pretty(&compose_report_json(report, tools)).unwrap()
        );
        return;
    }
    let styles = FormatRegistry::new();
    attach_formatted(report, tools, format, &styles);
    let text = compose_report_text(report, format, &styles, use_colors(format));
    if !text.is_empty() {
        println!("{text}");
    }
}

/// Columns and rows describing every registered tool.
pub fn tools_table(tools: &ToolRegistry) -> (Vec<&'static str>, Vec<Vec<String>>) {
    let columns = vec!["Tool", "Priority", "Categories", "Fix", "Mode", "Patterns", "Conflicts"];
    let rows = tools
        .all()
        .iter()
        .map(|e| {
            let d = &e.definition;
            vec![
                d.name.clone(),
                d.priority.to_string(),
                d.category.labels().join(", "),
                if d.can_fix { "yes" } else { "no" }.to_string(),
                d.mode.as_str().to_string(),
                d.file_patterns.join(", "),
                d.conflicts_with.join(", "),
            ]
        })
        .collect();
    (columns, rows)
}

/// Compose the `list-tools` JSON array (pure).
pub fn compose_tools_json(tools: &ToolRegistry) -> JsonVal {
    let items: Vec<_> = tools
        .all()
        .iter()
        .map(|e| {
            let d = &e.definition;
            json!({
                "name": d.name,
                "description": d.description,
                "priority": d.priority,
                "categories": d.category.labels(),
                "can_check": d.can_check,
                "can_fix": d.can_fix,
                "mode": d.mode.as_str(),
                "file_patterns": d.file_patterns,
                "conflicts_with": d.conflicts_with,
                "min_version": d.min_version,
                "default_timeout": d.effective_timeout(),
                "default_options": d.default_options,
            })
        })
        .collect();
    json!({"tools": items, "total": items.len()})
}

/// Print the tool listing.
pub fn print_tools(tools: &ToolRegistry, format: OutputFormat) {
    if format == OutputFormat::Json {
        println!(
            "{}",
            serde_json::to_string_pretty(&compose_tools_json(tools)).unwrap()
        );
        return;
    }
    let styles = FormatRegistry::new();
    let (columns, rows) = tools_table(tools);
    println!("{}", render(&columns, &rows, styles.style(format)));
}
