//! Tool execution and result aggregation.
//!
//! A prepared tool is split into units: one per file for per-file tools, a
//! single unit otherwise. Each unit runs in isolation, so a timeout or crash
//! in one becomes a synthetic issue for that unit while the others carry on.
//! The outcomes are folded into exactly one [`ToolResult`].

use crate::models::{FixCounts, Issue, ToolResult};
use crate::models::tool::ExecutionMode;
use crate::prepare::ExecutionContext;
use crate::process::{CommandRunner, RunOutcome};
use crate::registry::{CommandFn, ToolEntry};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tracing::{debug, info};

/// Progress is drawn only for at least this many units.
pub const PROGRESS_MIN_UNITS: usize = 2;

struct Unit {
    /// File path (or tool name for project-wide runs) used in synthetic issues.
    label: String,
    args: Vec<String>,
}

fn units(entry: &ToolEntry, ctx: &ExecutionContext) -> Vec<Unit> {
    match entry.definition.mode {
        ExecutionMode::PerFile => ctx
            .files
            .iter()
            .zip(&ctx.rel_files)
            .map(|(abs, rel)| Unit {
                label: rel.clone(),
                args: vec![abs.to_string_lossy().into_owned()],
            })
            .collect(),
        ExecutionMode::Batch => vec![Unit {
            label: entry.name().to_string(),
            args: ctx.rel_files.clone(),
        }],
        ExecutionMode::Project => vec![Unit {
            label: entry.name().to_string(),
            args: Vec::new(),
        }],
    }
}

fn first_line(output: &str) -> &str {
    output.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("")
}

/// Run one command; `Err` carries the synthetic record for a failed unit.
fn run_unit<R>(
    entry: &ToolEntry,
    command: CommandFn,
    unit: &Unit,
    ctx: &ExecutionContext,
    runner: &R,
) -> Result<(bool, String), Issue>
where
    R: CommandRunner + ?Sized,
{
    let mut cmd = command(&ctx.options);
    cmd.extend(unit.args.iter().cloned());
    debug!(tool = entry.name(), cmd = %cmd.join(" "), "running unit");
    match runner.run(&cmd, Some(&ctx.cwd), ctx.timeout()) {
        RunOutcome::Completed { success, output } => Ok((success, output)),
        RunOutcome::TimedOut => Err(Issue::timeout(&unit.label, ctx.timeout)),
        RunOutcome::Failed(err) => Err(Issue::execution_failure(
            &unit.label,
            format!("failed to run {}: {err}", cmd.first().map(String::as_str).unwrap_or("")),
        )),
    }
}

/// Run the check command for a unit and parse what it printed.
fn check_unit<R>(
    entry: &ToolEntry,
    unit: &Unit,
    ctx: &ExecutionContext,
    runner: &R,
) -> Result<Vec<Issue>, Issue>
where
    R: CommandRunner + ?Sized,
{
    let (success, output) = run_unit(entry, entry.plugin.check_command, unit, ctx, runner)?;
    match (entry.plugin.parse)(&output) {
        Ok(issues) if !success && issues.is_empty() => {
            let detail = first_line(&output);
            let message = if detail.is_empty() {
                "exited with a failure status and reported no issues".to_string()
            } else {
                format!("exited with a failure status: {detail}")
            };
            Err(Issue::execution_failure(&unit.label, message))
        }
        Ok(issues) => Ok(issues),
        Err(err) => Err(Issue::parse_failure(
            &unit.label,
            format!("could not parse {} output: {err}", entry.name()),
        )),
    }
}

/// Check → fix → re-check for one unit.
fn fix_unit<R>(
    entry: &ToolEntry,
    fix: CommandFn,
    unit: &Unit,
    ctx: &ExecutionContext,
    runner: &R,
) -> (Vec<Issue>, FixCounts, Option<Issue>)
where
    R: CommandRunner + ?Sized,
{
    let initial = match check_unit(entry, unit, ctx, runner) {
        Ok(issues) => issues,
        Err(failure) => return (Vec::new(), FixCounts::default(), Some(failure)),
    };
    if initial.is_empty() {
        return (initial, FixCounts::default(), None);
    }
    if let Err(failure) = run_unit(entry, fix, unit, ctx, runner) {
        let counts = FixCounts::unresolved(initial.len());
        return (initial, counts, Some(failure));
    }
    match check_unit(entry, unit, ctx, runner) {
        Ok(remaining) => {
            let counts = FixCounts::from_recheck(initial.len(), remaining.len());
            (remaining, counts, None)
        }
        Err(failure) => {
            let counts = FixCounts::unresolved(initial.len());
            (initial, counts, Some(failure))
        }
    }
}

fn progress_bar(tool: &str, len: usize, enabled: bool) -> ProgressBar {
    if !enabled || len < PROGRESS_MIN_UNITS {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::with_draw_target(Some(len as u64), ProgressDrawTarget::stderr());
    bar.set_style(
        ProgressStyle::with_template("{prefix:.bold} [{bar:30}] {pos}/{len} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    bar.set_prefix(tool.to_string());
    bar
}

fn failure_summary(failures: &[Issue], timeout: u64) -> Option<String> {
    if failures.is_empty() {
        return None;
    }
    let mut text = format!(
        "Skipped/failed {} file(s) due to execution failures (including timeouts) (timeout: {timeout}s):",
        failures.len()
    );
    for f in failures {
        text.push_str(&format!("\n  - {}: {}", f.file, f.message));
    }
    Some(text)
}

/// Run a prepared tool and aggregate every unit into one result.
pub fn execute<R>(entry: &ToolEntry, ctx: &ExecutionContext, runner: &R, progress: bool) -> ToolResult
where
    R: CommandRunner + ?Sized,
{
    let work = units(entry, ctx);
    let fix = if ctx.fix { entry.plugin.fix_command } else { None };
    info!(tool = entry.name(), units = work.len(), fix = fix.is_some(), "running");

    let bar = progress_bar(entry.name(), work.len(), progress);
    let mut issues: Vec<Issue> = Vec::new();
    let mut failures: Vec<Issue> = Vec::new();
    let mut counts = FixCounts::default();

    for unit in &work {
        bar.set_message(unit.label.clone());
        match fix {
            Some(fix_cmd) => {
                let (remaining, unit_counts, failure) = fix_unit(entry, fix_cmd, unit, ctx, runner);
                issues.extend(remaining);
                counts.add(unit_counts);
                failures.extend(failure);
            }
            None => match check_unit(entry, unit, ctx, runner) {
                Ok(found) => issues.extend(found),
                Err(failure) => failures.push(failure),
            },
        }
        bar.inc(1);
    }
    bar.finish_and_clear();

    let success = failures.is_empty() && issues.is_empty();
    let mut lines: Vec<String> = Vec::new();
    if fix.is_some() {
        if counts.fixed > 0 {
            lines.push(format!("Fixed {} issue(s)", counts.fixed));
        }
        if counts.remaining > 0 {
            lines.push(format!("Found {} issue(s) that cannot be auto-fixed", counts.remaining));
        }
    }
    lines.extend(failure_summary(&failures, ctx.timeout));

    issues.extend(failures);
    let mut result = ToolResult::new(entry.name(), success, issues);
    result = result.with_output(Some(lines.join("\n")));
    if fix.is_some() {
        result = result.with_fix_counts(counts);
    }
    info!(
        tool = entry.name(),
        success = result.success,
        issues = result.issues_count,
        "finished"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatters::LINT_TABLE;
    use crate::models::tool::ToolDefinition;
    use crate::models::{EXEC_CODE, PARSE_CODE, TIMEOUT_CODE};
    use crate::parsers::{ParseError, ParseFn};
    use crate::registry::ToolPlugin;
    use std::cell::RefCell;
    use std::collections::BTreeMap;
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    /// One issue per output line `file:msg`.
    fn lines_parser(output: &str) -> Result<Vec<Issue>, ParseError> {
        output
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| match l.split_once(':') {
                Some((f, m)) => Ok(Issue::new(f, m)),
                None => Err(ParseError::Shape(l.to_string())),
            })
            .collect()
    }

    fn check_cmd(_: &crate::models::tool::ToolOptions) -> Vec<String> {
        vec!["lint".into()]
    }

    fn fix_cmd(_: &crate::models::tool::ToolOptions) -> Vec<String> {
        vec!["lint".into(), "--fix".into()]
    }

    fn entry(mode: ExecutionMode, parse: ParseFn, can_fix: bool) -> ToolEntry {
        ToolEntry {
            definition: ToolDefinition {
                name: "lint".into(),
                can_check: true,
                can_fix,
                mode,
                ..Default::default()
            },
            plugin: ToolPlugin {
                parse,
                table: &LINT_TABLE,
                check_command: check_cmd,
                fix_command: can_fix.then_some(fix_cmd as CommandFn),
            },
            order: 0,
        }
    }

    fn ctx(files: &[&str], fix: bool) -> ExecutionContext {
        ExecutionContext {
            cwd: PathBuf::from("/repo"),
            files: files.iter().map(|f| PathBuf::from("/repo").join(f)).collect(),
            rel_files: files.iter().map(|f| f.to_string()).collect(),
            timeout: 7,
            options: BTreeMap::new(),
            fix,
        }
    }

    fn file_arg(cmd: &[String]) -> String {
        cmd.last().cloned().unwrap_or_default()
    }

    #[test]
    fn per_file_timeout_is_isolated() {
        let e = entry(ExecutionMode::PerFile, lines_parser, false);
        let c = ctx(&["1.py", "2.py", "3.py"], false);
        let runner = |cmd: &[String], cwd: Option<&Path>, _: Duration| {
            assert_eq!(cwd, Some(Path::new("/repo")));
            match file_arg(cmd).as_str() {
                "/repo/1.py" => RunOutcome::completed(false, "1.py:a\n1.py:b"),
                "/repo/2.py" => RunOutcome::TimedOut,
                _ => RunOutcome::completed(false, "3.py:c"),
            }
        };
        let res = execute(&e, &c, &runner, false);
        assert!(!res.success);
        assert_eq!(res.issues_count, 2 + 1 + 1);
        assert_eq!(res.issues_count, res.issues.len());
        let timeout = res.issues.iter().find(|i| i.code == TIMEOUT_CODE).unwrap();
        assert_eq!(timeout.file, "2.py");
        let out = res.output.unwrap();
        assert!(out.contains("Skipped/failed 1 file(s)"));
        assert!(out.contains("(timeout: 7s)"));
    }

    #[test]
    fn clean_run_succeeds_without_output() {
        let e = entry(ExecutionMode::PerFile, lines_parser, false);
        let res = execute(&e, &ctx(&["a.py", "b.py"], false), &|_: &[String], _: Option<&Path>, _: Duration| {
            RunOutcome::completed(true, "")
        }, false);
        assert!(res.success);
        assert_eq!(res.issues_count, 0);
        assert!(res.output.is_none());
        assert!(res.fixed_issues_count.is_none());
    }

    #[test]
    fn failure_status_without_issues_is_an_execution_failure() {
        let e = entry(ExecutionMode::PerFile, lines_parser, false);
        let res = execute(&e, &ctx(&["a.py"], false), &|_: &[String], _: Option<&Path>, _: Duration| {
            RunOutcome::completed(false, "")
        }, false);
        assert!(!res.success);
        assert_eq!(res.issues[0].code, EXEC_CODE);
    }

    #[test]
    fn unparsable_output_and_spawn_errors_are_recorded() {
        let e = entry(ExecutionMode::PerFile, lines_parser, false);
        let runner = |cmd: &[String], _: Option<&Path>, _: Duration| match file_arg(cmd).as_str() {
            "/repo/a.py" => RunOutcome::completed(true, "garbage without colon"),
            _ => RunOutcome::Failed(std::io::Error::new(std::io::ErrorKind::NotFound, "gone")),
        };
        let res = execute(&e, &ctx(&["a.py", "b.py"], false), &runner, false);
        let codes: Vec<&str> = res.issues.iter().map(|i| i.code.as_str()).collect();
        assert_eq!(codes, vec![PARSE_CODE, EXEC_CODE]);
        assert!(!res.success);
    }

    #[test]
    fn batch_sees_relative_files_once() {
        let e = entry(ExecutionMode::Batch, lines_parser, false);
        let calls = RefCell::new(Vec::new());
        let runner = |cmd: &[String], _: Option<&Path>, _: Duration| {
            calls.borrow_mut().push(cmd.to_vec());
            RunOutcome::completed(false, "a.py:x")
        };
        let res = execute(&e, &ctx(&["a.py", "sub/b.py"], false), &runner, false);
        assert_eq!(calls.borrow().len(), 1);
        assert_eq!(calls.borrow()[0], vec!["lint", "a.py", "sub/b.py"]);
        assert_eq!(res.issues_count, 1);
    }

    #[test]
    fn fix_counts_track_recheck() {
        let e = entry(ExecutionMode::Project, lines_parser, true);
        let checks = RefCell::new(0);
        let runner = |cmd: &[String], _: Option<&Path>, _: Duration| {
            if cmd.iter().any(|a| a == "--fix") {
                return RunOutcome::completed(true, "");
            }
            *checks.borrow_mut() += 1;
            if *checks.borrow() == 1 {
                RunOutcome::completed(false, "a:1\na:2\na:3\nb:4\nb:5")
            } else {
                RunOutcome::completed(false, "b:4\nb:5")
            }
        };
        let res = execute(&e, &ctx(&["a.py", "b.py"], true), &runner, false);
        assert_eq!(res.initial_issues_count, Some(5));
        assert_eq!(res.fixed_issues_count, Some(3));
        assert_eq!(res.remaining_issues_count, Some(2));
        assert_eq!(res.issues_count, 2);
        assert!(!res.success);
        assert!(res.output.unwrap().contains("Fixed 3 issue(s)"));
    }

    #[test]
    fn fix_timeout_keeps_everything_remaining() {
        let e = entry(ExecutionMode::PerFile, lines_parser, true);
        let runner = |cmd: &[String], _: Option<&Path>, _: Duration| {
            if cmd.iter().any(|a| a == "--fix") {
                RunOutcome::TimedOut
            } else {
                RunOutcome::completed(false, "a.py:1\na.py:2")
            }
        };
        let res = execute(&e, &ctx(&["a.py"], true), &runner, false);
        assert_eq!(res.initial_issues_count, Some(2));
        assert_eq!(res.fixed_issues_count, Some(0));
        assert_eq!(res.remaining_issues_count, Some(2));
        assert_eq!(res.issues_count, 3);
        assert!(res.issues.iter().any(|i| i.code == TIMEOUT_CODE));
    }

    #[test]
    fn fix_that_adds_findings_keeps_counts_closed() {
        let e = entry(ExecutionMode::Project, lines_parser, true);
        let checks = RefCell::new(0);
        let runner = |cmd: &[String], _: Option<&Path>, _: Duration| {
            if cmd.iter().any(|a| a == "--fix") {
                return RunOutcome::completed(true, "");
            }
            *checks.borrow_mut() += 1;
            if *checks.borrow() == 1 {
                RunOutcome::completed(false, "a:1")
            } else {
                RunOutcome::completed(false, "a:1\na:2\na:3")
            }
        };
        let res = execute(&e, &ctx(&["a.py"], true), &runner, false);
        let (i, f, r) = (
            res.initial_issues_count.unwrap(),
            res.fixed_issues_count.unwrap(),
            res.remaining_issues_count.unwrap(),
        );
        assert_eq!(i, f + r);
        assert_eq!(r, 3);
    }

    #[test]
    fn hidden_progress_for_single_unit() {
        assert!(progress_bar("t", 1, true).is_hidden());
        assert!(progress_bar("t", 5, false).is_hidden());
    }
}
