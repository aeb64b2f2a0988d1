//! One invocation end to end: schedule, prepare, execute, collect.

use crate::error::{Error, Result};
use crate::execute;
use crate::models::tool::normalize_tool_id;
use crate::models::{SkipReason, ToolResult};
use crate::prepare::{self, Preparation, RunOptions};
use crate::process::CommandRunner;
use crate::registry::ToolRegistry;
use crate::scheduler::{self, Schedule};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Check,
    Fix,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Check => "check",
            Action::Fix => "fix",
        }
    }

    pub fn is_fix(self) -> bool {
        self == Action::Fix
    }
}

#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Tool ids; empty means every tool that supports the action.
    pub tools: Vec<String>,
    /// Left out of the default set; explicit requests still run them.
    pub disabled: Vec<String>,
    pub paths: Vec<PathBuf>,
    pub action: Action,
    pub ignore_conflicts: bool,
    /// Version gate failures abort the run.
    pub strict: bool,
}

#[derive(Debug)]
pub struct RunReport {
    pub action: Action,
    /// Executed tools in schedule order, then conflict-skipped ones.
    pub results: Vec<ToolResult>,
}

impl RunReport {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn total_issues(&self) -> usize {
        self.results.iter().map(|r| r.issues_count).sum()
    }

    pub fn skipped_tools(&self) -> usize {
        self.results.iter().filter(|r| r.skipped).count()
    }

    /// 0 when every tool succeeded and none was gated out, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        let ok = self
            .results
            .iter()
            .all(|r| r.success && !r.is_version_skip());
        if ok {
            0
        } else {
            1
        }
    }
}

fn conflict_result(name: &str, winner: &str) -> ToolResult {
    ToolResult::skipped(
        name,
        SkipReason::Conflict {
            winner: winner.to_string(),
        },
        format!("Skipped: conflicts with {winner} (use --ignore-conflicts to run both)"),
    )
}

/// Run every requested tool over `request.paths`.
///
/// Configuration problems (unknown tool, invalid option or pattern) are
/// reported before any subprocess starts. Everything that goes wrong while
/// a tool runs ends up in that tool's result instead.
pub fn run<R>(
    registry: &ToolRegistry,
    request: &RunRequest,
    opts: &RunOptions,
    runner: &R,
) -> Result<RunReport>
where
    R: CommandRunner + ?Sized,
{
    let fix = request.action.is_fix();
    let mut results = Vec::new();

    let requested: Vec<String> = if request.tools.is_empty() {
        let disabled: Vec<String> = request.disabled.iter().map(|d| normalize_tool_id(d)).collect();
        let defaults: Vec<String> = registry
            .all()
            .iter()
            .filter(|e| e.definition.supports(fix))
            .filter(|e| !disabled.contains(&normalize_tool_id(e.name())))
            .map(|e| e.name().to_string())
            .collect();
        if defaults.is_empty() {
            info!("no enabled tool supports {}", request.action.as_str());
            return Ok(RunReport {
                action: request.action,
                results,
            });
        }
        defaults
    } else {
        // Tools that cannot perform the action stay out of conflict resolution.
        let mut supported = Vec::new();
        for name in &request.tools {
            let entry = registry.get(name)?;
            if entry.definition.supports(fix) {
                supported.push(name.clone());
            } else if !results.iter().any(|r: &ToolResult| r.name == entry.name()) {
                results.push(ToolResult::message(
                    entry.name(),
                    format!("{} does not support {}; skipped.", entry.name(), request.action.as_str()),
                ));
            }
        }
        supported
    };

    let schedule = if requested.is_empty() {
        Schedule::default()
    } else {
        scheduler::order(registry, &requested, request.ignore_conflicts)?
    };
    let runnable = schedule.ordered.clone();

    for entry in &runnable {
        let overrides = opts
            .settings(entry.name())
            .map(|s| s.options.clone())
            .unwrap_or_default();
        prepare::effective_options(&entry.definition, &overrides)?;
    }

    if runnable.is_empty() {
        info!("nothing to run");
    }

    for entry in runnable {
        let result = match prepare::prepare(entry, &request.paths, opts, runner)? {
            Preparation::Ready(ctx) => execute::execute(entry, &ctx, runner, opts.progress),
            Preparation::Done(result) => {
                if request.strict && result.is_version_skip() {
                    return Err(Error::VersionGate {
                        tool: entry.name().to_string(),
                        message: result.output.clone().unwrap_or_default(),
                    });
                }
                result
            }
        };
        results.push(result);
    }

    for skipped in &schedule.skipped {
        warn!(tool = skipped.entry.name(), winner = %skipped.winner, "skipped by conflict");
        results.push(conflict_result(skipped.entry.name(), &skipped.winner));
    }

    Ok(RunReport {
        action: request.action,
        results,
    })
}
