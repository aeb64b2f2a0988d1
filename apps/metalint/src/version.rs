//! Minimum-version gate.
//!
//! Before a tool runs, its version command is executed and the reported
//! version compared against the declared minimum. Any failure along the way
//! becomes a distinct [`SkipReason`] on a skipped result; the gate never
//! returns an error by itself.

use crate::models::tool::ToolDefinition;
use crate::models::{SkipReason, ToolResult};
use crate::process::{CommandRunner, RunOutcome};
use regex::Regex;
use std::cmp::Ordering;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, warn};

pub const VERSION_TIMEOUT_ENV: &str = "METALINT_VERSION_TIMEOUT";
pub const DEFAULT_VERSION_TIMEOUT: u64 = 30;

const GENERIC_VERSION: &str = r"\b(\d+(?:\.\d+){0,3})\b";

fn generic_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(GENERIC_VERSION).expect("static regex is valid"))
}

fn leading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?i)v?(\d+(?:\.\d+)*)").expect("static regex is valid"))
}

/// Timeout for version commands given the raw env value; invalid or
/// non-positive values fall back to the default.
pub fn version_timeout_from(raw: Option<&str>) -> u64 {
    let Some(raw) = raw else {
        return DEFAULT_VERSION_TIMEOUT;
    };
    match raw.trim().parse::<u64>() {
        Ok(n) if n >= 1 => n,
        _ => {
            warn!(value = raw, "invalid {VERSION_TIMEOUT_ENV}; using {DEFAULT_VERSION_TIMEOUT}s");
            DEFAULT_VERSION_TIMEOUT
        }
    }
}

/// Numeric components of a version string. A leading `v` and anything after
/// the dotted numbers (pre-release tags, build metadata) are ignored.
pub fn parse_version(version: &str) -> Option<Vec<u64>> {
    let caps = leading_re().captures(version.trim())?;
    caps[1].split('.').map(|p| p.parse().ok()).collect()
}

/// Component-wise comparison with the shorter side zero-padded.
pub fn compare_versions(a: &str, b: &str) -> Option<Ordering> {
    let (mut a, mut b) = (parse_version(a)?, parse_version(b)?);
    let len = a.len().max(b.len());
    a.resize(len, 0);
    b.resize(len, 0);
    Some(a.cmp(&b))
}

/// Pull a version out of `--version` output, using the tool's own pattern
/// when it has one and the generic numeric pattern otherwise.
pub fn extract_version(output: &str, pattern: Option<&str>) -> Option<String> {
    if let Some(pat) = pattern {
        match Regex::new(pat) {
            Ok(re) => {
                return re
                    .captures(output)
                    .and_then(|c| c.get(1))
                    .map(|m| m.as_str().to_string());
            }
            Err(err) => warn!(pattern = pat, %err, "bad version pattern, using generic"),
        }
    }
    generic_re()
        .captures(output)
        .map(|c| c[1].to_string())
}

fn reason_text(reason: &SkipReason) -> String {
    match reason {
        SkipReason::NotInPath => "executable not found in PATH".into(),
        SkipReason::CommandFailed => "version command failed".into(),
        SkipReason::NoVersionParsed => "could not parse version".into(),
        SkipReason::BelowMinimum { found, required } => {
            format!("version {found} is below the minimum {required}")
        }
        SkipReason::Timeout => "version command timed out".into(),
        SkipReason::OsError => "version command could not be run".into(),
        SkipReason::Conflict { winner } => format!("conflicts with {winner}"),
    }
}

/// The gate verdict: `None` when the tool may run.
pub fn gate_reason<R>(def: &ToolDefinition, runner: &R, timeout: Duration) -> Option<SkipReason>
where
    R: CommandRunner + ?Sized,
{
    let min = def.min_version.as_deref()?;
    if def.version_command.is_empty() {
        return None;
    }
    let output = match runner.run(&def.version_command, None, timeout) {
        RunOutcome::Completed { success: true, output } => output,
        RunOutcome::Completed { success: false, .. } => return Some(SkipReason::CommandFailed),
        RunOutcome::TimedOut => return Some(SkipReason::Timeout),
        failed @ RunOutcome::Failed(_) if failed.is_not_found() => {
            return Some(SkipReason::NotInPath)
        }
        RunOutcome::Failed(err) => {
            debug!(tool = %def.name, %err, "version command error");
            return Some(SkipReason::OsError);
        }
    };
    let Some(found) = extract_version(&output, def.version_pattern.as_deref()) else {
        return Some(SkipReason::NoVersionParsed);
    };
    match compare_versions(&found, min) {
        Some(Ordering::Less) => Some(SkipReason::BelowMinimum {
            found,
            required: min.to_string(),
        }),
        Some(_) => {
            debug!(tool = %def.name, version = %found, "version ok");
            None
        }
        None => Some(SkipReason::NoVersionParsed),
    }
}

/// Run the gate and turn a failure into the skipped result for the tool.
pub fn check<R>(def: &ToolDefinition, runner: &R, timeout: Duration) -> Option<ToolResult>
where
    R: CommandRunner + ?Sized,
{
    let reason = gate_reason(def, runner, timeout)?;
    let message = format!(
        "Skipping {}: {}. Minimum required: {}. {}",
        def.name,
        reason_text(&reason),
        def.min_version.as_deref().unwrap_or("-"),
        def.install_hint()
    );
    warn!(tool = %def.name, reason = %reason, "version gate failed");
    Some(ToolResult::skipped(&def.name, reason, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::path::Path;

    fn def(min: Option<&str>, pattern: Option<&str>) -> ToolDefinition {
        ToolDefinition {
            name: "black".into(),
            version_command: vec!["black".into(), "--version".into()],
            version_pattern: pattern.map(String::from),
            min_version: min.map(String::from),
            ..Default::default()
        }
    }

    fn answering(outcome: fn() -> RunOutcome) -> impl Fn(&[String], Option<&Path>, Duration) -> RunOutcome {
        move |_: &[String], _: Option<&Path>, _: Duration| outcome()
    }

    const T: Duration = Duration::from_secs(1);

    #[test]
    fn compare_pads_and_strips() {
        assert_eq!(compare_versions("1.2", "1.2.0"), Some(Ordering::Equal));
        assert_eq!(compare_versions("v2.0.1", "2.0"), Some(Ordering::Greater));
        assert_eq!(compare_versions("0.9.0-rc1", "0.10"), Some(Ordering::Less));
        assert_eq!(compare_versions("abc", "1"), None);
        assert_eq!(parse_version("V3.4beta"), Some(vec![3, 4]));
    }

    #[test]
    fn extraction_prefers_tool_pattern() {
        let out = "black, 24.1.0 (compiled: yes)\nPython (CPython) 3.12.1";
        assert_eq!(
            extract_version(out, Some(r"(?i)black,\s+(\d+(?:\.\d+)*)")).as_deref(),
            Some("24.1.0")
        );
        assert_eq!(extract_version("ShellCheck - version: 0.9.0", None).as_deref(), Some("0.9.0"));
        assert_eq!(extract_version("no digits", None), None);
    }

    #[test]
    fn gate_outcomes_are_distinct() {
        let d = def(Some("23.0"), None);
        let cases: [(fn() -> RunOutcome, SkipReason); 6] = [
            (|| RunOutcome::Failed(io::Error::new(io::ErrorKind::NotFound, "x")), SkipReason::NotInPath),
            (|| RunOutcome::Failed(io::Error::new(io::ErrorKind::PermissionDenied, "x")), SkipReason::OsError),
            (|| RunOutcome::completed(false, "boom"), SkipReason::CommandFailed),
            (|| RunOutcome::completed(true, "black unknown"), SkipReason::NoVersionParsed),
            (|| RunOutcome::TimedOut, SkipReason::Timeout),
            (
                || RunOutcome::completed(true, "black, 22.3.0"),
                SkipReason::BelowMinimum { found: "22.3.0".into(), required: "23.0".into() },
            ),
        ];
        for (outcome, expected) in cases {
            assert_eq!(gate_reason(&d, &answering(outcome), T), Some(expected));
        }
        assert_eq!(gate_reason(&d, &answering(|| RunOutcome::completed(true, "black, 23.1")), T), None);
    }

    #[test]
    fn no_minimum_means_no_gate() {
        let d = def(None, None);
        let never = |_: &[String], _: Option<&Path>, _: Duration| -> RunOutcome {
            panic!("version command must not run")
        };
        assert!(check(&d, &never, T).is_none());
    }

    #[test]
    fn skipped_result_explains_itself() {
        let d = def(Some("23.0"), None);
        let res = check(&d, &answering(|| RunOutcome::TimedOut), T).unwrap();
        assert!(res.skipped && res.success);
        assert_eq!(res.skip_reason, Some(SkipReason::Timeout));
        let text = res.output.unwrap();
        assert!(text.contains("Minimum required: 23.0"));
        assert!(text.contains("Install black"));
    }

    #[test]
    fn timeout_env_validation() {
        assert_eq!(version_timeout_from(None), 30);
        assert_eq!(version_timeout_from(Some("5")), 5);
        assert_eq!(version_timeout_from(Some("0")), 30);
        assert_eq!(version_timeout_from(Some("soon")), 30);
    }
}
