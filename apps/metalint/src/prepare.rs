//! Per-tool execution preparation.
//!
//! Turns a registry entry plus the run-wide options into either a ready
//! [`ExecutionContext`] or an early terminal [`ToolResult`]: the version gate
//! failed, or no file matched the tool's patterns.

use crate::error::{Error, Result};
use crate::exclude::{self, ExclusionRuleSet};
use crate::models::tool::{normalize_tool_id, ToolDefinition, ToolOptions};
use crate::models::ToolResult;
use crate::process::CommandRunner;
use crate::registry::ToolEntry;
use crate::version;
use serde_json::Value as Json;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Default)]
/// Per-tool overrides coming from the config file.
pub struct ToolSettings {
    pub timeout: Option<u64>,
    pub options: ToolOptions,
}

#[derive(Debug, Clone)]
/// Run-wide knobs shared by every tool of one invocation.
pub struct RunOptions {
    /// Invocation root; cwd for tools that run from the root.
    pub root: PathBuf,
    pub fix: bool,
    pub rules: ExclusionRuleSet,
    /// Explicit `--timeout`, beats everything else.
    pub timeout: Option<u64>,
    /// Keyed by normalized tool id.
    pub tools: BTreeMap<String, ToolSettings>,
    pub version_timeout: Duration,
    pub progress: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            fix: false,
            rules: ExclusionRuleSet::default(),
            timeout: None,
            tools: BTreeMap::new(),
            version_timeout: Duration::from_secs(version::DEFAULT_VERSION_TIMEOUT),
            progress: false,
        }
    }
}

impl RunOptions {
    pub fn settings(&self, tool: &str) -> Option<&ToolSettings> {
        self.tools.get(&normalize_tool_id(tool))
    }

    /// Explicit override, then per-tool configured, then the tool default.
    pub fn timeout_for(&self, def: &ToolDefinition) -> u64 {
        self.timeout
            .or_else(|| self.settings(&def.name).and_then(|s| s.timeout))
            .unwrap_or_else(|| def.effective_timeout())
    }
}

#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub cwd: PathBuf,
    /// Absolute paths, sorted.
    pub files: Vec<PathBuf>,
    /// `files` relative to `cwd`, in the same order.
    pub rel_files: Vec<String>,
    pub timeout: u64,
    pub options: ToolOptions,
    pub fix: bool,
}

impl ExecutionContext {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

#[derive(Debug)]
pub enum Preparation {
    Ready(ExecutionContext),
    /// The tool must not run; this is its result.
    Done(ToolResult),
}

fn kind(v: &Json) -> &'static str {
    match v {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

/// Merge user overrides over the declared defaults.
///
/// Keys the tool does not declare are rejected, as are values whose JSON type
/// differs from a non-null default.
pub fn effective_options(def: &ToolDefinition, overrides: &ToolOptions) -> Result<ToolOptions> {
    let mut merged = def.default_options.clone();
    for (key, value) in overrides {
        let Some(default) = def.default_options.get(key) else {
            let known: Vec<&str> = def.default_options.keys().map(String::as_str).collect();
            return Err(Error::InvalidOption {
                tool: def.name.clone(),
                message: format!("unknown option '{key}' (known: {})", known.join(", ")),
            });
        };
        if !default.is_null() && !value.is_null() && kind(default) != kind(value) {
            return Err(Error::InvalidOption {
                tool: def.name.clone(),
                message: format!(
                    "option '{key}' expects a {}, got a {}",
                    kind(default),
                    kind(value)
                ),
            });
        }
        merged.insert(key.clone(), value.clone());
    }
    Ok(merged)
}

/// `No .py/.pyi files found to check.` style message.
pub fn no_files_message(patterns: &[String], fix: bool) -> String {
    let exts: Vec<&str> = patterns
        .iter()
        .filter(|p| p.starts_with("*."))
        .map(|p| &p[1..])
        .collect();
    let what = if exts.is_empty() {
        "files".to_string()
    } else {
        format!("{} files", exts.join("/"))
    };
    let verb = if fix { "fix" } else { "check" };
    format!("No {what} found to {verb}.")
}

/// Deepest directory containing every file.
pub fn common_parent(files: &[PathBuf]) -> Option<PathBuf> {
    let mut parents = files.iter().filter_map(|f| f.parent());
    let mut common: PathBuf = parents.next()?.to_path_buf();
    for dir in parents {
        while !dir.starts_with(&common) {
            if !common.pop() {
                return None;
            }
        }
    }
    Some(common)
}

fn relative(file: &Path, cwd: &Path) -> String {
    pathdiff::diff_paths(file, cwd)
        .unwrap_or_else(|| file.to_path_buf())
        .to_string_lossy()
        .replace('\\', "/")
}

/// Version gate, file discovery, then cwd/timeout resolution.
pub fn prepare<R>(
    entry: &ToolEntry,
    paths: &[PathBuf],
    opts: &RunOptions,
    runner: &R,
) -> Result<Preparation>
where
    R: CommandRunner + ?Sized,
{
    let def = &entry.definition;
    let overrides = opts
        .settings(&def.name)
        .map(|s| s.options.clone())
        .unwrap_or_default();
    let options = effective_options(def, &overrides)?;

    if let Some(skipped) = version::check(def, runner, opts.version_timeout) {
        return Ok(Preparation::Done(skipped));
    }

    let files = exclude::discover(paths, &def.file_patterns, &opts.rules)?;
    if files.is_empty() {
        debug!(tool = %def.name, "no matching files");
        return Ok(Preparation::Done(ToolResult::message(
            &def.name,
            no_files_message(&def.file_patterns, opts.fix),
        )));
    }

    let root = exclude::absolute(&opts.root);
    let cwd = if def.run_from_root {
        root
    } else {
        common_parent(&files).unwrap_or(root)
    };
    let rel_files = files.iter().map(|f| relative(f, &cwd)).collect();
    let timeout = opts.timeout_for(def);
    debug!(tool = %def.name, files = files.len(), cwd = %cwd.display(), timeout, "prepared");

    Ok(Preparation::Ready(ExecutionContext {
        cwd,
        files,
        rel_files,
        timeout,
        options,
        fix: opts.fix,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::RunOutcome;
    use crate::registry::tests::{def, plugin};
    use crate::registry::ToolRegistry;
    use serde_json::json;
    use std::fs;

    fn no_run(_: &[String], _: Option<&Path>, _: Duration) -> RunOutcome {
        RunOutcome::completed(true, "")
    }

    fn registry_with(d: ToolDefinition) -> ToolRegistry {
        let mut reg = ToolRegistry::new();
        reg.register(d, plugin()).unwrap();
        reg
    }

    #[test]
    fn zero_files_is_a_successful_message() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();
        let reg = registry_with(def("pyish", 1));
        let opts = RunOptions {
            root: dir.path().to_path_buf(),
            ..Default::default()
        };
        let prep = prepare(reg.get("pyish").unwrap(), &[dir.path().to_path_buf()], &opts, &no_run).unwrap();
        let Preparation::Done(res) = prep else {
            panic!("expected an early result");
        };
        assert!(res.success);
        assert_eq!(res.issues_count, 0);
        assert_eq!(res.output.as_deref(), Some("No .py files found to check."));
    }

    #[test]
    fn messages_name_extensions() {
        let pats = vec!["*.py".to_string(), "*.pyi".to_string()];
        assert_eq!(no_files_message(&pats, false), "No .py/.pyi files found to check.");
        assert_eq!(no_files_message(&pats, true), "No .py/.pyi files found to fix.");
        assert_eq!(no_files_message(&["Dockerfile".into()], false), "No files found to check.");
    }

    #[test]
    fn ready_context_has_common_cwd_and_relative_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("pkg/sub")).unwrap();
        fs::write(dir.path().join("pkg/a.py"), "").unwrap();
        fs::write(dir.path().join("pkg/sub/b.py"), "").unwrap();
        let reg = registry_with(def("pyish", 1));
        let opts = RunOptions {
            root: dir.path().to_path_buf(),
            timeout: None,
            ..Default::default()
        };
        let prep = prepare(reg.get("pyish").unwrap(), &[dir.path().to_path_buf()], &opts, &no_run).unwrap();
        let Preparation::Ready(ctx) = prep else {
            panic!("expected a ready context");
        };
        assert!(ctx.cwd.ends_with("pkg"));
        assert_eq!(ctx.rel_files, vec!["a.py", "sub/b.py"]);
        assert_eq!(ctx.timeout, crate::models::tool::DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn timeout_precedence() {
        let mut d = def("t", 1);
        d.default_timeout = 15;
        let mut opts = RunOptions::default();
        assert_eq!(opts.timeout_for(&d), 15);
        opts.tools.insert(
            "t".into(),
            ToolSettings {
                timeout: Some(20),
                ..Default::default()
            },
        );
        assert_eq!(opts.timeout_for(&d), 20);
        opts.timeout = Some(5);
        assert_eq!(opts.timeout_for(&d), 5);
    }

    #[test]
    fn options_are_validated_against_defaults() {
        let mut d = def("shellcheck", 1);
        d.default_options.insert("severity".into(), json!("style"));
        d.default_options.insert("exclude".into(), Json::Null);

        let mut ok = ToolOptions::new();
        ok.insert("exclude".into(), json!(["SC1090"]));
        ok.insert("severity".into(), json!("warning"));
        let merged = effective_options(&d, &ok).unwrap();
        assert_eq!(merged["severity"], json!("warning"));

        let mut unknown = ToolOptions::new();
        unknown.insert("colour".into(), json!(true));
        assert!(matches!(effective_options(&d, &unknown), Err(Error::InvalidOption { .. })));

        let mut wrong_type = ToolOptions::new();
        wrong_type.insert("severity".into(), json!(3));
        assert!(matches!(effective_options(&d, &wrong_type), Err(Error::InvalidOption { .. })));
    }

    #[test]
    fn common_parent_of_siblings_and_nested() {
        let files = vec![PathBuf::from("/r/a/x.py"), PathBuf::from("/r/a/b/y.py"), PathBuf::from("/r/c/z.py")];
        assert_eq!(common_parent(&files), Some(PathBuf::from("/r")));
        assert_eq!(common_parent(&files[..1]), Some(PathBuf::from("/r/a")));
        assert_eq!(common_parent(&[]), None);
    }
}
