//! Configuration discovery and effective settings resolution.
//!
//! metalint reads `metalint.toml|yaml|yml` from the repository root (or the
//! closest ancestor holding one, stopping at `.git`) and merges it with CLI
//! flags into an [`Effective`] config.
//!
//! Defaults:
//! - `tools`: every registered tool that supports the action
//! - `exclude`: none; `include_venv`: false
//! - `output_format`: `grid`
//! - `timeout`: per tool; `version_timeout`: 30s
//! - `ignore_conflicts` / `strict`: false
//! - `ignore_file`: `.metalint-ignore`
//!
//! Overrides precedence: CLI > config file > defaults.

use crate::error::{Error, Result};
use crate::exclude::{absolute, ExclusionRuleSet, IgnoreFile, IGNORE_FILE_NAME};
use crate::models::tool::{normalize_tool_id, ToolOptions};
use crate::prepare::{RunOptions, ToolSettings};
use crate::version;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const CONFIG_FILES: [&str; 3] = ["metalint.toml", "metalint.yaml", "metalint.yml"];

#[derive(Debug, Default, Deserialize, Clone)]
/// Per-tool section under `[tool.<id>]`.
pub struct ToolCfg {
    pub enabled: Option<bool>,
    pub timeout: Option<u64>,
    #[serde(default)]
    pub options: ToolOptions,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `metalint.toml|yaml`.
pub struct MetalintConfig {
    pub tools: Option<Vec<String>>,
    pub exclude: Option<Vec<String>>,
    pub include_venv: Option<bool>,
    pub output_format: Option<String>,
    pub timeout: Option<u64>,
    pub ignore_conflicts: Option<bool>,
    pub strict: Option<bool>,
    pub ignore_file: Option<String>,
    pub version_timeout: Option<u64>,
    #[serde(default)]
    pub tool: BTreeMap<String, ToolCfg>,
}

#[derive(Debug, Default, Clone)]
/// Values given on the command line; `None` defers to the config file.
pub struct Overrides {
    pub repo_root: Option<String>,
    pub tools: Option<Vec<String>>,
    pub exclude: Option<Vec<String>>,
    pub include_venv: Option<bool>,
    pub output_format: Option<String>,
    pub timeout: Option<u64>,
    pub ignore_conflicts: Option<bool>,
    pub strict: Option<bool>,
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by commands after applying precedence.
pub struct Effective {
    pub repo_root: PathBuf,
    pub config_path: Option<PathBuf>,
    /// Explicit tool list; empty means the default set.
    pub tools: Vec<String>,
    /// Tools with `enabled = false`, dropped from the default set.
    pub disabled: Vec<String>,
    pub exclude: Vec<String>,
    pub include_venv: bool,
    pub output_format: String,
    pub timeout: Option<u64>,
    pub ignore_conflicts: bool,
    pub strict: bool,
    pub ignore_file: String,
    pub version_timeout: u64,
    /// Keyed by normalized tool id.
    pub tool_settings: BTreeMap<String, ToolSettings>,
}

/// Walk upward from `start` to detect the repository root.
///
/// Stops when a `metalint.toml|yaml|yml` or a `.git` directory is found.
/// A relative `start` is resolved against the current directory first.
pub fn detect_repo_root(start: &Path) -> PathBuf {
    let start = absolute(start);
    let mut cur = start.as_path();
    loop {
        if CONFIG_FILES.iter().any(|name| cur.join(name).exists()) {
            return cur.to_path_buf();
        }
        if cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start,
        }
    }
}

/// Path of the config file under `root`, if any.
pub fn config_path(root: &Path) -> Option<PathBuf> {
    CONFIG_FILES
        .iter()
        .map(|name| root.join(name))
        .find(|p| p.is_file())
}

/// Load `MetalintConfig` from `root`; a present but broken file is an error.
pub fn load_config(root: &Path) -> Result<Option<MetalintConfig>> {
    let Some(path) = config_path(root) else {
        return Ok(None);
    };
    let text = fs::read_to_string(&path).map_err(|e| Error::Config {
        path: path.clone(),
        message: e.to_string(),
    })?;
    let parsed = if path.extension().is_some_and(|e| e == "toml") {
        toml::from_str::<MetalintConfig>(&text).map_err(|e| e.to_string())
    } else {
        serde_yaml::from_str::<MetalintConfig>(&text).map_err(|e| e.to_string())
    };
    parsed
        .map(Some)
        .map_err(|message| Error::Config { path, message })
}

/// Split `a,b , c` style CLI lists.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults.
pub fn resolve_effective(cli: &Overrides) -> Result<Effective> {
    let start = PathBuf::from(cli.repo_root.as_deref().unwrap_or("."));
    let repo_root = detect_repo_root(&start);
    let cfg = load_config(&repo_root)?.unwrap_or_default();

    let disabled: Vec<String> = cfg
        .tool
        .iter()
        .filter(|(_, t)| t.enabled == Some(false))
        .map(|(id, _)| id.clone())
        .collect();

    let tools = match (&cli.tools, &cfg.tools) {
        (Some(explicit), _) => explicit.clone(),
        (None, Some(listed)) => listed
            .iter()
            .filter(|id| {
                !disabled
                    .iter()
                    .any(|d| normalize_tool_id(d) == normalize_tool_id(id))
            })
            .cloned()
            .collect(),
        (None, None) => Vec::new(),
    };

    let tool_settings = cfg
        .tool
        .iter()
        .map(|(id, t)| {
            (
                normalize_tool_id(id),
                ToolSettings {
                    timeout: t.timeout,
                    options: t.options.clone(),
                },
            )
        })
        .collect();

    let version_timeout = match std::env::var(version::VERSION_TIMEOUT_ENV) {
        Ok(raw) => version::version_timeout_from(Some(&raw)),
        Err(_) => cfg
            .version_timeout
            .filter(|t| *t > 0)
            .unwrap_or(version::DEFAULT_VERSION_TIMEOUT),
    };

    Ok(Effective {
        config_path: config_path(&repo_root),
        tools,
        disabled,
        exclude: cli.exclude.clone().or(cfg.exclude).unwrap_or_default(),
        include_venv: cli.include_venv.or(cfg.include_venv).unwrap_or(false),
        output_format: cli
            .output_format
            .clone()
            .or(cfg.output_format)
            .unwrap_or_else(|| "grid".to_string()),
        timeout: cli.timeout.or(cfg.timeout),
        ignore_conflicts: cli.ignore_conflicts.or(cfg.ignore_conflicts).unwrap_or(false),
        strict: cli.strict.or(cfg.strict).unwrap_or(false),
        ignore_file: cfg
            .ignore_file
            .unwrap_or_else(|| IGNORE_FILE_NAME.to_string()),
        version_timeout,
        tool_settings,
        repo_root,
    })
}

/// Run-wide options for one `check`/`fmt` invocation.
///
/// The ignore file is looked up from the repository root upward; a missing
/// one is fine, an unreadable one is an error.
pub fn run_options(eff: &Effective, fix: bool, progress: bool) -> Result<RunOptions> {
    let ignore = match IgnoreFile::find(&eff.repo_root, &eff.ignore_file) {
        Some(path) => Some(IgnoreFile::load(&path)?),
        None => {
            debug!(name = %eff.ignore_file, "no ignore file");
            None
        }
    };
    let rules = ExclusionRuleSet::new(&eff.exclude)?
        .with_ignore_file(ignore)
        .include_dependency_dirs(eff.include_venv);
    Ok(RunOptions {
        root: eff.repo_root.clone(),
        fix,
        rules,
        timeout: eff.timeout,
        tools: eff.tool_settings.clone(),
        version_timeout: Duration::from_secs(eff.version_timeout),
        progress,
    })
}
