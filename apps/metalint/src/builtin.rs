//! Built-in tool definitions.

use crate::formatters::{FILE_TABLE, LINE_TABLE, LINT_TABLE};
use crate::models::tool::{ExecutionMode, ToolCategory, ToolDefinition, ToolOptions};
use crate::parsers;
use crate::registry::{ToolPlugin, ToolRegistry};
use serde_json::{json, Value as Json};
use tracing::warn;

fn strs(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn options(pairs: &[(&str, Json)]) -> ToolOptions {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn opt_str<'a>(opts: &'a ToolOptions, key: &str) -> Option<&'a str> {
    opts.get(key).and_then(Json::as_str).filter(|s| !s.is_empty())
}

fn opt_bool(opts: &ToolOptions, key: &str) -> bool {
    opts.get(key).and_then(Json::as_bool).unwrap_or(false)
}

/// Accepts either a JSON array or a comma-separated string.
fn opt_list(opts: &ToolOptions, key: &str) -> Vec<String> {
    match opts.get(key) {
        Some(Json::Array(items)) => items
            .iter()
            .filter_map(|v| match v {
                Json::String(s) => Some(s.clone()),
                Json::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Some(Json::String(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    }
}

fn opt_scalar(opts: &ToolOptions, key: &str) -> Option<String> {
    match opts.get(key) {
        Some(Json::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Json::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

fn push_flag_value(cmd: &mut Vec<String>, flag: &str, value: Option<String>) {
    if let Some(v) = value {
        cmd.push(flag.to_string());
        cmd.push(v);
    }
}

fn black_args(mut cmd: Vec<String>, opts: &ToolOptions) -> Vec<String> {
    push_flag_value(&mut cmd, "--line-length", opt_scalar(opts, "line_length"));
    push_flag_value(&mut cmd, "--target-version", opt_scalar(opts, "target_version"));
    if opt_bool(opts, "preview") {
        cmd.push("--preview".into());
    }
    cmd
}

fn black_check(opts: &ToolOptions) -> Vec<String> {
    black_args(strs(&["black", "--check"]), opts)
}

fn black_fix(opts: &ToolOptions) -> Vec<String> {
    black_args(strs(&["black"]), opts)
}

fn ruff_args(mut cmd: Vec<String>, opts: &ToolOptions) -> Vec<String> {
    let select = opt_list(opts, "select");
    if !select.is_empty() {
        cmd.push("--select".into());
        cmd.push(select.join(","));
    }
    let ignore = opt_list(opts, "ignore");
    if !ignore.is_empty() {
        cmd.push("--ignore".into());
        cmd.push(ignore.join(","));
    }
    push_flag_value(&mut cmd, "--line-length", opt_scalar(opts, "line_length"));
    cmd
}

fn ruff_check(opts: &ToolOptions) -> Vec<String> {
    ruff_args(strs(&["ruff", "check", "--output-format", "json"]), opts)
}

fn ruff_fix(opts: &ToolOptions) -> Vec<String> {
    ruff_args(strs(&["ruff", "check", "--fix", "--output-format", "json"]), opts)
}

fn prettier_check(opts: &ToolOptions) -> Vec<String> {
    let mut cmd = strs(&["prettier", "--check"]);
    push_flag_value(&mut cmd, "--config", opt_scalar(opts, "config"));
    cmd
}

fn prettier_fix(opts: &ToolOptions) -> Vec<String> {
    let mut cmd = strs(&["prettier", "--write"]);
    push_flag_value(&mut cmd, "--config", opt_scalar(opts, "config"));
    cmd
}

fn rustfmt_check(_: &ToolOptions) -> Vec<String> {
    strs(&["cargo", "fmt", "--all", "--", "--check"])
}

fn rustfmt_fix(_: &ToolOptions) -> Vec<String> {
    strs(&["cargo", "fmt", "--all"])
}

fn mypy_check(opts: &ToolOptions) -> Vec<String> {
    let mut cmd = strs(&[
        "mypy",
        "--show-error-codes",
        "--show-column-numbers",
        "--hide-error-context",
        "--no-error-summary",
        "--explicit-package-bases",
    ]);
    if opt_bool(opts, "strict") {
        cmd.push("--strict".into());
    }
    if opt_bool(opts, "ignore_missing_imports") {
        cmd.push("--ignore-missing-imports".into());
    }
    push_flag_value(&mut cmd, "--python-version", opt_scalar(opts, "python_version"));
    push_flag_value(&mut cmd, "--config-file", opt_scalar(opts, "config_file"));
    cmd
}

fn shellcheck_check(opts: &ToolOptions) -> Vec<String> {
    let mut cmd = strs(&["shellcheck", "--format", "json1"]);
    let severity = opt_str(opts, "severity").unwrap_or("style");
    cmd.push("--severity".into());
    cmd.push(severity.to_string());
    for code in opt_list(opts, "exclude") {
        cmd.push("--exclude".into());
        cmd.push(code);
    }
    push_flag_value(&mut cmd, "--shell", opt_scalar(opts, "shell"));
    cmd
}

fn hadolint_check(opts: &ToolOptions) -> Vec<String> {
    let mut cmd = strs(&["hadolint", "--format", "json", "--no-color"]);
    push_flag_value(
        &mut cmd,
        "--failure-threshold",
        opt_scalar(opts, "failure_threshold"),
    );
    for rule in opt_list(opts, "ignore") {
        cmd.push("--ignore".into());
        cmd.push(rule);
    }
    cmd
}

fn darglint_check(opts: &ToolOptions) -> Vec<String> {
    let mut cmd = strs(&["darglint"]);
    let ignore = opt_list(opts, "ignore");
    if !ignore.is_empty() {
        cmd.push("--ignore".into());
        cmd.push(ignore.join(","));
    }
    push_flag_value(&mut cmd, "--verbosity", opt_scalar(opts, "verbosity"));
    push_flag_value(&mut cmd, "--strictness", opt_scalar(opts, "strictness"));
    cmd
}

fn pydoclint_check(opts: &ToolOptions) -> Vec<String> {
    let mut cmd = strs(&["pydoclint"]);
    push_flag_value(&mut cmd, "--style", opt_scalar(opts, "style"));
    for (flag, key) in [
        ("--check-return-types", "check_return_types"),
        ("--check-arg-order", "check_arg_order"),
        ("--skip-checking-short-docstrings", "skip_checking_short_docstrings"),
    ] {
        cmd.push(flag.into());
        cmd.push(opt_bool(opts, key).to_string());
    }
    cmd.push("--quiet".into());
    cmd
}

fn yamllint_check(opts: &ToolOptions) -> Vec<String> {
    let mut cmd = strs(&["yamllint", "--format", "parsable"]);
    push_flag_value(&mut cmd, "--config-file", opt_scalar(opts, "config_file"));
    if opt_bool(opts, "strict") {
        cmd.push("--strict".into());
    }
    cmd
}

const PYTHON: [&str; 2] = ["*.py", "*.pyi"];

/// Every built-in tool, in registration order.
pub fn tools() -> Vec<(ToolDefinition, ToolPlugin)> {
    vec![
        (
            ToolDefinition {
                name: "black".into(),
                description: "Python code formatter".into(),
                can_check: true,
                can_fix: true,
                category: ToolCategory::FORMATTER,
                file_patterns: strs(&PYTHON),
                priority: 90,
                native_configs: strs(&["pyproject.toml"]),
                version_command: strs(&["black", "--version"]),
                version_pattern: Some(r"(?i)black,\s+(\d+(?:\.\d+)*)".into()),
                install_hint: Some("pip install black".into()),
                default_options: options(&[
                    ("line_length", Json::Null),
                    ("target_version", Json::Null),
                    ("preview", json!(false)),
                ]),
                default_timeout: 30,
                ..Default::default()
            },
            ToolPlugin {
                parse: parsers::parse_black,
                table: &FILE_TABLE,
                check_command: black_check,
                fix_command: Some(black_fix),
            },
        ),
        (
            ToolDefinition {
                name: "ruff".into(),
                description: "Fast Python linter".into(),
                can_check: true,
                can_fix: true,
                category: ToolCategory::LINTER | ToolCategory::FORMATTER,
                file_patterns: strs(&PYTHON),
                priority: 85,
                native_configs: strs(&["pyproject.toml", "ruff.toml", ".ruff.toml"]),
                version_command: strs(&["ruff", "--version"]),
                install_hint: Some("pip install ruff".into()),
                default_options: options(&[
                    ("select", Json::Null),
                    ("ignore", Json::Null),
                    ("line_length", Json::Null),
                ]),
                default_timeout: 30,
                ..Default::default()
            },
            ToolPlugin {
                parse: parsers::parse_ruff,
                table: &LINT_TABLE,
                check_command: ruff_check,
                fix_command: Some(ruff_fix),
            },
        ),
        (
            ToolDefinition {
                name: "prettier".into(),
                description: "Opinionated formatter for web files".into(),
                can_check: true,
                can_fix: true,
                category: ToolCategory::FORMATTER,
                file_patterns: strs(&[
                    "*.js", "*.jsx", "*.ts", "*.tsx", "*.json", "*.css", "*.scss", "*.md",
                    "*.yaml", "*.yml",
                ]),
                priority: 80,
                native_configs: strs(&[".prettierrc", ".prettierrc.json", "prettier.config.js"]),
                version_command: strs(&["prettier", "--version"]),
                min_version: Some("3.0.0".into()),
                install_hint: Some("npm install --global prettier".into()),
                default_options: options(&[("config", Json::Null)]),
                default_timeout: 30,
                ..Default::default()
            },
            ToolPlugin {
                parse: parsers::parse_prettier,
                table: &FILE_TABLE,
                check_command: prettier_check,
                fix_command: Some(prettier_fix),
            },
        ),
        (
            ToolDefinition {
                name: "rustfmt".into(),
                description: "Rust code formatter".into(),
                can_check: true,
                can_fix: true,
                category: ToolCategory::FORMATTER,
                file_patterns: strs(&["*.rs"]),
                priority: 80,
                native_configs: strs(&["rustfmt.toml", ".rustfmt.toml"]),
                version_command: strs(&["rustfmt", "--version"]),
                min_version: Some("1.0.0".into()),
                install_hint: Some("rustup component add rustfmt".into()),
                default_timeout: 60,
                mode: ExecutionMode::Project,
                run_from_root: true,
                ..Default::default()
            },
            ToolPlugin {
                parse: parsers::parse_rustfmt,
                table: &LINE_TABLE,
                check_command: rustfmt_check,
                fix_command: Some(rustfmt_fix),
            },
        ),
        (
            ToolDefinition {
                name: "mypy".into(),
                description: "Static type checker for Python".into(),
                can_check: true,
                category: ToolCategory::TYPE_CHECKER,
                file_patterns: strs(&PYTHON),
                priority: 82,
                native_configs: strs(&["mypy.ini", ".mypy.ini", "pyproject.toml", "setup.cfg"]),
                version_command: strs(&["mypy", "--version"]),
                install_hint: Some("pip install mypy".into()),
                default_options: options(&[
                    ("strict", json!(false)),
                    ("ignore_missing_imports", json!(true)),
                    ("python_version", Json::Null),
                    ("config_file", Json::Null),
                ]),
                default_timeout: 60,
                mode: ExecutionMode::Batch,
                run_from_root: true,
                ..Default::default()
            },
            ToolPlugin {
                parse: parsers::parse_generic,
                table: &LINT_TABLE,
                check_command: mypy_check,
                fix_command: None,
            },
        ),
        (
            ToolDefinition {
                name: "shellcheck".into(),
                description: "Static analysis for shell scripts".into(),
                can_check: true,
                category: ToolCategory::LINTER,
                file_patterns: strs(&["*.sh", "*.bash", "*.ksh", "*.zsh"]),
                priority: 50,
                native_configs: strs(&[".shellcheckrc"]),
                version_command: strs(&["shellcheck", "--version"]),
                min_version: Some("0.9.0".into()),
                install_hint: Some("Install shellcheck from your package manager".into()),
                default_options: options(&[
                    ("severity", json!("style")),
                    ("exclude", Json::Null),
                    ("shell", Json::Null),
                ]),
                default_timeout: 30,
                ..Default::default()
            },
            ToolPlugin {
                parse: parsers::parse_shellcheck,
                table: &LINT_TABLE,
                check_command: shellcheck_check,
                fix_command: None,
            },
        ),
        (
            ToolDefinition {
                name: "hadolint".into(),
                description: "Dockerfile linter".into(),
                can_check: true,
                category: ToolCategory::LINTER | ToolCategory::SECURITY,
                file_patterns: strs(&["Dockerfile", "Dockerfile.*", "*.dockerfile"]),
                priority: 50,
                native_configs: strs(&[".hadolint.yaml", ".hadolint.yml"]),
                version_command: strs(&["hadolint", "--version"]),
                min_version: Some("2.12.0".into()),
                install_hint: Some("Install hadolint from https://github.com/hadolint/hadolint/releases".into()),
                default_options: options(&[
                    ("failure_threshold", json!("info")),
                    ("ignore", Json::Null),
                ]),
                default_timeout: 30,
                ..Default::default()
            },
            ToolPlugin {
                parse: parsers::parse_hadolint,
                table: &LINT_TABLE,
                check_command: hadolint_check,
                fix_command: None,
            },
        ),
        (
            ToolDefinition {
                name: "darglint".into(),
                description: "Checks that docstrings match function signatures".into(),
                can_check: true,
                category: ToolCategory::LINTER | ToolCategory::DOCS,
                file_patterns: strs(&["*.py"]),
                priority: 45,
                version_command: strs(&["darglint", "--version"]),
                install_hint: Some("pip install darglint".into()),
                default_options: options(&[
                    ("ignore", Json::Null),
                    ("verbosity", json!(2)),
                    ("strictness", json!("full")),
                ]),
                default_timeout: 10,
                ..Default::default()
            },
            ToolPlugin {
                parse: parsers::parse_darglint,
                table: &LINE_TABLE,
                check_command: darglint_check,
                fix_command: None,
            },
        ),
        (
            ToolDefinition {
                name: "pydoclint".into(),
                description: "Docstring linter that validates against signatures".into(),
                can_check: true,
                category: ToolCategory::LINTER | ToolCategory::DOCS,
                file_patterns: strs(&PYTHON),
                priority: 45,
                conflicts_with: strs(&["darglint"]),
                native_configs: strs(&["pyproject.toml", ".pydoclint.toml"]),
                version_command: strs(&["pydoclint", "--version"]),
                install_hint: Some("pip install pydoclint".into()),
                default_options: options(&[
                    ("style", json!("google")),
                    ("check_return_types", json!(true)),
                    ("check_arg_order", json!(true)),
                    ("skip_checking_short_docstrings", json!(true)),
                ]),
                default_timeout: 30,
                ..Default::default()
            },
            ToolPlugin {
                parse: parsers::parse_pydoclint,
                table: &LINE_TABLE,
                check_command: pydoclint_check,
                fix_command: None,
            },
        ),
        (
            ToolDefinition {
                name: "yamllint".into(),
                description: "Linter for YAML files".into(),
                can_check: true,
                category: ToolCategory::LINTER,
                file_patterns: strs(&["*.yml", "*.yaml", ".yamllint"]),
                priority: 40,
                native_configs: strs(&[".yamllint", ".yamllint.yaml", ".yamllint.yml"]),
                version_command: strs(&["yamllint", "--version"]),
                install_hint: Some("pip install yamllint".into()),
                default_options: options(&[
                    ("config_file", Json::Null),
                    ("strict", json!(false)),
                ]),
                default_timeout: 15,
                ..Default::default()
            },
            ToolPlugin {
                parse: parsers::parse_yamllint,
                table: &LINT_TABLE,
                check_command: yamllint_check,
                fix_command: None,
            },
        ),
    ]
}

impl ToolRegistry {
    /// A registry holding every built-in tool.
    pub fn with_builtins() -> Self {
        let mut registry = ToolRegistry::new();
        for (definition, plugin) in tools() {
            if let Err(err) = registry.register(definition, plugin) {
                warn!(%err, "skipping built-in tool");
            }
        }
        registry
    }
}
