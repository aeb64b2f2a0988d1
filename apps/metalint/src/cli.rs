//! CLI argument parsing via `clap`.

use crate::config::{split_list, Overrides};
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "metalint",
    version,
    about = "Run many linters and formatters as one",
    long_about = "metalint runs external linters and formatters over a set of paths, normalizes their findings, and renders one report.\n\nConfiguration precedence: CLI > metalint.toml > defaults.",
    after_help = "Examples:\n  metalint check src tests\n  metalint check --tools ruff,mypy --output-format json\n  metalint fmt --exclude 'build/*'\n  metalint list-tools --output-format markdown",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    #[arg(long, global = true, action = clap::ArgAction::SetTrue, help = "Debug logging (overrides METALINT_LOG)")]
    pub verbose: bool,
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
/// Supported subcommands.
pub enum Commands {
    /// Show version
    #[command(about = "Show version", long_about = "Print the current metalint version.")]
    Version,
    /// Report issues without changing files
    #[command(
        about = "Run checks",
        long_about = "Run every selected tool in check mode. Exit status is 1 when any tool fails, reports issues, or is skipped for an unusable version.",
        after_help = "Examples:\n  metalint check\n  metalint check src --tools ruff --output-format grid"
    )]
    Check(RunArgs),
    /// Apply fixes in place
    #[command(
        about = "Apply fixes",
        long_about = "Run every fix-capable tool in fix mode: check, fix, then re-check to count what was fixed and what remains.",
        after_help = "Examples:\n  metalint fmt\n  metalint fmt src --tools black,prettier"
    )]
    Fmt(RunArgs),
    /// List registered tools
    #[command(
        about = "List tools",
        long_about = "Print every registered tool with its priority, categories, fix capability, patterns and conflicts."
    )]
    ListTools {
        #[arg(long, help = "Output format: plain|grid|markdown|html|json|csv|github (default: grid)")]
        output_format: Option<String>,
    },
}

#[derive(Args, Debug, Clone)]
/// Options shared by `check` and `fmt`.
pub struct RunArgs {
    #[arg(help = "Files or directories (default: .)")]
    pub paths: Vec<String>,
    #[arg(long, help = "Repository root (default: current dir)")]
    pub repo_root: Option<String>,
    #[arg(long, help = "Comma-separated tool ids (default: all enabled)")]
    pub tools: Option<String>,
    #[arg(long, help = "Comma-separated exclude patterns")]
    pub exclude: Option<String>,
    #[arg(long, action = clap::ArgAction::SetTrue, help = "Walk into virtualenv and dependency directories")]
    pub include_venv: bool,
    #[arg(long, help = "Output format: plain|grid|markdown|html|json|csv|github (default: grid)")]
    pub output_format: Option<String>,
    #[arg(long, action = clap::ArgAction::SetTrue, help = "Run tools even when they conflict")]
    pub ignore_conflicts: bool,
    #[arg(long, value_name = "SECS", help = "Per-file timeout for every tool")]
    pub timeout: Option<u64>,
    #[arg(long, action = clap::ArgAction::SetTrue, help = "Abort when a tool fails its version check")]
    pub strict: bool,
    #[arg(long, action = clap::ArgAction::SetTrue, help = "Hide progress bars")]
    pub no_progress: bool,
}

impl RunArgs {
    /// Flags that were set; unset ones defer to the config file.
    pub fn overrides(&self) -> Overrides {
        let flag = |set: bool| if set { Some(true) } else { None };
        Overrides {
            repo_root: self.repo_root.clone(),
            tools: self.tools.as_deref().map(split_list),
            exclude: self.exclude.as_deref().map(split_list),
            include_venv: flag(self.include_venv),
            output_format: self.output_format.clone(),
            timeout: self.timeout,
            ignore_conflicts: flag(self.ignore_conflicts),
            strict: flag(self.strict),
        }
    }

    pub fn paths_or_default(&self) -> Vec<String> {
        if self.paths.is_empty() {
            vec![".".to_string()]
        } else {
            self.paths.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_flags_become_overrides() {
        let cli = Cli::parse_from([
            "metalint",
            "check",
            "src",
            "--tools",
            "ruff, mypy",
            "--strict",
            "--timeout",
            "9",
            "--verbose",
        ]);
        assert!(cli.verbose);
        let Commands::Check(args) = cli.cmd else {
            panic!("expected check");
        };
        let o = args.overrides();
        assert_eq!(o.tools, Some(vec!["ruff".to_string(), "mypy".to_string()]));
        assert_eq!(o.strict, Some(true));
        assert_eq!(o.ignore_conflicts, None);
        assert_eq!(o.timeout, Some(9));
        assert_eq!(args.paths_or_default(), vec!["src"]);
    }

    #[test]
    fn fmt_defaults_to_current_dir() {
        let cli = Cli::parse_from(["metalint", "fmt"]);
        let Commands::Fmt(args) = cli.cmd else {
            panic!("expected fmt");
        };
        assert_eq!(args.paths_or_default(), vec!["."]);
        assert!(args.overrides().tools.is_none());
    }
}
