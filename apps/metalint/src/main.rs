//! metalint CLI binary entry point.
//! Resolves configuration, runs the selected tools and prints the report.

use clap::Parser;
use metalint::cli::{Cli, Commands, RunArgs};
use metalint::formatters::OutputFormat;
use metalint::process::SystemRunner;
use metalint::registry::ToolRegistry;
use metalint::runner::{self, Action, RunRequest};
use metalint::utils::{error_prefix, info_prefix, note_prefix};
use metalint::{config, output, utils};
use std::path::PathBuf;

fn main() {
    let cli = Cli::parse();
    utils::init_logging(cli.verbose);
    let code = match cli.cmd {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            0
        }
        Commands::ListTools { output_format } => {
            let registry = ToolRegistry::with_builtins();
            let format = OutputFormat::resolve(output_format.as_deref().unwrap_or("grid"));
            output::print_tools(&registry, format);
            0
        }
        Commands::Check(args) => run_command(&args, Action::Check),
        Commands::Fmt(args) => run_command(&args, Action::Fix),
    };
    std::process::exit(code);
}

fn run_command(args: &RunArgs, action: Action) -> i32 {
    match run_tools(args, action) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {}", error_prefix(), err);
            err.exit_code()
        }
    }
}

fn run_tools(args: &RunArgs, action: Action) -> metalint::Result<i32> {
    let eff = config::resolve_effective(&args.overrides())?;
    let format = OutputFormat::resolve(&eff.output_format);
    let human = format != OutputFormat::Json;
    // Friendly note if no metalint config was found
    if human && eff.config_path.is_none() {
        eprintln!("{} No metalint.toml found; using defaults.", note_prefix());
    }
    let opts = config::run_options(&eff, action.is_fix(), human && !args.no_progress)?;
    let request = RunRequest {
        tools: eff.tools.clone(),
        disabled: eff.disabled.clone(),
        paths: args.paths_or_default().into_iter().map(PathBuf::from).collect(),
        action,
        ignore_conflicts: eff.ignore_conflicts,
        strict: eff.strict,
    };

    let registry = ToolRegistry::with_builtins();
    let mut report = runner::run(&registry, &request, &opts, &SystemRunner)?;
    if report.is_empty() && human {
        eprintln!("{} No tool to run for {}.", info_prefix(), action.as_str());
    }
    output::print_report(&mut report, &registry, format);
    Ok(report.exit_code())
}
