//! modkit CLI binary entry point.
//! Resolves configuration, delegates to the workspace and prints reports.

use clap::Parser;
use modkit::cli::{Cli, Commands, CommonArgs};
use modkit::config::{self, Effective};
use modkit::errors::ModkitError;
use modkit::models::{CoverageStatus, FixReport};
use modkit::output;
use modkit::tool::LiveRunner;
use modkit::utils::{info_prefix, note_prefix};
use modkit::workspace::Workspace;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn workspace(common: &CommonArgs, threshold: Option<f64>) -> Workspace {
    let eff: Effective = config::resolve_effective(
        common.repo_root.as_deref(),
        common.output.as_deref(),
        threshold,
    );
    // Friendly note if no modkit config was found
    if !eff.config_found && eff.output != "json" {
        eprintln!("{} No modkit.toml found; using defaults.", note_prefix());
    }
    Workspace::new(eff, Arc::new(LiveRunner))
}

fn exit_for(clean: bool) -> ExitCode {
    if clean {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

fn fail(err: &ModkitError, output: &str) -> ExitCode {
    output::print_error(err, output);
    ExitCode::from(2)
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        Commands::Modules { common } => {
            let ws = workspace(&common, None);
            let out = ws.settings().output.clone();
            match ws.modules() {
                Ok(modules) => {
                    output::print_modules(&modules, &out);
                    ExitCode::SUCCESS
                }
                Err(e) => fail(&e, &out),
            }
        }
        Commands::Staged { common } => {
            let ws = workspace(&common, None);
            let out = ws.settings().output.clone();
            match ws.staged_modules() {
                Ok(modules) => {
                    output::print_modules(&modules, &out);
                    ExitCode::SUCCESS
                }
                Err(e) => fail(&e, &out),
            }
        }
        Commands::Pkg { common, package } => {
            let ws = workspace(&common, None);
            let out = ws.settings().output.clone();
            match ws.module_for_package(&package) {
                Ok(module) => {
                    output::print_package(&package, &module, &out);
                    ExitCode::SUCCESS
                }
                Err(e) => fail(&e, &out),
            }
        }
        Commands::Info { common, module } => {
            let ws = workspace(&common, None);
            let out = ws.settings().output.clone();
            match ws.info(&module) {
                Ok(info) => {
                    output::print_info(&info, &out);
                    ExitCode::SUCCESS
                }
                Err(e) => fail(&e, &out),
            }
        }
        Commands::Lint {
            common,
            module,
            all,
            staged,
        } => {
            let ws = workspace(&common, None);
            let out = ws.settings().output.clone();
            if let Some(id) = module {
                return match ws.lint(&id) {
                    Ok(report) => {
                        output::print_lint(&report, &out);
                        exit_for(report.is_clean())
                    }
                    Err(e) => fail(&e, &out),
                };
            }
            let targets = if all {
                ws.modules()
            } else {
                debug_assert!(staged);
                ws.staged_modules()
            };
            match targets {
                Ok(modules) => {
                    if modules.is_empty() && out != "json" {
                        eprintln!("{} No modules selected; nothing to lint.", info_prefix());
                    }
                    let reports = ws.lint_many(&modules);
                    output::print_lints(&reports, &out);
                    exit_for(reports.iter().all(|r| r.is_clean()))
                }
                Err(e) => fail(&e, &out),
            }
        }
        Commands::Fix {
            common,
            module,
            preview,
        } => {
            let ws = workspace(&common, None);
            let out = ws.settings().output.clone();
            match ws.fix(&module, preview) {
                Ok(report) => {
                    output::print_fix(&report, &out);
                    exit_for(!matches!(
                        report,
                        FixReport::Timeout { .. } | FixReport::Error { .. }
                    ))
                }
                Err(e) => fail(&e, &out),
            }
        }
        Commands::Coverage {
            common,
            module,
            threshold,
        } => {
            let ws = workspace(&common, threshold);
            let out = ws.settings().output.clone();
            match ws.coverage(&module, None) {
                Ok(report) => {
                    output::print_coverage(&report, &out);
                    exit_for(report.status == CoverageStatus::Success)
                }
                Err(e) => fail(&e, &out),
            }
        }
    }
}
