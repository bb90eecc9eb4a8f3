//! CLI argument parsing via `clap`.

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "modkit",
    version,
    about = "Go multi-module workspace toolkit",
    long_about = "modkit — discover Go modules in a repository, map files and packages to them, and run normalized lint and coverage per module.\n\nConfiguration precedence: CLI > modkit.toml > defaults.",
    after_help = "Examples:\n  modkit modules\n  modkit staged --output json\n  modkit pkg github.com/acme/platform/rover/internal/handler\n  modkit lint rover\n  modkit lint --staged\n  modkit coverage identity --threshold 70",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Args, Debug, Default, Clone)]
/// Options shared by every workspace command.
pub struct CommonArgs {
    #[arg(long, help = "Repository root (default: current dir)")]
    pub repo_root: Option<String>,
    #[arg(long, help = "Output mode: human|json (default: human)")]
    pub output: Option<String>,
}

#[derive(Subcommand)]
/// Supported subcommands.
pub enum Commands {
    /// Show version
    #[command(about = "Show version", long_about = "Print the current modkit version.")]
    Version,
    /// List discovered modules
    #[command(
        about = "List modules",
        long_about = "List every directory under the repository root that holds a go.mod, sorted by id."
    )]
    Modules {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Modules touched by staged changes
    #[command(
        about = "List modules with staged changes",
        long_about = "Map `git diff --cached` paths to their deepest owning module. Prints nothing when git is unavailable."
    )]
    Staged {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Resolve a Go import path to its module
    #[command(
        about = "Resolve package",
        after_help = "Examples:\n  modkit pkg rover/internal/handler\n  modkit pkg github.com/acme/platform/rover/internal/handler"
    )]
    Pkg {
        #[command(flatten)]
        common: CommonArgs,
        #[arg(help = "Go import path or module-relative package path")]
        package: String,
    },
    /// Module overview
    #[command(
        about = "Show module info",
        long_about = "Summarize go.mod facts, top-level layout and the README of one module."
    )]
    Info {
        #[command(flatten)]
        common: CommonArgs,
        #[arg(help = "Module id (path relative to the repository root)")]
        module: String,
    },
    /// Run golangci-lint and normalize its output
    #[command(
        about = "Lint modules",
        long_about = "Run golangci-lint in one module, every module (--all) or modules with staged changes (--staged). Exits 1 when any report is not clean.",
        after_help = "Examples:\n  modkit lint rover\n  modkit lint --all --output json\n  modkit lint --staged"
    )]
    Lint {
        #[command(flatten)]
        common: CommonArgs,
        #[arg(help = "Module id", required_unless_present_any = ["all", "staged"])]
        module: Option<String>,
        #[arg(long, action = clap::ArgAction::SetTrue, conflicts_with_all = ["module", "staged"], help = "Lint every discovered module")]
        all: bool,
        #[arg(long, action = clap::ArgAction::SetTrue, conflicts_with = "module", help = "Lint modules with staged changes")]
        staged: bool,
    },
    /// Preview or apply golangci-lint auto-fixes
    #[command(
        about = "Fix lint issues",
        long_about = "Estimate fixable issues (--preview) or run golangci-lint --fix and report what remains."
    )]
    Fix {
        #[command(flatten)]
        common: CommonArgs,
        #[arg(help = "Module id")]
        module: String,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Report what would be fixed without touching files")]
        preview: bool,
    },
    /// Run tests with coverage and aggregate per file
    #[command(
        about = "Coverage report",
        long_about = "Run `go test -coverprofile` then `go tool cover -func` and aggregate per-file coverage against a threshold."
    )]
    Coverage {
        #[command(flatten)]
        common: CommonArgs,
        #[arg(help = "Module id")]
        module: String,
        #[arg(long, help = "Per-file coverage threshold in percent (default: 50)")]
        threshold: Option<f64>,
    },
}
