//! Output rendering for module, lint, fix, coverage and info commands.
//!
//! Supports `human` (default) and `json` outputs. JSON bodies are the
//! serialized report types; lookup failures render as an error object with
//! the known module list so callers can retry.

use crate::coverage::format_percent;
use crate::errors::ModkitError;
use crate::info::{self, ModuleInfo};
use crate::models::{
    CoverageReport, CoverageStatus, FixReport, LintReport, LintStatus, Module, Severity,
};
use crate::utils::use_colors;
use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::json;
use serde_json::Value as JsonVal;

fn print_json<T: Serialize + ?Sized>(value: &T) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string())
    );
}

fn paint(text: &str, color: bool, f: fn(&str) -> String) -> String {
    if color {
        f(text)
    } else {
        text.to_string()
    }
}

/// Print a module list (discovery or staged mapping).
pub fn print_modules(modules: &[Module], output: &str) {
    match output {
        "json" => print_json(&compose_modules_json(modules)),
        _ => {
            let color = use_colors(output);
            for m in modules {
                match &m.import_path {
                    Some(p) => println!(
                        "{} {}",
                        paint(&m.id, color, |s| s.bold().to_string()),
                        paint(p, color, |s| s.bright_black().to_string())
                    ),
                    None => println!("{}", paint(&m.id, color, |s| s.bold().to_string())),
                }
            }
        }
    }
}

/// Print the module owning a package.
pub fn print_package(pkg: &str, module: &Module, output: &str) {
    match output {
        "json" => print_json(&json!({"package": pkg, "module": module})),
        _ => println!("{}", module.id),
    }
}

fn print_lint_human(r: &LintReport, color: bool) {
    let status = match r.status {
        LintStatus::Success => paint("✔ clean", color, |s| s.green().bold().to_string()),
        LintStatus::CompletedWithIssues => {
            paint("▲ issues", color, |s| s.yellow().bold().to_string())
        }
        LintStatus::Error => paint("✖ error", color, |s| s.red().bold().to_string()),
        LintStatus::Timeout => paint("⏱ timeout", color, |s| s.red().bold().to_string()),
    };
    println!("{} {}", status, paint(&r.module, color, |s| s.bold().to_string()));
    for is in r.issues.as_deref().unwrap_or_default() {
        let sev = match is.severity {
            Severity::Error => paint("⟦error⟧", color, |s| s.red().bold().to_string()),
            Severity::Warning => paint("⟦warn⟧", color, |s| s.yellow().bold().to_string()),
            Severity::Info => paint("⟦info⟧", color, |s| s.blue().bold().to_string()),
            Severity::Unknown => paint("⟦?⟧", color, |s| s.bright_black().to_string()),
        };
        println!(
            "  {} {}:{}:{} ❲{}❳ {}",
            sev, is.file, is.line, is.column, is.linter, is.message
        );
    }
    if let Some(msg) = &r.error_message {
        println!("  {}", msg);
    }
    if let Some(summary) = &r.summary {
        let line = format!("  total={}", summary.total_issues);
        println!("{}", paint(&line, color, |s| s.bold().to_string()));
    } else if r.raw_output.is_some() {
        println!("  (lint output could not be parsed; see --output json)");
    }
}

pub fn print_lint(report: &LintReport, output: &str) {
    match output {
        "json" => print_json(report),
        _ => print_lint_human(report, use_colors(output)),
    }
}

/// Print reports for several modules in order.
pub fn print_lints(reports: &[LintReport], output: &str) {
    match output {
        "json" => print_json(&compose_lints_json(reports)),
        _ => {
            let color = use_colors(output);
            for r in reports {
                print_lint_human(r, color);
            }
            let clean = reports.iter().filter(|r| r.is_clean()).count();
            let line = format!(
                "— Summary — modules={} clean={} failing={}",
                reports.len(),
                clean,
                reports.len() - clean
            );
            println!("{}", paint(&line, color, |s| s.bold().to_string()));
        }
    }
}

pub fn print_fix(report: &FixReport, output: &str) {
    if output == "json" {
        print_json(report);
        return;
    }
    let color = use_colors(output);
    match report {
        FixReport::Preview {
            module,
            current_total_issues,
            estimated_fixable_issues,
            fixable_linters,
            manual_fix_required,
            message,
            ..
        } => {
            println!(
                "{} {}",
                paint("preview:", color, |s| s.cyan().bold().to_string()),
                module
            );
            println!("  {}", message);
            println!(
                "  issues={} fixable={} linters=[{}]",
                current_total_issues,
                estimated_fixable_issues,
                fixable_linters.join(", ")
            );
            println!("  manual: {}", manual_fix_required.join(", "));
        }
        FixReport::FixCompleted {
            message,
            remaining_status,
            remaining_issues_summary,
            ..
        } => {
            println!(
                "{} {}",
                paint("fixed:", color, |s| s.green().bold().to_string()),
                message
            );
            let remaining = remaining_issues_summary
                .as_ref()
                .map(|s| s.total_issues)
                .unwrap_or(0);
            println!("  remaining={} status={:?}", remaining, remaining_status);
        }
        FixReport::Timeout {
            module,
            error_message,
        }
        | FixReport::Error {
            module,
            error_message,
        } => {
            println!(
                "{} {} {}",
                paint("✖", color, |s| s.red().bold().to_string()),
                module,
                error_message
            );
        }
    }
}

pub fn print_coverage(report: &CoverageReport, output: &str) {
    if output == "json" {
        print_json(report);
        return;
    }
    let color = use_colors(output);
    let header = match report.total_coverage() {
        Some(total) => format!("{} {}%", report.module, format_percent(total)),
        None => report.module.clone(),
    };
    let ok = report.status == CoverageStatus::Success;
    let mark = if ok {
        paint("✔", color, |s| s.green().bold().to_string())
    } else {
        paint("✖", color, |s| s.red().bold().to_string())
    };
    println!("{} {}", mark, paint(&header, color, |s| s.bold().to_string()));
    if let Some(a) = &report.coverage_analysis {
        println!("  {}", a.assessment);
    }
    for f in report.low_coverage_files.as_deref().unwrap_or_default() {
        println!(
            "  {} {} {}%",
            paint("low:", color, |s| s.yellow().to_string()),
            f.file,
            format_percent(f.coverage)
        );
    }
    for s in &report.suggestions {
        println!("  {}", s);
    }
    for msg in [&report.error_message, &report.message].into_iter().flatten() {
        println!("  {}", msg);
    }
    if let Some(out) = &report.test_output {
        println!("{}", out);
    }
}

pub fn print_info(module: &ModuleInfo, output: &str) {
    match output {
        "json" => print_json(module),
        _ => println!("{}", info::render(module)),
    }
}

/// Print a lookup failure. JSON goes to stdout so the caller can parse it.
pub fn print_error(err: &ModkitError, output: &str) {
    match output {
        "json" => print_json(&compose_error_json(err)),
        _ => {
            eprintln!("{} {}", crate::utils::error_prefix(), err);
            if let Some(available) = err.available_modules() {
                eprintln!(
                    "{} available modules: {}",
                    crate::utils::note_prefix(),
                    available.join(", ")
                );
            }
        }
    }
}

/// Compose module list JSON (pure) for testing/snapshot purposes.
pub fn compose_modules_json(modules: &[Module]) -> JsonVal {
    json!({"modules": modules, "count": modules.len()})
}

/// Compose multi-module lint JSON with a top-level summary.
pub fn compose_lints_json(reports: &[LintReport]) -> JsonVal {
    let clean = reports.iter().filter(|r| r.is_clean()).count();
    let total_issues: usize = reports
        .iter()
        .filter_map(|r| r.summary.as_ref())
        .map(|s| s.total_issues)
        .sum();
    json!({
        "results": reports,
        "summary": {
            "modules": reports.len(),
            "clean": clean,
            "failing": reports.len() - clean,
            "total_issues": total_issues,
        }
    })
}

/// Compose the error object for a failed lookup.
pub fn compose_error_json(err: &ModkitError) -> JsonVal {
    let mut out = json!({"error": err.to_string()});
    if let Some(available) = err.available_modules() {
        out["available_modules"] = json!(available);
    }
    if let Some(path) = err.path() {
        out["path"] = json!(path.to_string_lossy());
    }
    out
}
