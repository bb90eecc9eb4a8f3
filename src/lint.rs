//! golangci-lint runner and report normalization.
//!
//! Raw tool results are first classified into a `RawLintOutput` variant and
//! then normalized into a `LintReport`, one arm per variant. Classification
//! never fails: output that is not the tool's JSON shape falls back to the
//! `Unparseable` variant and is preserved verbatim.

use crate::config::LintSettings;
use crate::models::{
    FixReport, FixToolResult, LintIssue, LintReport, LintStatus, Module, Severity,
};
use crate::tool::{Invocation, ToolOutcome, ToolRunner};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
/// Issue record as emitted by golangci-lint's JSON printer.
pub struct RawIssue {
    #[serde(rename = "FromLinter", alias = "from_linter", alias = "linter")]
    pub from_linter: Option<String>,
    #[serde(rename = "Text", alias = "text", alias = "message")]
    pub text: Option<String>,
    #[serde(rename = "Severity", alias = "severity")]
    pub severity: Option<String>,
    #[serde(rename = "Pos", alias = "pos")]
    pub pos: Option<RawPos>,
    #[serde(rename = "Rule", alias = "rule")]
    pub rule: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RawPos {
    #[serde(rename = "Filename", alias = "filename", alias = "file")]
    pub filename: Option<String>,
    #[serde(rename = "Line", alias = "line")]
    pub line: Option<u64>,
    #[serde(rename = "Column", alias = "column")]
    pub column: Option<u64>,
}

/// Accepted JSON documents: `{"Issues": [...]}` (possibly null) or a bare array.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawDocument {
    Report {
        #[serde(rename = "Issues", alias = "issues", default)]
        issues: Option<Vec<RawIssue>>,
    },
    Bare(Vec<RawIssue>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// The shapes a lint run can produce.
pub enum RawLintOutput {
    Clean,
    Issues(Vec<RawIssue>),
    Unparseable { stdout: String, stderr: String },
    DiagnosticOnly { stderr: String, exit_code: i32 },
    TimedOut { after: Duration },
    ToolMissing { tool: String },
    Failed { message: String },
}

/// Classify captured output of a completed run.
pub fn classify(stdout: &str, stderr: &str, exit_code: i32) -> RawLintOutput {
    if exit_code == 0 {
        return RawLintOutput::Clean;
    }
    if stdout.trim().is_empty() {
        return RawLintOutput::DiagnosticOnly {
            stderr: stderr.to_string(),
            exit_code,
        };
    }
    // Only the first JSON value counts; trailing text summaries are ignored.
    let mut stream = serde_json::Deserializer::from_str(stdout).into_iter::<RawDocument>();
    match stream.next() {
        Some(Ok(RawDocument::Report { issues })) => {
            RawLintOutput::Issues(issues.unwrap_or_default())
        }
        Some(Ok(RawDocument::Bare(issues))) => RawLintOutput::Issues(issues),
        _ => {
            debug!("lint output is not structured JSON; keeping raw text");
            RawLintOutput::Unparseable {
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
            }
        }
    }
}

/// Classify any tool outcome, including ones that never produced output.
pub fn classify_outcome(outcome: ToolOutcome) -> RawLintOutput {
    match outcome {
        ToolOutcome::Completed(out) => classify(&out.stdout, &out.stderr, out.exit_code),
        ToolOutcome::TimedOut { after } => RawLintOutput::TimedOut { after },
        ToolOutcome::Missing { program } => RawLintOutput::ToolMissing { tool: program },
        ToolOutcome::Failed { message } => RawLintOutput::Failed { message },
    }
}

/// Normalize a classified output into the canonical report.
pub fn normalize(module: &str, raw: RawLintOutput) -> LintReport {
    match raw {
        RawLintOutput::Clean => LintReport::with_issues(module, Vec::new()),
        RawLintOutput::Issues(raw_issues) => {
            let issues = raw_issues.into_iter().map(to_issue).collect();
            LintReport::with_issues(module, issues)
        }
        RawLintOutput::Unparseable { stdout, stderr } => {
            LintReport::unparsed(module, stdout, stderr)
        }
        RawLintOutput::DiagnosticOnly { stderr, exit_code } => {
            let message = if stderr.trim().is_empty() {
                "Unknown error occurred".to_string()
            } else {
                stderr
            };
            LintReport::error(module, message, Some(exit_code))
        }
        RawLintOutput::TimedOut { after } => LintReport::timeout(
            module,
            format!("Linting process timed out after {}s", after.as_secs()),
        ),
        RawLintOutput::ToolMissing { tool } => LintReport::error(
            module,
            format!("{} not found. Please ensure it's installed and in PATH.", tool),
            None,
        ),
        RawLintOutput::Failed { message } => LintReport::error(module, message, None),
    }
}

/// Pure entry point: normalize captured stdout/stderr and exit code.
pub fn normalize_output(module: &str, stdout: &str, stderr: &str, exit_code: i32) -> LintReport {
    normalize(module, classify(stdout, stderr, exit_code))
}

fn to_issue(raw: RawIssue) -> LintIssue {
    let pos = raw.pos.unwrap_or_default();
    LintIssue {
        file: non_empty(pos.filename).unwrap_or_else(|| "unknown".to_string()),
        line: pos.line.unwrap_or(0),
        column: pos.column.unwrap_or(0),
        severity: Severity::parse(raw.severity.as_deref().unwrap_or("")),
        message: raw.text.unwrap_or_default(),
        linter: non_empty(raw.from_linter).unwrap_or_else(|| "unknown".to_string()),
        rule: non_empty(raw.rule),
    }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.trim().is_empty())
}

fn lint_invocation(settings: &LintSettings, module: &Module, fix: bool) -> Invocation {
    let mut inv = Invocation::new(&settings.binary, &module.dir, settings.timeout)
        .arg("run")
        .arg("--config")
        .arg(settings.config.to_string_lossy());
    inv = if fix {
        inv.arg("--fix")
    } else {
        inv.args(["--output.json.path", "stdout"])
    };
    inv.arg("./...")
}

/// Lint one module.
pub fn run_lint(runner: &dyn ToolRunner, settings: &LintSettings, module: &Module) -> LintReport {
    let outcome = runner.run(&lint_invocation(settings, module, false));
    let report = normalize(&module.id, classify_outcome(outcome));
    info!("lint {}: {:?}", module.id, report.status);
    report
}

/// Preview or apply auto-fixes for one module.
pub fn run_fix(
    runner: &dyn ToolRunner,
    settings: &LintSettings,
    module: &Module,
    preview: bool,
) -> FixReport {
    if preview {
        let current = run_lint(runner, settings, module);
        return preview_from_report(&current, &settings.fixable_linters);
    }

    let fix_result = match runner.run(&lint_invocation(settings, module, true)) {
        ToolOutcome::Completed(out) => FixToolResult {
            return_code: out.exit_code,
            stdout: out.stdout,
            stderr: out.stderr,
        },
        ToolOutcome::TimedOut { after } => {
            return FixReport::Timeout {
                module: module.id.clone(),
                error_message: format!("Fix process timed out after {}s", after.as_secs()),
            }
        }
        ToolOutcome::Missing { program } => {
            return FixReport::Error {
                module: module.id.clone(),
                error_message: format!(
                    "{} not found. Please ensure it's installed and in PATH.",
                    program
                ),
            }
        }
        ToolOutcome::Failed { message } => {
            return FixReport::Error {
                module: module.id.clone(),
                error_message: message,
            }
        }
    };

    let remaining = run_lint(runner, settings, module);
    FixReport::FixCompleted {
        module: module.id.clone(),
        fix_result,
        remaining_status: remaining.status,
        remaining_issues_summary: remaining.summary,
        message: format!(
            "Auto-fix completed for {}. Run lint for detailed remaining issues.",
            module.id
        ),
    }
}

/// Estimate how much of a lint report the tool can fix on its own.
pub fn preview_from_report(report: &LintReport, fixable_linters: &[String]) -> FixReport {
    match report.status {
        LintStatus::Timeout => {
            return FixReport::Timeout {
                module: report.module.clone(),
                error_message: report.error_message.clone().unwrap_or_default(),
            }
        }
        LintStatus::Error => {
            return FixReport::Error {
                module: report.module.clone(),
                error_message: report.error_message.clone().unwrap_or_default(),
            }
        }
        _ => {}
    }

    let mut fixable_count = 0usize;
    let mut fixable: Vec<String> = Vec::new();
    for issue in report.issues.as_deref().unwrap_or_default() {
        if fixable_linters.iter().any(|l| l == &issue.linter) {
            fixable_count += 1;
            if !fixable.contains(&issue.linter) {
                fixable.push(issue.linter.clone());
            }
        }
    }

    FixReport::Preview {
        module: report.module.clone(),
        current_status: report.status,
        current_total_issues: report.summary.as_ref().map_or(0, |s| s.total_issues),
        estimated_fixable_issues: fixable_count,
        fixable_linters: fixable,
        auto_fixable_types: vec![
            "formatting (gofmt)".into(),
            "imports (goimports)".into(),
            "comment spacing (revive)".into(),
        ],
        manual_fix_required: vec![
            "code duplication".into(),
            "logic errors".into(),
            "test assertions".into(),
            "unused parameters".into(),
        ],
        message: format!(
            "Estimated {} issues can be auto-fixed. Run fix without --preview to apply.",
            fixable_count
        ),
    }
}
