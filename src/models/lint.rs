//! Lint and fix report schema.
//!
//! `LintReport` is the canonical form every golangci-lint outcome is
//! normalized into. Breakdown maps are `BTreeMap`s so serialized reports are
//! byte-stable for identical input.

use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LintStatus {
    Success,
    CompletedWithIssues,
    Error,
    Timeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
    Unknown,
}

impl Severity {
    /// Map a tool severity string; anything unrecognized is `Unknown`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "error" => Severity::Error,
            "warning" | "warn" => Severity::Warning,
            "info" => Severity::Info,
            _ => Severity::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
            Severity::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// A single issue reported by the lint tool.
pub struct LintIssue {
    pub file: String,
    pub line: u64,
    pub column: u64,
    pub severity: Severity,
    pub message: String,
    pub linter: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
/// Issue counts overall, per severity and per linter.
pub struct LintSummary {
    pub total_issues: usize,
    pub severity_breakdown: BTreeMap<String, usize>,
    pub linter_breakdown: BTreeMap<String, usize>,
}

impl LintSummary {
    pub fn from_issues(issues: &[LintIssue]) -> Self {
        let mut summary = LintSummary {
            total_issues: issues.len(),
            ..Default::default()
        };
        for issue in issues {
            *summary
                .severity_breakdown
                .entry(issue.severity.as_str().to_string())
                .or_insert(0) += 1;
            *summary
                .linter_breakdown
                .entry(issue.linter.clone())
                .or_insert(0) += 1;
        }
        summary
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Normalized lint result for one module.
pub struct LintReport {
    pub module: String,
    pub status: LintStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issues: Option<Vec<LintIssue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<LintSummary>,
    /// Verbatim stdout when it could not be parsed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_code: Option<i32>,
}

impl LintReport {
    fn bare(module: &str, status: LintStatus) -> Self {
        Self {
            module: module.to_string(),
            status,
            issues: None,
            summary: None,
            raw_output: None,
            stderr: None,
            error_message: None,
            return_code: None,
        }
    }

    /// Report carrying parsed issues; status follows from emptiness.
    pub fn with_issues(module: &str, issues: Vec<LintIssue>) -> Self {
        let status = if issues.is_empty() {
            LintStatus::Success
        } else {
            LintStatus::CompletedWithIssues
        };
        let mut report = Self::bare(module, status);
        report.summary = Some(LintSummary::from_issues(&issues));
        report.issues = Some(issues);
        report
    }

    /// Fallback report for output that did not parse.
    pub fn unparsed(module: &str, raw_output: String, stderr: String) -> Self {
        let mut report = Self::bare(module, LintStatus::CompletedWithIssues);
        report.raw_output = Some(raw_output);
        report.stderr = Some(stderr);
        report
    }

    pub fn error(module: &str, message: String, return_code: Option<i32>) -> Self {
        let mut report = Self::bare(module, LintStatus::Error);
        report.error_message = Some(message);
        report.return_code = return_code;
        report
    }

    pub fn timeout(module: &str, message: String) -> Self {
        let mut report = Self::bare(module, LintStatus::Timeout);
        report.error_message = Some(message);
        report
    }

    pub fn is_clean(&self) -> bool {
        self.status == LintStatus::Success
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Captured output of the `--fix` run.
pub struct FixToolResult {
    pub return_code: i32,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
/// Outcome of a fix request, either a preview or an applied fix.
pub enum FixReport {
    Preview {
        module: String,
        current_status: LintStatus,
        current_total_issues: usize,
        estimated_fixable_issues: usize,
        fixable_linters: Vec<String>,
        auto_fixable_types: Vec<String>,
        manual_fix_required: Vec<String>,
        message: String,
    },
    FixCompleted {
        module: String,
        fix_result: FixToolResult,
        remaining_status: LintStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        remaining_issues_summary: Option<LintSummary>,
        message: String,
    },
    Timeout {
        module: String,
        error_message: String,
    },
    Error {
        module: String,
        error_message: String,
    },
}

impl FixReport {
    pub fn module(&self) -> &str {
        match self {
            FixReport::Preview { module, .. }
            | FixReport::FixCompleted { module, .. }
            | FixReport::Timeout { module, .. }
            | FixReport::Error { module, .. } => module,
        }
    }
}
