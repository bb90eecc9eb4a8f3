//! Shared data models: module catalogue plus lint, fix and coverage reports.

pub mod coverage;
pub mod lint;
pub mod module;

pub use coverage::{
    CoverageReport, CoverageStatus, CoverageSummary, FileCoverageSummary, QualityAssessment,
    QualityRating,
};
pub use lint::{FixReport, FixToolResult, LintIssue, LintReport, LintStatus, LintSummary, Severity};
pub use module::{Module, Registry};
