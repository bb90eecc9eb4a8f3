//! Coverage report schema.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageStatus {
    Success,
    TestFailure,
    NoCoverageData,
    CoverageAnalysisFailed,
    Timeout,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityRating {
    Excellent,
    Good,
    Moderate,
    Low,
}

impl QualityRating {
    /// Tier for an overall coverage percentage.
    pub fn from_total(total: f64) -> Self {
        if total >= 80.0 {
            QualityRating::Excellent
        } else if total >= 70.0 {
            QualityRating::Good
        } else if total >= 50.0 {
            QualityRating::Moderate
        } else {
            QualityRating::Low
        }
    }

    pub fn assessment(&self) -> &'static str {
        match self {
            QualityRating::Excellent => "Great coverage! Your code is well-tested.",
            QualityRating::Good => {
                "Good coverage. Consider adding a few more tests for critical paths."
            }
            QualityRating::Moderate => {
                "Moderate coverage. Adding more tests would improve code reliability."
            }
            QualityRating::Low => "Low coverage. Significant testing improvements are needed.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityAssessment {
    pub quality_rating: QualityRating,
    pub assessment: String,
}

impl From<QualityRating> for QualityAssessment {
    fn from(rating: QualityRating) -> Self {
        Self {
            quality_rating: rating,
            assessment: rating.assessment().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// Overall coverage as reported by the tool's total line.
pub struct CoverageSummary {
    pub total_coverage: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_line: Option<String>,
    /// Set when the total line is missing or unreadable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileCoverageSummary {
    pub file: String,
    pub coverage: f64,
    pub functions_total: usize,
    pub functions_covered: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageReport {
    pub module: String,
    pub status: CoverageStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage_summary: Option<CoverageSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_summary: Option<Vec<FileCoverageSummary>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_coverage_files: Option<Vec<FileCoverageSummary>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage_analysis: Option<QualityAssessment>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Excerpt of the failing test run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage_output: Option<String>,
}

impl CoverageReport {
    /// Report with only a status; failure constructors fill in details.
    pub fn with_status(module: &str, status: CoverageStatus) -> Self {
        Self {
            module: module.to_string(),
            status,
            coverage_summary: None,
            file_summary: None,
            low_coverage_files: None,
            coverage_analysis: None,
            suggestions: Vec::new(),
            error_message: None,
            message: None,
            test_output: None,
            coverage_output: None,
        }
    }

    pub fn test_failure(module: &str, excerpt: String) -> Self {
        let mut r = Self::with_status(module, CoverageStatus::TestFailure);
        r.error_message = Some("Tests failed, cannot generate coverage report.".into());
        r.test_output = Some(excerpt);
        r
    }

    pub fn no_coverage_data(module: &str) -> Self {
        let mut r = Self::with_status(module, CoverageStatus::NoCoverageData);
        r.message = Some("No coverage data generated. Module may not have any tests.".into());
        r
    }

    pub fn analysis_failed(module: &str, stderr: String) -> Self {
        let mut r = Self::with_status(module, CoverageStatus::CoverageAnalysisFailed);
        r.error_message = Some("Failed to analyze coverage data.".into());
        r.coverage_output = Some(stderr);
        r
    }

    pub fn timeout(module: &str, message: String) -> Self {
        let mut r = Self::with_status(module, CoverageStatus::Timeout);
        r.error_message = Some(message);
        r
    }

    pub fn error(module: &str, message: String) -> Self {
        let mut r = Self::with_status(module, CoverageStatus::Error);
        r.error_message = Some(message);
        r
    }

    pub fn total_coverage(&self) -> Option<f64> {
        self.coverage_summary.as_ref().map(|s| s.total_coverage)
    }
}
