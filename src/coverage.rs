//! Coverage collection and aggregation.
//!
//! `go test -coverprofile` writes an artifact into the module directory,
//! `go tool cover -func` renders it as per-function percentages, and
//! `aggregate` turns that text into per-file statistics, a quality rating and
//! suggestions. Lines that do not parse are skipped, never fatal.

use crate::config::CoverageSettings;
use crate::models::{
    CoverageReport, CoverageStatus, CoverageSummary, FileCoverageSummary, Module, QualityAssessment,
    QualityRating,
};
use crate::tool::{Invocation, ToolOutcome, ToolRunner};
use crate::utils::truncate_chars;
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info};

/// Default threshold below which a file counts as low coverage.
pub const DEFAULT_THRESHOLD: f64 = 50.0;
/// Maximum characters of failing test output kept in a report.
pub const TEST_OUTPUT_LIMIT: usize = 5000;
const ARTIFACT_NAME: &str = ".modkit-coverage.out";
const MAX_FILE_SUGGESTIONS: usize = 3;

#[derive(Debug, Clone, PartialEq)]
/// One function-level measurement from the rendered coverage text.
pub struct FunctionCoverageRecord {
    pub file: String,
    pub percentage: f64,
    pub covered: bool,
}

fn percent_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+(?:\.\d+)?)%$").expect("valid percent regex"))
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn parse_percent(token: &str) -> Option<f64> {
    let caps = percent_re().captures(token.trim())?;
    let v: f64 = caps[1].parse().ok()?;
    (0.0..=100.0).contains(&v).then_some(v)
}

/// Index of the summary line: the last line containing `total:` in any case.
fn total_line_index(lines: &[&str]) -> Option<usize> {
    lines
        .iter()
        .rposition(|l| l.to_ascii_lowercase().contains("total:"))
}

/// Overall coverage from the total line.
pub fn parse_total(text: &str) -> CoverageSummary {
    let lines: Vec<&str> = text.trim().lines().collect();
    let Some(idx) = total_line_index(&lines) else {
        return CoverageSummary {
            total_coverage: 0.0,
            total_line: None,
            error: Some("Could not find total coverage line.".into()),
        };
    };
    let line = lines[idx];
    match line.split_whitespace().last().and_then(parse_percent) {
        Some(v) => CoverageSummary {
            total_coverage: round2(v),
            total_line: Some(line.trim().to_string()),
            error: None,
        },
        None => CoverageSummary {
            total_coverage: 0.0,
            total_line: None,
            error: Some("Could not parse total coverage percentage.".into()),
        },
    }
}

/// Parse one `<file>:<line>:\t<func>\t<pct>%` line.
///
/// The file is everything before the rightmost colon of the first field, with
/// a trailing `:<digits>` segment removed. Paths with other embedded colons
/// are kept as-is.
pub fn parse_function_line(line: &str) -> Option<FunctionCoverageRecord> {
    let fields: Vec<&str> = line
        .trim()
        .split('\t')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .collect();
    if fields.len() < 2 {
        return None;
    }
    let locator = fields[0];
    let (mut file, _) = locator.rsplit_once(':')?;
    if let Some((head, tail)) = file.rsplit_once(':') {
        if !tail.is_empty() && tail.bytes().all(|b| b.is_ascii_digit()) {
            file = head;
        }
    }
    if file.is_empty() {
        return None;
    }
    let percentage = parse_percent(fields[fields.len() - 1])?;
    Some(FunctionCoverageRecord {
        file: file.to_string(),
        percentage,
        covered: percentage > 0.0,
    })
}

/// Function records from every non-total line, in input order.
pub fn parse_function_records(text: &str) -> Vec<FunctionCoverageRecord> {
    let lines: Vec<&str> = text.trim().lines().collect();
    let total_idx = total_line_index(&lines);
    lines
        .iter()
        .enumerate()
        .filter(|(i, l)| {
            Some(*i) != total_idx && !l.trim_start().to_ascii_lowercase().starts_with("total:")
        })
        .filter_map(|(_, l)| {
            let rec = parse_function_line(l);
            if rec.is_none() && !l.trim().is_empty() {
                debug!("skipping coverage line {:?}", l);
            }
            rec
        })
        .collect()
}

/// Per-file statistics sorted ascending by coverage (stable on ties).
pub fn summarize_files(records: &[FunctionCoverageRecord]) -> Vec<FileCoverageSummary> {
    let mut order: Vec<(String, usize, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for rec in records {
        let i = *index.entry(rec.file.as_str()).or_insert_with(|| {
            order.push((rec.file.clone(), 0, 0));
            order.len() - 1
        });
        order[i].1 += 1;
        if rec.covered {
            order[i].2 += 1;
        }
    }
    let mut files: Vec<FileCoverageSummary> = order
        .into_iter()
        .map(|(file, total, covered)| FileCoverageSummary {
            file,
            coverage: if total > 0 {
                round2(covered as f64 / total as f64 * 100.0)
            } else {
                0.0
            },
            functions_total: total,
            functions_covered: covered,
        })
        .collect();
    files.sort_by(|a, b| a.coverage.total_cmp(&b.coverage));
    files
}

/// Render a percentage the way the report text shows it (`50.0`, `33.33`).
pub fn format_percent(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{:.1}", v)
    } else {
        format!("{}", v)
    }
}

/// Suggestions for the given overall coverage and low-coverage files.
pub fn suggestions(total: f64, low_files: &[FileCoverageSummary]) -> Vec<String> {
    let mut out = Vec::new();
    out.push(
        match QualityRating::from_total(total) {
            QualityRating::Low => "🎯 Priority: Add basic unit tests for core functionality.",
            QualityRating::Moderate => "✅ Add tests for error handling and edge cases.",
            _ => "🏆 Focus on covering remaining complex logic and edge cases.",
        }
        .to_string(),
    );
    if !low_files.is_empty() {
        out.push(format!(
            "⚠️ Focus on improving test coverage for these {} files:",
            low_files.len()
        ));
        for f in low_files.iter().take(MAX_FILE_SUGGESTIONS) {
            out.push(format!(
                "  - {} ({}% coverage)",
                f.file,
                format_percent(f.coverage)
            ));
        }
    }
    out.push("💡 Use table-driven tests for comprehensive case coverage.".into());
    out.push("🔄 Run tests with the -race flag to detect data races in concurrent code.".into());
    out
}

/// Build a coverage report from rendered per-function coverage text.
pub fn aggregate(module: &str, text: &str, threshold: f64) -> CoverageReport {
    let summary = parse_total(text);
    let files = summarize_files(&parse_function_records(text));
    let low: Vec<FileCoverageSummary> = files
        .iter()
        .filter(|f| f.coverage < threshold)
        .cloned()
        .collect();
    let total = summary.total_coverage;

    let mut report = CoverageReport::with_status(module, CoverageStatus::Success);
    report.coverage_analysis = Some(QualityAssessment::from(QualityRating::from_total(total)));
    report.suggestions = suggestions(total, &low);
    report.coverage_summary = Some(summary);
    report.file_summary = Some(files);
    report.low_coverage_files = Some(low);
    report
}

/// Coverage artifact that is removed when dropped.
struct Artifact(PathBuf);

impl Artifact {
    /// Claim the artifact path, discarding anything left by an earlier run.
    fn in_dir(dir: &Path) -> Self {
        let artifact = Artifact(dir.join(ARTIFACT_NAME));
        artifact.remove();
        artifact
    }

    fn remove(&self) {
        if self.0.exists() {
            if let Err(e) = fs::remove_file(&self.0) {
                debug!("could not remove {}: {}", self.0.display(), e);
            }
        }
    }
}

impl Drop for Artifact {
    fn drop(&mut self) {
        self.remove();
    }
}

/// Run tests with coverage for one module and aggregate the result.
pub fn run_coverage(
    runner: &dyn ToolRunner,
    settings: &CoverageSettings,
    module: &Module,
    threshold: f64,
) -> CoverageReport {
    let artifact = Artifact::in_dir(&module.dir);
    let profile = format!("-coverprofile={}", artifact.0.to_string_lossy());

    let test = Invocation::new("go", &module.dir, settings.test_timeout).args([
        "test".to_string(),
        profile,
        "./...".to_string(),
    ]);
    match runner.run(&test) {
        ToolOutcome::Completed(out) if out.exit_code != 0 => {
            let text = if out.stderr.trim().is_empty() {
                out.stdout
            } else {
                out.stderr
            };
            return CoverageReport::test_failure(
                &module.id,
                truncate_chars(&text, TEST_OUTPUT_LIMIT).to_string(),
            );
        }
        ToolOutcome::Completed(_) => {}
        other => return tool_failure(&module.id, other, "Coverage test run"),
    }

    if !artifact.0.exists() {
        return CoverageReport::no_coverage_data(&module.id);
    }

    let render = Invocation::new("go", &module.dir, settings.report_timeout).args([
        "tool".to_string(),
        "cover".to_string(),
        format!("-func={}", artifact.0.to_string_lossy()),
    ]);
    let outcome = runner.run(&render);
    drop(artifact);

    match outcome {
        ToolOutcome::Completed(out) if out.exit_code != 0 => {
            CoverageReport::analysis_failed(&module.id, out.stderr)
        }
        ToolOutcome::Completed(out) => {
            let report = aggregate(&module.id, &out.stdout, threshold);
            info!(
                "coverage {}: {:.2}%",
                module.id,
                report.total_coverage().unwrap_or(0.0)
            );
            report
        }
        other => tool_failure(&module.id, other, "Coverage analysis"),
    }
}

fn tool_failure(module: &str, outcome: ToolOutcome, step: &str) -> CoverageReport {
    match outcome {
        ToolOutcome::TimedOut { after } => CoverageReport::timeout(
            module,
            format!("{} timed out after {}s", step, after.as_secs()),
        ),
        ToolOutcome::Missing { program } => CoverageReport::error(
            module,
            format!("{} not found. Please ensure it's installed and in PATH.", program),
        ),
        ToolOutcome::Failed { message } => CoverageReport::error(module, message),
        ToolOutcome::Completed(out) => CoverageReport::error(
            module,
            format!("{} exited with {}", step, out.exit_code),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::testing::ScriptedRunner;
    use std::time::Duration;
    use tempfile::tempdir;

    const SAMPLE: &str = "pkg/a.go:10:\tFoo\t100.0%\npkg/a.go:20:\tBar\t0.0%\npkg/b.go:5:\tBaz\t0.0%\ntotal:\t(statements)\t33.3%";

    fn settings() -> CoverageSettings {
        CoverageSettings {
            threshold: DEFAULT_THRESHOLD,
            test_timeout: Duration::from_secs(300),
            report_timeout: Duration::from_secs(60),
        }
    }

    #[test]
    fn test_aggregate_end_to_end_sample() {
        let r = aggregate("m", SAMPLE, DEFAULT_THRESHOLD);
        assert_eq!(r.status, CoverageStatus::Success);
        assert_eq!(r.total_coverage(), Some(33.3));
        let files = r.file_summary.as_ref().unwrap();
        let names: Vec<_> = files.iter().map(|f| f.file.as_str()).collect();
        assert_eq!(names, vec!["pkg/b.go", "pkg/a.go"]);
        assert_eq!(files[1].coverage, 50.0);
        assert_eq!((files[1].functions_covered, files[1].functions_total), (1, 2));
        assert_eq!(files[0].coverage, 0.0);
        let low: Vec<_> = r
            .low_coverage_files
            .as_ref()
            .unwrap()
            .iter()
            .map(|f| f.file.as_str())
            .collect();
        assert_eq!(low, vec!["pkg/b.go"]);
        assert_eq!(
            r.coverage_analysis.as_ref().unwrap().quality_rating,
            QualityRating::Low
        );
    }

    #[test]
    fn test_suggestions_are_ordered_and_capped() {
        let text = "a.go:1:\tA\t0.0%\nb.go:1:\tB\t0.0%\nc.go:1:\tC\t0.0%\nd.go:1:\tD\t0.0%\ne.go:1:\tE\t80.0%\ntotal:\t(statements)\t16.0%";
        let r = aggregate("m", text, DEFAULT_THRESHOLD);
        assert_eq!(
            r.suggestions,
            vec![
                "🎯 Priority: Add basic unit tests for core functionality.",
                "⚠️ Focus on improving test coverage for these 4 files:",
                "  - a.go (0.0% coverage)",
                "  - b.go (0.0% coverage)",
                "  - c.go (0.0% coverage)",
                "💡 Use table-driven tests for comprehensive case coverage.",
                "🔄 Run tests with the -race flag to detect data races in concurrent code.",
            ]
        );
        assert_eq!(r.suggestions, aggregate("m", text, DEFAULT_THRESHOLD).suggestions);
    }

    #[test]
    fn test_suggestion_tiers() {
        assert!(suggestions(60.0, &[])[0].starts_with("✅"));
        assert!(suggestions(70.0, &[])[0].starts_with("🏆"));
        assert_eq!(suggestions(90.0, &[]).len(), 3);
    }

    #[test]
    fn test_missing_total_defaults_to_zero() {
        let s = parse_total("pkg/a.go:10:\tFoo\t100.0%");
        assert_eq!(s.total_coverage, 0.0);
        assert!(s.error.is_some());
        let s = parse_total("total:\t(statements)\tn/a");
        assert_eq!(s.total_coverage, 0.0);
        assert_eq!(
            s.error.as_deref(),
            Some("Could not parse total coverage percentage.")
        );
    }

    #[test]
    fn test_total_found_from_end_when_paths_contain_marker() {
        let text = "pkg/Total:x/a.go:3:\tF\t50.0%\nTOTAL:\t(statements)\t50.0%";
        let s = parse_total(text);
        assert_eq!(s.total_coverage, 50.0);
        let recs = parse_function_records(text);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].file, "pkg/Total:x/a.go");
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let text = "garbage\npkg/a.go:1:\tF\tnan%\npkg/a.go:2:\tG\t150.0%\nnocolon\tF\t5.0%\npkg/c.go:3:\tH\t12.5%\ntotal:\t(statements)\t12.5%";
        let recs = parse_function_records(text);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].file, "pkg/c.go");
    }

    #[test]
    fn test_file_line_suffix_is_stripped() {
        let rec = parse_function_line("C:/src/pkg/a.go:42:\tRun\t75.0%").unwrap();
        assert_eq!(rec.file, "C:/src/pkg/a.go");
        assert!(rec.covered);
        let rec = parse_function_line("pkg/a.go:12:\tRun\t0.0%").unwrap();
        assert_eq!(rec.file, "pkg/a.go");
        assert!(!rec.covered);
    }

    #[test]
    fn test_coverage_bounds_hold() {
        let text = "x.go:1:\tA\t100.0%\nx.go:2:\tB\t100.0%\ny.go:1:\tC\t33.3%\ny.go:2:\tD\t0.0%\ny.go:3:\tE\t0.0%\ntotal:\t(statements)\t61.0%";
        let r = aggregate("m", text, DEFAULT_THRESHOLD);
        let total = r.total_coverage().unwrap();
        assert!((0.0..=100.0).contains(&total));
        for f in r.file_summary.unwrap() {
            assert!((0.0..=100.0).contains(&f.coverage));
            assert!(f.functions_covered <= f.functions_total);
        }
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(50.0), "50.0");
        assert_eq!(format_percent(0.0), "0.0");
        assert_eq!(format_percent(33.33), "33.33");
    }

    fn module_in(dir: &Path) -> Module {
        Module {
            id: "svc".into(),
            dir: dir.to_path_buf(),
            import_path: None,
        }
    }

    #[test]
    fn test_run_coverage_success_removes_artifact() {
        let dir = tempdir().unwrap();
        let artifact = dir.path().join(ARTIFACT_NAME);
        let runner = ScriptedRunner::default()
            .on("go", "test", ScriptedRunner::completed(0, "ok", ""))
            .creating("go", "test", artifact.clone())
            .on("go", "tool", ScriptedRunner::completed(0, SAMPLE, ""));
        let r = run_coverage(&runner, &settings(), &module_in(dir.path()), DEFAULT_THRESHOLD);
        assert_eq!(r.status, CoverageStatus::Success);
        assert_eq!(r.total_coverage(), Some(33.3));
        assert!(!artifact.exists());
        assert_eq!(runner.calls().len(), 2);
    }

    #[test]
    fn test_run_coverage_test_failure_is_truncated() {
        let dir = tempdir().unwrap();
        let long = "x".repeat(TEST_OUTPUT_LIMIT + 100);
        let runner = ScriptedRunner::default().on(
            "go",
            "test",
            ScriptedRunner::completed(1, "", &long),
        );
        let r = run_coverage(&runner, &settings(), &module_in(dir.path()), DEFAULT_THRESHOLD);
        assert_eq!(r.status, CoverageStatus::TestFailure);
        assert_eq!(r.test_output.unwrap().chars().count(), TEST_OUTPUT_LIMIT);
        assert_eq!(runner.calls().len(), 1);
    }

    #[test]
    fn test_run_coverage_without_artifact() {
        let dir = tempdir().unwrap();
        let runner =
            ScriptedRunner::default().on("go", "test", ScriptedRunner::completed(0, "", ""));
        let r = run_coverage(&runner, &settings(), &module_in(dir.path()), DEFAULT_THRESHOLD);
        assert_eq!(r.status, CoverageStatus::NoCoverageData);
    }

    #[test]
    fn test_stale_artifact_is_not_reused() {
        let dir = tempdir().unwrap();
        let artifact = dir.path().join(ARTIFACT_NAME);
        fs::write(&artifact, "mode: set\n").unwrap();
        let runner = ScriptedRunner::default()
            .on("go", "test", ScriptedRunner::completed(0, "", ""))
            .on("go", "tool", ScriptedRunner::completed(0, SAMPLE, ""));
        let r = run_coverage(&runner, &settings(), &module_in(dir.path()), DEFAULT_THRESHOLD);
        assert_eq!(r.status, CoverageStatus::NoCoverageData);
        assert_eq!(runner.calls().len(), 1);
        assert!(!artifact.exists());
    }

    #[test]
    fn test_missing_go_toolchain_is_an_error_report() {
        let dir = tempdir().unwrap();
        let r = run_coverage(
            &ScriptedRunner::default(),
            &settings(),
            &module_in(dir.path()),
            DEFAULT_THRESHOLD,
        );
        assert_eq!(r.status, CoverageStatus::Error);
        assert_eq!(
            r.error_message.as_deref(),
            Some("go not found. Please ensure it's installed and in PATH.")
        );
    }

    #[test]
    fn test_run_coverage_render_failure_and_timeout() {
        let dir = tempdir().unwrap();
        let artifact = dir.path().join(ARTIFACT_NAME);
        let runner = ScriptedRunner::default()
            .on("go", "test", ScriptedRunner::completed(0, "", ""))
            .creating("go", "test", artifact.clone())
            .on("go", "tool", ScriptedRunner::completed(1, "", "bad profile"));
        let r = run_coverage(&runner, &settings(), &module_in(dir.path()), DEFAULT_THRESHOLD);
        assert_eq!(r.status, CoverageStatus::CoverageAnalysisFailed);
        assert_eq!(r.coverage_output.as_deref(), Some("bad profile"));
        assert!(!artifact.exists());

        let runner = ScriptedRunner::default().on(
            "go",
            "test",
            ToolOutcome::TimedOut {
                after: Duration::from_secs(300),
            },
        );
        let r = run_coverage(&runner, &settings(), &module_in(dir.path()), DEFAULT_THRESHOLD);
        assert_eq!(r.status, CoverageStatus::Timeout);
    }
}
