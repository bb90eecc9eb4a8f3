//! Configuration discovery and effective settings resolution.
//!
//! modkit reads `modkit.toml|yaml|yml` from the repository root (or closest
//! ancestor) and merges it with CLI flags to produce an `Effective` config.
//! Defaults:
//! - `output`: `human`
//! - `manifest`: `go.mod`
//! - `package_prefixes`: none (prefixes implied by manifests are always added)
//! - `lint.binary|config|timeout_secs`: `golangci-lint`, `.golangci.yml`, 300
//! - `lint.fixable_linters`: gofmt, goimports, revive
//! - `coverage.threshold|test_timeout_secs|report_timeout_secs`: 50.0, 300, 60
//! - `git.timeout_secs`: 30
//!
//! Overrides precedence: CLI > config file > defaults.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

const CONFIG_NAMES: [&str; 3] = ["modkit.toml", "modkit.yaml", "modkit.yml"];

#[derive(Debug, Default, Deserialize, Clone)]
/// Lint section under `[lint]`.
pub struct LintCfg {
    pub binary: Option<String>,
    pub config: Option<String>,
    pub timeout_secs: Option<u64>,
    pub fixable_linters: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Coverage section under `[coverage]`.
pub struct CoverageCfg {
    pub threshold: Option<f64>,
    pub test_timeout_secs: Option<u64>,
    pub report_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct GitCfg {
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `modkit.toml|yaml`.
pub struct ModkitConfig {
    pub output: Option<String>,
    pub manifest: Option<String>,
    #[serde(default)]
    pub package_prefixes: Vec<String>,
    pub lint: Option<LintCfg>,
    pub coverage: Option<CoverageCfg>,
    pub git: Option<GitCfg>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LintSettings {
    pub binary: String,
    /// Absolute path of the linter configuration file.
    pub config: PathBuf,
    pub timeout: Duration,
    pub fixable_linters: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoverageSettings {
    pub threshold: f64,
    pub test_timeout: Duration,
    pub report_timeout: Duration,
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by commands after applying precedence.
pub struct Effective {
    pub repo_root: PathBuf,
    pub config_found: bool,
    pub output: String,
    pub manifest: String,
    pub package_prefixes: Vec<String>,
    pub lint: LintSettings,
    pub coverage: CoverageSettings,
    pub git_timeout: Duration,
}

/// Walk upward from `start` to detect the repository root.
///
/// Stops when a `modkit.toml|yaml|yml` or a `.git` entry is found.
pub fn detect_repo_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if CONFIG_NAMES.iter().any(|n| cur.join(n).exists()) || cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.to_path_buf(),
        }
    }
}

/// Load `ModkitConfig` from `modkit.toml` or `modkit.yaml|yml` if present.
pub fn load_config(root: &Path) -> Option<ModkitConfig> {
    let toml_path = root.join("modkit.toml");
    if toml_path.exists() {
        let s = fs::read_to_string(&toml_path).ok()?;
        return match toml::from_str(&s) {
            Ok(cfg) => Some(cfg),
            Err(e) => {
                debug!("ignoring invalid {}: {}", toml_path.display(), e);
                None
            }
        };
    }
    for yml in ["modkit.yaml", "modkit.yml"] {
        let p = root.join(yml);
        if p.exists() {
            let s = fs::read_to_string(&p).ok()?;
            return match serde_yaml::from_str(&s) {
                Ok(cfg) => Some(cfg),
                Err(e) => {
                    debug!("ignoring invalid {}: {}", p.display(), e);
                    None
                }
            };
        }
    }
    None
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults.
pub fn resolve_effective(
    cli_repo_root: Option<&str>,
    cli_output: Option<&str>,
    cli_threshold: Option<f64>,
) -> Effective {
    let start = PathBuf::from(cli_repo_root.unwrap_or("."));
    let start = fs::canonicalize(&start).unwrap_or(start);
    let repo_root = detect_repo_root(&start);
    let loaded = load_config(&repo_root);
    let config_found = loaded.is_some();
    let cfg = loaded.unwrap_or_default();

    let output = cli_output
        .map(|s| s.to_string())
        .or(cfg.output)
        .unwrap_or_else(|| "human".to_string());
    let manifest = cfg.manifest.unwrap_or_else(|| "go.mod".to_string());

    let lint_cfg = cfg.lint.unwrap_or_default();
    let lint = LintSettings {
        binary: lint_cfg
            .binary
            .unwrap_or_else(|| "golangci-lint".to_string()),
        config: repo_root.join(lint_cfg.config.as_deref().unwrap_or(".golangci.yml")),
        timeout: Duration::from_secs(lint_cfg.timeout_secs.unwrap_or(300)),
        fixable_linters: lint_cfg.fixable_linters.unwrap_or_else(|| {
            vec!["gofmt".into(), "goimports".into(), "revive".into()]
        }),
    };

    let cov_cfg = cfg.coverage.unwrap_or_default();
    let coverage = CoverageSettings {
        threshold: cli_threshold
            .or(cov_cfg.threshold)
            .unwrap_or(crate::coverage::DEFAULT_THRESHOLD),
        test_timeout: Duration::from_secs(cov_cfg.test_timeout_secs.unwrap_or(300)),
        report_timeout: Duration::from_secs(cov_cfg.report_timeout_secs.unwrap_or(60)),
    };

    let git_timeout = Duration::from_secs(cfg.git.and_then(|g| g.timeout_secs).unwrap_or(30));

    Effective {
        repo_root,
        config_found,
        output,
        manifest,
        package_prefixes: cfg.package_prefixes,
        lint,
        coverage,
        git_timeout,
    }
}
