//! Operation facade over one project root.
//!
//! Every call rediscovers the module registry, so results always reflect the
//! tree as it is now. Lookups that fail return a `ModkitError` carrying the
//! known module list; tool problems surface as report statuses.

use crate::config::Effective;
use crate::coverage;
use crate::errors::ModkitError;
use crate::git;
use crate::info::{self, ModuleInfo};
use crate::lint;
use crate::models::{CoverageReport, FixReport, LintReport, Module, Registry};
use crate::registry;
use crate::resolve;
use crate::tool::ToolRunner;
use rayon::prelude::*;
use std::sync::Arc;

pub struct Workspace {
    settings: Effective,
    runner: Arc<dyn ToolRunner>,
}

impl Workspace {
    pub fn new(settings: Effective, runner: Arc<dyn ToolRunner>) -> Self {
        Self { settings, runner }
    }

    pub fn settings(&self) -> &Effective {
        &self.settings
    }

    /// Fresh module catalogue for the project root.
    pub fn registry(&self) -> Result<Registry, ModkitError> {
        registry::discover(&self.settings.repo_root, &self.settings.manifest)
    }

    pub fn modules(&self) -> Result<Vec<Module>, ModkitError> {
        Ok(self.registry()?.modules().to_vec())
    }

    /// Modules touched by the staged changeset.
    pub fn staged_modules(&self) -> Result<Vec<Module>, ModkitError> {
        let registry = self.registry()?;
        let files = git::staged_files(
            self.runner.as_ref(),
            &self.settings.repo_root,
            self.settings.git_timeout,
        );
        Ok(resolve::map_changes(
            &files,
            &self.settings.repo_root,
            &registry,
        ))
    }

    pub fn module_for_package(&self, pkg: &str) -> Result<Module, ModkitError> {
        let registry = self.registry()?;
        let prefixes = resolve::package_prefixes(&self.settings.package_prefixes, &registry);
        resolve::resolve_package(pkg, &registry, &prefixes).cloned()
    }

    /// Locate a module directory by id and confirm it holds a manifest.
    pub fn locate(&self, id: &str) -> Result<Module, ModkitError> {
        let id = id.trim().trim_matches('/');
        let dir = self.settings.repo_root.join(id);
        if id.is_empty() || !dir.is_dir() {
            return Err(ModkitError::ModuleNotFound {
                module: id.to_string(),
                available: self.registry()?.ids(),
            });
        }
        let manifest = dir.join(&self.settings.manifest);
        if !manifest.is_file() {
            return Err(ModkitError::ManifestMissing {
                module: id.to_string(),
                path: dir,
            });
        }
        Ok(Module {
            id: id.to_string(),
            import_path: registry::read_import_path(&manifest),
            dir,
        })
    }

    pub fn info(&self, id: &str) -> Result<ModuleInfo, ModkitError> {
        let module = self.locate(id)?;
        info::module_info(&module, &self.settings.manifest)
    }

    pub fn lint(&self, id: &str) -> Result<LintReport, ModkitError> {
        let module = self.locate(id)?;
        Ok(lint::run_lint(
            self.runner.as_ref(),
            &self.settings.lint,
            &module,
        ))
    }

    /// Lint several modules in parallel; reports keep the input order.
    pub fn lint_many(&self, modules: &[Module]) -> Vec<LintReport> {
        modules
            .par_iter()
            .map(|m| lint::run_lint(self.runner.as_ref(), &self.settings.lint, m))
            .collect()
    }

    pub fn fix(&self, id: &str, preview: bool) -> Result<FixReport, ModkitError> {
        let module = self.locate(id)?;
        Ok(lint::run_fix(
            self.runner.as_ref(),
            &self.settings.lint,
            &module,
            preview,
        ))
    }

    pub fn coverage(
        &self,
        id: &str,
        threshold: Option<f64>,
    ) -> Result<CoverageReport, ModkitError> {
        let module = self.locate(id)?;
        Ok(coverage::run_coverage(
            self.runner.as_ref(),
            &self.settings.coverage,
            &module,
            threshold.unwrap_or(self.settings.coverage.threshold),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::resolve_effective;
    use crate::models::LintStatus;
    use crate::tool::testing::ScriptedRunner;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn seed(root: &Path) {
        fs::create_dir_all(root.join(".git")).unwrap();
        for (rel, name) in [
            ("identity", "github.com/acme/cp/identity"),
            ("identity/api", "github.com/acme/cp/identity/api"),
            ("rover", "github.com/acme/cp/rover"),
        ] {
            fs::create_dir_all(root.join(rel)).unwrap();
            fs::write(root.join(rel).join("go.mod"), format!("module {}\n", name)).unwrap();
        }
        fs::create_dir_all(root.join("docs")).unwrap();
    }

    fn workspace(root: &Path, runner: ScriptedRunner) -> Workspace {
        let eff = resolve_effective(root.to_str(), None, None);
        Workspace::new(eff, Arc::new(runner))
    }

    #[test]
    fn test_staged_modules_map_to_deepest_module() {
        let dir = tempdir().unwrap();
        seed(dir.path());
        let runner = ScriptedRunner::default().on(
            "git",
            "diff",
            ScriptedRunner::completed(
                0,
                "identity/api/v1/types.go\0identity/api/v1/more.go\0rover/main.go\0README.md\0",
                "",
            ),
        );
        let ws = workspace(dir.path(), runner);
        let ids: Vec<_> = ws
            .staged_modules()
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec!["identity/api", "rover"]);
    }

    #[test]
    fn test_staged_modules_below_git_top_level() {
        use crate::tool::LiveRunner;
        use std::process::Command;

        let dir = tempdir().unwrap();
        let top = dir.path();
        let git = |args: &[&str]| {
            Command::new("git")
                .args(args)
                .current_dir(top)
                .output()
                .map(|o| o.status.success())
                .unwrap_or(false)
        };
        if !git(&["init", "-q"]) {
            // git is not installed here
            return;
        }
        let project = top.join("go");
        fs::create_dir_all(project.join("rover/\u{e9}t\u{e9}")).unwrap();
        fs::write(project.join("modkit.toml"), "output = \"json\"\n").unwrap();
        fs::write(project.join("rover/go.mod"), "module example.com/go/rover\n").unwrap();
        fs::write(project.join("rover/\u{e9}t\u{e9}/caf\u{e9}.go"), "package x\n").unwrap();
        fs::write(top.join("NOTES.md"), "outside the project\n").unwrap();
        assert!(git(&["add", "NOTES.md", "go/modkit.toml", "go/rover/\u{e9}t\u{e9}"]));

        let eff = resolve_effective(project.to_str(), None, None);
        assert!(eff.repo_root.ends_with("go"));
        let ws = Workspace::new(eff, Arc::new(LiveRunner));
        let ids: Vec<_> = ws
            .staged_modules()
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec!["rover"]);
    }

    #[test]
    fn test_package_resolution_uses_manifest_prefix() {
        let dir = tempdir().unwrap();
        seed(dir.path());
        let ws = workspace(dir.path(), ScriptedRunner::default());
        let m = ws
            .module_for_package("github.com/acme/cp/rover/internal/handler")
            .unwrap();
        assert_eq!(m.id, "rover");
        let err = ws.module_for_package("example.org/elsewhere/pkg").unwrap_err();
        assert_eq!(
            err.available_modules().unwrap(),
            ["identity", "identity/api", "rover"]
        );
    }

    #[test]
    fn test_locate_reports_missing_module_and_manifest() {
        let dir = tempdir().unwrap();
        seed(dir.path());
        let ws = workspace(dir.path(), ScriptedRunner::default());
        match ws.lint("nope").unwrap_err() {
            ModkitError::ModuleNotFound { available, .. } => assert_eq!(available.len(), 3),
            other => panic!("unexpected error: {other}"),
        }
        assert!(matches!(
            ws.lint("docs").unwrap_err(),
            ModkitError::ManifestMissing { .. }
        ));
    }

    #[test]
    fn test_lint_many_keeps_module_order() {
        let dir = tempdir().unwrap();
        seed(dir.path());
        let runner = ScriptedRunner::default().on(
            "golangci-lint",
            "run",
            ScriptedRunner::completed(0, "", ""),
        );
        let ws = workspace(dir.path(), runner);
        let modules = ws.modules().unwrap();
        let reports = ws.lint_many(&modules);
        let ids: Vec<_> = reports.iter().map(|r| r.module.as_str()).collect();
        assert_eq!(ids, vec!["identity", "identity/api", "rover"]);
        assert!(reports.iter().all(|r| r.status == LintStatus::Success));
    }

    #[test]
    fn test_missing_lint_tool_is_an_error_report() {
        let dir = tempdir().unwrap();
        seed(dir.path());
        let ws = workspace(dir.path(), ScriptedRunner::default());
        let report = ws.lint("rover").unwrap();
        assert_eq!(report.status, LintStatus::Error);
        assert!(report
            .error_message
            .unwrap()
            .starts_with("golangci-lint not found"));
    }
}
