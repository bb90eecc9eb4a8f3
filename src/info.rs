//! Module overview: manifest facts, README excerpt and top-level layout.

use crate::errors::ModkitError;
use crate::models::Module;
use crate::registry::parse_module_directive;
use crate::utils::truncate_chars;
use serde::Serialize;
use std::fs;
use std::path::Path;

const README_NAMES: [&str; 6] = [
    "README.md",
    "README.rst",
    "README.txt",
    "README",
    "readme.md",
    "readme.txt",
];
pub const README_LIMIT: usize = 2000;
const TRUNCATION_MARKER: &str = "\n\n... (truncated)";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ManifestInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub go_version: Option<String>,
    pub dependencies_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Structure {
    pub directories: Vec<String>,
    pub files_count: usize,
    pub test_files_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleInfo {
    pub module: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest: Option<ManifestInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readme: Option<String>,
    pub structure: Structure,
    pub has_tests: bool,
}

/// Extract module name, Go version and dependency count from `go.mod` text.
pub fn parse_manifest(content: &str) -> ManifestInfo {
    let mut info = ManifestInfo {
        module_name: parse_module_directive(content),
        ..Default::default()
    };
    let mut in_require = false;
    for line in content.lines().map(str::trim) {
        if let Some(v) = line.strip_prefix("go ") {
            info.go_version.get_or_insert_with(|| v.trim().to_string());
        }
        if line.starts_with("require (") || line == "require(" {
            in_require = true;
        } else if in_require && line == ")" {
            in_require = false;
        } else if in_require {
            if !line.is_empty() && !line.starts_with("//") {
                info.dependencies_count += 1;
            }
        } else if line.starts_with("require ") {
            info.dependencies_count += 1;
        }
    }
    info
}

/// README text capped at `README_LIMIT` characters plus a truncation marker.
pub fn read_readme(dir: &Path) -> Option<String> {
    let path = README_NAMES.iter().map(|n| dir.join(n)).find(|p| p.is_file())?;
    let content = match fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) => return Some(format!("Error reading README: {}", e)),
    };
    if content.chars().count() > README_LIMIT {
        Some(format!(
            "{}{}",
            truncate_chars(&content, README_LIMIT),
            TRUNCATION_MARKER
        ))
    } else {
        Some(content)
    }
}

fn scan_structure(dir: &Path) -> Result<Structure, ModkitError> {
    let entries = fs::read_dir(dir).map_err(|source| ModkitError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut s = Structure::default();
    for entry in entries.flatten() {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        if path.is_dir() {
            s.directories.push(name);
        } else if path.is_file() {
            s.files_count += 1;
            if name.ends_with("_test.go") {
                s.test_files_count += 1;
            }
        }
    }
    s.directories.sort();
    Ok(s)
}

/// Collect the overview for a located module.
pub fn module_info(module: &Module, manifest_name: &str) -> Result<ModuleInfo, ModkitError> {
    let manifest = fs::read_to_string(module.dir.join(manifest_name))
        .ok()
        .map(|c| parse_manifest(&c));
    let structure = scan_structure(&module.dir)?;
    Ok(ModuleInfo {
        module: module.id.clone(),
        path: module.dir.to_string_lossy().into_owned(),
        manifest,
        readme: read_readme(&module.dir),
        has_tests: structure.test_files_count > 0,
        structure,
    })
}

/// Human-readable rendering of a module overview.
pub fn render(info: &ModuleInfo) -> String {
    let mut out = vec![
        format!("# Module: {}", info.module),
        format!("Path: {}", info.path),
        String::new(),
    ];
    if let Some(m) = &info.manifest {
        out.push("## Go Module Information".into());
        if let Some(name) = &m.module_name {
            out.push(format!("Module Name: {}", name));
        }
        if let Some(v) = &m.go_version {
            out.push(format!("Go Version: {}", v));
        }
        out.push(format!("Dependencies: {}", m.dependencies_count));
        out.push(String::new());
    }
    out.push("## Structure".into());
    out.push(format!("Files: {}", info.structure.files_count));
    out.push(format!("Test Files: {}", info.structure.test_files_count));
    if !info.structure.directories.is_empty() {
        out.push(format!("Directories: {}", info.structure.directories.join(", ")));
    }
    out.push(format!("Has Tests: {}", if info.has_tests { "Yes" } else { "No" }));
    out.push(String::new());
    out.push("## README".into());
    out.push(
        info.readme
            .clone()
            .unwrap_or_else(|| "No README file found".to_string()),
    );
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const GO_MOD: &str = "module github.com/acme/cp/rover\n\ngo 1.24.1\n\nrequire github.com/x/y v1.0.0\n\nrequire (\n\t// indirect deps below\n\tgithub.com/a/b v0.1.0\n\tgithub.com/c/d v0.2.0 // indirect\n)\n";

    #[test]
    fn test_parse_manifest_counts_dependencies() {
        let m = parse_manifest(GO_MOD);
        assert_eq!(m.module_name.as_deref(), Some("github.com/acme/cp/rover"));
        assert_eq!(m.go_version.as_deref(), Some("1.24.1"));
        assert_eq!(m.dependencies_count, 3);
    }

    #[test]
    fn test_module_info_collects_layout_and_truncates_readme() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("go.mod"), GO_MOD).unwrap();
        fs::write(root.join("main.go"), "package main").unwrap();
        fs::write(root.join("main_test.go"), "package main").unwrap();
        fs::write(root.join("README.md"), "é".repeat(README_LIMIT + 10)).unwrap();
        fs::create_dir_all(root.join("internal")).unwrap();
        fs::create_dir_all(root.join("cmd")).unwrap();

        let module = Module {
            id: "rover".into(),
            dir: root.to_path_buf(),
            import_path: None,
        };
        let info = module_info(&module, "go.mod").unwrap();
        assert_eq!(info.structure.directories, vec!["cmd", "internal"]);
        assert_eq!(info.structure.files_count, 4);
        assert_eq!(info.structure.test_files_count, 1);
        assert!(info.has_tests);
        let readme = info.readme.as_ref().unwrap();
        assert!(readme.ends_with("... (truncated)"));
        assert_eq!(
            readme.chars().count(),
            README_LIMIT + TRUNCATION_MARKER.chars().count()
        );

        let text = render(&info);
        assert!(text.starts_with("# Module: rover"));
        assert!(text.contains("Go Version: 1.24.1"));
        assert!(text.contains("Directories: cmd, internal"));
    }

    #[test]
    fn test_render_without_readme() {
        let info = ModuleInfo {
            module: "m".into(),
            path: "/repo/m".into(),
            manifest: None,
            readme: None,
            structure: Structure::default(),
            has_tests: false,
        };
        let text = render(&info);
        assert!(text.ends_with("## README\nNo README file found"));
        assert!(text.contains("Has Tests: No"));
    }
}
