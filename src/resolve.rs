//! Resolution of file paths and package identifiers to owning modules.
//!
//! All resolvers take the `Registry` explicitly; none of them rediscover
//! modules. Path resolution is lexical so deleted or not-yet-created files
//! still map to the module that would contain them.

use crate::errors::ModkitError;
use crate::models::{Module, Registry};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Return the deepest module whose directory contains `path`.
///
/// Relative paths are taken relative to `root`. Equal-depth candidates break
/// on the lexicographically smallest id.
pub fn resolve_path<'a>(path: &Path, root: &Path, registry: &'a Registry) -> Option<&'a Module> {
    let abs = normalize(&root.join(path));
    if !abs.starts_with(normalize(root)) {
        return None;
    }
    registry
        .modules()
        .iter()
        .filter(|m| abs.starts_with(normalize(&m.dir)))
        .min_by(|a, b| b.depth().cmp(&a.depth()).then_with(|| a.id.cmp(&b.id)))
}

/// Map changed file paths to the set of modules they touch, sorted by id.
///
/// Blank and malformed entries are skipped; files outside every module are
/// ignored.
pub fn map_changes<S: AsRef<str>>(paths: &[S], root: &Path, registry: &Registry) -> Vec<Module> {
    let mut hit: BTreeMap<String, Module> = BTreeMap::new();
    for raw in paths {
        let raw = raw.as_ref().trim();
        if raw.is_empty() || raw.contains('\0') {
            debug!("skipping malformed changed path {:?}", raw);
            continue;
        }
        if let Some(m) = resolve_path(Path::new(raw), root, registry) {
            hit.entry(m.id.clone()).or_insert_with(|| m.clone());
        }
    }
    hit.into_values().collect()
}

/// Find the module owning a package identifier.
///
/// Tried in order: exact id match, prefix-stripped progressive match over
/// `prefixes`, then whether the package exists as a subdirectory of a module.
pub fn resolve_package<'a>(
    pkg: &str,
    registry: &'a Registry,
    prefixes: &[String],
) -> Result<&'a Module, ModkitError> {
    let not_found = || ModkitError::PackageNotFound {
        package: pkg.to_string(),
        available: registry.ids(),
    };
    let pkg = pkg.trim();
    if pkg.is_empty() || Path::new(pkg).is_absolute() {
        return Err(not_found());
    }

    if let Some(m) = registry.get(pkg) {
        return Ok(m);
    }

    let stripped: Vec<&str> = prefixes
        .iter()
        .filter_map(|p| pkg.strip_prefix(p.as_str()))
        .map(|rest| rest.trim_matches('/'))
        .filter(|rest| !rest.is_empty())
        .collect();

    for rest in &stripped {
        let segments: Vec<&str> = rest.split('/').collect();
        for n in 1..=segments.len() {
            if let Some(m) = registry.get(&segments[..n].join("/")) {
                return Ok(m);
            }
        }
    }

    let mut candidates = vec![pkg];
    candidates.extend(stripped.iter().copied());
    // Only plain descending paths may be joined onto a module dir.
    candidates.retain(|c| {
        Path::new(c)
            .components()
            .all(|comp| matches!(comp, Component::Normal(_)))
    });
    for m in registry.modules() {
        if candidates.iter().any(|c| m.dir.join(c).exists()) {
            return Ok(m);
        }
    }

    Err(not_found())
}

/// Organizational prefixes for package resolution: configured ones first,
/// then those implied by each module's declared import path.
pub fn package_prefixes(configured: &[String], registry: &Registry) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let derived = registry.modules().iter().filter_map(|m| {
        let import = m.import_path.as_deref()?;
        let head = import.strip_suffix(m.id.as_str())?;
        (!head.is_empty() && head.ends_with('/')).then(|| head.to_string())
    });
    for p in configured.iter().cloned().chain(derived) {
        if !p.is_empty() && !out.contains(&p) {
            out.push(p);
        }
    }
    out
}

/// Lexically normalize `.` and `..` without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(comp);
                }
            }
            other => out.push(other),
        }
    }
    out
}
