//! Module discovery.
//!
//! A module is any directory below the project root that holds the manifest
//! marker (`go.mod` by default). Discovery checks the root's immediate
//! children and then walks the whole tree for nested manifests; both passes
//! feed one id-keyed map so a top-level module found twice is listed once.
//! The root's own manifest is not a module.

use crate::errors::ModkitError;
use crate::models::{Module, Registry};
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fs;
use std::path::{Component, Path};
use tracing::debug;
use walkdir::WalkDir;

/// Discover all modules under `root`, sorted by relative id.
pub fn discover(root: &Path, marker: &str) -> Result<Registry, ModkitError> {
    let entries = fs::read_dir(root).map_err(|source| ModkitError::Io {
        path: root.to_path_buf(),
        source,
    })?;

    let mut found: BTreeMap<String, Module> = BTreeMap::new();
    for entry in entries.flatten() {
        let dir = entry.path();
        if dir.is_dir() && dir.join(marker).is_file() {
            insert_module(&mut found, root, &dir, marker);
        }
    }

    // Symlinked directories are not descended into, so a link back up the
    // tree cannot produce phantom nested copies.
    let walker = WalkDir::new(root).min_depth(2).follow_links(false);
    for entry in walker.into_iter().filter_map(|e| e.ok()) {
        if entry.file_type().is_file() && entry.file_name() == OsStr::new(marker) {
            if let Some(dir) = entry.path().parent() {
                insert_module(&mut found, root, dir, marker);
            }
        }
    }

    debug!("discovered {} modules under {}", found.len(), root.display());
    Ok(Registry::new(found.into_values().collect()))
}

fn insert_module(found: &mut BTreeMap<String, Module>, root: &Path, dir: &Path, marker: &str) {
    let Some(id) = relative_id(root, dir) else {
        return;
    };
    if found.contains_key(&id) {
        return;
    }
    let import_path = read_import_path(&dir.join(marker));
    found.insert(
        id.clone(),
        Module {
            id,
            dir: dir.to_path_buf(),
            import_path,
        },
    );
}

/// `/`-joined path of `dir` relative to `root`; `None` for the root itself
/// or anything outside it.
fn relative_id(root: &Path, dir: &Path) -> Option<String> {
    let rel = pathdiff::diff_paths(dir, root)?;
    let mut segments = Vec::new();
    for comp in rel.components() {
        match comp {
            Component::Normal(s) => segments.push(s.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if segments.is_empty() {
        None
    } else {
        Some(segments.join("/"))
    }
}

/// Value of the manifest's `module` directive, if readable.
pub fn read_import_path(manifest: &Path) -> Option<String> {
    let content = fs::read_to_string(manifest).ok()?;
    parse_module_directive(&content)
}

pub(crate) fn parse_module_directive(content: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let rest = line.trim().strip_prefix("module ")?;
        let name = rest.split("//").next().unwrap_or("").trim().trim_matches('"');
        (!name.is_empty()).then(|| name.to_string())
    })
}
