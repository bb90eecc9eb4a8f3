//! Module catalogue types shared by the registry and the resolvers.

use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// A build unit rooted at a directory that holds a manifest.
pub struct Module {
    /// Path relative to the project root, `/`-separated (e.g. `"a/b"`).
    pub id: String,
    /// Absolute module root directory.
    pub dir: PathBuf,
    /// Import path declared by the manifest's `module` directive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub import_path: Option<String>,
}

impl Module {
    /// Number of path segments in the id; deeper modules are more specific.
    pub fn depth(&self) -> usize {
        self.id.split('/').filter(|s| !s.is_empty()).count()
    }
}

#[derive(Debug, Clone, Default)]
/// Ordered module catalogue for one operation. Sorted and unique by id.
pub struct Registry {
    modules: Vec<Module>,
}

impl Registry {
    /// Build a registry, sorting by id and dropping duplicate ids.
    pub fn new(mut modules: Vec<Module>) -> Self {
        modules.sort_by(|a, b| a.id.cmp(&b.id));
        modules.dedup_by(|a, b| a.id == b.id);
        Self { modules }
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn ids(&self) -> Vec<String> {
        self.modules.iter().map(|m| m.id.clone()).collect()
    }

    pub fn get(&self, id: &str) -> Option<&Module> {
        self.modules
            .binary_search_by(|m| m.id.as_str().cmp(id))
            .ok()
            .map(|i| &self.modules[i])
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(id: &str) -> Module {
        Module {
            id: id.into(),
            dir: PathBuf::from("/repo").join(id),
            import_path: None,
        }
    }

    #[test]
    fn test_registry_sorts_and_dedups() {
        let reg = Registry::new(vec![module("b"), module("a/b"), module("a"), module("b")]);
        assert_eq!(reg.ids(), vec!["a", "a/b", "b"]);
        assert_eq!(reg.len(), 3);
        assert_eq!(reg.get("a/b").map(|m| m.depth()), Some(2));
        assert!(reg.get("c").is_none());
    }
}
