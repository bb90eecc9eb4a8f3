//! Error taxonomy for lookups that cannot produce a report.
//!
//! Tool failures (missing binary, timeouts, non-zero exits, unparseable
//! output) are not errors here: they are statuses inside the lint, fix and
//! coverage reports. `ModkitError` covers the NotFound family and unreadable
//! directories, and always carries enough context for the caller to retry
//! with a valid identifier.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModkitError {
    #[error("Module directory '{module}' not found in project root")]
    ModuleNotFound {
        module: String,
        available: Vec<String>,
    },

    #[error("No manifest found in module directory '{module}'")]
    ManifestMissing { module: String, path: PathBuf },

    #[error("Package '{package}' not found in any module")]
    PackageNotFound {
        package: String,
        available: Vec<String>,
    },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ModkitError {
    /// Known module ids attached to NotFound errors, if any.
    pub fn available_modules(&self) -> Option<&[String]> {
        match self {
            ModkitError::ModuleNotFound { available, .. }
            | ModkitError::PackageNotFound { available, .. } => Some(available),
            _ => None,
        }
    }

    /// Filesystem path attached to the error, if any.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            ModkitError::ManifestMissing { path, .. } | ModkitError::Io { path, .. } => Some(path),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_carries_module_list() {
        let err = ModkitError::PackageNotFound {
            package: "example.com/other/pkg".into(),
            available: vec!["a".into(), "a/b".into()],
        };
        assert_eq!(
            err.to_string(),
            "Package 'example.com/other/pkg' not found in any module"
        );
        assert_eq!(err.available_modules().unwrap(), ["a", "a/b"]);
        assert!(err.path().is_none());
    }

    #[test]
    fn test_manifest_missing_exposes_path() {
        let err = ModkitError::ManifestMissing {
            module: "tools".into(),
            path: PathBuf::from("/repo/tools"),
        };
        assert!(err.available_modules().is_none());
        assert_eq!(err.path().unwrap(), &PathBuf::from("/repo/tools"));
    }
}
