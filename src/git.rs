//! Staged-file listing from git.
//!
//! Paths come back relative to the directory git runs in, and changes outside
//! it are left out. Any git failure (not a repository, git missing, timeout)
//! degrades to an empty changeset.

use crate::tool::{Invocation, ToolOutcome, ToolRunner};
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// Paths staged for commit, relative to `root`.
pub fn staged_files(runner: &dyn ToolRunner, root: &Path, timeout: Duration) -> Vec<String> {
    let inv = Invocation::new("git", root, timeout).args([
        "diff",
        "--name-only",
        "--cached",
        "--relative",
        "-z",
    ]);
    match runner.run(&inv) {
        ToolOutcome::Completed(out) if out.exit_code == 0 => out
            .stdout
            .split('\0')
            .map(|l| l.trim_end_matches(['\n', '\r']))
            .filter(|l| !l.trim().is_empty())
            .map(String::from)
            .collect(),
        ToolOutcome::Completed(out) => {
            warn!(
                "git diff exited with {}: {}",
                out.exit_code,
                out.stderr.trim()
            );
            Vec::new()
        }
        other => {
            warn!("git diff unavailable: {:?}", other);
            Vec::new()
        }
    }
}
