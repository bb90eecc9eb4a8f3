//! modkit core library.
//!
//! This crate exposes programmatic APIs for working with a repository that
//! holds many Go modules: discovering them, mapping changed files and import
//! paths to their owning module, and running golangci-lint and `go test`
//! coverage per module with normalized, serializable reports.
//!
//! High-level modules:
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Discovery and effective configuration resolution.
//! - `registry`: Module discovery under a project root.
//! - `resolve`: Path, changeset and package to module resolution.
//! - `lint`: golangci-lint invocation and output normalization, plus auto-fix.
//! - `coverage`: Coverage collection and per-file aggregation.
//! - `info`: Module overview (go.mod facts, layout, README).
//! - `git`: Staged changeset listing.
//! - `tool`: External process runner with timeouts.
//! - `workspace`: Operation facade tying the above together.
//! - `models`: Report and catalogue types.
//! - `output`: Human/JSON printers.
//! - `errors`: Lookup error taxonomy.
//! - `utils`: Supporting helpers.
pub mod cli;
pub mod config;
pub mod coverage;
pub mod errors;
pub mod git;
pub mod info;
pub mod lint;
pub mod models;
pub mod output;
pub mod registry;
pub mod resolve;
pub mod tool;
pub mod utils;
pub mod workspace;
