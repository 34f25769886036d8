//! # reviewkit-git
//!
//! Git operations for reviewkit.
//!
//! This crate computes the change set of the current branch relative to a
//! base branch and turns the resulting unified diff into structured data.
//!
//! ## Overview
//!
//! - [`ProcessRunner`] spawns external commands with a deadline and always
//!   returns a [`ProcessResult`], even when the binary is missing
//! - [`Git`] locates the repository root and current branch, and resolves the
//!   merge base against a base branch
//! - [`BranchComparison`] collects the diff, changed files and stats against a
//!   single merge base
//! - [`parse_diff`] turns unified diff text into a [`FileDiff`]
//!
//! ## Usage
//!
//! ```rust,ignore
//! use reviewkit_git::{parse_diff, BranchComparison, Git};
//! use std::path::Path;
//!
//! let git = Git::new();
//! let comparison = BranchComparison::capture(&git, Path::new("."), "main", "*.rs").await?;
//! let files = parse_diff(&comparison.diff);
//!
//! for (path, hunks) in files.iter() {
//!     println!("{}: {} hunks", path, hunks.len());
//! }
//! ```

mod diff;
mod process;
mod repo;

pub use diff::{
    parse_diff, parse_diff_with_diagnostics, DiffSummary, FileDiff, Hunk, HunkHeader, SkippedHunk,
};
pub use process::{ProcessResult, ProcessRunner, DEFAULT_COMMAND_TIMEOUT};
pub use repo::{short_commit, BranchComparison, Git, GitError};
