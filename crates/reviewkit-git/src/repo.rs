use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::process::{ProcessResult, ProcessRunner};

#[derive(Error, Debug)]
pub enum GitError {
    #[error("Error finding merge base for '{base}': {stderr}")]
    InvalidBaseBranch { base: String, stderr: String },

    #[error("git {command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("git {command} timed out")]
    Timeout { command: String },
}

/// Thin wrapper around the `git` command line
#[derive(Debug, Clone)]
pub struct Git {
    binary: String,
    runner: ProcessRunner,
}

impl Default for Git {
    fn default() -> Self {
        Self::new()
    }
}

impl Git {
    pub fn new() -> Self {
        Self {
            binary: "git".to_string(),
            runner: ProcessRunner::new(),
        }
    }

    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_runner(mut self, runner: ProcessRunner) -> Self {
        self.runner = runner;
        self
    }

    /// Run a git subcommand and return its raw result
    pub async fn run(&self, args: &[&str], cwd: &Path) -> ProcessResult {
        self.runner.run(&self.binary, args, Some(cwd)).await
    }

    /// Run a git subcommand and require a zero exit status
    async fn run_checked(&self, args: &[&str], cwd: &Path) -> Result<String, GitError> {
        let result = self.run(args, cwd).await;
        let command = args.first().copied().unwrap_or_default().to_string();

        if result.timed_out {
            return Err(GitError::Timeout { command });
        }
        if !result.success() {
            return Err(GitError::CommandFailed {
                command,
                stderr: result.stderr,
            });
        }
        Ok(result.stdout)
    }

    /// Top-level directory of the repository enclosing `cwd`.
    ///
    /// `None` is the normal answer outside a repository.
    pub async fn find_root(&self, cwd: &Path) -> Option<PathBuf> {
        let result = self.run(&["rev-parse", "--show-toplevel"], cwd).await;
        if !result.success() {
            debug!(cwd = %cwd.display(), "Not inside a git repository");
            return None;
        }
        let root = result.stdout.trim();
        (!root.is_empty()).then(|| PathBuf::from(root))
    }

    /// Name of the checked-out branch.
    ///
    /// `None` outside a repository and for a detached HEAD.
    pub async fn current_branch(&self, cwd: &Path) -> Option<String> {
        let result = self.run(&["branch", "--show-current"], cwd).await;
        if !result.success() {
            return None;
        }
        let branch = result.stdout.trim();
        (!branch.is_empty()).then(|| branch.to_string())
    }

    /// Common ancestor of `base` and `HEAD`
    pub async fn merge_base(&self, base: &str, cwd: &Path) -> Result<String, GitError> {
        let result = self.run(&["merge-base", base, "HEAD"], cwd).await;

        if result.timed_out {
            return Err(GitError::Timeout {
                command: "merge-base".to_string(),
            });
        }
        if !result.success() {
            return Err(GitError::InvalidBaseBranch {
                base: base.to_string(),
                stderr: result.stderr,
            });
        }

        let commit = result.stdout.trim().to_string();
        debug!(base, merge_base = %commit, "Resolved merge base");
        Ok(commit)
    }

    /// Unified diff between `merge_base` and `HEAD`, restricted to `filter`
    pub async fn diff(&self, merge_base: &str, filter: &str, cwd: &Path) -> Result<String, GitError> {
        self.run_checked(&["diff", merge_base, "HEAD", "--", filter], cwd)
            .await
    }

    /// Paths changed between `merge_base` and `HEAD`, restricted to `filter`
    pub async fn changed_files(
        &self,
        merge_base: &str,
        filter: &str,
        cwd: &Path,
    ) -> Result<Vec<String>, GitError> {
        let stdout = self
            .run_checked(
                &["diff", "--stat", "--name-only", merge_base, "HEAD", "--", filter],
                cwd,
            )
            .await?;

        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect())
    }

    /// `git diff --stat` output; empty when the command fails
    pub async fn diff_stat(&self, merge_base: &str, filter: &str, cwd: &Path) -> String {
        self.run(&["diff", "--stat", merge_base, "HEAD", "--", filter], cwd)
            .await
            .stdout
    }
}

/// Every artefact of one branch comparison, taken against a single merge base
#[derive(Debug, Clone)]
pub struct BranchComparison {
    pub base_branch: String,
    pub merge_base: String,
    pub file_filter: String,
    pub diff: String,
    pub files: Vec<String>,
    pub stat: String,
}

impl BranchComparison {
    /// Resolve the merge base once and collect the diff, file list and stats.
    ///
    /// Diff commands run from the repository root so `file_filter` matches
    /// across the whole tree even when `cwd` is a subdirectory.
    pub async fn capture(
        git: &Git,
        cwd: &Path,
        base_branch: &str,
        file_filter: &str,
    ) -> Result<Self, GitError> {
        let merge_base = git.merge_base(base_branch, cwd).await?;
        let root = git
            .find_root(cwd)
            .await
            .unwrap_or_else(|| cwd.to_path_buf());
        let diff = git.diff(&merge_base, file_filter, &root).await?;
        let files = git.changed_files(&merge_base, file_filter, &root).await?;
        let stat = git.diff_stat(&merge_base, file_filter, &root).await;

        info!(
            base_branch,
            merge_base = %short_commit(&merge_base),
            files = files.len(),
            diff_len = diff.len(),
            "Captured branch comparison"
        );

        Ok(Self {
            base_branch: base_branch.to_string(),
            merge_base,
            file_filter: file_filter.to_string(),
            diff,
            files,
            stat,
        })
    }

    pub fn has_changes(&self) -> bool {
        !self.diff.trim().is_empty()
    }
}

/// First eight characters of a commit id
pub fn short_commit(commit: &str) -> &str {
    commit.get(..8).unwrap_or(commit)
}
