use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use reviewkit_git::{parse_diff_with_diagnostics, BranchComparison, Git};
use reviewkit_logging::{LogEvent, Logger};
use reviewkit_report::{Persona, ReportInput, ReviewPrompts};

use crate::error::ReviewError;
use crate::outcome::{
    BranchDiff, BranchDiffOutcome, ChangedFilesOutcome, DiffReviewOutcome, ReportOutcome,
};
use crate::ReviewContext;

/// Report file name used when no output path is given
pub const DEFAULT_REPORT_FILE: &str = ".code_review.md";

/// Runs review operations against the repository in a [`ReviewContext`]
pub struct ReviewRunner {
    git: Git,
    logger: Arc<Logger>,
}

impl ReviewRunner {
    pub fn new(git: Git, logger: Arc<Logger>) -> Self {
        Self { git, logger }
    }

    /// Persona for this context, resolved against the repository root
    pub async fn persona(&self, ctx: &ReviewContext) -> Persona {
        let repo_root = self.git.find_root(&ctx.working_dir).await;
        Persona::load(
            ctx.persona_file.as_deref(),
            &ctx.working_dir,
            repo_root.as_deref(),
        )
    }

    /// Compare the current branch with the base branch
    pub async fn branch_diff(&self, ctx: &ReviewContext) -> Result<BranchDiffOutcome, ReviewError> {
        let current_branch = self.git.current_branch(&ctx.working_dir).await;

        self.logger.log(&LogEvent::ReviewStarted {
            working_dir: ctx.working_dir.clone(),
            base_branch: ctx.base_branch.clone(),
            current_branch: current_branch.clone(),
        });

        let Some(current_branch) = current_branch else {
            info!(working_dir = %ctx.working_dir.display(), "No current branch");
            return Ok(BranchDiffOutcome::NotARepository);
        };

        let comparison = self.capture(ctx).await?;

        if !comparison.has_changes() {
            return Ok(BranchDiffOutcome::NoChanges {
                current_branch,
                base_branch: ctx.base_branch.clone(),
                file_filter: ctx.file_filter.clone(),
            });
        }

        Ok(BranchDiffOutcome::Changes(BranchDiff {
            current_branch,
            comparison,
        }))
    }

    /// Files changed on the current branch, with `git diff --stat`
    pub async fn changed_files(
        &self,
        ctx: &ReviewContext,
    ) -> Result<ChangedFilesOutcome, ReviewError> {
        if self.git.find_root(&ctx.working_dir).await.is_none() {
            return Ok(ChangedFilesOutcome::NotARepository);
        }

        let comparison = self.capture(ctx).await?;

        if comparison.files.is_empty() {
            return Ok(ChangedFilesOutcome::NoFiles {
                file_filter: ctx.file_filter.clone(),
            });
        }

        Ok(ChangedFilesOutcome::Files {
            files: comparison.files,
            stat: comparison.stat,
        })
    }

    /// Build a review request for the branch diff
    pub async fn review_diff(&self, ctx: &ReviewContext) -> Result<DiffReviewOutcome, ReviewError> {
        let persona = self.persona(ctx).await;

        let diff = match self.branch_diff(ctx).await? {
            BranchDiffOutcome::Changes(diff) => diff,
            other => return Ok(DiffReviewOutcome::Unavailable(other)),
        };

        let (files, skipped_hunks) = parse_diff_with_diagnostics(&diff.comparison.diff);
        let summary = files.summary();

        self.logger.log(&LogEvent::DiffParsed {
            files_changed: summary.files_changed,
            hunks: summary.hunks,
            insertions: summary.insertions,
            deletions: summary.deletions,
            skipped_hunks: skipped_hunks.len(),
        });

        for skipped in &skipped_hunks {
            debug!(path = %skipped.path, header = %skipped.header, "Skipped malformed hunk header");
        }

        if files.is_empty() {
            return Ok(DiffReviewOutcome::NothingToReview);
        }

        let request = ReviewPrompts::diff_review_request(
            &persona,
            &ctx.focus_areas,
            &files,
            &diff.comparison.diff,
        );

        Ok(DiffReviewOutcome::Ready {
            files,
            skipped_hunks,
            request,
        })
    }

    /// Build a review request for one file
    pub async fn review_file(
        &self,
        ctx: &ReviewContext,
        file_path: &Path,
    ) -> Result<String, ReviewError> {
        let persona = self.persona(ctx).await;
        let path = ctx.resolve(file_path);

        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => ReviewError::FileNotFound(path.clone()),
                _ => ReviewError::FileRead {
                    path: path.clone(),
                    source: e,
                },
            })?;

        Ok(ReviewPrompts::file_review_request(
            &persona,
            &path.display().to_string(),
            &content,
        ))
    }

    /// Write a markdown review report.
    ///
    /// Defaults to [`DEFAULT_REPORT_FILE`] in the repository root, or in the
    /// working directory outside a repository. Git failures are embedded in
    /// the report text rather than aborting it.
    pub async fn generate_report(
        &self,
        ctx: &ReviewContext,
        output_file: Option<&Path>,
    ) -> ReportOutcome {
        let repo_root = self.git.find_root(&ctx.working_dir).await;
        let current_branch = self
            .git
            .current_branch(&ctx.working_dir)
            .await
            .unwrap_or_else(|| "unknown".to_string());
        let persona = Persona::load(
            ctx.persona_file.as_deref(),
            &ctx.working_dir,
            repo_root.as_deref(),
        );

        let output = match output_file {
            Some(path) => ctx.resolve(path),
            None => repo_root
                .clone()
                .unwrap_or_else(|| ctx.working_dir.clone())
                .join(DEFAULT_REPORT_FILE),
        };

        let changed_files = match self.changed_files(ctx).await {
            Ok(outcome) => outcome.to_string(),
            Err(e) => format!("Error getting changed files: {}", e),
        };
        let diff = match self.branch_diff(ctx).await {
            Ok(outcome) => outcome.to_string(),
            Err(e) => format!("Error getting diff: {}", e),
        };

        let report = ReviewPrompts::report(&ReportInput {
            current_branch: &current_branch,
            base_branch: &ctx.base_branch,
            persona: &persona,
            changed_files: &changed_files,
            diff: &diff,
            generated_at: Utc::now(),
        });

        self.write_report(output, &report).await
    }

    async fn write_report(&self, path: PathBuf, report: &str) -> ReportOutcome {
        match tokio::fs::write(&path, report).await {
            Ok(()) => {
                self.logger.log(&LogEvent::ReportWritten { path: path.clone() });
                ReportOutcome::Written { path }
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to write report");
                self.logger.log(&LogEvent::ErrorEncountered {
                    error: format!("Error writing report {}: {}", path.display(), e),
                });
                ReportOutcome::write_failed(path, e, report)
            }
        }
    }

    async fn capture(&self, ctx: &ReviewContext) -> Result<BranchComparison, ReviewError> {
        let comparison = BranchComparison::capture(
            &self.git,
            &ctx.working_dir,
            &ctx.base_branch,
            &ctx.file_filter,
        )
        .await?;

        self.logger.log(&LogEvent::MergeBaseResolved {
            base_branch: comparison.base_branch.clone(),
            merge_base: comparison.merge_base.clone(),
        });

        Ok(comparison)
    }
}
