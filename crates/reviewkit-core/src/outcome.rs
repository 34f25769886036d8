use std::fmt;
use std::path::PathBuf;

use reviewkit_git::{BranchComparison, FileDiff, SkippedHunk};
use reviewkit_report::{preview, ReviewPrompts};

/// Characters of the report echoed back when it cannot be written
pub const REPORT_PREVIEW_CHARS: usize = 2000;

/// A non-empty comparison of the current branch against its base
#[derive(Debug, Clone)]
pub struct BranchDiff {
    pub current_branch: String,
    pub comparison: BranchComparison,
}

/// Result of comparing the current branch with a base branch
#[derive(Debug, Clone)]
pub enum BranchDiffOutcome {
    /// Repository root or current branch could not be determined
    NotARepository,
    NoChanges {
        current_branch: String,
        base_branch: String,
        file_filter: String,
    },
    Changes(BranchDiff),
}

impl BranchDiffOutcome {
    pub fn has_changes(&self) -> bool {
        matches!(self, Self::Changes(_))
    }
}

impl fmt::Display for BranchDiffOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotARepository => write!(
                f,
                "Not in a git repository or unable to determine current branch."
            ),
            Self::NoChanges {
                current_branch,
                base_branch,
                file_filter,
            } => f.write_str(&ReviewPrompts::no_changes(
                file_filter,
                base_branch,
                current_branch,
            )),
            Self::Changes(diff) => f.write_str(&ReviewPrompts::branch_diff_summary(
                &diff.current_branch,
                &diff.comparison.base_branch,
                &diff.comparison.merge_base,
                &diff.comparison.file_filter,
                &diff.comparison.diff,
            )),
        }
    }
}

/// Result of listing changed files
#[derive(Debug, Clone)]
pub enum ChangedFilesOutcome {
    NotARepository,
    NoFiles { file_filter: String },
    Files { files: Vec<String>, stat: String },
}

impl fmt::Display for ChangedFilesOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotARepository => write!(f, "Not in a git repository."),
            Self::NoFiles { file_filter } => {
                f.write_str(&ReviewPrompts::no_changed_files(file_filter))
            }
            Self::Files { files, stat } => f.write_str(&ReviewPrompts::changed_files(files, stat)),
        }
    }
}

/// Result of preparing a review request for the branch diff
#[derive(Debug, Clone)]
pub enum DiffReviewOutcome {
    /// No diff to review (not a repository, or nothing changed)
    Unavailable(BranchDiffOutcome),
    /// The diff had content but no file sections
    NothingToReview,
    Ready {
        files: FileDiff,
        skipped_hunks: Vec<SkippedHunk>,
        request: String,
    },
}

impl fmt::Display for DiffReviewOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable(outcome) => write!(f, "{}", outcome),
            Self::NothingToReview => write!(f, "No files to review in the diff."),
            Self::Ready { request, .. } => f.write_str(request),
        }
    }
}

/// Result of writing a review report
#[derive(Debug)]
pub enum ReportOutcome {
    Written {
        path: PathBuf,
    },
    /// The report could not be written; `preview` holds its beginning
    WriteFailed {
        path: PathBuf,
        error: std::io::Error,
        preview: String,
    },
}

impl ReportOutcome {
    pub(crate) fn write_failed(path: PathBuf, error: std::io::Error, report: &str) -> Self {
        Self::WriteFailed {
            path,
            error,
            preview: preview(report, REPORT_PREVIEW_CHARS).to_string(),
        }
    }

    pub fn is_written(&self) -> bool {
        matches!(self, Self::Written { .. })
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Written { .. } => 0,
            Self::WriteFailed { .. } => 1,
        }
    }
}

impl fmt::Display for ReportOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Written { path } => write!(
                f,
                "Report generated successfully: `{}`\n\nYou can now review the diff above and provide feedback following the persona standards.",
                path.display()
            ),
            Self::WriteFailed { error, preview, .. } => write!(
                f,
                "Error writing report: {}\n\nReport content:\n{}...",
                error, preview
            ),
        }
    }
}
