mod context;
mod error;
mod outcome;
mod runner;

pub use context::{ReviewContext, DEFAULT_BASE_BRANCH, DEFAULT_FILE_FILTER, DEFAULT_FOCUS_AREAS};
pub use error::ReviewError;
pub use outcome::{
    BranchDiff, BranchDiffOutcome, ChangedFilesOutcome, DiffReviewOutcome, ReportOutcome,
    REPORT_PREVIEW_CHARS,
};
pub use runner::{ReviewRunner, DEFAULT_REPORT_FILE};
