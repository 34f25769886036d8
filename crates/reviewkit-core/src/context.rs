use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_BRANCH: &str = "development";
pub const DEFAULT_FILE_FILTER: &str = "*.py";
pub const DEFAULT_FOCUS_AREAS: &str = "all";

/// Inputs shared by every review operation
#[derive(Debug, Clone)]
pub struct ReviewContext {
    /// Directory git commands run in
    pub working_dir: PathBuf,
    /// Branch the current branch is compared against
    pub base_branch: String,
    /// Pathspec passed to `git diff`
    pub file_filter: String,
    /// Custom persona document (relative to `working_dir` unless absolute)
    pub persona_file: Option<PathBuf>,
    /// Comma-separated focus areas quoted in review requests
    pub focus_areas: String,
}

impl ReviewContext {
    pub fn new(working_dir: PathBuf) -> Self {
        Self {
            working_dir,
            base_branch: DEFAULT_BASE_BRANCH.to_string(),
            file_filter: DEFAULT_FILE_FILTER.to_string(),
            persona_file: None,
            focus_areas: DEFAULT_FOCUS_AREAS.to_string(),
        }
    }

    pub fn with_base_branch(mut self, base_branch: impl Into<String>) -> Self {
        self.base_branch = base_branch.into();
        self
    }

    pub fn with_file_filter(mut self, file_filter: impl Into<String>) -> Self {
        self.file_filter = file_filter.into();
        self
    }

    pub fn with_persona_file(mut self, persona_file: Option<PathBuf>) -> Self {
        self.persona_file = persona_file;
        self
    }

    pub fn with_focus_areas(mut self, focus_areas: impl Into<String>) -> Self {
        self.focus_areas = focus_areas.into();
        self
    }

    /// `path` made absolute against the working directory
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.working_dir.join(path)
        }
    }
}
