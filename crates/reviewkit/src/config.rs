//! Project configuration file support for reviewkit.
//!
//! Loads configuration from `reviewkit.toml` in the working directory, or from
//! the user config directory when the project has none.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Project-level configuration loaded from `reviewkit.toml`
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Branch to compare against
    pub base_branch: Option<String>,
    /// Pathspec passed to `git diff`
    pub file_filter: Option<String>,
    /// Reviewer persona document
    pub persona_file: Option<PathBuf>,
    /// Focus areas quoted in review requests
    pub focus_areas: Option<String>,
    /// Comment export settings
    #[serde(default)]
    pub bitbucket: BitbucketConfig,
}

/// `[bitbucket]` table. Credentials are never read from the file.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct BitbucketConfig {
    pub workspace: Option<String>,
    pub repo_slug: Option<String>,
    /// Keep only comments written by this account
    pub account_id: Option<String>,
    pub api_base: Option<String>,
}

/// The config file name
pub const CONFIG_FILE_NAME: &str = "reviewkit.toml";

impl ProjectConfig {
    /// Load configuration for `working_dir`.
    ///
    /// Returns:
    /// - `Ok(Some(config))` for the first candidate file that exists
    /// - `Ok(None)` if no candidate exists
    /// - `Err(...)` if a file exists but fails to parse (hard error)
    pub fn load(working_dir: &Path) -> Result<Option<Self>> {
        Self::load_first(&candidate_paths(working_dir))
    }

    fn load_first(candidates: &[PathBuf]) -> Result<Option<Self>> {
        let Some(config_path) = candidates.iter().find(|p| p.exists()) else {
            return Ok(None);
        };

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let config: ProjectConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        Ok(Some(config))
    }
}

/// Project file first, then `<config dir>/reviewkit/reviewkit.toml`
fn candidate_paths(working_dir: &Path) -> Vec<PathBuf> {
    let mut paths = vec![working_dir.join(CONFIG_FILE_NAME)];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("reviewkit").join(CONFIG_FILE_NAME));
    }
    paths
}
