use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("Git error: {0}")]
    GitError(#[from] reviewkit_git::GitError),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Error reading file {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
