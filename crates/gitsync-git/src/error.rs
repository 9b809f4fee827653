use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GitSyncError {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not a git working copy: {0}")]
    NotARepository(PathBuf),
}

pub type Result<T> = std::result::Result<T, GitSyncError>;
