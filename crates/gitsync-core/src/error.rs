use std::time::Duration;

use thiserror::Error;

use crate::webhook::AuthFailure;

#[derive(Error, Debug)]
pub enum Error {
    #[error("webhook authentication failed: {0}")]
    Authentication(AuthFailure),

    #[error("repo not found: {0}")]
    RepoNotFound(String),

    #[error("failed updating repo {repo}: {source}")]
    UpdateFailed {
        repo: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("timed out after {timeout:?} waiting for update lock on repo {repo}")]
    LockTimeout { repo: String, timeout: Duration },

    #[error("failed encoding response: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// HTTP status code reported to the webhook caller.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Authentication(_) => 401,
            _ => 500,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
