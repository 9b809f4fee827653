use std::sync::Arc;
use std::time::Duration;

use crate::{Error, Repository, RepositoryRegistry, Result};

/// Runs repository updates, at most one at a time per repository.
#[derive(Clone)]
pub struct UpdateCoordinator {
    registry: Arc<RepositoryRegistry>,
    lock_timeout: Option<Duration>,
}

impl UpdateCoordinator {
    pub fn new(registry: Arc<RepositoryRegistry>) -> Self {
        Self {
            registry,
            lock_timeout: None,
        }
    }

    /// Bound how long a request waits for another update of the same repository.
    pub fn with_lock_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn registry(&self) -> &Arc<RepositoryRegistry> {
        &self.registry
    }

    /// Look up a repository by name
    pub fn resolve(&self, name: &str) -> Result<Arc<Repository>> {
        self.registry.lookup(name).ok_or_else(|| {
            tracing::warn!(repo_name = %name, "repo not found");
            Error::RepoNotFound(name.to_string())
        })
    }

    /// Look up a repository and update it
    pub async fn dispatch(&self, name: &str) -> Result<()> {
        let repo = self.resolve(name)?;
        self.update(&repo).await
    }

    /// Update an already resolved repository.
    ///
    /// The update runs on its own task which owns the lock guard, so dropping
    /// this future neither interrupts the update nor releases the lock early.
    pub async fn update(&self, repo: &Arc<Repository>) -> Result<()> {
        let state = repo.state();
        let guard = match self.lock_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, state.lock_owned()).await {
                Ok(guard) => guard,
                Err(_) => {
                    tracing::warn!(
                        repo_name = %repo.name(),
                        timeout_ms = timeout.as_millis() as u64,
                        "timed out waiting for update lock"
                    );
                    return Err(Error::LockTimeout {
                        repo: repo.name().to_string(),
                        timeout,
                    });
                }
            },
            None => state.lock_owned().await,
        };

        tracing::debug!(repo_name = %repo.name(), "acquired update lock");

        let updater = repo.updater();
        let config = repo.config().clone();
        let task = tokio::spawn(async move {
            let mut state = guard;
            let result = updater.update(&config).await;
            if result.is_ok() {
                state.update_count += 1;
                state.last_updated_at = Some(chrono::Utc::now());
            }
            result
        });

        let result = match task.await {
            Ok(result) => result,
            Err(e) => Err(anyhow::anyhow!("update task did not complete: {}", e)),
        };

        match result {
            Ok(()) => {
                tracing::info!(repo_name = %repo.name(), "updated repo");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(repo_name = %repo.name(), error = %e, "failed updating repo");
                Err(Error::UpdateFailed {
                    repo: repo.name().to_string(),
                    source: e,
                })
            }
        }
    }
}
