use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::webhook::WebhookRule;

fn default_branch() -> String {
    "main".to_string()
}

fn default_base_dir() -> PathBuf {
    PathBuf::from(".")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryAuth {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    pub name: String,
    pub address: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,
    #[serde(default)]
    pub auth: Option<RepositoryAuth>,
    #[serde(default)]
    pub webhooks: Vec<WebhookRule>,
}

impl RepositoryConfig {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            branch: default_branch(),
            base_dir: default_base_dir(),
            auth: None,
            webhooks: Vec::new(),
        }
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    pub fn with_webhooks(mut self, webhooks: Vec<WebhookRule>) -> Self {
        self.webhooks = webhooks;
        self
    }

    /// Reject names that cannot be used as a route segment or that would place
    /// the working copy outside `base_dir`.
    pub fn validate_name(&self) -> crate::Result<()> {
        let name = &self.name;
        if name.is_empty() {
            return Err(crate::Error::Config("repository name must not be empty".to_string()));
        }
        if name == "." || name.contains("..") || name.contains(&['/', '\\', ':', '*'][..]) {
            return Err(crate::Error::Config(format!("invalid repository name: {}", name)));
        }
        Ok(())
    }

    /// Directory holding the working copy.
    pub fn path(&self) -> PathBuf {
        self.base_dir.join(&self.name)
    }
}

/// Performs the actual synchronization of a working copy.
///
/// Implementations are not required to be reentrant; callers go through
/// [`crate::UpdateCoordinator`], which serializes updates per repository.
#[async_trait]
pub trait RepoUpdater: Send + Sync {
    async fn update(&self, config: &RepositoryConfig) -> anyhow::Result<()>;
}

/// State guarded by the per-repository update lock.
#[derive(Debug, Clone, Default)]
pub struct UpdateState {
    pub update_count: u64,
    pub last_updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RepositoryStatus {
    pub name: String,
    pub updating: bool,
    pub update_count: Option<u64>,
    pub last_updated_at: Option<DateTime<Utc>>,
}

pub struct Repository {
    config: RepositoryConfig,
    updater: Arc<dyn RepoUpdater>,
    state: Arc<Mutex<UpdateState>>,
}

impl Repository {
    pub fn new(config: RepositoryConfig, updater: Arc<dyn RepoUpdater>) -> Self {
        Self {
            config,
            updater,
            state: Arc::new(Mutex::new(UpdateState::default())),
        }
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub(crate) fn updater(&self) -> Arc<dyn RepoUpdater> {
        self.updater.clone()
    }

    pub(crate) fn state(&self) -> Arc<Mutex<UpdateState>> {
        self.state.clone()
    }

    /// Snapshot for health reporting. Never waits on a running update.
    pub fn status(&self) -> RepositoryStatus {
        match self.state.try_lock() {
            Ok(state) => RepositoryStatus {
                name: self.config.name.clone(),
                updating: false,
                update_count: Some(state.update_count),
                last_updated_at: state.last_updated_at,
            },
            Err(_) => RepositoryStatus {
                name: self.config.name.clone(),
                updating: true,
                update_count: None,
                last_updated_at: None,
            },
        }
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopUpdater;

    #[async_trait]
    impl RepoUpdater for NoopUpdater {
        async fn update(&self, _config: &RepositoryConfig) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_config_defaults() {
        let config = RepositoryConfig::new("alpha", "https://example.com/alpha.git");
        assert_eq!(config.branch, "main");
        assert!(config.webhooks.is_empty());
        assert_eq!(config.path(), PathBuf::from("./alpha"));
    }

    #[test]
    fn test_validate_name() {
        assert!(RepositoryConfig::new("alpha-1.0", "x").validate_name().is_ok());
        for name in ["", ".", "..", "../etc", "a/b", "a\\b", "a:b", "a*"] {
            assert!(RepositoryConfig::new(name, "x").validate_name().is_err(), "{}", name);
        }
    }

    #[test]
    fn test_config_deserialize_defaults() {
        let config: RepositoryConfig = serde_json::from_str(
            r#"{"name":"alpha","address":"https://example.com/alpha.git","webhooks":[{"header":"X-Hub-Sig","secret":"s3cr3t"}]}"#,
        )
        .unwrap();

        assert_eq!(config.branch, "main");
        assert_eq!(config.webhooks, vec![WebhookRule::new("X-Hub-Sig", "s3cr3t")]);
        assert!(config.auth.is_none());
    }

    #[tokio::test]
    async fn test_status_reports_running_update() {
        let repo = Repository::new(
            RepositoryConfig::new("alpha", "https://example.com/alpha.git"),
            Arc::new(NoopUpdater),
        );

        let status = repo.status();
        assert!(!status.updating);
        assert_eq!(status.update_count, Some(0));

        let state = repo.state();
        let _guard = state.lock().await;
        assert!(repo.status().updating);
    }
}
