use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use gitsync_core::endpoint::validate_path;
use gitsync_core::{Endpoint, Error, RepoUpdater, Repository, RepositoryConfig, RepositoryRegistry};
use serde::Deserialize;

fn default_listen() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_listen")]
    pub listen: String,
    /// Seconds a request may wait for another update of the same repository.
    #[serde(default)]
    pub update_lock_timeout_secs: Option<u64>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            update_lock_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EndpointSettings {
    pub repository: String,
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub repositories: Vec<RepositoryConfig>,
    /// When empty, every repository gets an endpoint at its default path.
    #[serde(default)]
    pub endpoints: Vec<EndpointSettings>,
}

impl Settings {
    /// Load from a config file, with `GITSYNC__*` environment overrides
    pub fn load(path: &Path) -> Result<Self> {
        let settings: Settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix("GITSYNC").separator("__"))
            .build()
            .with_context(|| format!("failed to read config {}", path.display()))?
            .try_deserialize()
            .context("invalid config")?;

        settings.validate()?;
        Ok(settings)
    }

    #[cfg(test)]
    pub fn from_toml(source: &str) -> Result<Self> {
        let settings: Settings = config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> gitsync_core::Result<()> {
        let mut names = HashSet::new();
        for repo in &self.repositories {
            repo.validate_name()?;
            if !names.insert(repo.name.as_str()) {
                return Err(Error::Config(format!("duplicate repository name: {}", repo.name)));
            }
        }

        let mut paths = HashSet::new();
        for endpoint in self.endpoints() {
            if !names.contains(endpoint.repository_name()) {
                return Err(Error::Config(format!(
                    "endpoint {} refers to unknown repository {}",
                    endpoint.path(),
                    endpoint.repository_name()
                )));
            }
            validate_path(endpoint.path())?;
            if endpoint.path() == gitsync_api::routes::HEALTH_PATH {
                return Err(Error::Config(format!("endpoint path {} is reserved", endpoint.path())));
            }
            if !paths.insert(endpoint.path().to_string()) {
                return Err(Error::Config(format!("duplicate endpoint path: {}", endpoint.path())));
            }
        }

        for name in self.open_repositories() {
            tracing::warn!(
                repo_name = %name,
                "repository has no webhooks configured, update requests are not authenticated"
            );
        }

        Ok(())
    }

    /// Repositories without webhook rules; they accept every update request.
    pub fn open_repositories(&self) -> Vec<&str> {
        self.repositories
            .iter()
            .filter(|repo| repo.webhooks.is_empty())
            .map(|repo| repo.name.as_str())
            .collect()
    }

    pub fn lock_timeout(&self) -> Option<Duration> {
        self.server.update_lock_timeout_secs.map(Duration::from_secs)
    }

    /// Endpoints described by the config, not yet provisioned.
    pub fn endpoints(&self) -> Vec<Endpoint> {
        if self.endpoints.is_empty() {
            return self
                .repositories
                .iter()
                .map(|repo| Endpoint::new(repo.name.clone()))
                .collect();
        }

        self.endpoints
            .iter()
            .map(|settings| {
                let endpoint = Endpoint::new(settings.repository.clone());
                match &settings.path {
                    Some(path) => endpoint.with_path(path.clone()),
                    None => endpoint,
                }
            })
            .collect()
    }

    pub fn build_registry(&self, updater: Arc<dyn RepoUpdater>) -> gitsync_core::Result<RepositoryRegistry> {
        let mut registry = RepositoryRegistry::new();
        for config in &self.repositories {
            registry.register(Repository::new(config.clone(), updater.clone()))?;
        }
        Ok(registry)
    }
}
