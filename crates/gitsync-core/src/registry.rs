use std::collections::HashMap;
use std::sync::Arc;

use crate::{Error, Repository, RepositoryStatus, Result};

/// Name-indexed set of repositories, built once at startup and read-only after.
#[derive(Debug, Default)]
pub struct RepositoryRegistry {
    repos: HashMap<String, Arc<Repository>>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a repository. Names must be unique.
    pub fn register(&mut self, repo: Repository) -> Result<Arc<Repository>> {
        repo.config().validate_name()?;
        let name = repo.name().to_string();
        if self.repos.contains_key(&name) {
            return Err(Error::Config(format!("duplicate repository name: {}", name)));
        }

        let repo = Arc::new(repo);
        self.repos.insert(name.clone(), repo.clone());
        tracing::debug!(repo_name = %name, "registered repository");

        Ok(repo)
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<Repository>> {
        self.repos.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.repos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repos.is_empty()
    }

    /// Repository names in sorted order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.repos.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn statuses(&self) -> Vec<RepositoryStatus> {
        self.names()
            .iter()
            .filter_map(|name| self.repos.get(name))
            .map(|repo| repo.status())
            .collect()
    }
}
