use chrono::{DateTime, Utc};
use tracing::Span;

use crate::{Error, Result};

/// One HTTP-exposed synchronization target.
///
/// Lifecycle: [`Endpoint::set_logger`], then [`Endpoint::provision`], then
/// [`Endpoint::validate`], before the first request is served.
#[derive(Debug, Clone)]
pub struct Endpoint {
    name: String,
    repository_name: String,
    path: String,
    started_at: Option<DateTime<Utc>>,
    logger: Span,
}

/// Check that `path` is a plain route: absolute, with no `:` or `*` segments,
/// which the router would read as parameters or wildcards.
pub fn validate_path(path: &str) -> Result<()> {
    if !path.starts_with('/') {
        return Err(Error::Config(format!("endpoint path must start with '/': {}", path)));
    }
    if path.contains(':') || path.contains('*') {
        return Err(Error::Config(format!(
            "endpoint path must not contain ':' or '*': {}",
            path
        )));
    }
    Ok(())
}

impl Endpoint {
    pub fn new(repository_name: impl Into<String>) -> Self {
        let repository_name = repository_name.into();
        Self {
            name: String::new(),
            path: format!("/update/{}", repository_name),
            repository_name,
            started_at: None,
            logger: Span::none(),
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Span every event about this endpoint is recorded under.
    pub fn set_logger(&mut self, logger: Span) {
        self.logger = logger;
    }

    pub fn provision(&mut self) -> Result<()> {
        if self.repository_name.is_empty() {
            return Err(Error::Config("endpoint repository name must not be empty".to_string()));
        }
        validate_path(&self.path)?;

        let started_at = Utc::now();
        self.started_at = Some(started_at);
        self.name = format!("git-{}", self.repository_name);

        self.logger.in_scope(|| {
            tracing::info!(
                instance_name = %self.name,
                started_at = %started_at.to_rfc3339(),
                "provisioned endpoint"
            );
        });
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.logger.in_scope(|| {
            tracing::info!(instance_name = %self.name, path = %self.path, "validated endpoint");
        });
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn repository_name(&self) -> &str {
        &self.repository_name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn logger(&self) -> &Span {
        &self.logger
    }
}
