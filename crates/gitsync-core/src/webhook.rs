use serde::{Deserialize, Serialize};

use crate::repository::RepositoryConfig;

/// One configured header/secret pair a webhook caller must present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookRule {
    /// Label used in logs only.
    #[serde(default)]
    pub name: Option<String>,
    /// Header name, matched case-insensitively.
    pub header: String,
    /// Expected header value, compared byte for byte.
    pub secret: String,
}

impl WebhookRule {
    pub fn new(header: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            name: None,
            header: header.into(),
            secret: secret.into(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Read access to the headers of an inbound request.
///
/// Implementations must treat `name` case-insensitively and return the first
/// value when a header repeats.
pub trait HeaderSource {
    fn header_value(&self, name: &str) -> Option<&[u8]>;
}

impl HeaderSource for [(&str, &str)] {
    fn header_value(&self, name: &str) -> Option<&[u8]> {
        self.iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_bytes())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthFailure {
    /// None of the configured headers were present on the request.
    HeaderNotFound,
    /// A configured header was present with the wrong value.
    HeaderMismatch { header: String },
}

impl AuthFailure {
    pub fn reason(&self) -> &'static str {
        match self {
            AuthFailure::HeaderNotFound => "header not found",
            AuthFailure::HeaderMismatch { .. } => "header value mismatch",
        }
    }
}

impl std::fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthFailure::HeaderNotFound => write!(f, "{}", self.reason()),
            AuthFailure::HeaderMismatch { header } => write!(f, "{}: {}", self.reason(), header),
        }
    }
}

pub struct WebhookAuthenticator;

impl WebhookAuthenticator {
    /// Check a request against the repository's webhook rules.
    ///
    /// A repository without rules accepts every request. Otherwise any
    /// presented header with the wrong value rejects the request, and at
    /// least one configured header must be presented with the right value.
    pub fn authenticate<H>(config: &RepositoryConfig, headers: &H) -> Result<(), AuthFailure>
    where
        H: HeaderSource + ?Sized,
    {
        if config.webhooks.is_empty() {
            return Ok(());
        }

        let mut authorized = false;
        for rule in &config.webhooks {
            let value = match headers.header_value(&rule.header) {
                Some(value) if !value.is_empty() => value,
                _ => continue,
            };

            if value != rule.secret.as_bytes() {
                let failure = AuthFailure::HeaderMismatch {
                    header: rule.header.clone(),
                };
                tracing::warn!(
                    repo_name = %config.name,
                    webhook_header = %rule.header,
                    webhook_name = rule.name.as_deref().unwrap_or(""),
                    error = failure.reason(),
                    "webhook authentication failed"
                );
                return Err(failure);
            }
            authorized = true;
        }

        if !authorized {
            let failure = AuthFailure::HeaderNotFound;
            tracing::warn!(
                repo_name = %config.name,
                error = failure.reason(),
                "webhook authentication failed"
            );
            return Err(failure);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(rules: Vec<WebhookRule>) -> RepositoryConfig {
        RepositoryConfig::new("beta", "https://example.com/beta.git").with_webhooks(rules)
    }

    #[test]
    fn test_no_rules_is_open() {
        let config = config_with(vec![]);
        let headers: &[(&str, &str)] = &[];
        assert!(WebhookAuthenticator::authenticate(&config, headers).is_ok());

        let headers: &[(&str, &str)] = &[("X-Anything", "value")];
        assert!(WebhookAuthenticator::authenticate(&config, headers).is_ok());
    }

    #[test]
    fn test_missing_header_rejected() {
        let config = config_with(vec![WebhookRule::new("X-Hub-Sig", "s3cr3t")]);
        let headers: &[(&str, &str)] = &[("X-Other", "s3cr3t")];

        let err = WebhookAuthenticator::authenticate(&config, headers).unwrap_err();
        assert_eq!(err, AuthFailure::HeaderNotFound);
        assert_eq!(err.reason(), "header not found");
    }

    #[test]
    fn test_empty_header_counts_as_missing() {
        let config = config_with(vec![WebhookRule::new("X-Hub-Sig", "s3cr3t")]);
        let headers: &[(&str, &str)] = &[("X-Hub-Sig", "")];

        let err = WebhookAuthenticator::authenticate(&config, headers).unwrap_err();
        assert_eq!(err, AuthFailure::HeaderNotFound);
    }

    #[test]
    fn test_wrong_value_rejected() {
        let config = config_with(vec![WebhookRule::new("X-Hub-Sig", "s3cr3t")]);
        let headers: &[(&str, &str)] = &[("X-Hub-Sig", "wrong")];

        let err = WebhookAuthenticator::authenticate(&config, headers).unwrap_err();
        assert_eq!(err.reason(), "header value mismatch");
        assert_eq!(
            err,
            AuthFailure::HeaderMismatch {
                header: "X-Hub-Sig".to_string()
            }
        );
    }

    #[test]
    fn test_header_name_is_case_insensitive() {
        let config = config_with(vec![WebhookRule::new("X-Hub-Sig", "s3cr3t")]);
        let headers: &[(&str, &str)] = &[("x-hub-sig", "s3cr3t")];
        assert!(WebhookAuthenticator::authenticate(&config, headers).is_ok());
    }

    #[test]
    fn test_secret_is_case_sensitive() {
        let config = config_with(vec![WebhookRule::new("X-Hub-Sig", "s3cr3t")]);
        let headers: &[(&str, &str)] = &[("X-Hub-Sig", "S3CR3T")];
        assert!(WebhookAuthenticator::authenticate(&config, headers).is_err());
    }

    #[test]
    fn test_one_correct_header_among_several_rules() {
        let config = config_with(vec![
            WebhookRule::new("X-Gitlab-Token", "gl-secret"),
            WebhookRule::new("X-Hub-Sig", "s3cr3t"),
            WebhookRule::new("X-Gitea-Token", "gt-secret"),
        ]);
        let headers: &[(&str, &str)] = &[("X-Hub-Sig", "s3cr3t")];
        assert!(WebhookAuthenticator::authenticate(&config, headers).is_ok());
    }

    #[test]
    fn test_later_mismatch_overrides_earlier_match() {
        let config = config_with(vec![
            WebhookRule::new("X-Hub-Sig", "s3cr3t"),
            WebhookRule::new("X-Gitlab-Token", "gl-secret"),
        ]);
        let headers: &[(&str, &str)] = &[("X-Hub-Sig", "s3cr3t"), ("X-Gitlab-Token", "nope")];

        let err = WebhookAuthenticator::authenticate(&config, headers).unwrap_err();
        assert_eq!(
            err,
            AuthFailure::HeaderMismatch {
                header: "X-Gitlab-Token".to_string()
            }
        );
    }

    #[test]
    fn test_earlier_mismatch_short_circuits() {
        let config = config_with(vec![
            WebhookRule::new("X-Gitlab-Token", "gl-secret"),
            WebhookRule::new("X-Hub-Sig", "s3cr3t"),
        ]);
        let headers: &[(&str, &str)] = &[("X-Gitlab-Token", "nope"), ("X-Hub-Sig", "s3cr3t")];

        let err = WebhookAuthenticator::authenticate(&config, headers).unwrap_err();
        assert_eq!(err.reason(), "header value mismatch");
    }
}
