pub mod coordinator;
pub mod endpoint;
pub mod error;
pub mod outcome;
pub mod registry;
pub mod repository;
pub mod webhook;

// Re-exports
pub use coordinator::UpdateCoordinator;
pub use endpoint::Endpoint;
pub use error::{Error, Result};
pub use outcome::RequestOutcome;
pub use registry::RepositoryRegistry;
pub use repository::{
    RepoUpdater, Repository, RepositoryAuth, RepositoryConfig, RepositoryStatus, UpdateState,
};
pub use webhook::{AuthFailure, HeaderSource, WebhookAuthenticator, WebhookRule};
