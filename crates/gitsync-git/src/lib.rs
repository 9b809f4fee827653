mod error;
mod git;

pub use error::{GitSyncError, Result};
pub use git::{GitManager, GitUpdater};
