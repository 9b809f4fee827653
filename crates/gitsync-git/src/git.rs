use crate::error::{GitSyncError, Result};
use async_trait::async_trait;
use git2::{build::CheckoutBuilder, Cred, FetchOptions, Oid, RemoteCallbacks, Repository};
use gitsync_core::{RepoUpdater, RepositoryAuth, RepositoryConfig};
use std::path::Path;
use tracing::{debug, info};

/// Blocking git operations backing [`GitUpdater`].
pub struct GitManager;

impl GitManager {
    /// Bring the working copy at `config.path()` to the tip of the configured
    /// remote branch, cloning it first if needed. Returns the checked out commit.
    pub fn sync(config: &RepositoryConfig) -> Result<Oid> {
        let target_dir = config.path();

        if Self::needs_clone(&target_dir)? {
            let repo = Self::clone_repository(config, &target_dir)?;
            let head = repo.head()?.peel_to_commit()?.id();
            return Ok(head);
        }

        let repo = Repository::open(&target_dir)?;
        Self::fetch_and_checkout(&repo, config)
    }

    fn needs_clone(target_dir: &Path) -> Result<bool> {
        if !target_dir.exists() {
            return Ok(true);
        }
        if target_dir.join(".git").exists() {
            return Ok(false);
        }
        if std::fs::read_dir(target_dir)?.next().is_none() {
            return Ok(true);
        }
        Err(GitSyncError::NotARepository(target_dir.to_path_buf()))
    }

    /// Clone a repository to a local path
    fn clone_repository(config: &RepositoryConfig, target_dir: &Path) -> Result<Repository> {
        info!("Cloning repository {} to {:?}", config.address, target_dir);

        if let Some(parent) = target_dir.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut builder = git2::build::RepoBuilder::new();
        builder.fetch_options(Self::fetch_options(config.auth.as_ref()));
        builder.branch(&config.branch);

        let repo = builder.clone(&config.address, target_dir)?;

        info!("Repository cloned successfully to {:?}", target_dir);

        Ok(repo)
    }

    /// Fetch the configured branch and force the working tree to it
    fn fetch_and_checkout(repo: &Repository, config: &RepositoryConfig) -> Result<Oid> {
        let branch = &config.branch;
        debug!("Fetching branch {} for {}", branch, config.name);

        let mut remote = repo.find_remote("origin")?;
        let refspec = format!("+refs/heads/{0}:refs/remotes/origin/{0}", branch);
        let mut fetch_options = Self::fetch_options(config.auth.as_ref());
        remote.fetch(&[refspec.as_str()], Some(&mut fetch_options), None)?;

        let remote_ref = repo.find_reference(&format!("refs/remotes/origin/{}", branch))?;
        let commit = remote_ref.peel_to_commit()?;

        let local_ref = format!("refs/heads/{}", branch);
        repo.reference(&local_ref, commit.id(), true, "gitsync: update")?;
        repo.set_head(&local_ref)?;

        let mut checkout = CheckoutBuilder::new();
        checkout.force();
        repo.reset(commit.as_object(), git2::ResetType::Hard, Some(&mut checkout))?;

        info!("Checked out {} at {}", branch, commit.id());

        Ok(commit.id())
    }

    fn fetch_options(auth: Option<&RepositoryAuth>) -> FetchOptions<'static> {
        let mut callbacks = RemoteCallbacks::new();

        if let Some(auth) = auth {
            let username = auth.username.clone();
            let password = auth.password.clone();
            callbacks.credentials(move |_url, _username_from_url, _allowed_types| {
                Cred::userpass_plaintext(&username, &password)
            });
        }

        let mut fetch_options = FetchOptions::new();
        fetch_options.remote_callbacks(callbacks);
        fetch_options
    }
}

/// [`RepoUpdater`] that synchronizes a working copy with git.
#[derive(Debug, Default, Clone, Copy)]
pub struct GitUpdater;

impl GitUpdater {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RepoUpdater for GitUpdater {
    async fn update(&self, config: &RepositoryConfig) -> anyhow::Result<()> {
        let config = config.clone();
        let name = config.name.clone();

        let head = tokio::task::spawn_blocking(move || GitManager::sync(&config)).await??;

        debug!(repo_name = %name, commit = %head, "working copy synchronized");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::{Commit, RepositoryInitOptions, Signature};
    use std::fs;

    fn init_origin(path: &Path) -> Repository {
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("main");
        Repository::init_opts(path, &opts).unwrap()
    }

    fn commit_file(repo: &Repository, file: &str, content: &str, message: &str) -> Oid {
        let workdir = repo.workdir().unwrap();
        fs::write(workdir.join(file), content).unwrap();

        let mut index = repo.index().unwrap();
        index.add_path(Path::new(file)).unwrap();
        index.write().unwrap();

        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = Signature::now("GitSync Test", "test@gitsync.local").unwrap();

        let parents: Vec<Commit> = match repo.head() {
            Ok(head) => vec![head.peel_to_commit().unwrap()],
            Err(_) => vec![],
        };
        let parent_refs: Vec<&Commit> = parents.iter().collect();

        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
            .unwrap()
    }

    fn config_for(origin: &Path, base_dir: &Path) -> RepositoryConfig {
        RepositoryConfig::new("alpha", origin.to_str().unwrap()).with_base_dir(base_dir)
    }

    #[test]
    fn test_sync_clones_then_fast_forwards() {
        let origin_dir = tempfile::tempdir().unwrap();
        let work_dir = tempfile::tempdir().unwrap();
        let origin = init_origin(origin_dir.path());

        let first = commit_file(&origin, "README.md", "v1", "initial");
        let config = config_for(origin_dir.path(), work_dir.path());

        assert_eq!(GitManager::sync(&config).unwrap(), first);
        let checkout = work_dir.path().join("alpha");
        assert_eq!(fs::read_to_string(checkout.join("README.md")).unwrap(), "v1");

        let second = commit_file(&origin, "README.md", "v2", "second");
        assert_eq!(GitManager::sync(&config).unwrap(), second);
        assert_eq!(fs::read_to_string(checkout.join("README.md")).unwrap(), "v2");
    }

    #[test]
    fn test_sync_discards_local_changes() {
        let origin_dir = tempfile::tempdir().unwrap();
        let work_dir = tempfile::tempdir().unwrap();
        let origin = init_origin(origin_dir.path());
        commit_file(&origin, "README.md", "v1", "initial");

        let config = config_for(origin_dir.path(), work_dir.path());
        GitManager::sync(&config).unwrap();

        let readme = work_dir.path().join("alpha").join("README.md");
        fs::write(&readme, "local edit").unwrap();

        GitManager::sync(&config).unwrap();
        assert_eq!(fs::read_to_string(&readme).unwrap(), "v1");
    }

    #[test]
    fn test_sync_refuses_foreign_directory() {
        let origin_dir = tempfile::tempdir().unwrap();
        let work_dir = tempfile::tempdir().unwrap();
        let origin = init_origin(origin_dir.path());
        commit_file(&origin, "README.md", "v1", "initial");

        let checkout = work_dir.path().join("alpha");
        fs::create_dir_all(&checkout).unwrap();
        fs::write(checkout.join("notes.txt"), "not a repo").unwrap();

        let err = GitManager::sync(&config_for(origin_dir.path(), work_dir.path())).unwrap_err();
        assert!(matches!(err, GitSyncError::NotARepository(_)));
    }

    #[tokio::test]
    async fn test_updater_reports_missing_remote() {
        let work_dir = tempfile::tempdir().unwrap();
        let missing = work_dir.path().join("no-such-origin");
        let config = config_for(&missing, &work_dir.path().join("checkouts"));

        assert!(GitUpdater::new().update(&config).await.is_err());
    }
}
