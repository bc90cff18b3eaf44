//! Fetching template repositories.
//! Clones a template repository into the cache on first use and
//! fast-forwards it afterwards.

use crate::cache::{needs_initial_fetch, CacheStore};
use crate::error::{Error, Result};
use crate::source::{repo_cache_dir, repo_slug};
use chrono::Utc;
use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::{FetchOptions, RemoteCallbacks, Repository};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// Clone URL for a repository identifier.
///
/// Full HTTPS, git and SSH URLs are used as given; `owner/repo` is
/// resolved against GitHub.
pub fn clone_url(template_repo: &str) -> String {
    if let Ok(url) = Url::parse(template_repo) {
        if matches!(url.scheme(), "https" | "http" | "git" | "ssh" | "file") {
            return template_repo.to_string();
        }
    }
    if template_repo.starts_with("git@") {
        return template_repo.to_string();
    }
    format!("https://github.com/{}.git", repo_slug(template_repo))
}

fn fetch_options<'a>() -> FetchOptions<'a> {
    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(|_url, username_from_url, allowed_types| {
        if allowed_types.contains(git2::CredentialType::SSH_KEY) {
            let home = dirs::home_dir().unwrap_or_default();
            git2::Cred::ssh_key(
                username_from_url.unwrap_or("git"),
                None,
                &home.join(".ssh").join("id_rsa"),
                None,
            )
        } else {
            git2::Cred::default()
        }
    });

    let mut fetch_opts = FetchOptions::new();
    fetch_opts.remote_callbacks(callbacks);
    fetch_opts
}

/// Keeps the cached clone of one template repository up to date.
pub struct TemplateFetcher<'a> {
    cache_dir: PathBuf,
    template_repo: String,
    store: &'a dyn CacheStore,
}

impl<'a> TemplateFetcher<'a> {
    pub fn new(cache_dir: &Path, template_repo: &str, store: &'a dyn CacheStore) -> Self {
        Self {
            cache_dir: cache_dir.to_path_buf(),
            template_repo: template_repo.to_string(),
            store,
        }
    }

    pub fn repo_dir(&self) -> PathBuf {
        repo_cache_dir(&self.cache_dir, &self.template_repo)
    }

    /// Clones or updates the repository, then records the fetch time.
    ///
    /// # Returns
    /// * `Result<PathBuf>` - Path to the repository clone
    pub fn fetch(&self) -> Result<PathBuf> {
        let repo_dir = self.repo_dir();
        if needs_initial_fetch(&repo_dir) {
            self.clone_into(&repo_dir)?;
        } else {
            self.pull(&repo_dir)?;
        }

        let mut info = self.store.load()?;
        info.mark_fetched(Utc::now());
        self.store.save(&info)?;
        Ok(repo_dir)
    }

    fn clone_into(&self, repo_dir: &Path) -> Result<()> {
        let url = clone_url(&self.template_repo);
        info!("Cloning templates from '{url}'");

        if repo_dir.exists() {
            debug!("Removing incomplete clone at '{}'", repo_dir.display());
            fs::remove_dir_all(repo_dir)?;
        }
        if let Some(parent) = repo_dir.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut fetch_opts = fetch_options();
        fetch_opts.depth(1);
        let mut builder = RepoBuilder::new();
        builder.fetch_options(fetch_opts);
        builder.clone(&url, repo_dir)?;
        Ok(())
    }

    fn pull(&self, repo_dir: &Path) -> Result<()> {
        info!("Updating templates in '{}'", repo_dir.display());
        let repo = Repository::open(repo_dir)?;
        let mut remote = repo.find_remote("origin")?;
        remote.fetch(&[] as &[&str], Some(&mut fetch_options()), None)?;

        let fetch_head = repo.find_reference("FETCH_HEAD")?;
        let fetch_commit = repo.reference_to_annotated_commit(&fetch_head)?;
        let (analysis, _) = repo.merge_analysis(&[&fetch_commit])?;

        if analysis.is_up_to_date() {
            debug!("Templates already up to date");
            return Ok(());
        }
        if !analysis.is_fast_forward() {
            return Err(Error::git(
                "template update",
                format!("'{}' has diverged from its remote", repo_dir.display()),
            ));
        }

        let head_ref = repo
            .head()?
            .name()
            .map(str::to_string)
            .ok_or_else(|| Error::git("template update", "HEAD is not a named reference"))?;
        let mut reference = repo.find_reference(&head_ref)?;
        reference.set_target(fetch_commit.id(), "incubator: fast-forward")?;
        repo.set_head(&head_ref)?;
        repo.checkout_head(Some(CheckoutBuilder::default().force()))?;
        Ok(())
    }
}
