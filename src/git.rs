//! Git and GitHub operations used while provisioning a project.
//! Every command goes through a [`ProcessRunner`].

use crate::error::{Error, Result};
use crate::runner::{require_program, ProcessRunner};
use log::{debug, info};
use std::path::Path;

pub const GIT_HINT: &str = "Install git from https://git-scm.com/downloads";
pub const GH_HINT: &str =
    "Install the GitHub CLI from https://cli.github.com and run `gh auth login`";

/// Remote repository visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Private,
    Public,
}

impl Visibility {
    /// `"private"` maps to private, anything else to public.
    pub fn from_answer(value: &str) -> Self {
        if value == "private" {
            Visibility::Private
        } else {
            Visibility::Public
        }
    }

    fn flag(self) -> &'static str {
        match self {
            Visibility::Private => "--private",
            Visibility::Public => "--public",
        }
    }
}

fn git(runner: &dyn ProcessRunner, dir: &Path, operation: &str, args: &[&str]) -> Result<String> {
    let output = runner.run(dir, "git", args)?;
    if !output.success {
        return Err(Error::git(operation, output.message()));
    }
    Ok(output.stdout)
}

/// Whether `dir` already has git history.
pub fn has_repo(dir: &Path) -> bool {
    dir.join(".git").exists()
}

/// Initializes a repository in `dir`.
pub fn init_repo(runner: &dyn ProcessRunner, dir: &Path) -> Result<()> {
    require_program(runner, "git", GIT_HINT)?;
    info!("Initializing git repository in {}", dir.display());
    git(runner, dir, "git init", &["init"])?;
    Ok(())
}

/// Stages everything and commits it.
///
/// # Returns
/// * `Ok(false)` - nothing to commit, which is not an error
/// * `Ok(true)` - a commit was created
pub fn commit_all(runner: &dyn ProcessRunner, dir: &Path, message: &str) -> Result<bool> {
    require_program(runner, "git", GIT_HINT)?;
    git(runner, dir, "git add", &["add", "-A"])?;

    let status = git(runner, dir, "git status", &["status", "--porcelain"])?;
    if status.trim().is_empty() {
        info!("Nothing to commit in {}", dir.display());
        return Ok(false);
    }

    let output = runner.run(dir, "git", &["commit", "-m", message])?;
    if !output.success {
        if output.stdout.contains("nothing to commit") {
            debug!("git commit reported nothing to commit");
            return Ok(false);
        }
        return Err(Error::git("git commit", output.message()));
    }
    info!("Committed scaffold: {message}");
    Ok(true)
}

/// Creates a GitHub repository from `dir` with `origin` pointing at it.
///
/// # Returns
/// The repository URL printed by `gh`, or the conventional GitHub URL when
/// `gh` prints nothing. `owner` is the configured GitHub user and may be empty.
pub fn create_remote_repo(
    runner: &dyn ProcessRunner,
    dir: &Path,
    name: &str,
    owner: &str,
    visibility: Visibility,
) -> Result<String> {
    require_program(runner, "gh", GH_HINT)?;
    info!("Creating GitHub repository '{name}'");

    let output = runner.run(
        dir,
        "gh",
        &["repo", "create", name, visibility.flag(), "--source=.", "--remote=origin"],
    )?;
    if !output.success {
        return Err(Error::git("gh repo create", output.message()));
    }

    let url = output
        .stdout
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| match owner.trim() {
            "" => format!("https://github.com/{name}"),
            owner => format!("https://github.com/{owner}/{name}"),
        });
    Ok(url)
}

/// Pushes the current branch to `origin`.
pub fn push(runner: &dyn ProcessRunner, dir: &Path) -> Result<()> {
    require_program(runner, "git", GIT_HINT)?;
    info!("Pushing to origin");
    git(runner, dir, "git push", &["push", "-u", "origin", "HEAD"])?;
    Ok(())
}
