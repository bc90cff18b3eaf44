//! Post-create hook execution.
//! A template may name a script (relative to the generated project) that
//! runs once the project has been provisioned.

use crate::answers::Answers;
use crate::error::{Error, Result};
use crate::manifest::TemplateManifest;
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Prefix of the environment variables exported to hooks.
pub const ENV_PREFIX: &str = "INCUBATOR_";

/// Location of the post-create hook inside `project_dir`, if the template declares one.
pub fn get_post_create_hook(manifest: &TemplateManifest, project_dir: &Path) -> Option<PathBuf> {
    let hook = manifest.hooks.post_create.trim();
    if hook.is_empty() {
        None
    } else {
        Some(project_dir.join(hook))
    }
}

/// Environment variables passed to hooks, one per answer.
pub fn hook_env(answers: &Answers) -> Vec<(String, String)> {
    answers
        .iter()
        .map(|(key, value)| (format!("{ENV_PREFIX}{}", key.to_uppercase()), value.to_string()))
        .collect()
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut permissions = std::fs::metadata(path)?.permissions();
    permissions.set_mode(0o755);
    std::fs::set_permissions(path, permissions)
        .map_err(|e| Error::HookError(format!("making hook executable: {e}")))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

/// Runs the template's post-create hook in `project_dir`.
///
/// # Returns
/// * `Ok(false)` - no hook declared, or the script does not exist
/// * `Ok(true)` - the hook ran and succeeded
///
/// # Errors
/// * `Error::HookError` if the hook cannot be started or exits with a failure
pub fn run_post_create_hook(
    manifest: &TemplateManifest,
    project_dir: &Path,
    answers: &Answers,
) -> Result<bool> {
    let Some(hook_path) = get_post_create_hook(manifest, project_dir) else {
        return Ok(false);
    };
    if !hook_path.exists() {
        debug!("Post-create hook {} not found, skipping", hook_path.display());
        return Ok(false);
    }

    let hook_path = hook_path.canonicalize()?;
    make_executable(&hook_path)?;
    info!("Running post-create hook {}", hook_path.display());

    let status = Command::new(&hook_path)
        .current_dir(project_dir)
        .envs(hook_env(answers))
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|e| Error::HookError(format!("failed to start {}: {e}", hook_path.display())))?;

    if !status.success() {
        return Err(Error::HookError(format!("post-create hook failed with status: {status}")));
    }
    Ok(true)
}
