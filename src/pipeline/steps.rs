//! What each pipeline step does.

use super::{Mode, StepName, StepOutcome};
use crate::answers::{Answers, PROJECT_NAME, VISIBILITY};
use crate::error::{Error, Result};
use crate::git::{self, Visibility};
use crate::manifest::TemplateManifest;
use crate::processor::{Processor, ProcessorOptions};
use crate::renderer::MiniJinjaRenderer;
use crate::runner::ProcessRunner;
use crate::source::resolve_template_tree;
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Everything the steps of one run share. Read-only for the whole run.
pub struct StepContext {
    pub manifest: TemplateManifest,
    pub answers: Answers,
    pub mode: Mode,
    pub project_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub template_repo: String,
    /// Owner used for the repository URL when `gh` does not print one.
    pub github_user: String,
    pub runner: Arc<dyn ProcessRunner>,
}

/// Where the project lives: `<base>/<project_name>` for a fresh project,
/// `base` itself when initializing in place.
pub fn project_dir_for(mode: Mode, base: &Path, answers: &Answers) -> Result<PathBuf> {
    match mode {
        Mode::InitInPlace => Ok(base.to_path_buf()),
        Mode::Fresh => {
            let name = answers.text(PROJECT_NAME);
            let name = name.trim();
            if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
                return Err(Error::ValidationError(format!("invalid project name '{name}'")));
            }
            Ok(base.join(name))
        }
    }
}

impl StepContext {
    fn project_name(&self) -> String {
        let name = self.answers.text(PROJECT_NAME);
        if !name.trim().is_empty() {
            return name.trim().to_string();
        }
        self.project_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    fn commit_message(&self) -> String {
        match self.mode {
            Mode::Fresh => {
                format!("Initial commit from incubator template '{}'", self.manifest.name)
            }
            Mode::InitInPlace => format!("Add '{}' scaffold from incubator", self.manifest.name),
        }
    }

    fn outcome_with_dir(&self) -> StepOutcome {
        StepOutcome { project_dir: Some(self.project_dir.clone()), repo_url: None }
    }
}

fn create_directory(ctx: &StepContext) -> Result<StepOutcome> {
    fs::create_dir_all(&ctx.project_dir)?;
    Ok(ctx.outcome_with_dir())
}

fn render(ctx: &StepContext) -> Result<StepOutcome> {
    let wrap = |e: Error| Error::TemplateError(format!("rendering templates: {e}"));

    let tree = resolve_template_tree(&ctx.manifest, &ctx.cache_dir, &ctx.template_repo)
        .map_err(wrap)?;
    debug!("Rendering {tree} into {}", ctx.project_dir.display());

    let engine = MiniJinjaRenderer::new();
    let options = ProcessorOptions { skip_existing: ctx.mode == Mode::InitInPlace };
    let processor = Processor::new(&ctx.manifest, &ctx.answers, &engine, options);
    let rendered = processor.render_to(&tree, &ctx.project_dir).map_err(wrap)?;
    info!("Rendered {} files", rendered.len());
    Ok(ctx.outcome_with_dir())
}

fn commit(ctx: &StepContext) -> Result<StepOutcome> {
    let runner = ctx.runner.as_ref();
    if !git::has_repo(&ctx.project_dir) {
        git::init_repo(runner, &ctx.project_dir)?;
    }
    git::commit_all(runner, &ctx.project_dir, &ctx.commit_message())?;
    Ok(StepOutcome::default())
}

fn create_remote_repo(ctx: &StepContext) -> Result<StepOutcome> {
    if !ctx.answers.wants_remote_repo() {
        debug!("Remote repository not requested");
        return Ok(StepOutcome::default());
    }
    let visibility = Visibility::from_answer(&ctx.answers.text(VISIBILITY));
    let url = git::create_remote_repo(
        ctx.runner.as_ref(),
        &ctx.project_dir,
        &ctx.project_name(),
        &ctx.github_user,
        visibility,
    )?;
    Ok(StepOutcome { project_dir: None, repo_url: Some(url) })
}

fn push(ctx: &StepContext) -> Result<StepOutcome> {
    if !ctx.answers.wants_remote_repo() {
        debug!("Remote repository not requested");
        return Ok(StepOutcome::default());
    }
    git::push(ctx.runner.as_ref(), &ctx.project_dir)?;
    Ok(StepOutcome::default())
}

/// Runs one step to completion. Blocks on filesystem and process I/O.
pub fn execute(step: StepName, ctx: &StepContext) -> Result<StepOutcome> {
    match step {
        StepName::CreateDirectory => create_directory(ctx),
        StepName::Render => render(ctx),
        StepName::InitRepo | StepName::CommitScaffold => commit(ctx),
        StepName::CreateRemoteRepo => create_remote_repo(ctx),
        StepName::Push => push(ctx),
    }
}
