//! incubator's main application entry point and orchestration logic.
//! Handles command-line parsing, template selection, answer collection and
//! runs the provisioning pipeline.

use anyhow::{bail, Context};
use chrono::Utc;
use incubator::{
    cache::{needs_initial_fetch, CacheInfo, CacheStore, JsonCacheStore},
    cli::{get_args, Args, Commands, InitArgs, NewArgs, TemplateArgs},
    config::{config_dir, Config},
    editor::open_in_editor,
    error::default_error_handler,
    fetcher::TemplateFetcher,
    hooks::{get_post_create_hook, run_post_create_hook},
    loader::{
        create_local_template, find_template, load_all_templates, CatalogEntry, TemplateOrigin,
    },
    logger::init_logger,
    parser::{collect_answers, load_from_stdin},
    pipeline::{
        driver::{self, PipelineObserver},
        steps::{project_dir_for, StepContext},
        Mode, Pipeline, PipelineResult, PipelineState, StepStatus,
    },
    processor::{partition_existing, Processor, ProcessorOptions},
    prompt::{DialoguerPrompter, Prompter},
    renderer::MiniJinjaRenderer,
    runner::SystemRunner,
    source::{repo_cache_dir, resolve_template_tree},
};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Main application entry point.
fn main() {
    let args = get_args();
    init_logger(args.verbose);

    if let Err(err) = run(args) {
        default_error_handler(err);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let mut config = Config::load().context("loading configuration")?;
    let cache_dir = config_dir()?;

    match args.command {
        Commands::New(new_args) => new_project(&config, &cache_dir, new_args),
        Commands::Init(init_args) => init_project(&config, &cache_dir, init_args),
        Commands::List => list_templates(&config, &cache_dir),
        Commands::Update => update_templates(&config, &cache_dir, true),
        Commands::CreateTemplate { name } => {
            let dir = create_local_template(&config.local_template_dir(), &name)?;
            println!("Created local template '{}' at {}", name, dir.display());
            println!("Edit {} and add files under files/.", dir.join("template.yaml").display());
            Ok(())
        }
        Commands::AddRepo { repo } => {
            if config.add_template_repo(&repo) {
                config.save()?;
                println!("Added template repository '{repo}'. Run `incubator update` to fetch it.");
            } else {
                println!("Template repository '{repo}' is already configured.");
            }
            Ok(())
        }
        Commands::RemoveRepo { repo } => {
            config.remove_template_repo(&repo);
            config.save()?;
            println!("Removed template repository '{repo}'.");
            Ok(())
        }
        Commands::Config { edit } => {
            if edit {
                config.edit(&DialoguerPrompter::new())?;
                config.save()?;
                println!("Configuration saved.");
            }
            print!("{}", config.to_yaml()?);
            Ok(())
        }
    }
}

/// Fetches template repositories. Without `force`, only runs when a
/// repository is missing or the cache is stale, and failures are warnings.
fn update_templates(config: &Config, cache_dir: &Path, force: bool) -> anyhow::Result<()> {
    let store = JsonCacheStore::new(cache_dir);
    let repos = config.template_repos();

    if !force {
        let info = store.load().unwrap_or_default();
        let missing = repos.iter().any(|r| needs_initial_fetch(&repo_cache_dir(cache_dir, r)));
        if !missing && !info.is_stale(Utc::now(), CacheInfo::ttl()) {
            return Ok(());
        }
    }

    for repo in repos {
        match TemplateFetcher::new(cache_dir, &repo, &store).fetch() {
            Ok(dir) => info!("Templates from '{repo}' are in {}", dir.display()),
            Err(e) if !force => warn!("Could not update templates from '{repo}': {e}"),
            Err(e) => return Err(e).with_context(|| format!("updating templates from '{repo}'")),
        }
        if force {
            println!("Updated templates from '{repo}'");
        }
    }
    Ok(())
}

fn load_catalog(config: &Config, cache_dir: &Path) -> anyhow::Result<Vec<CatalogEntry>> {
    if config.auto_update_check {
        update_templates(config, cache_dir, false)?;
    }
    Ok(load_all_templates(config, cache_dir))
}

fn list_templates(config: &Config, cache_dir: &Path) -> anyhow::Result<()> {
    for entry in load_catalog(config, cache_dir)? {
        let manifest = &entry.manifest;
        println!(
            "{:<24} {:<10} {:<32} {}",
            manifest.name, manifest.version, entry.origin, manifest.description
        );
    }
    Ok(())
}

fn select_template<'a>(
    prompter: &dyn Prompter,
    catalog: &'a [CatalogEntry],
    name: Option<&str>,
    interactive: bool,
) -> anyhow::Result<&'a CatalogEntry> {
    if let Some(name) = name {
        return find_template(catalog, name)
            .with_context(|| format!("template '{name}' not found (see `incubator list`)"));
    }
    if !interactive || catalog.len() == 1 {
        return catalog.first().context("no templates available");
    }

    let items: Vec<String> = catalog
        .iter()
        .map(|e| format!("{} ({}) - {}", e.manifest.name, e.origin, e.manifest.description))
        .collect();
    let idx = prompter.select("Template", &items, 0)?;
    catalog.get(idx).context("invalid template selection")
}

fn gather_answers(
    prompter: &dyn Prompter,
    config: &Config,
    entry: &CatalogEntry,
    args: &TemplateArgs,
    interactive: bool,
) -> anyhow::Result<incubator::answers::Answers> {
    let preloaded = if args.stdin { load_from_stdin()? } else { serde_json::Map::new() };
    let mut manifest = entry.manifest.clone();
    config.apply_prompt_defaults(&mut manifest);
    Ok(collect_answers(prompter, &manifest, &preloaded, interactive)?)
}

fn step_context(
    config: &Config,
    cache_dir: &Path,
    entry: &CatalogEntry,
    answers: incubator::answers::Answers,
    mode: Mode,
    project_dir: PathBuf,
) -> StepContext {
    let template_repo = match &entry.origin {
        TemplateOrigin::Remote(repo) => repo.clone(),
        _ => config.template_repo.clone(),
    };
    StepContext {
        manifest: entry.manifest.clone(),
        answers,
        mode,
        project_dir,
        cache_dir: cache_dir.to_path_buf(),
        template_repo,
        github_user: config.github_user.clone(),
        runner: Arc::new(SystemRunner),
    }
}

/// Files the template would produce for the context's answers.
fn planned_files(ctx: &StepContext) -> anyhow::Result<Vec<String>> {
    let tree = resolve_template_tree(&ctx.manifest, &ctx.cache_dir, &ctx.template_repo)?;
    let engine = MiniJinjaRenderer::new();
    let processor =
        Processor::new(&ctx.manifest, &ctx.answers, &engine, ProcessorOptions::default());
    Ok(processor.list_files(&tree)?)
}

fn new_project(config: &Config, cache_dir: &Path, args: NewArgs) -> anyhow::Result<()> {
    let prompter = DialoguerPrompter::new();
    let interactive = !(args.template.yes || args.template.stdin);

    let catalog = load_catalog(config, cache_dir)?;
    let entry =
        select_template(&prompter, &catalog, args.template.template.as_deref(), interactive)?;
    let answers = gather_answers(&prompter, config, entry, &args.template, interactive)?;

    let base = args.output_dir.unwrap_or_else(|| config.project_dir());
    let project_dir = project_dir_for(Mode::Fresh, &base, &answers)?;
    if project_dir.exists() && project_dir.read_dir()?.next().is_some() {
        bail!("{} already exists and is not empty", project_dir.display());
    }

    let ctx = step_context(config, cache_dir, entry, answers, Mode::Fresh, project_dir);
    if args.dry_run {
        println!("Would create {}:", ctx.project_dir.display());
        for file in planned_files(&ctx)? {
            println!("  {file}");
        }
        return Ok(());
    }

    let question = format!(
        "Create '{}' from template '{}' in {}?",
        ctx.answers.text(incubator::answers::PROJECT_NAME),
        ctx.manifest.name,
        ctx.project_dir.display()
    );
    if interactive && !prompter.confirm(&question, true)? {
        println!("Aborted.");
        return Ok(());
    }

    execute(ctx, config, &prompter, &args.template, interactive)
}

fn init_project(config: &Config, cache_dir: &Path, args: InitArgs) -> anyhow::Result<()> {
    let prompter = DialoguerPrompter::new();
    let interactive = !(args.template.yes || args.template.stdin);
    let dir = args
        .dir
        .canonicalize()
        .with_context(|| format!("directory {} does not exist", args.dir.display()))?;

    let catalog = load_catalog(config, cache_dir)?;
    let entry =
        select_template(&prompter, &catalog, args.template.template.as_deref(), interactive)?;
    let answers = gather_answers(&prompter, config, entry, &args.template, interactive)?;
    let project_dir = project_dir_for(Mode::InitInPlace, &dir, &answers)?;
    let ctx = step_context(config, cache_dir, entry, answers, Mode::InitInPlace, project_dir);

    let files = planned_files(&ctx)?;
    let (new_files, existing) = partition_existing(&files, &ctx.project_dir);
    println!("Scaffolding '{}' into {}", ctx.manifest.name, ctx.project_dir.display());
    for file in &new_files {
        println!("  + {file}");
    }
    for file in &existing {
        println!("  = {file} (exists, kept)");
    }
    if new_files.is_empty() {
        println!("No new files to add.");
    }

    if interactive && !prompter.confirm("Continue?", true)? {
        println!("Aborted.");
        return Ok(());
    }

    execute(ctx, config, &prompter, &args.template, interactive)
}

/// Runs the pipeline and reports the outcome. Afterwards it runs the
/// post-create hook and offers to open the project in the editor.
fn execute(
    ctx: StepContext,
    config: &Config,
    prompter: &dyn Prompter,
    args: &TemplateArgs,
    interactive: bool,
) -> anyhow::Result<()> {
    let ctx = Arc::new(ctx);
    let result = run_pipeline(Arc::clone(&ctx))?;

    match result.state {
        PipelineState::Halted => {
            bail!("project creation failed: {}", result.failures().join("; "));
        }
        PipelineState::Cancelled => {
            println!("Cancelled. Steps already completed were kept.");
            return Ok(());
        }
        PipelineState::Done | PipelineState::Running => {}
    }

    let project_dir = result.project_dir.clone().unwrap_or_else(|| ctx.project_dir.clone());
    println!("Project ready at {}", project_dir.display());
    if let Some(url) = &result.repo_url {
        println!("Repository: {url}");
    }
    for failure in result.failures() {
        println!("Warning: {failure}");
    }

    let has_hook =
        get_post_create_hook(&ctx.manifest, &project_dir).is_some_and(|hook| hook.exists());
    if has_hook && !args.skip_hooks {
        let run_hook = !interactive
            || prompter.confirm(
                "This template has a post-create hook that runs commands on your system. Run it?",
                false,
            )?;
        if run_hook {
            run_post_create_hook(&ctx.manifest, &project_dir, &ctx.answers)?;
        }
    }

    let editor = config.editor.trim();
    if interactive && !matches!(editor, "" | "none") {
        let question = format!("Open {} in {editor}?", project_dir.display());
        if prompter.confirm(&question, true)? {
            if let Err(e) = open_in_editor(editor, &project_dir) {
                warn!("Could not open {editor}: {e}");
            }
        }
    }
    Ok(())
}

fn run_pipeline(ctx: Arc<StepContext>) -> anyhow::Result<PipelineResult> {
    let quit = Arc::new(AtomicBool::new(false));
    {
        let quit = Arc::clone(&quit);
        ctrlc::set_handler(move || {
            if quit.swap(true, Ordering::SeqCst) {
                std::process::exit(130);
            }
            eprintln!("\nStopping after the current step (press Ctrl-C again to exit now)");
        })
        .context("installing Ctrl-C handler")?;
    }

    let runtime = tokio::runtime::Builder::new_current_thread().enable_time().build()?;
    let pipeline = Pipeline::new(ctx.mode, &ctx.answers);
    let mut observer = ProgressObserver::new(pipeline.steps().len());
    let result = runtime.block_on(driver::run(pipeline, ctx, &mut observer, quit));
    observer.finish();
    Ok(result)
}

/// Renders pipeline progress as a progress bar with one line per finished step.
struct ProgressObserver {
    bar: ProgressBar,
    reported: Vec<StepStatus>,
}

impl ProgressObserver {
    fn new(steps: usize) -> Self {
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::with_template("{spinner} [{bar:30}] {percent:>3}% {msg}")
            .map(|style| style.progress_chars("=> "))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        Self { bar, reported: vec![StepStatus::Pending; steps] }
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl PipelineObserver for ProgressObserver {
    fn on_update(&mut self, pipeline: &Pipeline) {
        self.bar.set_position((pipeline.progress() * 100.0).round() as u64);
        if let Some(step) = pipeline.running_step() {
            self.bar.set_message(step.label());
        }

        for (step, reported) in pipeline.steps().iter().zip(self.reported.iter_mut()) {
            if step.status == *reported {
                continue;
            }
            match step.status {
                StepStatus::Done => self.bar.println(format!("  ✓ {}", step.name.label())),
                StepStatus::Failed => self.bar.println(format!(
                    "  ✗ {}: {}",
                    step.name.label(),
                    step.error.as_deref().unwrap_or("failed")
                )),
                StepStatus::Pending | StepStatus::Running => {}
            }
            *reported = step.status;
        }
    }

    fn on_tick(&mut self, _pipeline: &Pipeline) {
        self.bar.tick();
    }
}
