mod common;

use common::FakeRunner;
use incubator::answers::Answers;
use incubator::builtin;
use incubator::pipeline::driver::{run, NoopObserver, PipelineObserver};
use incubator::pipeline::steps::{project_dir_for, StepContext};
use incubator::pipeline::{Mode, Pipeline, PipelineState, StepName, StepStatus};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

fn answers(create_repo: Option<bool>) -> Answers {
    let mut answers = Answers::new();
    answers.insert("project_name", "demo");
    answers.insert("description", "Pipeline fixture");
    answers.insert("visibility", "private");
    answers.insert("license", "MIT");
    if let Some(create_repo) = create_repo {
        answers.insert("create_github_repo", create_repo);
    }
    answers.insert("enable_preview", false);
    answers
}

fn context(
    mode: Mode,
    base: &Path,
    answers: Answers,
    runner: Arc<FakeRunner>,
) -> Arc<StepContext> {
    let project_dir = project_dir_for(mode, base, &answers).unwrap();
    Arc::new(StepContext {
        manifest: builtin::manifest(),
        answers,
        mode,
        project_dir,
        cache_dir: base.join("cache"),
        template_repo: "acme/templates".to_string(),
        github_user: String::new(),
        runner,
    })
}

async fn run_to_end(mode: Mode, ctx: Arc<StepContext>) -> incubator::pipeline::PipelineResult {
    let pipeline = Pipeline::new(mode, &ctx.answers);
    let quit = Arc::new(AtomicBool::new(false));
    run(pipeline, ctx, &mut NoopObserver, quit).await
}

#[tokio::test]
async fn test_fresh_project_without_remote() {
    let base = TempDir::new().unwrap();
    let runner = Arc::new(FakeRunner::new().respond("git status", true, "A  README.md\n"));
    let ctx = context(Mode::Fresh, base.path(), answers(Some(false)), Arc::clone(&runner));

    let result = run_to_end(Mode::Fresh, ctx).await;

    assert_eq!(result.state, PipelineState::Done);
    assert_eq!(result.steps.len(), 3);
    assert!(result.steps.iter().all(|s| s.status == StepStatus::Done));
    assert_eq!(result.project_dir.as_deref(), Some(base.path().join("demo").as_path()));
    assert_eq!(result.repo_url, None);
    assert!(base.path().join("demo/README.md").exists());
    assert!(runner.ran("git init"));
    assert!(runner.ran("git commit"));
    assert!(!runner.ran("gh"));
}

#[tokio::test]
async fn test_fresh_project_with_remote() {
    let base = TempDir::new().unwrap();
    let runner = Arc::new(
        FakeRunner::new()
            .respond("git status", true, "A  README.md\n")
            .respond("gh repo create", true, "https://github.com/me/demo\n"),
    );
    let ctx = context(Mode::Fresh, base.path(), answers(None), Arc::clone(&runner));

    let result = run_to_end(Mode::Fresh, ctx).await;

    assert_eq!(result.state, PipelineState::Done);
    assert_eq!(result.steps.len(), 5);
    assert_eq!(result.repo_url.as_deref(), Some("https://github.com/me/demo"));
    assert!(result.failures().is_empty());
    assert!(runner.ran("git push -u origin HEAD"));
}

#[test_log::test(tokio::test)]
async fn test_remote_failure_is_tolerated() {
    let base = TempDir::new().unwrap();
    let runner = Arc::new(FakeRunner::new().respond("gh repo create", false, ""));
    let ctx = context(Mode::Fresh, base.path(), answers(Some(true)), Arc::clone(&runner));

    let result = run_to_end(Mode::Fresh, ctx).await;

    assert_eq!(result.state, PipelineState::Done);
    assert!(result.project_dir.is_some());
    assert_eq!(result.repo_url, None);
    let failures = result.failures();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].starts_with("create-remote-repo: "));
    assert!(runner.ran("git push"));
}

#[tokio::test]
async fn test_render_failure_halts() {
    let base = TempDir::new().unwrap();
    let runner = Arc::new(FakeRunner::new());
    let mut ctx = StepContext {
        manifest: builtin::manifest(),
        answers: answers(Some(false)),
        mode: Mode::Fresh,
        project_dir: base.path().join("demo"),
        cache_dir: base.path().join("cache"),
        template_repo: "acme/templates".to_string(),
        github_user: String::new(),
        runner: runner.clone(),
    };
    ctx.manifest.builtin = false;
    ctx.manifest.source_path = Some("missing-template".into());

    let result = run_to_end(Mode::Fresh, Arc::new(ctx)).await;

    assert_eq!(result.state, PipelineState::Halted);
    assert_eq!(result.steps[1].name, StepName::Render);
    assert_eq!(result.steps[1].status, StepStatus::Failed);
    assert!(result.steps[1].error.as_deref().unwrap_or_default().contains("rendering templates"));
    assert_eq!(result.steps[2].status, StepStatus::Pending);
    assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn test_init_in_place_keeps_existing_files() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join(".git")).unwrap();
    fs::write(dir.path().join("README.md"), "existing").unwrap();
    let runner = Arc::new(FakeRunner::new());
    let ctx = context(Mode::InitInPlace, dir.path(), answers(None), Arc::clone(&runner));

    let result = run_to_end(Mode::InitInPlace, ctx).await;

    assert_eq!(result.state, PipelineState::Done);
    assert_eq!(result.steps.len(), 2);
    assert_eq!(fs::read_to_string(dir.path().join("README.md")).unwrap(), "existing");
    assert!(dir.path().join("LICENSE").exists());
    assert!(!runner.ran("git init"));
    assert!(!runner.ran("git commit"));
}

struct QuitAfterFirstStep {
    quit: Arc<AtomicBool>,
}

impl PipelineObserver for QuitAfterFirstStep {
    fn on_update(&mut self, pipeline: &Pipeline) {
        if pipeline.steps()[0].status == StepStatus::Done {
            self.quit.store(true, Ordering::SeqCst);
        }
    }
}

#[tokio::test]
async fn test_quit_cancels_before_next_step() {
    let base = TempDir::new().unwrap();
    let runner = Arc::new(FakeRunner::new());
    let ctx = context(Mode::Fresh, base.path(), answers(Some(false)), runner);
    let quit = Arc::new(AtomicBool::new(false));
    let mut observer = QuitAfterFirstStep { quit: Arc::clone(&quit) };

    let pipeline = Pipeline::new(Mode::Fresh, &ctx.answers);
    let result = run(pipeline, ctx, &mut observer, quit).await;

    assert_eq!(result.state, PipelineState::Cancelled);
    assert_eq!(result.steps[0].status, StepStatus::Done);
    assert!(result.steps[1..].iter().all(|s| s.status == StepStatus::Pending));
    assert!(base.path().join("demo").is_dir());
    assert!(!base.path().join("demo/README.md").exists());
}

#[test]
fn test_project_dir_rejects_bad_names() {
    let base = TempDir::new().unwrap();
    let mut answers = Answers::new();
    answers.insert("project_name", "../escape");
    assert!(project_dir_for(Mode::Fresh, base.path(), &answers).is_err());

    answers.insert("project_name", "  ");
    assert!(project_dir_for(Mode::Fresh, base.path(), &answers).is_err());

    assert_eq!(project_dir_for(Mode::InitInPlace, base.path(), &answers).unwrap(), base.path());
}
