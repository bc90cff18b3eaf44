//! The scaffolding pipeline.
//! A run is an ordered list of steps built once from the mode and the
//! answers. Exactly one step runs at a time; [`driver::run`] executes them
//! and feeds their results back into the [`Pipeline`] state machine.

pub mod driver;
pub mod steps;

use crate::answers::Answers;
use log::{info, warn};
use std::fmt;
use std::path::PathBuf;

/// How the project directory is provisioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Create a new directory, render into it and publish it.
    Fresh,
    /// Render into an existing directory without overwriting files.
    InitInPlace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepName {
    CreateDirectory,
    Render,
    InitRepo,
    CommitScaffold,
    CreateRemoteRepo,
    Push,
}

impl StepName {
    pub fn as_str(self) -> &'static str {
        match self {
            StepName::CreateDirectory => "create-directory",
            StepName::Render => "render",
            StepName::InitRepo => "init-repo",
            StepName::CommitScaffold => "commit-scaffold",
            StepName::CreateRemoteRepo => "create-remote-repo",
            StepName::Push => "push",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StepName::CreateDirectory => "Creating project directory",
            StepName::Render => "Rendering template files",
            StepName::InitRepo => "Initializing git repository",
            StepName::CommitScaffold => "Committing scaffold",
            StepName::CreateRemoteRepo => "Creating GitHub repository",
            StepName::Push => "Pushing to GitHub",
        }
    }

    /// Relative share of the progress bar.
    pub fn weight(self) -> f64 {
        match self {
            StepName::CreateDirectory => 0.10,
            StepName::Render => 0.20,
            StepName::InitRepo => 0.10,
            StepName::CommitScaffold => 0.10,
            StepName::CreateRemoteRepo => 0.40,
            StepName::Push => 0.20,
        }
    }

    /// Remote steps may fail without stopping the run.
    pub fn is_remote(self) -> bool {
        matches!(self, StepName::CreateRemoteRepo | StepName::Push)
    }
}

impl fmt::Display for StepName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Pending,
    Running,
    Done,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressStep {
    pub name: StepName,
    pub status: StepStatus,
    pub error: Option<String>,
}

impl ProgressStep {
    fn new(name: StepName) -> Self {
        Self { name, status: StepStatus::Pending, error: None }
    }

    /// `"<step>: <cause>"` for a failed step.
    pub fn failure(&self) -> Option<String> {
        self.error.as_ref().map(|e| format!("{}: {e}", self.name))
    }
}

/// Values a step contributes to the run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepOutcome {
    pub project_dir: Option<PathBuf>,
    pub repo_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Running,
    /// Every step ran. Remote steps may have failed.
    Done,
    /// A local step failed; later steps never started.
    Halted,
    /// The user quit between steps.
    Cancelled,
}

/// Steps for a run, in execution order.
///
/// Remote steps are added to a fresh run unless `create_github_repo` is
/// explicitly `false`.
pub fn build_steps(mode: Mode, answers: &Answers) -> Vec<StepName> {
    match mode {
        Mode::InitInPlace => vec![StepName::Render, StepName::CommitScaffold],
        Mode::Fresh => {
            let mut steps = vec![StepName::CreateDirectory, StepName::Render, StepName::InitRepo];
            if answers.wants_remote_repo() {
                steps.extend([StepName::CreateRemoteRepo, StepName::Push]);
            }
            steps
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub state: PipelineState,
    pub steps: Vec<ProgressStep>,
    pub project_dir: Option<PathBuf>,
    pub repo_url: Option<String>,
}

impl PipelineResult {
    pub fn failures(&self) -> Vec<String> {
        self.steps.iter().filter_map(ProgressStep::failure).collect()
    }
}

/// Step bookkeeping for one run.
#[derive(Debug, Clone)]
pub struct Pipeline {
    steps: Vec<ProgressStep>,
    current: usize,
    state: PipelineState,
    failed: bool,
    project_dir: Option<PathBuf>,
    repo_url: Option<String>,
}

impl Pipeline {
    pub fn new(mode: Mode, answers: &Answers) -> Self {
        Self::from_steps(build_steps(mode, answers))
    }

    pub fn from_steps(steps: Vec<StepName>) -> Self {
        Self {
            steps: steps.into_iter().map(ProgressStep::new).collect(),
            current: 0,
            state: PipelineState::Running,
            failed: false,
            project_dir: None,
            repo_url: None,
        }
    }

    pub fn steps(&self) -> &[ProgressStep] {
        &self.steps
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Whether any step failed, including tolerated remote failures.
    pub fn has_failures(&self) -> bool {
        self.failed
    }

    pub fn project_dir(&self) -> Option<&PathBuf> {
        self.project_dir.as_ref()
    }

    pub fn repo_url(&self) -> Option<&str> {
        self.repo_url.as_deref()
    }

    /// The step currently running.
    pub fn running_step(&self) -> Option<StepName> {
        self.steps
            .get(self.current)
            .filter(|step| step.status == StepStatus::Running)
            .map(|step| step.name)
    }

    /// Marks the first step running and returns it.
    pub fn start(&mut self) -> Option<StepName> {
        if self.state != PipelineState::Running || self.running_step().is_some() {
            return None;
        }
        self.start_at(self.current)
    }

    fn start_at(&mut self, index: usize) -> Option<StepName> {
        self.current = index;
        match self.steps.get_mut(index) {
            Some(step) => {
                step.status = StepStatus::Running;
                info!("{}", step.name.label());
                Some(step.name)
            }
            None => {
                self.state = PipelineState::Done;
                None
            }
        }
    }

    /// Records success of the running step and starts the next one.
    pub fn complete(&mut self, outcome: StepOutcome) -> Option<StepName> {
        self.running_step()?;
        self.steps[self.current].status = StepStatus::Done;
        if let Some(dir) = outcome.project_dir {
            self.project_dir = Some(dir);
        }
        if let Some(url) = outcome.repo_url {
            self.repo_url = Some(url);
        }
        self.start_at(self.current + 1)
    }

    /// Records failure of the running step.
    ///
    /// A remote step failure still starts the next step; any other failure
    /// halts the run.
    pub fn fail(&mut self, error: impl Into<String>) -> Option<StepName> {
        let name = self.running_step()?;
        let error = error.into();
        warn!("{name} failed: {error}");

        let step = &mut self.steps[self.current];
        step.status = StepStatus::Failed;
        step.error = Some(error);
        self.failed = true;

        if name.is_remote() {
            self.start_at(self.current + 1)
        } else {
            self.state = PipelineState::Halted;
            None
        }
    }

    /// Stops before the next step starts. Steps not yet run stay pending.
    pub fn cancel(&mut self) {
        if self.state == PipelineState::Running {
            if let Some(step) = self.steps.get_mut(self.current) {
                if step.status == StepStatus::Running {
                    step.status = StepStatus::Pending;
                }
            }
            self.state = PipelineState::Cancelled;
        }
    }

    /// Weighted completion between 0 and 1.
    ///
    /// A running step earns half its weight; done and failed steps earn all
    /// of it.
    pub fn progress(&self) -> f64 {
        let total: f64 = self.steps.iter().map(|s| s.name.weight()).sum();
        if total == 0.0 {
            return if self.state == PipelineState::Done { 1.0 } else { 0.0 };
        }
        let earned: f64 = self
            .steps
            .iter()
            .map(|s| {
                let credit = match s.status {
                    StepStatus::Pending => 0.0,
                    StepStatus::Running => 0.5,
                    StepStatus::Done | StepStatus::Failed => 1.0,
                };
                s.name.weight() * credit
            })
            .sum();
        earned / total
    }

    pub fn result(&self) -> PipelineResult {
        PipelineResult {
            state: self.state,
            steps: self.steps.clone(),
            project_dir: self.project_dir.clone(),
            repo_url: self.repo_url.clone(),
        }
    }
}
