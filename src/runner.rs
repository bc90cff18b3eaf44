//! External process execution.
//! Provisioning steps run `git` and `gh` through [`ProcessRunner`] so tests
//! can substitute a recording fake.

use crate::error::{Error, Result};
use log::debug;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Trimmed stderr, falling back to stdout when stderr is empty.
    pub fn message(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim().to_string()
        } else {
            stderr.to_string()
        }
    }
}

pub trait ProcessRunner: Send + Sync {
    /// Runs `program` with `args` in `dir` and waits for it to exit.
    fn run(&self, dir: &Path, program: &str, args: &[&str]) -> Result<CommandOutput>;

    /// Location of `program` on PATH, if any.
    fn look_path(&self, program: &str) -> Option<PathBuf>;
}

/// Runs real processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, dir: &Path, program: &str, args: &[&str]) -> Result<CommandOutput> {
        debug!("Running `{} {}` in {}", program, args.join(" "), dir.display());
        let output = Command::new(program).args(args).current_dir(dir).output()?;
        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn look_path(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }
}

/// Fails with an install hint when `program` is not on PATH.
pub fn require_program(runner: &dyn ProcessRunner, program: &str, hint: &str) -> Result<()> {
    match runner.look_path(program) {
        Some(_) => Ok(()),
        None => Err(Error::CommandNotFound {
            program: program.to_string(),
            hint: hint.to_string(),
        }),
    }
}
