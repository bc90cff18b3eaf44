#![allow(dead_code)]

use incubator::error::Result;
use incubator::runner::{CommandOutput, ProcessRunner};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Records every command and answers from canned outputs.
///
/// A response is chosen by the longest registered prefix of
/// `"<program> <args...>"`; unmatched commands succeed with no output.
#[derive(Default)]
pub struct FakeRunner {
    calls: Mutex<Vec<String>>,
    responses: Vec<(String, CommandOutput)>,
    missing: Vec<String>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, command: &str, success: bool, stdout: &str) -> Self {
        let output = CommandOutput {
            success,
            stdout: stdout.to_string(),
            stderr: if success { String::new() } else { format!("{command}: boom") },
        };
        self.responses.push((command.to_string(), output));
        self
    }

    pub fn without(mut self, program: &str) -> Self {
        self.missing.push(program.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn ran(&self, prefix: &str) -> bool {
        self.calls().iter().any(|call| call.starts_with(prefix))
    }
}

impl ProcessRunner for FakeRunner {
    fn run(&self, _dir: &Path, program: &str, args: &[&str]) -> Result<CommandOutput> {
        let line = format!("{program} {}", args.join(" "));
        self.calls.lock().unwrap().push(line.clone());
        let output = self
            .responses
            .iter()
            .filter(|(prefix, _)| line.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, output)| output.clone())
            .unwrap_or(CommandOutput { success: true, ..Default::default() });
        Ok(output)
    }

    fn look_path(&self, program: &str) -> Option<PathBuf> {
        if self.missing.iter().any(|p| p == program) {
            None
        } else {
            Some(PathBuf::from("/usr/bin").join(program))
        }
    }
}
