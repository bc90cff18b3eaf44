//! Core template processing.
//! Walks a source tree, applies the manifest's file rules, expands path
//! placeholders and writes the project files.

use crate::answers::Answers;
use crate::error::{Error, Result};
use crate::manifest::TemplateManifest;
use crate::renderer::TemplateRenderer;
use crate::rules::{expand_path, RuleSet};
use crate::source::SourceTree;
use log::debug;
use std::fs;
use std::path::{Component, Path};

/// Suffix marking files whose content is rendered.
pub const TEMPLATE_SUFFIX: &str = ".tmpl";

#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessorOptions {
    /// Leave files that already exist in the target untouched.
    pub skip_existing: bool,
}

/// One entry that will be produced in the target directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedEntry {
    /// Path inside the source tree.
    pub source: String,
    /// Path relative to the target directory.
    pub target: String,
    pub is_dir: bool,
    pub is_template: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAction {
    Created,
    Skipped,
}

impl std::fmt::Display for FileAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileAction::Created => write!(f, "Created"),
            FileAction::Skipped => write!(f, "Skipped (exists)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    pub path: String,
    pub action: FileAction,
}

pub fn is_template_path(path: &str) -> bool {
    path.ends_with(TEMPLATE_SUFFIX)
}

fn is_under(path: &str, dir: &str) -> bool {
    path.strip_prefix(dir).is_some_and(|rest| rest.starts_with('/'))
}

/// Renders a template tree for one set of answers.
pub struct Processor<'a> {
    manifest: &'a TemplateManifest,
    answers: &'a Answers,
    engine: &'a dyn TemplateRenderer,
    options: ProcessorOptions,
}

impl<'a> Processor<'a> {
    pub fn new(
        manifest: &'a TemplateManifest,
        answers: &'a Answers,
        engine: &'a dyn TemplateRenderer,
        options: ProcessorOptions,
    ) -> Self {
        Self { manifest, answers, engine, options }
    }

    /// Computes the entries produced by the tree, in traversal order.
    ///
    /// Both [`Processor::render_to`] and [`Processor::list_files`] are built
    /// on this, so they always agree on what is included.
    pub fn plan(&self, tree: &dyn SourceTree) -> Result<Vec<PlannedEntry>> {
        let rules = RuleSet::new(&self.manifest.files, self.answers, self.engine);
        let mut excluded_dirs: Vec<String> = Vec::new();
        let mut planned = Vec::new();

        for entry in tree.entries()? {
            if excluded_dirs.iter().any(|dir| is_under(&entry.path, dir)) {
                continue;
            }
            if !rules.should_include(&entry.path) {
                if entry.is_dir {
                    excluded_dirs.push(entry.path);
                }
                continue;
            }

            let expanded = expand_path(&entry.path, self.answers);
            let is_template = !entry.is_dir && is_template_path(&entry.path);
            let target = match expanded.strip_suffix(TEMPLATE_SUFFIX) {
                Some(stripped) if is_template => stripped.to_string(),
                _ => expanded,
            };
            if escapes_target(&target) {
                return Err(Error::ValidationError(format!(
                    "Template path '{}' expands to '{}', which is outside the target directory",
                    entry.path, target
                )));
            }
            planned.push(PlannedEntry {
                source: entry.path,
                target,
                is_dir: entry.is_dir,
                is_template,
            });
        }

        Ok(planned)
    }

    /// Paths of the files that rendering would produce, without writing anything.
    pub fn list_files(&self, tree: &dyn SourceTree) -> Result<Vec<String>> {
        Ok(self
            .plan(tree)?
            .into_iter()
            .filter(|entry| !entry.is_dir)
            .map(|entry| entry.target)
            .collect())
    }

    /// Renders the tree into `target_dir`.
    ///
    /// Stops at the first failing entry. Files written before the failure
    /// are left in place.
    ///
    /// # Errors
    /// * `Error::ReadError` if a source entry cannot be read
    /// * `Error::ProcessError` if a template fails to render
    /// * `Error::WriteError` if the target cannot be written
    pub fn render_to(&self, tree: &dyn SourceTree, target_dir: &Path) -> Result<Vec<RenderedFile>> {
        let context = self.answers.to_context();
        let mut rendered = Vec::new();

        for entry in self.plan(tree)? {
            let target = target_dir.join(&entry.target);

            if entry.is_dir {
                debug!("Creating directory: {}", target.display());
                fs::create_dir_all(&target).map_err(|source| Error::WriteError {
                    path: entry.target.clone(),
                    source,
                })?;
                continue;
            }

            if self.options.skip_existing && target.exists() {
                debug!("Skipping existing file: {}", target.display());
                rendered.push(RenderedFile { path: entry.target, action: FileAction::Skipped });
                continue;
            }

            let mut content = tree.read(&entry.source)?;
            if entry.is_template {
                let text = String::from_utf8(content).map_err(|e| Error::ReadError {
                    path: entry.source.clone(),
                    source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
                })?;
                content = self
                    .engine
                    .render(&text, &context)
                    .map_err(|e| match e {
                        Error::MinijinjaError(source) => {
                            Error::ProcessError { path: entry.source.clone(), source }
                        }
                        other => other,
                    })?
                    .into_bytes();
                debug!("Writing file: {}", target.display());
            } else {
                debug!("Copying file: {}", target.display());
            }

            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|source| Error::WriteError {
                    path: entry.target.clone(),
                    source,
                })?;
            }
            fs::write(&target, content).map_err(|source| Error::WriteError {
                path: entry.target.clone(),
                source,
            })?;
            rendered.push(RenderedFile { path: entry.target, action: FileAction::Created });
        }

        Ok(rendered)
    }
}

fn escapes_target(target: &str) -> bool {
    Path::new(target)
        .components()
        .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)))
}

/// Splits listed files into those that are new and those already present
/// in `target_dir`.
pub fn partition_existing(files: &[String], target_dir: &Path) -> (Vec<String>, Vec<String>) {
    files
        .iter()
        .cloned()
        .partition(|file| !target_dir.join(file).exists())
}
