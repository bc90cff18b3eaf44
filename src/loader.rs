//! Template catalog loading.
//! Collects the built-in template, templates listed in the registry of each
//! cached template repository, and local templates. A broken template is
//! logged and skipped so the rest of the catalog stays usable.

use crate::builtin;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::manifest::TemplateManifest;
use crate::source::{repo_cache_dir, FILES_DIR};
use log::{debug, warn};
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "template.yaml";
pub const REGISTRY_FILE: &str = "registry.yaml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Registry {
    #[serde(default)]
    pub templates: Vec<RegistryEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistryEntry {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub description: String,
}

/// Where a catalog entry comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateOrigin {
    Builtin,
    Remote(String),
    Local,
}

impl std::fmt::Display for TemplateOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateOrigin::Builtin => f.pad("built-in"),
            TemplateOrigin::Remote(repo) => f.pad(repo),
            TemplateOrigin::Local => f.pad("local"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub manifest: TemplateManifest,
    pub origin: TemplateOrigin,
}

fn read_manifest(path: &Path) -> Result<TemplateManifest> {
    let content = fs::read_to_string(path)
        .map_err(|source| Error::ReadError { path: path.display().to_string(), source })?;
    TemplateManifest::from_yaml(&path.display().to_string(), &content)
}

/// Loads the templates listed in `<repo_dir>/registry.yaml`.
///
/// Entries whose manifest cannot be loaded are skipped.
pub fn load_registry_manifests(repo_dir: &Path) -> Result<Vec<TemplateManifest>> {
    let registry_path = repo_dir.join(REGISTRY_FILE);
    let content = fs::read_to_string(&registry_path).map_err(|source| Error::ReadError {
        path: registry_path.display().to_string(),
        source,
    })?;
    let registry: Registry = serde_yaml::from_str(&content).map_err(|e| Error::ManifestError {
        source_name: registry_path.display().to_string(),
        message: e.to_string(),
    })?;

    let mut manifests = Vec::with_capacity(registry.templates.len());
    for entry in registry.templates {
        match read_manifest(&repo_dir.join(&entry.path).join(MANIFEST_FILE)) {
            Ok(mut manifest) => {
                if manifest.name.is_empty() {
                    manifest.name = entry.name.clone();
                }
                if manifest.description.is_empty() {
                    manifest.description = entry.description.clone();
                }
                manifest.source_path = Some(PathBuf::from(&entry.path));
                manifests.push(manifest);
            }
            Err(e) => warn!("Skipping template '{}': {e}", entry.name),
        }
    }
    Ok(manifests)
}

fn load_local_manifest(template_dir: &Path) -> Result<TemplateManifest> {
    let files_dir = template_dir.join(FILES_DIR);
    if !files_dir.is_dir() {
        return Err(Error::LocalFilesNotFound { path: files_dir.display().to_string() });
    }

    let mut manifest = read_manifest(&template_dir.join(MANIFEST_FILE))?;
    if manifest.name.is_empty() {
        manifest.name = template_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
    }
    manifest.source_path = Some(template_dir.canonicalize()?);
    Ok(manifest)
}

/// Loads every valid template under `dir`, ordered by directory name.
/// A missing directory yields no templates.
pub fn load_local_manifests(dir: &Path) -> Result<Vec<TemplateManifest>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut template_dirs: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    template_dirs.sort();

    let mut manifests = Vec::new();
    for template_dir in template_dirs {
        match load_local_manifest(&template_dir) {
            Ok(manifest) => manifests.push(manifest),
            Err(e) => debug!("Skipping local template {}: {e}", template_dir.display()),
        }
    }
    Ok(manifests)
}

/// Builds the full catalog: built-in first, then each cloned template
/// repository, then local templates.
pub fn load_all_templates(config: &Config, cache_dir: &Path) -> Vec<CatalogEntry> {
    let mut catalog =
        vec![CatalogEntry { manifest: builtin::manifest(), origin: TemplateOrigin::Builtin }];

    for repo in config.template_repos() {
        let repo_dir = repo_cache_dir(cache_dir, &repo);
        if !repo_dir.exists() {
            debug!("Template repository '{repo}' has not been fetched yet");
            continue;
        }
        match load_registry_manifests(&repo_dir) {
            Ok(manifests) => catalog.extend(manifests.into_iter().map(|manifest| CatalogEntry {
                manifest,
                origin: TemplateOrigin::Remote(repo.clone()),
            })),
            Err(e) => warn!("Skipping template repository '{repo}': {e}"),
        }
    }

    match load_local_manifests(&config.local_template_dir()) {
        Ok(manifests) => catalog.extend(
            manifests
                .into_iter()
                .map(|manifest| CatalogEntry { manifest, origin: TemplateOrigin::Local }),
        ),
        Err(e) => warn!("Skipping local templates: {e}"),
    }

    catalog
}

/// Finds a template by name. Later entries shadow earlier ones, so a local
/// template can override a remote template of the same name.
pub fn find_template<'a>(catalog: &'a [CatalogEntry], name: &str) -> Option<&'a CatalogEntry> {
    catalog.iter().rev().find(|entry| entry.manifest.name == name)
}

fn local_template_scaffold(name: &str) -> Vec<(&'static str, String)> {
    let manifest = format!(
        r#"name: {name}
version: 0.1.0
description: Local template scaffold for {name}
author: local
prompts:
  - name: project_name
    label: Project name
    type: text
    required: true
  - name: description
    label: Description
    type: text
    default: A project created from a local template
  - name: visibility
    label: Repo visibility
    type: select
    options: [private, public]
    default: private
  - name: create_github_repo
    label: Create GitHub repository?
    type: confirm
    default: true
  - name: enable_preview
    label: Enable headless preview tooling?
    type: confirm
    default: false
files:
  - src: .incubator/preview/**
    when: '{{{{if .enable_preview}}}}true{{{{end}}}}'
preview:
  enabled: true
  app_command: "echo 'Set app_command in .incubator/preview/config.yaml'"
"#
    );

    vec![
        (MANIFEST_FILE, manifest),
        ("files/README.md.tmpl", "# {{ project_name }}\n\n{{ description }}\n".to_string()),
        ("files/.gitignore", ".DS_Store\n.env\n".to_string()),
        (
            "files/.incubator/preview/config.yaml.tmpl",
            "# Preview settings for {{ project_name }}\nnovnc_port: 6080\nvnc_port: 5900\n"
                .to_string(),
        ),
    ]
}

/// Creates a starter local template named `name` under `dir`.
///
/// # Returns
/// * `Result<PathBuf>` - Directory of the new template
///
/// # Errors
/// * `Error::ValidationError` if the name is invalid or the template exists
pub fn create_local_template(dir: &Path, name: &str) -> Result<PathBuf> {
    let pattern = Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9_-]*$")
        .map_err(|e| Error::ValidationError(e.to_string()))?;
    if !pattern.is_match(name) {
        return Err(Error::ValidationError(format!(
            "invalid template name '{name}': use letters, numbers, dashes and underscores"
        )));
    }

    let template_dir = dir.join(name);
    if template_dir.exists() {
        return Err(Error::ValidationError(format!(
            "template '{name}' already exists at {}",
            template_dir.display()
        )));
    }

    for (relative, content) in local_template_scaffold(name) {
        let path = template_dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)
            .map_err(|source| Error::WriteError { path: relative.to_string(), source })?;
    }
    Ok(template_dir)
}
