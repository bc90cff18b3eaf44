//! User configuration.
//! Stored as YAML in `~/.incubator/config.yaml`; the same directory holds
//! the template cache.

use crate::answers::{LICENSE, VISIBILITY};
use crate::editor::EDITORS;
use crate::error::{Error, Result};
use crate::manifest::{PromptKind, TemplateManifest};
use crate::prompt::Prompter;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_DIR_NAME: &str = ".incubator";
pub const CONFIG_FILE: &str = "config.yaml";
pub const DEFAULT_TEMPLATE_REPO: &str = "HungSloth/incubator-templates";

pub const VISIBILITIES: [&str; 2] = ["private", "public"];
pub const LICENSES: [&str; 4] = ["MIT", "Apache-2.0", "GPL-3.0", "none"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub github_user: String,
    pub default_visibility: String,
    pub default_license: String,
    pub project_dir: String,
    pub editor: String,
    pub template_repo: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub template_repos: Vec<String>,
    pub local_template_dir: String,
    pub auto_update_check: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            github_user: String::new(),
            default_visibility: "private".to_string(),
            default_license: "MIT".to_string(),
            project_dir: "~/projects".to_string(),
            editor: "none".to_string(),
            template_repo: DEFAULT_TEMPLATE_REPO.to_string(),
            template_repos: Vec::new(),
            local_template_dir: format!("~/{CONFIG_DIR_NAME}/local-templates"),
            auto_update_check: true,
        }
    }
}

/// `~/.incubator`.
pub fn config_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(CONFIG_DIR_NAME))
        .ok_or_else(|| Error::ConfigError("could not determine the home directory".to_string()))
}

pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE))
}

/// Expands a leading `~` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix('~'), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest.trim_start_matches(['/', '\\'])),
        _ => PathBuf::from(path),
    }
}

impl Config {
    /// Loads `~/.incubator/config.yaml`, writing defaults when it does not exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            let config = Config::default();
            if let Err(e) = config.save_to(path) {
                warn!("Could not save default config: {e}");
            }
            return Ok(config);
        }

        let data = fs::read_to_string(path)?;
        serde_yaml::from_str(&data)
            .map_err(|e| Error::ConfigError(format!("parsing {}: {e}", path.display())))
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("encoding config: {e}")))?;
        fs::write(path, data)?;
        Ok(())
    }

    /// Base directory for new projects.
    pub fn project_dir(&self) -> PathBuf {
        expand_home(&self.project_dir)
    }

    pub fn local_template_dir(&self) -> PathBuf {
        expand_home(&self.local_template_dir)
    }

    /// The primary template repository followed by the additional ones.
    pub fn template_repos(&self) -> Vec<String> {
        let mut repos = vec![self.template_repo.clone()];
        for repo in &self.template_repos {
            if !repos.contains(repo) {
                repos.push(repo.clone());
            }
        }
        repos
    }

    /// Returns false when the repository was already configured.
    pub fn add_template_repo(&mut self, repo: &str) -> bool {
        if self.template_repo == repo || self.template_repos.iter().any(|r| r == repo) {
            return false;
        }
        self.template_repos.push(repo.to_string());
        true
    }

    pub fn remove_template_repo(&mut self, repo: &str) {
        self.template_repos.retain(|r| r != repo);
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| Error::ConfigError(e.to_string()))
    }

    /// Uses the configured visibility and license as the defaults of the
    /// matching select prompts. Values the prompt does not offer are ignored.
    pub fn apply_prompt_defaults(&self, manifest: &mut TemplateManifest) {
        let preferred = [(VISIBILITY, &self.default_visibility), (LICENSE, &self.default_license)];
        for (name, value) in preferred {
            let Some(prompt) = manifest.prompts.iter_mut().find(|p| p.name == name) else {
                continue;
            };
            if let PromptKind::Select { options, default } = &mut prompt.kind {
                if options.iter().any(|o| &o.value == value) {
                    *default = Some(value.clone());
                }
            }
        }
    }

    /// Walks through every setting with the current value as the default.
    pub fn edit(&mut self, prompter: &dyn Prompter) -> Result<()> {
        self.github_user = prompter.text("GitHub User", &self.github_user, false)?;
        self.default_visibility =
            select_value(prompter, "Default Visibility", &VISIBILITIES, &self.default_visibility)?;
        self.default_license =
            select_value(prompter, "Default License", &LICENSES, &self.default_license)?;
        self.project_dir = prompter.text("Project Directory", &self.project_dir, true)?;
        self.editor = select_value(prompter, "Editor", &EDITORS, &self.editor)?;
        self.template_repo = prompter.text("Template Repo", &self.template_repo, true)?;
        self.auto_update_check = prompter.confirm("Auto Update Check", self.auto_update_check)?;
        Ok(())
    }
}

fn select_value(
    prompter: &dyn Prompter,
    label: &str,
    choices: &[&str],
    current: &str,
) -> Result<String> {
    let items: Vec<String> = choices.iter().map(|c| c.to_string()).collect();
    let default = choices.iter().position(|c| *c == current).unwrap_or(0);
    let idx = prompter.select(label, &items, default)?;
    items
        .get(idx)
        .cloned()
        .ok_or_else(|| Error::PromptError(format!("invalid selection for {label}")))
}
