//! Template manifest model.
//! A manifest (`template.yaml`) declares the prompts a template asks, the
//! conditional file rules applied while rendering, and devcontainer/preview
//! metadata.

use crate::answers::Answer;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Default noVNC web proxy port.
pub const DEFAULT_NOVNC_PORT: u16 = 6080;
/// Default raw VNC port.
pub const DEFAULT_VNC_PORT: u16 = 5900;

/// A parsed template manifest.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TemplateManifest {
    pub name: String,
    pub version: String,
    pub description: String,
    pub author: String,
    pub prompts: Vec<Prompt>,
    pub files: Vec<FileRule>,
    pub devcontainer: DevcontainerConfig,
    pub preview: PreviewConfig,
    pub hooks: HooksConfig,

    /// Where the manifest was loaded from: absolute for local templates,
    /// relative to the repository root for cached remote templates.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
    /// Set for the template compiled into the binary.
    #[serde(skip)]
    pub builtin: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawPrompt")]
pub struct Prompt {
    pub name: String,
    pub label: String,
    pub kind: PromptKind,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PromptKind {
    Text { default: Option<String> },
    Select { options: Vec<PromptOption>, default: Option<String> },
    Confirm { default: Option<bool> },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawOption")]
pub struct PromptOption {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FileRule {
    pub src: String,
    pub always: bool,
    pub when: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DevcontainerConfig {
    pub base_image: String,
    pub features: DevcontainerFeatures,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DevcontainerFeatures {
    pub always: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    pub enabled: bool,
    pub app_command: String,
    pub novnc_port: u16,
    pub vnc_port: u16,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HooksConfig {
    pub post_create: String,
}

#[derive(Deserialize)]
struct RawPrompt {
    name: String,
    #[serde(default)]
    label: String,
    #[serde(rename = "type", default = "default_prompt_type")]
    prompt_type: String,
    #[serde(default)]
    default: Option<serde_yaml::Value>,
    #[serde(default)]
    options: Vec<PromptOption>,
    #[serde(default)]
    required: bool,
}

fn default_prompt_type() -> String {
    "text".to_string()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawOption {
    Plain(String),
    Full { label: String, value: String },
}

impl From<RawOption> for PromptOption {
    fn from(raw: RawOption) -> Self {
        match raw {
            RawOption::Plain(value) => PromptOption { label: value.clone(), value },
            RawOption::Full { label, value } => PromptOption { label, value },
        }
    }
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl TryFrom<RawPrompt> for Prompt {
    type Error = String;

    fn try_from(raw: RawPrompt) -> std::result::Result<Self, Self::Error> {
        let default = raw.default.filter(|v| !v.is_null());
        let kind = match raw.prompt_type.as_str() {
            "text" => PromptKind::Text {
                default: match &default {
                    Some(v) => Some(scalar_to_string(v).ok_or_else(|| {
                        format!("prompt '{}': text default must be a scalar", raw.name)
                    })?),
                    None => None,
                },
            },
            "select" => {
                let default = match &default {
                    Some(v) => Some(scalar_to_string(v).ok_or_else(|| {
                        format!("prompt '{}': select default must be a scalar", raw.name)
                    })?),
                    None => None,
                };
                PromptKind::Select { options: raw.options, default }
            }
            "confirm" => PromptKind::Confirm {
                default: match &default {
                    Some(serde_yaml::Value::Bool(b)) => Some(*b),
                    Some(serde_yaml::Value::String(s)) if s == "true" || s == "false" => {
                        Some(s == "true")
                    }
                    Some(_) => {
                        return Err(format!(
                            "prompt '{}': confirm default must be true or false",
                            raw.name
                        ))
                    }
                    None => None,
                },
            },
            other => return Err(format!("prompt '{}': unknown type '{other}'", raw.name)),
        };

        let label = if raw.label.is_empty() { raw.name.clone() } else { raw.label };
        Ok(Prompt { name: raw.name, label, kind, required: raw.required })
    }
}

impl Prompt {
    /// The answer used when the prompt is not asked.
    pub fn default_answer(&self) -> Answer {
        match &self.kind {
            PromptKind::Text { default } => Answer::Text(default.clone().unwrap_or_default()),
            PromptKind::Select { options, default } => Answer::Text(
                default
                    .clone()
                    .or_else(|| options.first().map(|o| o.value.clone()))
                    .unwrap_or_default(),
            ),
            PromptKind::Confirm { default } => Answer::Flag(default.unwrap_or(false)),
        }
    }
}

impl FileRule {
    pub fn when_condition(&self) -> Option<&str> {
        self.when.as_deref().filter(|w| !w.trim().is_empty())
    }
}

impl TemplateManifest {
    /// Parses a manifest and fills in defaults.
    ///
    /// # Arguments
    /// * `source_name` - Used in the error message when parsing fails
    /// * `content` - YAML manifest text
    pub fn from_yaml(source_name: &str, content: &str) -> Result<Self> {
        let mut manifest: TemplateManifest =
            serde_yaml::from_str(content).map_err(|e| Error::ManifestError {
                source_name: source_name.to_string(),
                message: e.to_string(),
            })?;
        manifest.apply_defaults();
        Ok(manifest)
    }

    /// Fills unset preview ports. Explicit non-zero ports are kept.
    pub fn apply_defaults(&mut self) {
        if self.preview.novnc_port == 0 {
            self.preview.novnc_port = DEFAULT_NOVNC_PORT;
        }
        if self.preview.vnc_port == 0 {
            self.preview.vnc_port = DEFAULT_VNC_PORT;
        }
    }

    pub fn prompt(&self, name: &str) -> Option<&Prompt> {
        self.prompts.iter().find(|p| p.name == name)
    }
}
