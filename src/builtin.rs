//! The `empty` template compiled into the binary.

use rust_embed::RustEmbed;

use crate::manifest::{
    DevcontainerConfig, FileRule, PreviewConfig, Prompt, PromptKind, PromptOption,
    TemplateManifest,
};

/// Name of the built-in template.
pub const BUILTIN_NAME: &str = "empty";

/// Files of the built-in template, keyed by `/`-separated relative path.
#[derive(RustEmbed)]
#[folder = "templates/empty/"]
pub(crate) struct BuiltinFiles;

fn option(value: &str) -> PromptOption {
    PromptOption { label: value.to_string(), value: value.to_string() }
}

fn text(name: &str, label: &str, default: Option<&str>, required: bool) -> Prompt {
    Prompt {
        name: name.to_string(),
        label: label.to_string(),
        kind: PromptKind::Text { default: default.map(str::to_string) },
        required,
    }
}

fn select(name: &str, label: &str, values: &[&str], default: &str) -> Prompt {
    Prompt {
        name: name.to_string(),
        label: label.to_string(),
        kind: PromptKind::Select {
            options: values.iter().copied().map(option).collect(),
            default: Some(default.to_string()),
        },
        required: false,
    }
}

fn confirm(name: &str, label: &str, default: bool) -> Prompt {
    Prompt {
        name: name.to_string(),
        label: label.to_string(),
        kind: PromptKind::Confirm { default: Some(default) },
        required: false,
    }
}

/// Returns the manifest of the built-in `empty` template.
pub fn manifest() -> TemplateManifest {
    let mut manifest = TemplateManifest {
        name: BUILTIN_NAME.to_string(),
        version: "1.0.0".to_string(),
        description: "Blank project with README, license and devcontainer".to_string(),
        author: "incubator".to_string(),
        prompts: vec![
            text("project_name", "Project name", None, true),
            text("description", "Description", Some("A new project"), false),
            select("visibility", "Repository visibility", &["private", "public"], "private"),
            select("license", "License", &["MIT", "Apache-2.0", "GPL-3.0", "none"], "MIT"),
            confirm("create_github_repo", "Create GitHub repository?", true),
            confirm("enable_preview", "Enable GUI preview (noVNC)?", false),
        ],
        files: vec![
            FileRule {
                src: ".incubator/preview/**".to_string(),
                always: false,
                when: Some("{{if .enable_preview}}true{{end}}".to_string()),
            },
            FileRule {
                src: "LICENSE.tmpl".to_string(),
                always: false,
                when: Some(r#"{{if ne .license "none"}}true{{end}}"#.to_string()),
            },
        ],
        devcontainer: DevcontainerConfig {
            base_image: "mcr.microsoft.com/devcontainers/base:ubuntu".to_string(),
            ..Default::default()
        },
        preview: PreviewConfig {
            enabled: true,
            app_command: "echo 'Set app_command to launch your app'".to_string(),
            ..Default::default()
        },
        builtin: true,
        ..Default::default()
    };
    manifest.apply_defaults();
    manifest
}
