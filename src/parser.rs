//! Answer collection.
//! Turns a manifest's prompts into typed [`Answers`], taking values from
//! preloaded JSON (for example piped on stdin) before asking interactively.

use crate::answers::{Answer, Answers};
use crate::error::{Error, Result};
use crate::manifest::{Prompt, PromptKind, TemplateManifest};
use crate::prompt::Prompter;
use log::debug;
use std::io::Read;

/// Reads a JSON object of answers from stdin. Empty input yields no answers.
pub fn load_from_stdin() -> Result<serde_json::Map<String, serde_json::Value>> {
    let mut buffer = String::new();
    std::io::stdin().read_to_string(&mut buffer)?;
    parse_preloaded(&buffer)
}

pub fn parse_preloaded(input: &str) -> Result<serde_json::Map<String, serde_json::Value>> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(serde_json::Map::new());
    }
    match serde_json::from_str(input) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(_) => Err(Error::ValidationError("answers must be a JSON object".to_string())),
        Err(e) => Err(Error::ValidationError(format!("invalid answers JSON: {e}"))),
    }
}

/// Converts a preloaded JSON value to an answer of the prompt's kind.
pub fn answer_from_json(prompt: &Prompt, value: &serde_json::Value) -> Result<Answer> {
    let mismatch = || {
        Error::ValidationError(format!("unexpected value {value} for prompt '{}'", prompt.name))
    };

    match &prompt.kind {
        PromptKind::Confirm { .. } => match value {
            serde_json::Value::Bool(b) => Ok(Answer::Flag(*b)),
            serde_json::Value::String(s) if s == "true" || s == "false" => {
                Ok(Answer::Flag(s == "true"))
            }
            _ => Err(mismatch()),
        },
        PromptKind::Text { .. } => match value {
            serde_json::Value::String(s) => Ok(Answer::Text(s.clone())),
            serde_json::Value::Number(n) => Ok(Answer::Text(n.to_string())),
            serde_json::Value::Bool(b) => Ok(Answer::Text(b.to_string())),
            _ => Err(mismatch()),
        },
        PromptKind::Select { options, .. } => {
            let chosen = value.as_str().ok_or_else(mismatch)?;
            if options.iter().any(|o| o.value == chosen) {
                Ok(Answer::Text(chosen.to_string()))
            } else {
                Err(Error::ValidationError(format!(
                    "'{chosen}' is not an option of prompt '{}'",
                    prompt.name
                )))
            }
        }
    }
}

fn ask(prompter: &dyn Prompter, prompt: &Prompt) -> Result<Answer> {
    match &prompt.kind {
        PromptKind::Text { default } => Ok(Answer::Text(prompter.text(
            &prompt.label,
            default.as_deref().unwrap_or_default(),
            prompt.required,
        )?)),
        PromptKind::Select { options, .. } => {
            if options.is_empty() {
                return Ok(prompt.default_answer());
            }
            let labels: Vec<String> = options.iter().map(|o| o.label.clone()).collect();
            let default_value = prompt.default_answer().to_string();
            let default_idx = options.iter().position(|o| o.value == default_value).unwrap_or(0);
            let idx = prompter.select(&prompt.label, &labels, default_idx)?;
            options
                .get(idx)
                .map(|o| Answer::Text(o.value.clone()))
                .ok_or_else(|| Error::PromptError(format!("selection {idx} is out of range")))
        }
        PromptKind::Confirm { default } => {
            Ok(Answer::Flag(prompter.confirm(&prompt.label, default.unwrap_or(false))?))
        }
    }
}

/// Collects an answer for every prompt of `manifest`, in prompt order.
///
/// # Arguments
/// * `prompter` - Asked for prompts without a preloaded value
/// * `preloaded` - Answers supplied up front, converted to each prompt's kind
/// * `interactive` - When false, prompts without a preloaded value take their default
///
/// # Errors
/// * `Error::ValidationError` if a preloaded value does not fit its prompt, or
///   a required prompt ends up empty
pub fn collect_answers(
    prompter: &dyn Prompter,
    manifest: &TemplateManifest,
    preloaded: &serde_json::Map<String, serde_json::Value>,
    interactive: bool,
) -> Result<Answers> {
    let mut answers = Answers::new();

    for prompt in &manifest.prompts {
        let answer = match preloaded.get(&prompt.name) {
            Some(value) => answer_from_json(prompt, value)?,
            None if interactive => ask(prompter, prompt)?,
            None => prompt.default_answer(),
        };

        if prompt.required && answer.as_str().is_some_and(|s| s.trim().is_empty()) {
            return Err(Error::ValidationError(format!("'{}' is required", prompt.label)));
        }
        answers.insert(prompt.name.clone(), answer);
    }

    for key in preloaded.keys().filter(|key| manifest.prompt(key).is_none()) {
        debug!("Ignoring answer '{key}': the template has no such prompt");
    }

    Ok(answers)
}
