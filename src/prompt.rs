//! Interactive prompts.
//! The [`Prompter`] trait abstracts the terminal so answer collection can be
//! driven by scripted input in tests.

use crate::error::{Error, Result};
use dialoguer::{Confirm, FuzzySelect, Input, Select};

/// Select lists longer than this get fuzzy search.
const FUZZY_THRESHOLD: usize = 8;

pub trait Prompter {
    /// Asks for free text. A required prompt does not accept empty input.
    fn text(&self, label: &str, default: &str, required: bool) -> Result<String>;

    /// Asks to pick one of `items` and returns its index.
    fn select(&self, label: &str, items: &[String], default: usize) -> Result<usize>;

    fn confirm(&self, label: &str, default: bool) -> Result<bool>;
}

/// Terminal prompts backed by dialoguer.
#[derive(Debug, Default)]
pub struct DialoguerPrompter;

impl DialoguerPrompter {
    pub fn new() -> Self {
        Self
    }
}

fn prompt_error(e: dialoguer::Error) -> Error {
    Error::PromptError(e.to_string())
}

impl Prompter for DialoguerPrompter {
    fn text(&self, label: &str, default: &str, required: bool) -> Result<String> {
        let mut input = Input::<String>::new().with_prompt(label).allow_empty(!required);
        if !default.is_empty() {
            input = input.default(default.to_string());
        }
        input.interact_text().map_err(prompt_error)
    }

    fn select(&self, label: &str, items: &[String], default: usize) -> Result<usize> {
        if items.len() > FUZZY_THRESHOLD {
            FuzzySelect::new()
                .with_prompt(label)
                .items(items)
                .default(default)
                .interact()
                .map_err(prompt_error)
        } else {
            Select::new()
                .with_prompt(label)
                .items(items)
                .default(default)
                .interact()
                .map_err(prompt_error)
        }
    }

    fn confirm(&self, label: &str, default: bool) -> Result<bool> {
        Confirm::new().with_prompt(label).default(default).interact().map_err(prompt_error)
    }
}
