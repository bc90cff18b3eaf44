use incubator::answers::Answer;
use incubator::builtin;
use incubator::error::{Error, Result};
use incubator::parser::{collect_answers, parse_preloaded};
use incubator::prompt::Prompter;
use std::cell::RefCell;
use std::collections::VecDeque;

/// Answers prompts from a script and records the labels it was asked.
#[derive(Default)]
struct ScriptedPrompter {
    texts: RefCell<VecDeque<String>>,
    selections: RefCell<VecDeque<usize>>,
    confirms: RefCell<VecDeque<bool>>,
    asked: RefCell<Vec<String>>,
}

impl ScriptedPrompter {
    fn record(&self, label: &str) {
        self.asked.borrow_mut().push(label.to_string());
    }
}

impl Prompter for ScriptedPrompter {
    fn text(&self, label: &str, default: &str, _required: bool) -> Result<String> {
        self.record(label);
        Ok(self.texts.borrow_mut().pop_front().unwrap_or_else(|| default.to_string()))
    }

    fn select(&self, label: &str, _items: &[String], default: usize) -> Result<usize> {
        self.record(label);
        Ok(self.selections.borrow_mut().pop_front().unwrap_or(default))
    }

    fn confirm(&self, label: &str, default: bool) -> Result<bool> {
        self.record(label);
        Ok(self.confirms.borrow_mut().pop_front().unwrap_or(default))
    }
}

#[test]
fn test_interactive_answers_follow_prompt_order() {
    let prompter = ScriptedPrompter::default();
    prompter.texts.borrow_mut().extend(["demo".to_string(), "My project".to_string()]);
    prompter.selections.borrow_mut().extend([1, 3]);
    prompter.confirms.borrow_mut().extend([false, true]);

    let answers =
        collect_answers(&prompter, &builtin::manifest(), &serde_json::Map::new(), true).unwrap();

    assert_eq!(answers.text("project_name"), "demo");
    assert_eq!(answers.text("description"), "My project");
    assert_eq!(answers.text("visibility"), "public");
    assert_eq!(answers.text("license"), "none");
    assert_eq!(answers.flag("create_github_repo"), Some(false));
    assert_eq!(answers.flag("enable_preview"), Some(true));
    let keys: Vec<&String> = answers.iter().map(|(k, _)| k).collect();
    assert_eq!(
        keys,
        vec![
            "project_name",
            "description",
            "visibility",
            "license",
            "create_github_repo",
            "enable_preview"
        ]
    );
}

#[test]
fn test_preloaded_answers_are_not_asked() {
    let prompter = ScriptedPrompter::default();
    let preloaded = parse_preloaded(
        r#"{"project_name": "demo", "create_github_repo": "false", "extra": 1}"#,
    )
    .unwrap();

    let answers = collect_answers(&prompter, &builtin::manifest(), &preloaded, true).unwrap();

    assert_eq!(answers.get("project_name"), Some(&Answer::Text("demo".to_string())));
    assert_eq!(answers.flag("create_github_repo"), Some(false));
    assert!(answers.get("extra").is_none());
    assert!(!prompter.asked.borrow().iter().any(|label| label == "Project name"));
    assert_eq!(prompter.asked.borrow().len(), 4);
}

#[test]
fn test_non_interactive_uses_defaults() {
    let prompter = ScriptedPrompter::default();
    let preloaded = parse_preloaded(r#"{"project_name": "demo"}"#).unwrap();

    let answers = collect_answers(&prompter, &builtin::manifest(), &preloaded, false).unwrap();

    assert!(prompter.asked.borrow().is_empty());
    assert_eq!(answers.text("visibility"), "private");
    assert_eq!(answers.text("license"), "MIT");
    assert_eq!(answers.flag("create_github_repo"), Some(true));
    assert_eq!(answers.flag("enable_preview"), Some(false));
}

#[test]
fn test_required_answer_must_not_be_empty() {
    let prompter = ScriptedPrompter::default();

    let err = collect_answers(&prompter, &builtin::manifest(), &serde_json::Map::new(), false)
        .unwrap_err();

    assert!(matches!(err, Error::ValidationError(_)));
}

#[test]
fn test_select_value_must_be_an_option() {
    let prompter = ScriptedPrompter::default();
    let preloaded = parse_preloaded(r#"{"project_name": "demo", "license": "WTFPL"}"#).unwrap();

    let err = collect_answers(&prompter, &builtin::manifest(), &preloaded, false).unwrap_err();

    assert!(err.to_string().contains("WTFPL"));
}

#[test]
fn test_confirm_rejects_text() {
    let prompter = ScriptedPrompter::default();
    let preloaded =
        parse_preloaded(r#"{"project_name": "demo", "enable_preview": "maybe"}"#).unwrap();

    assert!(collect_answers(&prompter, &builtin::manifest(), &preloaded, false).is_err());
}

#[test]
fn test_parse_preloaded_input() {
    assert!(parse_preloaded("").unwrap().is_empty());
    assert!(parse_preloaded("  \n").unwrap().is_empty());
    assert!(matches!(parse_preloaded("[1, 2]"), Err(Error::ValidationError(_))));
    assert!(matches!(parse_preloaded("{oops"), Err(Error::ValidationError(_))));
}
