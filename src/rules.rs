//! Conditional file rules.
//! Decides which template entries are rendered, based on the manifest's
//! `files` rules and the collected answers.

use crate::answers::Answers;
use crate::manifest::FileRule;
use crate::renderer::TemplateRenderer;
use globset::GlobBuilder;
use log::debug;

/// Matches a rule glob against a `/`-separated relative path.
///
/// A pattern containing `**` matches every path starting with the text
/// before the first `**`. Other patterns are shell globs whose wildcards do
/// not cross `/`; they also match anything under the pattern's parent
/// directory. Invalid patterns match nothing beyond that fallback.
pub fn glob_match(pattern: &str, path: &str) -> bool {
    if let Some(idx) = pattern.find("**") {
        return path.starts_with(&pattern[..idx]);
    }

    let matched = GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map(|glob| glob.compile_matcher().is_match(path))
        .unwrap_or(false);
    if matched {
        return true;
    }

    match pattern.rfind('/') {
        Some(idx) => path.starts_with(&pattern[..=idx]),
        None => false,
    }
}

/// Replaces every `{{key}}` placeholder with the answer's string form.
/// Placeholders without an answer are left as they are.
pub fn expand_path(path: &str, answers: &Answers) -> String {
    if !path.contains("{{") {
        return path.to_string();
    }
    answers.iter().fold(path.to_string(), |acc, (key, value)| {
        acc.replace(&format!("{{{{{key}}}}}"), &value.to_string())
    })
}

/// Whether a rendered condition counts as true.
pub fn is_truthy(rendered: &str) -> bool {
    !matches!(rendered.trim(), "" | "false" | "0" | "none")
}

/// File rules bound to a set of answers.
pub struct RuleSet<'a> {
    rules: &'a [FileRule],
    answers: &'a Answers,
    engine: &'a dyn TemplateRenderer,
    context: serde_json::Value,
}

impl<'a> RuleSet<'a> {
    pub fn new(
        rules: &'a [FileRule],
        answers: &'a Answers,
        engine: &'a dyn TemplateRenderer,
    ) -> Self {
        Self { rules, answers, engine, context: answers.to_context() }
    }

    /// Renders a `when` condition. Errors, including references to missing
    /// answers, make the condition false.
    pub fn evaluate_condition(&self, condition: &str) -> bool {
        match self.engine.render_condition(condition, &self.context) {
            Ok(rendered) => is_truthy(&rendered),
            Err(e) => {
                debug!("Condition '{condition}' failed to render: {e}");
                false
            }
        }
    }

    /// Decides whether the source entry at `path` is rendered.
    pub fn should_include(&self, path: &str) -> bool {
        if self.rules.is_empty() {
            return true;
        }

        for rule in self.rules {
            if rule.always {
                if glob_match(&rule.src, path) {
                    return true;
                }
                continue;
            }
            if let Some(condition) = rule.when_condition() {
                if glob_match(&rule.src, path) && self.evaluate_condition(condition) {
                    return true;
                }
            }
        }

        let covered = self
            .rules
            .iter()
            .any(|rule| glob_match(&expand_path(&rule.src, self.answers), path));
        if covered {
            debug!("Excluding '{path}': covered by a rule whose condition is not met");
        }
        !covered
    }
}
