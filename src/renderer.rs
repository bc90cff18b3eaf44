//! Text templating for incubator.
//! Wraps MiniJinja behind a small trait so file contents and rule
//! conditions are rendered the same way. Templates written with Go
//! `text/template` actions (`{{.name}}`, `{{if .flag}}…{{end}}`) are
//! rewritten to MiniJinja syntax before rendering.
use crate::error::{Error, Result};
use minijinja::{Environment, UndefinedBehavior};
use regex::{Captures, Regex};
use std::borrow::Cow;

/// Trait for template rendering engines.
pub trait TemplateRenderer {
    /// Renders a template string with the given context.
    ///
    /// # Arguments
    /// * `template` - Template string to render
    /// * `context` - Context variables for rendering
    ///
    /// # Returns
    /// * `Result<String>` - Rendered template string
    fn render(&self, template: &str, context: &serde_json::Value) -> Result<String>;

    /// Renders a file rule condition.
    fn render_condition(&self, condition: &str, context: &serde_json::Value) -> Result<String> {
        self.render(condition, context)
    }
}

const GO_ACTION: &str = r"\{\{(-\s)?\s*(.*?)\s*(\s-)?\}\}";

/// Rewrites the Go template actions incubator templates use into MiniJinja.
///
/// Handles field access (`.a.b`), `if`/`else if`/`else`/`end` blocks and the
/// `not`, `eq`, `ne`, `and` and `or` functions. Anything else, including
/// every MiniJinja construct, is left untouched.
pub struct GoSyntax {
    action: Regex,
}

impl GoSyntax {
    pub fn new() -> Result<Self> {
        let action = Regex::new(GO_ACTION).map_err(|e| Error::TemplateError(e.to_string()))?;
        Ok(Self { action })
    }

    pub fn translate<'t>(&self, template: &'t str) -> Cow<'t, str> {
        if !template.contains("{{") {
            return Cow::Borrowed(template);
        }

        let mut open_ifs = 0usize;
        self.action.replace_all(template, |caps: &Captures| {
            let whole = caps[0].to_string();
            let left = if caps.get(1).is_some() { "-" } else { "" };
            let right = if caps.get(3).is_some() { "-" } else { "" };
            let tag = |inner: &str| format!("{{%{left} {inner} {right}%}}");
            let body = &caps[2];

            if let Some(condition) = body.strip_prefix("if ") {
                return match go_expression(condition) {
                    Some(expr) => {
                        open_ifs += 1;
                        tag(&format!("if {expr}"))
                    }
                    None => whole,
                };
            }
            if open_ifs > 0 {
                if let Some(condition) = body.strip_prefix("else if ") {
                    return match go_expression(condition) {
                        Some(expr) => tag(&format!("elif {expr}")),
                        None => whole,
                    };
                }
                match body {
                    "else" => return tag("else"),
                    "end" => {
                        open_ifs -= 1;
                        return tag("endif");
                    }
                    _ => {}
                }
            }
            if body.starts_with('.') {
                if let Some(expr) = go_expression(body) {
                    return format!("{{{{{left} {expr} {right}}}}}");
                }
            }
            whole
        })
    }
}

/// Splits a Go pipeline on whitespace, keeping quoted strings whole.
fn go_tokens(pipeline: &str) -> Option<Vec<&str>> {
    let mut tokens = Vec::new();
    let mut start = None;
    let mut in_quote = false;
    let mut escaped = false;

    for (idx, c) in pipeline.char_indices() {
        if in_quote {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_quote = false,
                _ => {}
            }
            continue;
        }
        if c.is_whitespace() {
            if let Some(s) = start.take() {
                tokens.push(&pipeline[s..idx]);
            }
            continue;
        }
        if start.is_none() {
            start = Some(idx);
        }
        if c == '"' {
            in_quote = true;
        }
    }
    if in_quote {
        return None;
    }
    if let Some(s) = start {
        tokens.push(&pipeline[s..]);
    }
    Some(tokens)
}

fn go_operand(token: &str) -> Option<String> {
    if let Some(path) = token.strip_prefix('.') {
        let valid = path
            .split('.')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_alphanumeric() || c == '_'));
        return valid.then(|| path.to_string());
    }
    let quoted = token.len() >= 2 && token.starts_with('"') && token.ends_with('"');
    if quoted || matches!(token, "true" | "false") || token.parse::<f64>().is_ok() {
        return Some(token.to_string());
    }
    None
}

fn go_expression(pipeline: &str) -> Option<String> {
    let tokens = go_tokens(pipeline)?;
    let (head, args) = tokens.split_first()?;
    let operands = args.iter().map(|t| go_operand(t)).collect::<Option<Vec<_>>>()?;

    match (*head, operands.as_slice()) {
        (single, []) => go_operand(single),
        ("not", [value]) => Some(format!("not {value}")),
        ("eq", [a, b]) => Some(format!("({a} == {b})")),
        ("ne", [a, b]) => Some(format!("({a} != {b})")),
        ("and", [_, _, ..]) => Some(format!("({})", operands.join(" and "))),
        ("or", [_, _, ..]) => Some(format!("({})", operands.join(" or "))),
        _ => None,
    }
}

/// MiniJinja-based template rendering engine.
///
/// File contents render undefined names as empty strings and keep a trailing
/// newline, so rendered files end the way their sources do. Conditions use
/// strict undefined handling: a condition that refers to a missing answer or
/// does not parse is an error.
pub struct MiniJinjaRenderer {
    env: Environment<'static>,
    strict: Environment<'static>,
    go_syntax: Option<GoSyntax>,
}

impl MiniJinjaRenderer {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Chainable);
        env.set_keep_trailing_newline(true);

        let mut strict = Environment::new();
        strict.set_undefined_behavior(UndefinedBehavior::Strict);

        Self { env, strict, go_syntax: GoSyntax::new().ok() }
    }

    fn translate<'t>(&self, template: &'t str) -> Cow<'t, str> {
        match &self.go_syntax {
            Some(go_syntax) => go_syntax.translate(template),
            None => Cow::Borrowed(template),
        }
    }
}

impl Default for MiniJinjaRenderer {
    fn default() -> Self {
        MiniJinjaRenderer::new()
    }
}

impl TemplateRenderer for MiniJinjaRenderer {
    fn render(&self, template: &str, context: &serde_json::Value) -> Result<String> {
        self.env.render_str(&self.translate(template), context).map_err(Error::MinijinjaError)
    }

    fn render_condition(&self, condition: &str, context: &serde_json::Value) -> Result<String> {
        self.strict.render_str(&self.translate(condition), context).map_err(Error::MinijinjaError)
    }
}
