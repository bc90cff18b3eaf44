//! Typed answers collected from template prompts.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Answer key for the project name prompt.
pub const PROJECT_NAME: &str = "project_name";
/// Answer key controlling the remote repository steps.
pub const CREATE_GITHUB_REPO: &str = "create_github_repo";
/// Answer key selecting remote repository visibility.
pub const VISIBILITY: &str = "visibility";
/// Answer key for the project license.
pub const LICENSE: &str = "license";

/// A single prompt answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Text(String),
    Flag(bool),
}

impl Answer {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Answer::Text(s) => Some(s),
            Answer::Flag(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Answer::Flag(b) => Some(*b),
            Answer::Text(_) => None,
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Answer::Text(s) => f.write_str(s),
            Answer::Flag(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for Answer {
    fn from(value: &str) -> Self {
        Answer::Text(value.to_string())
    }
}

impl From<String> for Answer {
    fn from(value: String) -> Self {
        Answer::Text(value)
    }
}

impl From<bool> for Answer {
    fn from(value: bool) -> Self {
        Answer::Flag(value)
    }
}

/// Answers keyed by prompt name, in prompt order.
///
/// A missing key is never an error: callers fall back to the prompt default,
/// an empty string or `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Answers(IndexMap<String, Answer>);

impl Answers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Answer>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Answer> {
        self.0.get(key)
    }

    /// String form of an answer, empty when absent.
    pub fn text(&self, key: &str) -> String {
        self.0.get(key).map(|a| a.to_string()).unwrap_or_default()
    }

    /// `Some(b)` only when the answer exists and is a flag.
    pub fn flag(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Answer::as_bool)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Answer)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The answers as a JSON object, used as the templating context.
    pub fn to_context(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.0
                .iter()
                .map(|(k, v)| {
                    let value = match v {
                        Answer::Text(s) => serde_json::Value::String(s.clone()),
                        Answer::Flag(b) => serde_json::Value::Bool(*b),
                    };
                    (k.clone(), value)
                })
                .collect(),
        )
    }

    /// Whether the remote repository steps should run.
    ///
    /// Only an explicit `false` flag disables them.
    pub fn wants_remote_repo(&self) -> bool {
        !matches!(self.get(CREATE_GITHUB_REPO), Some(Answer::Flag(false)))
    }
}

impl<K: Into<String>, V: Into<Answer>> FromIterator<(K, V)> for Answers {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
