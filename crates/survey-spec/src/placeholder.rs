//! `{{key}}` / `{{key.field}}` interpolation against prior answers.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::config::PlaceholderConfig;
use crate::spec::{Question, QuestionType};

static TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z0-9_-]+)(?:\.([A-Za-z0-9_]+))?\s*\}\}")
        .expect("placeholder pattern is valid")
});

/// One piece of a tokenized template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TemplatePart<'t> {
    Text {
        value: &'t str,
    },
    Placeholder {
        /// The raw token including braces.
        value: &'t str,
        key: &'t str,
        #[serde(skip_serializing_if = "Option::is_none")]
        field: Option<&'t str>,
    },
}

impl<'t> TemplatePart<'t> {
    /// The exact source slice this part was cut from.
    pub fn value(&self) -> &'t str {
        match self {
            TemplatePart::Text { value } | TemplatePart::Placeholder { value, .. } => *value,
        }
    }
}

/// Lazy iterator over the parts of a template. Cloning restarts from the clone point.
#[derive(Debug, Clone)]
pub struct Tokens<'t> {
    text: &'t str,
    position: usize,
}

pub fn tokenize(text: &str) -> Tokens<'_> {
    Tokens { text, position: 0 }
}

impl<'t> Tokens<'t> {
    /// A fresh iterator over the same template.
    pub fn restart(&self) -> Tokens<'t> {
        tokenize(self.text)
    }
}

impl<'t> Iterator for Tokens<'t> {
    type Item = TemplatePart<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.text.len() {
            return None;
        }
        let start = self.position;
        let Some(captures) = TOKEN.captures_at(self.text, start) else {
            self.position = self.text.len();
            return Some(TemplatePart::Text {
                value: &self.text[start..],
            });
        };
        let (Some(whole), Some(key)) = (captures.get(0), captures.get(1)) else {
            self.position = self.text.len();
            return Some(TemplatePart::Text {
                value: &self.text[start..],
            });
        };
        if whole.start() > start {
            self.position = whole.start();
            return Some(TemplatePart::Text {
                value: &self.text[start..whole.start()],
            });
        }
        self.position = whole.end();
        Some(TemplatePart::Placeholder {
            value: whole.as_str(),
            key: key.as_str(),
            field: captures.get(2).map(|field| field.as_str()),
        })
    }
}

/// Rendered piece of a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RenderedPart {
    Text {
        value: String,
    },
    Value {
        key: String,
        /// What is shown inline, possibly cut with an ellipsis.
        display: String,
        /// The untruncated value, disclosed on demand.
        full: String,
        truncated: bool,
    },
}

/// Result of resolving a template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderedText {
    pub parts: Vec<RenderedPart>,
}

impl RenderedText {
    pub fn display(&self) -> String {
        self.parts
            .iter()
            .map(|part| match part {
                RenderedPart::Text { value } => value.as_str(),
                RenderedPart::Value { display, .. } => display.as_str(),
            })
            .collect()
    }

    pub fn full(&self) -> String {
        self.parts
            .iter()
            .map(|part| match part {
                RenderedPart::Text { value } => value.as_str(),
                RenderedPart::Value { full, .. } => full.as_str(),
            })
            .collect()
    }

    pub fn has_truncation(&self) -> bool {
        self.parts
            .iter()
            .any(|part| matches!(part, RenderedPart::Value { truncated: true, .. }))
    }
}

/// Resolves placeholder tokens against an answer map and question metadata.
#[derive(Debug, Clone, Default)]
pub struct PlaceholderResolver {
    config: PlaceholderConfig,
}

impl PlaceholderResolver {
    pub fn new(config: PlaceholderConfig) -> Self {
        Self { config }
    }

    /// Tokenizes and resolves in one step.
    pub fn resolve_text(&self, text: &str, answers: &Value, questions: &[Question]) -> RenderedText {
        self.resolve(tokenize(text), answers, questions)
    }

    pub fn resolve<'t>(
        &self,
        parts: impl IntoIterator<Item = TemplatePart<'t>>,
        answers: &Value,
        questions: &[Question],
    ) -> RenderedText {
        let parts = parts
            .into_iter()
            .map(|part| match part {
                TemplatePart::Text { value } => RenderedPart::Text {
                    value: value.to_string(),
                },
                TemplatePart::Placeholder { key, field, .. } => {
                    let question = questions.iter().find(|question| question.id == key);
                    let full = self.render_value(question, answers.get(key), field);
                    self.present(key, full)
                }
            })
            .collect();
        RenderedText { parts }
    }

    /// Text form of one answer, without truncation.
    pub fn render_value(
        &self,
        question: Option<&Question>,
        answer: Option<&Value>,
        field: Option<&str>,
    ) -> String {
        let Some(answer) = answer.filter(|value| !value.is_null()) else {
            return self.config.undefined_literal.clone();
        };
        match (question.map(Question::kind), answer) {
            (Some(QuestionType::Radio | QuestionType::Select), Value::String(raw)) => {
                self.option_label(question, raw)
            }
            (Some(QuestionType::Checkbox), Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(raw) => self.option_label(question, raw),
                    other => scalar_text(other),
                })
                .collect::<Vec<_>>()
                .join(", "),
            (_, Value::Array(items)) => items
                .iter()
                .map(scalar_text)
                .collect::<Vec<_>>()
                .join(", "),
            (_, Value::Object(map)) => match field {
                Some(field) => map
                    .get(field)
                    .filter(|value| !value.is_null())
                    .map(scalar_text)
                    .unwrap_or_else(|| self.config.undefined_literal.clone()),
                None => self.config.object_marker.clone(),
            },
            (_, other) => scalar_text(other),
        }
    }

    fn option_label(&self, question: Option<&Question>, raw: &str) -> String {
        match question.and_then(|question| question.option_text(raw)) {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => format!("{raw} {}", self.config.missing_option_marker),
        }
    }

    fn present(&self, key: &str, full: String) -> RenderedPart {
        let limit = self.config.truncate_at;
        let truncated = limit > 0 && full.chars().count() > limit;
        let display = if truncated {
            let mut cut = full.chars().take(limit).collect::<String>();
            cut.push('…');
            cut
        } else {
            full.clone()
        };
        RenderedPart::Value {
            key: key.to_string(),
            display,
            full,
            truncated,
        }
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}
