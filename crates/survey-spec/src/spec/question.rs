use std::borrow::Cow;

use schemars::{JsonSchema, Schema, SchemaGenerator};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Identifier of a question inside a survey version.
pub type QuestionId = String;

/// Closed set of supported question types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Text,
    Number,
    Radio,
    Checkbox,
    Select,
    Date,
    Email,
    Phone,
    File,
    ParallelGroup,
    Resolution,
}

impl QuestionType {
    /// Types whose answers are option ids.
    pub fn has_options(self) -> bool {
        matches!(
            self,
            QuestionType::Radio | QuestionType::Checkbox | QuestionType::Select
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QuestionType::Text => "text",
            QuestionType::Number => "number",
            QuestionType::Radio => "radio",
            QuestionType::Checkbox => "checkbox",
            QuestionType::Select => "select",
            QuestionType::Date => "date",
            QuestionType::Email => "email",
            QuestionType::Phone => "phone",
            QuestionType::File => "file",
            QuestionType::ParallelGroup => "parallel_group",
            QuestionType::Resolution => "resolution",
        }
    }
}

/// Selectable option of radio/checkbox/select questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct QuestionOption {
    pub id: String,
    pub text: String,
}

impl QuestionOption {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// Conditional edge to another question, keyed on a literal answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRule {
    pub id: String,
    pub answer: String,
    pub next_question_id: QuestionId,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct TextSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    pub multiline: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct NumberSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
}

/// Radio and select questions carry no extra configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ChoiceSettings {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct CheckboxSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_selected: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_selected: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DateSettings {}

/// Email and phone questions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ContactSettings {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct FileSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_files: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub accept: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ResolutionSettings {}

/// How repeat instances of a parallel group are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    Sequential,
    Tabs,
}

/// Stored (possibly partial) settings of a `parallel_group` question.
///
/// Missing fields fall back to the engine defaults, see
/// [`crate::parallel::ParallelGroupEngine::resolve_settings`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct ParallelBranchSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_mode: Option<DisplayMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count_required: Option<bool>,
}

/// Type-specific configuration, one variant per [`QuestionType`].
#[derive(Debug, Clone, PartialEq)]
pub enum QuestionSettings {
    Text(TextSettings),
    Number(NumberSettings),
    Radio(ChoiceSettings),
    Checkbox(CheckboxSettings),
    Select(ChoiceSettings),
    Date(DateSettings),
    Email(ContactSettings),
    Phone(ContactSettings),
    File(FileSettings),
    ParallelGroup(ParallelBranchSettings),
    Resolution(ResolutionSettings),
}

/// Raised when stored settings do not fit the shape of their question type.
#[derive(Debug, Error)]
#[error("invalid settings for '{kind}' question: {source}")]
pub struct QuestionDecodeError {
    pub kind: &'static str,
    #[source]
    pub source: serde_json::Error,
}

impl QuestionSettings {
    /// Default settings for a question type.
    pub fn default_for(kind: QuestionType) -> Self {
        match kind {
            QuestionType::Text => QuestionSettings::Text(TextSettings::default()),
            QuestionType::Number => QuestionSettings::Number(NumberSettings::default()),
            QuestionType::Radio => QuestionSettings::Radio(ChoiceSettings::default()),
            QuestionType::Checkbox => QuestionSettings::Checkbox(CheckboxSettings::default()),
            QuestionType::Select => QuestionSettings::Select(ChoiceSettings::default()),
            QuestionType::Date => QuestionSettings::Date(DateSettings::default()),
            QuestionType::Email => QuestionSettings::Email(ContactSettings::default()),
            QuestionType::Phone => QuestionSettings::Phone(ContactSettings::default()),
            QuestionType::File => QuestionSettings::File(FileSettings::default()),
            QuestionType::ParallelGroup => {
                QuestionSettings::ParallelGroup(ParallelBranchSettings::default())
            }
            QuestionType::Resolution => QuestionSettings::Resolution(ResolutionSettings::default()),
        }
    }

    /// Decodes the settings object stored next to a `type` tag.
    pub fn from_parts(kind: QuestionType, raw: Option<Value>) -> Result<Self, QuestionDecodeError> {
        let Some(raw) = raw.filter(|value| !value.is_null()) else {
            return Ok(Self::default_for(kind));
        };
        let wrap = |source| QuestionDecodeError {
            kind: kind.as_str(),
            source,
        };
        let settings = match kind {
            QuestionType::Text => QuestionSettings::Text(serde_json::from_value(raw).map_err(wrap)?),
            QuestionType::Number => {
                QuestionSettings::Number(serde_json::from_value(raw).map_err(wrap)?)
            }
            QuestionType::Radio => QuestionSettings::Radio(serde_json::from_value(raw).map_err(wrap)?),
            QuestionType::Checkbox => {
                QuestionSettings::Checkbox(serde_json::from_value(raw).map_err(wrap)?)
            }
            QuestionType::Select => {
                QuestionSettings::Select(serde_json::from_value(raw).map_err(wrap)?)
            }
            QuestionType::Date => QuestionSettings::Date(serde_json::from_value(raw).map_err(wrap)?),
            QuestionType::Email => QuestionSettings::Email(serde_json::from_value(raw).map_err(wrap)?),
            QuestionType::Phone => QuestionSettings::Phone(serde_json::from_value(raw).map_err(wrap)?),
            QuestionType::File => QuestionSettings::File(serde_json::from_value(raw).map_err(wrap)?),
            QuestionType::ParallelGroup => {
                QuestionSettings::ParallelGroup(serde_json::from_value(raw).map_err(wrap)?)
            }
            QuestionType::Resolution => {
                QuestionSettings::Resolution(serde_json::from_value(raw).map_err(wrap)?)
            }
        };
        Ok(settings)
    }

    pub fn kind(&self) -> QuestionType {
        match self {
            QuestionSettings::Text(_) => QuestionType::Text,
            QuestionSettings::Number(_) => QuestionType::Number,
            QuestionSettings::Radio(_) => QuestionType::Radio,
            QuestionSettings::Checkbox(_) => QuestionType::Checkbox,
            QuestionSettings::Select(_) => QuestionType::Select,
            QuestionSettings::Date(_) => QuestionType::Date,
            QuestionSettings::Email(_) => QuestionType::Email,
            QuestionSettings::Phone(_) => QuestionType::Phone,
            QuestionSettings::File(_) => QuestionType::File,
            QuestionSettings::ParallelGroup(_) => QuestionType::ParallelGroup,
            QuestionSettings::Resolution(_) => QuestionType::Resolution,
        }
    }

    fn to_value(&self) -> Value {
        let encoded = match self {
            QuestionSettings::Text(settings) => serde_json::to_value(settings),
            QuestionSettings::Number(settings) => serde_json::to_value(settings),
            QuestionSettings::Radio(settings) | QuestionSettings::Select(settings) => {
                serde_json::to_value(settings)
            }
            QuestionSettings::Checkbox(settings) => serde_json::to_value(settings),
            QuestionSettings::Date(settings) => serde_json::to_value(settings),
            QuestionSettings::Email(settings) | QuestionSettings::Phone(settings) => {
                serde_json::to_value(settings)
            }
            QuestionSettings::File(settings) => serde_json::to_value(settings),
            QuestionSettings::ParallelGroup(settings) => serde_json::to_value(settings),
            QuestionSettings::Resolution(settings) => serde_json::to_value(settings),
        };
        encoded.unwrap_or_else(|_| Value::Object(Default::default()))
    }
}

/// Definition of a single question inside a survey version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "QuestionWire", into = "QuestionWire")]
pub struct Question {
    pub id: QuestionId,
    pub page_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub required: bool,
    pub options: Vec<QuestionOption>,
    pub settings: QuestionSettings,
    pub transition_rules: Vec<TransitionRule>,
    pub parallel_questions: Vec<QuestionId>,
}

impl Question {
    /// Creates a question of the given type with default settings.
    pub fn new(id: impl Into<String>, kind: QuestionType, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            page_id: None,
            title: title.into(),
            description: None,
            required: false,
            options: Vec::new(),
            settings: QuestionSettings::default_for(kind),
            transition_rules: Vec::new(),
            parallel_questions: Vec::new(),
        }
    }

    pub fn on_page(mut self, page_id: impl Into<String>) -> Self {
        self.page_id = Some(page_id.into());
        self
    }

    pub fn kind(&self) -> QuestionType {
        self.settings.kind()
    }

    pub fn is_group(&self) -> bool {
        matches!(self.settings, QuestionSettings::ParallelGroup(_))
    }

    pub fn parallel_settings(&self) -> Option<&ParallelBranchSettings> {
        match &self.settings {
            QuestionSettings::ParallelGroup(settings) => Some(settings),
            _ => None,
        }
    }

    pub fn option_text(&self, option_id: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|option| option.id == option_id)
            .map(|option| option.text.as_str())
    }
}

/// JSON shape of a question as persisted by collaborators.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct QuestionWire {
    id: QuestionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    page_id: Option<String>,
    #[serde(rename = "type")]
    kind: QuestionType,
    title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default)]
    required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    options: Vec<QuestionOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    settings: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    transition_rules: Vec<TransitionRule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    parallel_questions: Vec<QuestionId>,
}

impl TryFrom<QuestionWire> for Question {
    type Error = QuestionDecodeError;

    fn try_from(wire: QuestionWire) -> Result<Self, Self::Error> {
        Ok(Self {
            settings: QuestionSettings::from_parts(wire.kind, wire.settings)?,
            id: wire.id,
            page_id: wire.page_id,
            title: wire.title,
            description: wire.description,
            required: wire.required,
            options: wire.options,
            transition_rules: wire.transition_rules,
            parallel_questions: wire.parallel_questions,
        })
    }
}

impl From<Question> for QuestionWire {
    fn from(question: Question) -> Self {
        let settings = question.settings.to_value();
        let settings = match &settings {
            Value::Object(map) if map.is_empty() => None,
            _ => Some(settings),
        };
        Self {
            id: question.id,
            page_id: question.page_id,
            kind: question.settings.kind(),
            title: question.title,
            description: question.description,
            required: question.required,
            options: question.options,
            settings,
            transition_rules: question.transition_rules,
            parallel_questions: question.parallel_questions,
        }
    }
}

impl JsonSchema for Question {
    fn schema_name() -> Cow<'static, str> {
        "Question".into()
    }

    fn json_schema(generator: &mut SchemaGenerator) -> Schema {
        QuestionWire::json_schema(generator)
    }
}
