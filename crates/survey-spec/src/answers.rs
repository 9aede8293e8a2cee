//! Shape and completeness checks for stored responses.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::macros::format_description;

use crate::parallel::ParallelGroupEngine;
use crate::spec::{Question, QuestionSettings, QuestionType, SurveyVersion};
use crate::transition::TransitionRuleEngine;

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid"));
static PHONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9][0-9\s()-]{4,19}$").expect("phone pattern is valid"));

/// One problem with a stored answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Result returned from [`validate_answers`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ValidationError>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_required: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unknown_fields: Vec<String>,
}

/// Checks `answers` against the questions of `version`.
///
/// Required checks only cover questions on the path the answers actually take, so
/// questions skipped by a transition rule are never reported missing.
pub fn validate_answers(version: &SurveyVersion, answers: &Value) -> ValidationResult {
    validate_answers_with(version, answers, &ParallelGroupEngine::default())
}

/// Same as [`validate_answers`], with repeat-group defaults taken from `repeat`.
pub fn validate_answers_with(
    version: &SurveyVersion,
    answers: &Value,
    repeat: &ParallelGroupEngine,
) -> ValidationResult {
    let answers_map = answers.as_object().cloned().unwrap_or_default();
    let engine = TransitionRuleEngine::new(version);

    let mut errors = Vec::new();
    let mut missing_required = Vec::new();

    for question in answered_path(&engine, answers) {
        if question.kind() == QuestionType::Resolution {
            continue;
        }
        if question.is_group() {
            validate_group(
                question,
                &engine,
                repeat,
                &answers_map,
                &mut errors,
                &mut missing_required,
            );
            continue;
        }
        match present(&answers_map, &question.id) {
            None if question.required => missing_required.push(question.id.clone()),
            None => {}
            Some(value) => {
                if let Some(error) = validate_value(question, value) {
                    errors.push(error);
                }
            }
        }
    }

    let unknown_fields = unknown_fields(version, &answers_map);
    ValidationResult {
        valid: errors.is_empty() && missing_required.is_empty() && unknown_fields.is_empty(),
        errors,
        missing_required,
        unknown_fields,
    }
}

/// Questions visited from the first question following the answers.
fn answered_path<'a>(engine: &TransitionRuleEngine<'a>, answers: &Value) -> Vec<&'a Question> {
    let mut path = Vec::new();
    let mut seen = HashSet::new();
    let mut cursor = engine.first_question();
    while let Some(question) = cursor {
        if !seen.insert(question.id.as_str()) {
            break;
        }
        path.push(question);
        cursor = engine.next_question(&question.id, answers);
    }
    path
}

fn validate_group(
    group: &Question,
    engine: &TransitionRuleEngine<'_>,
    repeat: &ParallelGroupEngine,
    answers: &Map<String, Value>,
    errors: &mut Vec<ValidationError>,
    missing_required: &mut Vec<String>,
) {
    let Some(settings) = repeat.settings_for(group) else {
        return;
    };
    let count_key = ParallelGroupEngine::count_key(&group.id);
    let requested =
        ParallelGroupEngine::resolve_instance_count(&Value::Object(answers.clone()), &count_key);
    match present(answers, &count_key) {
        None if settings.count_required || group.required => {
            missing_required.push(count_key.clone());
        }
        None => {}
        Some(_) => {
            if requested > settings.max_items
                || (requested > 0 && requested < settings.min_items)
            {
                errors.push(error(
                    &count_key,
                    format!(
                        "instance count {requested} is outside {}..={}",
                        settings.min_items, settings.max_items
                    ),
                    "count_range",
                ));
            }
        }
    }

    let count = requested.min(settings.max_items) as usize;
    let members = engine.graph().child_questions(&group.id);
    for index in 0..count {
        for member in &members {
            let key = ParallelGroupEngine::instance_answer_key(&group.id, &member.id, index);
            match present(answers, &key) {
                None if member.required => missing_required.push(key),
                None => {}
                Some(value) => {
                    if let Some(mut error) = validate_value(member, value) {
                        error.path = Some(format!("/{}/{}/{}", group.id, index, member.id));
                        error.question_id = Some(key);
                        errors.push(error);
                    }
                }
            }
        }
    }
}

fn present<'v>(answers: &'v Map<String, Value>, key: &str) -> Option<&'v Value> {
    answers.get(key).filter(|value| match value {
        Value::Null => false,
        Value::String(text) => !text.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => true,
    })
}

fn validate_value(question: &Question, value: &Value) -> Option<ValidationError> {
    let id = question.id.as_str();
    match (&question.settings, value) {
        (QuestionSettings::Text(settings), Value::String(text)) => settings
            .max_length
            .filter(|max| text.chars().count() > *max)
            .map(|max| error(id, format!("text longer than {max} characters"), "max_length")),
        (QuestionSettings::Number(settings), _) => {
            let Some(number) = as_number(value) else {
                return Some(type_mismatch(id));
            };
            if settings.min.is_some_and(|min| number < min) {
                return Some(error(id, format!("{number} is below the minimum"), "min"));
            }
            if settings.max.is_some_and(|max| number > max) {
                return Some(error(id, format!("{number} is above the maximum"), "max"));
            }
            None
        }
        (QuestionSettings::Radio(_) | QuestionSettings::Select(_), Value::String(choice)) => {
            unknown_option(question, choice)
        }
        (QuestionSettings::Checkbox(settings), Value::Array(items)) => {
            for item in items {
                let Some(choice) = item.as_str() else {
                    return Some(type_mismatch(id));
                };
                if let Some(error) = unknown_option(question, choice) {
                    return Some(error);
                }
            }
            if let Some(min) = settings.min_selected
                && items.len() < min
            {
                return Some(error(
                    id,
                    format!("select at least {min} option(s)"),
                    "min_selected",
                ));
            }
            if let Some(max) = settings.max_selected
                && items.len() > max
            {
                return Some(error(
                    id,
                    format!("select at most {max} option(s)"),
                    "max_selected",
                ));
            }
            None
        }
        (QuestionSettings::Date(_), Value::String(text)) => {
            (!is_iso_date(text)).then(|| error(id, "expected a YYYY-MM-DD date", "date_format"))
        }
        (QuestionSettings::Email(_), Value::String(text)) => (!EMAIL.is_match(text.trim()))
            .then(|| error(id, "not a valid email address", "email_format")),
        (QuestionSettings::Phone(_), Value::String(text)) => (!PHONE.is_match(text.trim()))
            .then(|| error(id, "not a valid phone number", "phone_format")),
        (QuestionSettings::File(_), Value::String(_)) => None,
        (QuestionSettings::File(settings), Value::Array(items)) => {
            if items.iter().any(|item| !item.is_string()) {
                return Some(type_mismatch(id));
            }
            settings
                .max_files
                .filter(|max| items.len() > *max)
                .map(|max| error(id, format!("at most {max} file(s)"), "max_files"))
        }
        (QuestionSettings::Resolution(_) | QuestionSettings::ParallelGroup(_), _) => None,
        _ => Some(type_mismatch(id)),
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

fn is_iso_date(text: &str) -> bool {
    time::Date::parse(text.trim(), format_description!("[year]-[month]-[day]")).is_ok()
}

fn unknown_option(question: &Question, choice: &str) -> Option<ValidationError> {
    if question.options.iter().any(|option| option.id == choice) {
        return None;
    }
    Some(error(
        &question.id,
        format!("'{choice}' is not an option of this question"),
        "unknown_option",
    ))
}

/// Keys that are neither question ids, repeat counts, nor instance keys of known members.
fn unknown_fields(version: &SurveyVersion, answers: &Map<String, Value>) -> Vec<String> {
    let question_ids = version
        .questions
        .iter()
        .map(|question| question.id.as_str())
        .collect::<HashSet<_>>();
    let count_keys = version
        .questions
        .iter()
        .filter(|question| question.is_group())
        .map(|group| ParallelGroupEngine::count_key(&group.id))
        .collect::<HashSet<_>>();
    let is_member = |group_id: &str, member_id: &str| {
        version.question(group_id).is_some_and(|group| {
            group.is_group() && group.parallel_questions.iter().any(|id| id == member_id)
        })
    };

    answers
        .keys()
        .filter(|key| {
            if question_ids.contains(key.as_str()) || count_keys.contains(key.as_str()) {
                return false;
            }
            !ParallelGroupEngine::parse_instance_answer_key(key)
                .is_some_and(|parsed| is_member(&parsed.group_id, &parsed.question_id))
        })
        .cloned()
        .collect()
}

fn error(question_id: &str, message: impl Into<String>, code: &str) -> ValidationError {
    ValidationError {
        question_id: Some(question_id.to_string()),
        path: Some(format!("/{question_id}")),
        message: message.into(),
        code: Some(code.into()),
    }
}

fn type_mismatch(question_id: &str) -> ValidationError {
    error(question_id, "type mismatch", "type_mismatch")
}
