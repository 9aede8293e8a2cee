use serde::Serialize;
use serde_json::Value;

use crate::parallel::{ParallelGroupEngine, RepeatInstance};
use crate::placeholder::{PlaceholderResolver, RenderedText};
use crate::spec::{DescriptionPosition, Question, QuestionType, SurveyVersion};
use crate::transition::TransitionRuleEngine;

/// A stored response rendered against its survey version.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseView {
    pub survey_version: u32,
    pub title: String,
    pub pages: Vec<PageView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageView {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub description_position: DescriptionPosition,
    pub questions: Vec<QuestionView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    pub title: RenderedText,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<RenderedText>,
    /// Display text of the answer, `None` when unanswered or for groups.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub instances: Vec<InstanceView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceView {
    pub index: usize,
    pub label: String,
    pub questions: Vec<QuestionView>,
}

/// Renders `answers` page by page using default repeat limits.
pub fn render_response(
    version: &SurveyVersion,
    answers: &Value,
    resolver: &PlaceholderResolver,
) -> ResponseView {
    render_response_with(version, answers, resolver, &ParallelGroupEngine::default())
}

pub fn render_response_with(
    version: &SurveyVersion,
    answers: &Value,
    resolver: &PlaceholderResolver,
    repeat: &ParallelGroupEngine,
) -> ResponseView {
    let engine = TransitionRuleEngine::new(version);
    let graph = engine.graph();
    let pages = version
        .pages
        .iter()
        .map(|page| PageView {
            id: page.id.clone(),
            title: page.title.clone(),
            description: page.description.clone(),
            description_position: page.description_position(),
            questions: graph
                .visible_questions(&page.id)
                .into_iter()
                .map(|question| {
                    let mut view = question_view(
                        version,
                        question,
                        answers,
                        answers.get(&question.id),
                        resolver,
                    );
                    if question.is_group() {
                        let count = repeat.effective_instance_count(question, answers);
                        view.instances = repeat
                            .expand(question, graph, count)
                            .into_iter()
                            .map(|instance| {
                                let scope = instance_scope(answers, &instance);
                                InstanceView {
                                    index: instance.index,
                                    questions: instance
                                        .questions
                                        .iter()
                                        .map(|member| {
                                            question_view(
                                                version,
                                                member.question,
                                                &scope,
                                                answers.get(&member.answer_key),
                                                resolver,
                                            )
                                        })
                                        .collect(),
                                    label: instance.label,
                                }
                            })
                            .collect();
                    }
                    view
                })
                .collect(),
        })
        .collect();

    ResponseView {
        survey_version: version.version,
        title: version.title.clone(),
        pages,
    }
}

/// Answers as seen from one repeat instance: member ids resolve to that instance's values.
fn instance_scope(answers: &Value, instance: &RepeatInstance<'_>) -> Value {
    let mut scoped = answers.as_object().cloned().unwrap_or_default();
    for member in &instance.questions {
        if let Some(value) = answers.get(&member.answer_key) {
            scoped.insert(member.question.id.clone(), value.clone());
        }
    }
    Value::Object(scoped)
}

fn question_view(
    version: &SurveyVersion,
    question: &Question,
    answers: &Value,
    answer: Option<&Value>,
    resolver: &PlaceholderResolver,
) -> QuestionView {
    let answer = match question.kind() {
        QuestionType::ParallelGroup | QuestionType::Resolution => None,
        _ => answer
            .filter(|value| !value.is_null())
            .map(|value| resolver.render_value(Some(question), Some(value), None)),
    };
    QuestionView {
        id: question.id.clone(),
        kind: question.kind(),
        title: resolver.resolve_text(&question.title, answers, &version.questions),
        description: question
            .description
            .as_deref()
            .map(|text| resolver.resolve_text(text, answers, &version.questions)),
        answer,
        instances: Vec::new(),
    }
}
