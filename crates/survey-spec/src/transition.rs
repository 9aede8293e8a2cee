use serde_json::Value;

use crate::graph::{QuestionGraph, Violation, ViolationKind};
use crate::spec::{Page, Question, QuestionId, QuestionType, SurveyVersion};

/// Result of evaluating a question's transition rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextStep {
    /// A rule matched and names the next question.
    Jump(QuestionId),
    /// No rule matched; continue in page/question order.
    Sequential,
}

/// Picks the next question from ordered, first-match-wins transition rules.
#[derive(Debug, Clone)]
pub struct TransitionRuleEngine<'a> {
    graph: QuestionGraph<'a>,
    pages: &'a [Page],
}

impl<'a> TransitionRuleEngine<'a> {
    pub fn new(version: &'a SurveyVersion) -> Self {
        Self {
            graph: QuestionGraph::from_version(version),
            pages: &version.pages,
        }
    }

    pub fn graph(&self) -> &QuestionGraph<'a> {
        &self.graph
    }

    /// Evaluates the rules of `question` against its current answer.
    pub fn evaluate(question: &Question, answer: Option<&Value>) -> NextStep {
        let Some(answer) = answer else {
            return NextStep::Sequential;
        };
        question
            .transition_rules
            .iter()
            .find(|rule| answer_matches(&rule.answer, answer))
            .map(|rule| NextStep::Jump(rule.next_question_id.clone()))
            .unwrap_or(NextStep::Sequential)
    }

    /// Top-level questions in navigation order: pages in order, then collection order.
    pub fn linear_order(&self) -> Vec<&'a Question> {
        self.pages
            .iter()
            .flat_map(|page| self.graph.visible_questions(&page.id))
            .collect()
    }

    pub fn first_question(&self) -> Option<&'a Question> {
        self.linear_order().into_iter().next()
    }

    pub fn page_of(&self, question_id: &str) -> Option<&'a Page> {
        let question = self.graph.get(question_id)?;
        let question = self
            .graph
            .find_parent_group(&question.id)
            .unwrap_or(question);
        let page_id = question.page_id.as_deref()?;
        self.pages.iter().find(|page| page.id == page_id)
    }

    /// The question shown after `current_id` given the answers so far.
    ///
    /// `None` means the survey is finished: either the linear order is exhausted or the
    /// current question is a `resolution`.
    pub fn next_question(&self, current_id: &str, answers: &Value) -> Option<&'a Question> {
        let current = self.graph.get(current_id)?;
        if current.kind() == QuestionType::Resolution {
            return None;
        }
        if let NextStep::Jump(target) = Self::evaluate(current, answers.get(current_id))
            && let Some(next) = self.graph.get(&target)
        {
            return Some(next);
        }

        let anchor = self
            .graph
            .find_parent_group(current_id)
            .map(|group| group.id.as_str())
            .unwrap_or(current_id);
        let order = self.linear_order();
        let position = order.iter().position(|question| question.id == anchor)?;
        order.get(position + 1).copied()
    }

    pub fn validate(&self) -> Vec<Violation> {
        rule_violations(&self.graph)
    }
}

/// Exact string match; array answers match when any element matches.
pub fn answer_matches(expected: &str, answer: &Value) -> bool {
    match answer {
        Value::Array(items) => items
            .iter()
            .any(|item| scalar_text(item).is_some_and(|text| text == expected)),
        other => scalar_text(other).is_some_and(|text| text == expected),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// Transition rules whose target is not a question of the same version.
pub fn rule_violations(graph: &QuestionGraph<'_>) -> Vec<Violation> {
    graph
        .questions()
        .flat_map(|question| {
            question
                .transition_rules
                .iter()
                .filter(move |rule| !graph.contains(&rule.next_question_id))
                .map(move |rule| {
                    Violation::new(
                        ViolationKind::DanglingTransition,
                        &question.id,
                        format!(
                            "rule '{}' targets missing question '{}'",
                            rule.id, rule.next_question_id
                        ),
                    )
                })
        })
        .collect()
}
