//! Respondent navigation state and its persistence seam.

use std::collections::BTreeMap;

use dashmap::DashMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::parallel::{ParallelGroupEngine, RepeatState};
use crate::spec::SurveyVersion;
use crate::transition::TransitionRuleEngine;

/// Where a respondent is inside one survey version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressState {
    pub survey_id: String,
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_question: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<String>,
    /// Active tab per parallel group id.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub active_instances: BTreeMap<String, usize>,
    pub completed: bool,
}

impl ProgressState {
    pub fn new(survey_id: impl Into<String>, version: u32) -> Self {
        Self {
            survey_id: survey_id.into(),
            version,
            current_question: None,
            history: Vec::new(),
            active_instances: BTreeMap::new(),
            completed: false,
        }
    }

    /// Records the selected tab of a group, clamped to `count`.
    pub fn select_instance(mut self, group_id: &str, index: usize, count: usize) -> Self {
        let state = RepeatState::default().select(index, count);
        self.active_instances
            .insert(group_id.to_string(), state.active_instance);
        self
    }
}

/// Persistence for in-flight responses, keyed by session.
pub trait ProgressStore {
    fn load(&self, session_id: &str) -> Option<ProgressState>;
    fn save(&self, session_id: &str, state: ProgressState);
    fn clear(&self, session_id: &str);
}

#[derive(Debug, Default)]
pub struct InMemoryProgressStore {
    sessions: DashMap<String, ProgressState>,
}

impl InMemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressStore for InMemoryProgressStore {
    fn load(&self, session_id: &str) -> Option<ProgressState> {
        self.sessions
            .get(session_id)
            .map(|entry| entry.value().clone())
    }

    fn save(&self, session_id: &str, state: ProgressState) {
        self.sessions.insert(session_id.to_string(), state);
    }

    fn clear(&self, session_id: &str) {
        self.sessions.remove(session_id);
    }
}

/// Moves to the question after the current one.
///
/// A fresh state lands on the first question. Reaching a `resolution` question or the
/// end of the linear order marks the state completed.
pub fn advance(version: &SurveyVersion, state: &ProgressState, answers: &Value) -> ProgressState {
    advance_with(version, state, answers, &ParallelGroupEngine::default())
}

pub fn advance_with(
    version: &SurveyVersion,
    state: &ProgressState,
    answers: &Value,
    repeat: &ParallelGroupEngine,
) -> ProgressState {
    let engine = TransitionRuleEngine::new(version);
    let mut next = state.clone();
    if state.completed {
        return next;
    }

    match state.current_question.as_deref() {
        None => {
            next.current_question = engine.first_question().map(|question| question.id.clone());
            next.completed = next.current_question.is_none();
        }
        Some(current) => {
            let target = engine.next_question(current, answers);
            next.history.push(current.to_string());
            next.current_question = target.map(|question| question.id.clone());
            next.completed = target.is_none();
        }
    }

    next.active_instances = next
        .active_instances
        .into_iter()
        .filter_map(|(group_id, active)| {
            let group = engine.graph().get(&group_id)?;
            let count = repeat.effective_instance_count(group, answers);
            let state = RepeatState {
                active_instance: active,
            }
            .on_count_change(count);
            Some((group_id, state.active_instance))
        })
        .collect();

    debug!(
        survey = %next.survey_id,
        current = ?next.current_question,
        completed = next.completed,
        "advanced progress"
    );
    next
}

/// Returns to the previously visited question; a no-op at the start.
pub fn back(state: &ProgressState) -> ProgressState {
    let mut previous = state.clone();
    if let Some(last) = previous.history.pop() {
        previous.current_question = Some(last);
        previous.completed = false;
    }
    previous
}
