//! Repeat-group ("parallel group") settings and instance expansion.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::config::RepeatLimits;
use crate::graph::QuestionGraph;
use crate::spec::{DisplayMode, ParallelBranchSettings, Question, QuestionId};

/// Stored settings merged over the engine defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedParallelSettings {
    pub item_label: String,
    pub display_mode: DisplayMode,
    pub min_items: u32,
    pub max_items: u32,
    pub count_label: Option<String>,
    pub count_description: Option<String>,
    pub count_required: bool,
}

/// Outcome of [`ParallelGroupEngine::update_max_items`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaxItemsUpdate {
    pub settings: ParallelBranchSettings,
    /// Set when the requested value was above the global ceiling and got clamped.
    pub clamped: bool,
}

/// Address of a sub-question answer inside one repeat instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstanceAnswerKey {
    pub group_id: String,
    pub question_id: String,
    pub index: usize,
}

/// One expanded sub-question of a repeat instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceQuestion<'a> {
    pub question: &'a Question,
    pub answer_key: String,
}

/// One repetition of a parallel group's members.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepeatInstance<'a> {
    pub index: usize,
    pub label: String,
    pub questions: Vec<InstanceQuestion<'a>>,
}

/// Computes repeat-group settings and expands or collapses repeated instances.
#[derive(Debug, Clone, Default)]
pub struct ParallelGroupEngine {
    limits: RepeatLimits,
}

impl ParallelGroupEngine {
    pub fn new(limits: RepeatLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &RepeatLimits {
        &self.limits
    }

    pub fn resolve_settings(&self, stored: &ParallelBranchSettings) -> ResolvedParallelSettings {
        ResolvedParallelSettings {
            item_label: stored
                .item_label
                .clone()
                .filter(|label| !label.trim().is_empty())
                .unwrap_or_else(|| self.limits.item_label.clone()),
            display_mode: stored.display_mode.unwrap_or(self.limits.display_mode),
            min_items: stored.min_items.unwrap_or(self.limits.min_items),
            max_items: stored.max_items.unwrap_or(self.limits.max_items),
            count_label: stored.count_label.clone(),
            count_description: stored.count_description.clone(),
            count_required: stored.count_required.unwrap_or(false),
        }
    }

    /// Settings of a group question, or `None` for other question types.
    pub fn settings_for(&self, question: &Question) -> Option<ResolvedParallelSettings> {
        question
            .parallel_settings()
            .map(|stored| self.resolve_settings(stored))
    }

    /// Sets `maxItems`, never below `minItems` and never above the global ceiling.
    pub fn update_max_items(&self, settings: &ParallelBranchSettings, value: i64) -> MaxItemsUpdate {
        let ceiling = i64::from(self.limits.global_max_items);
        let min_items = i64::from(self.resolve_settings(settings).min_items);
        let clamped = value > ceiling;
        let max_items = value.max(min_items).clamp(0, ceiling);
        if clamped {
            warn!(requested = value, applied = max_items, "maxItems clamped to ceiling");
        }
        let mut updated = settings.clone();
        updated.max_items = Some(u32::try_from(max_items).unwrap_or(self.limits.global_max_items));
        MaxItemsUpdate {
            settings: updated,
            clamped,
        }
    }

    /// Moves the id at `from` to `to`; out-of-range indices leave the list untouched.
    pub fn reorder_questions(&self, ids: &[QuestionId], from: usize, to: usize) -> Vec<QuestionId> {
        let mut reordered = ids.to_vec();
        if from >= ids.len() || to >= ids.len() {
            return reordered;
        }
        let moved = reordered.remove(from);
        reordered.insert(to, moved);
        reordered
    }

    pub fn add_question(&self, ids: &[QuestionId], id: &str) -> Vec<QuestionId> {
        let mut updated = ids.to_vec();
        if !updated.iter().any(|existing| existing == id) {
            updated.push(id.to_string());
        }
        updated
    }

    pub fn remove_question(&self, ids: &[QuestionId], id: &str) -> Vec<QuestionId> {
        ids.iter().filter(|existing| *existing != id).cloned().collect()
    }

    /// Key of the user-entered repeat count for a group.
    pub fn count_key(group_id: &str) -> String {
        format!("{group_id}_count")
    }

    /// Reads the user-entered count; absent or non-numeric values count as zero.
    pub fn resolve_instance_count(answers: &Value, count_key: &str) -> u32 {
        let Some(value) = answers.get(count_key) else {
            return 0;
        };
        let parsed = match value {
            Value::Number(number) => number
                .as_u64()
                .or_else(|| number.as_f64().filter(|n| *n >= 0.0).map(|n| n as u64)),
            Value::String(text) => text.trim().parse::<u64>().ok(),
            _ => None,
        };
        parsed
            .map(|count| u32::try_from(count).unwrap_or(u32::MAX))
            .unwrap_or(0)
    }

    /// Instance count of a group bounded by its `maxItems`.
    pub fn effective_instance_count(&self, group: &Question, answers: &Value) -> usize {
        let Some(settings) = self.settings_for(group) else {
            return 0;
        };
        let requested = Self::resolve_instance_count(answers, &Self::count_key(&group.id));
        requested.min(settings.max_items) as usize
    }

    /// Shrinking a non-empty repeat count discards answers and must be confirmed by the user.
    pub fn requires_confirmation(old_count: u32, new_count: u32) -> bool {
        new_count < old_count && old_count > 0
    }

    pub fn instance_answer_key(group_id: &str, question_id: &str, index: usize) -> String {
        format!("{group_id}[{index}].{question_id}")
    }

    /// Inverse of [`Self::instance_answer_key`] for ids without square brackets.
    pub fn parse_instance_answer_key(key: &str) -> Option<InstanceAnswerKey> {
        let open = key.find('[')?;
        let (group_id, rest) = key.split_at(open);
        let close = rest.find("].")?;
        let index = rest[1..close].parse::<usize>().ok()?;
        if rest[1..close].starts_with('+') {
            return None;
        }
        let question_id = &rest[close + 2..];
        if group_id.is_empty() || question_id.is_empty() {
            return None;
        }
        Some(InstanceAnswerKey {
            group_id: group_id.to_string(),
            question_id: question_id.to_string(),
            index,
        })
    }

    pub fn instance_label(settings: &ResolvedParallelSettings, index: usize) -> String {
        format!("{} {}", settings.item_label, index + 1)
    }

    /// Expands a group into `count` instances of its existing members.
    pub fn expand<'a>(
        &self,
        group: &Question,
        graph: &QuestionGraph<'a>,
        count: usize,
    ) -> Vec<RepeatInstance<'a>> {
        let Some(settings) = self.settings_for(group) else {
            return Vec::new();
        };
        let members = graph.child_questions(&group.id);
        (0..count)
            .map(|index| RepeatInstance {
                index,
                label: Self::instance_label(&settings, index),
                questions: members
                    .iter()
                    .map(|question| InstanceQuestion {
                        question: *question,
                        answer_key: Self::instance_answer_key(&group.id, &question.id, index),
                    })
                    .collect(),
            })
            .collect()
    }

    /// Drops answers of instances at or beyond `new_count` and returns the removed keys.
    ///
    /// Callers check [`Self::requires_confirmation`] first; this only performs the removal.
    pub fn prune_instances(
        answers: &mut Map<String, Value>,
        group_id: &str,
        new_count: usize,
    ) -> Vec<String> {
        let removed = answers
            .keys()
            .filter(|key| {
                Self::parse_instance_answer_key(key)
                    .is_some_and(|parsed| parsed.group_id == group_id && parsed.index >= new_count)
            })
            .cloned()
            .collect::<Vec<_>>();
        for key in &removed {
            answers.remove(key);
        }
        removed
    }
}

/// Explicit tab state of a rendered parallel group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepeatState {
    pub active_instance: usize,
}

impl RepeatState {
    /// Selects an instance, clamped to the available range.
    pub fn select(self, index: usize, count: usize) -> Self {
        Self {
            active_instance: index.min(count.saturating_sub(1)),
        }
    }

    /// Keeps the active tab valid after the instance count changed.
    pub fn on_count_change(self, new_count: usize) -> Self {
        self.select(self.active_instance, new_count)
    }
}
