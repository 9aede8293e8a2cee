use std::collections::{BTreeSet, HashMap};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::RepeatLimits;
use crate::parallel::ParallelGroupEngine;
use crate::spec::{Page, Question, SurveyVersion};
use crate::transition;

/// Category of a structural problem in a question graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    DuplicateQuestionId,
    MissingPage,
    UnknownGroupMember,
    DuplicateGroupMembership,
    NestingTooDeep,
    Cycle,
    MembersOnNonGroup,
    DanglingTransition,
    InvalidRepeatBounds,
}

/// A single structural violation reported by [`QuestionGraph::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub kind: ViolationKind,
    pub question_id: String,
    pub detail: String,
}

impl Violation {
    pub fn new(kind: ViolationKind, question_id: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind,
            question_id: question_id.into(),
            detail: detail.into(),
        }
    }
}

/// Why a question cannot join a parallel group.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddToGroupError {
    #[error("question '{0}' does not exist")]
    UnknownQuestion(String),
    #[error("question '{0}' is not a parallel group")]
    NotAGroup(String),
    #[error("group '{0}' cannot contain itself")]
    SelfReference(String),
    #[error("adding '{candidate}' to '{group}' would create a cycle")]
    WouldCreateCycle { candidate: String, group: String },
    #[error("group '{candidate}' is already nested inside group '{parent}'")]
    NestedGroup { candidate: String, parent: String },
    #[error("group '{candidate}' contains the nested group '{child}'")]
    ContainsNestedGroup { candidate: String, child: String },
    #[error("group '{candidate}' cannot be nested inside another group")]
    GroupInGroup { candidate: String },
    #[error("question '{candidate}' already belongs to group '{parent}'")]
    AlreadyInGroup { candidate: String, parent: String },
}

/// Read-only index over the flat question collection of one version.
///
/// Questions live in an arena keyed by id; group membership is kept as
/// adjacency lists so structural checks are plain graph walks.
#[derive(Debug, Clone)]
pub struct QuestionGraph<'a> {
    order: Vec<&'a Question>,
    by_id: HashMap<&'a str, &'a Question>,
    children: HashMap<&'a str, Vec<&'a str>>,
    parents: HashMap<&'a str, Vec<&'a str>>,
}

impl<'a> QuestionGraph<'a> {
    pub fn new(questions: &'a [Question]) -> Self {
        let mut by_id = HashMap::with_capacity(questions.len());
        for question in questions {
            by_id.entry(question.id.as_str()).or_insert(question);
        }

        let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
        let mut parents: HashMap<&str, Vec<&str>> = HashMap::new();
        for question in questions.iter().filter(|question| question.is_group()) {
            let members = question
                .parallel_questions
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>();
            for member in &members {
                let entry = parents.entry(*member).or_default();
                if !entry.contains(&question.id.as_str()) {
                    entry.push(question.id.as_str());
                }
            }
            children.entry(question.id.as_str()).or_insert(members);
        }

        debug!(
            questions = questions.len(),
            groups = children.len(),
            nested = parents.len(),
            "question graph built"
        );

        Self {
            order: questions.iter().collect(),
            by_id,
            children,
            parents,
        }
    }

    pub fn from_version(version: &'a SurveyVersion) -> Self {
        Self::new(&version.questions)
    }

    pub fn get(&self, id: &str) -> Option<&'a Question> {
        self.by_id.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Questions in collection order.
    pub fn questions(&self) -> impl Iterator<Item = &'a Question> + '_ {
        self.order.iter().copied()
    }

    /// Member ids of a group in their stored order.
    pub fn children(&self, group_id: &str) -> &[&'a str] {
        self.children
            .get(group_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Existing member questions of a group in their stored order.
    pub fn child_questions(&self, group_id: &str) -> Vec<&'a Question> {
        self.children(group_id)
            .iter()
            .filter_map(|id| self.get(id))
            .collect()
    }

    pub fn is_nested(&self, question_id: &str) -> bool {
        self.parents.contains_key(question_id)
    }

    pub fn find_parent_group(&self, question_id: &str) -> Option<&'a Question> {
        self.parents
            .get(question_id)
            .and_then(|parents| parents.first())
            .and_then(|id| self.get(id))
    }

    /// Non-nested questions of a page, in collection order.
    pub fn visible_questions(&self, page_id: &str) -> Vec<&'a Question> {
        self.order
            .iter()
            .copied()
            .filter(|question| {
                !self.is_nested(&question.id) && question.page_id.as_deref() == Some(page_id)
            })
            .collect()
    }

    /// Whether `target` can be reached from `from` through one or more membership edges.
    pub fn reaches(&self, from: &str, target: &str) -> bool {
        let mut visited = BTreeSet::new();
        let mut stack = self.children(from).to_vec();
        while let Some(next) = stack.pop() {
            if next == target {
                return true;
            }
            if visited.insert(next) {
                stack.extend_from_slice(self.children(next));
            }
        }
        false
    }

    /// Checks whether `candidate_id` may become a member of `group_id`.
    ///
    /// Adding a question that is already a member of the same group is accepted.
    pub fn check_add_to_group(&self, candidate_id: &str, group_id: &str) -> Result<(), AddToGroupError> {
        let group = self
            .get(group_id)
            .ok_or_else(|| AddToGroupError::UnknownQuestion(group_id.to_string()))?;
        if !group.is_group() {
            return Err(AddToGroupError::NotAGroup(group_id.to_string()));
        }
        let candidate = self
            .get(candidate_id)
            .ok_or_else(|| AddToGroupError::UnknownQuestion(candidate_id.to_string()))?;
        if candidate_id == group_id {
            return Err(AddToGroupError::SelfReference(group_id.to_string()));
        }
        if self.reaches(candidate_id, group_id) {
            return Err(AddToGroupError::WouldCreateCycle {
                candidate: candidate_id.to_string(),
                group: group_id.to_string(),
            });
        }
        if candidate.is_group() {
            if let Some(parent) = self.find_parent_group(candidate_id) {
                return Err(AddToGroupError::NestedGroup {
                    candidate: candidate_id.to_string(),
                    parent: parent.id.clone(),
                });
            }
            if let Some(child) = self
                .child_questions(candidate_id)
                .into_iter()
                .find(|child| child.is_group())
            {
                return Err(AddToGroupError::ContainsNestedGroup {
                    candidate: candidate_id.to_string(),
                    child: child.id.clone(),
                });
            }
            return Err(AddToGroupError::GroupInGroup {
                candidate: candidate_id.to_string(),
            });
        }
        if let Some(parent) = self
            .parents
            .get(candidate_id)
            .and_then(|parents| parents.iter().find(|parent| **parent != group_id))
        {
            return Err(AddToGroupError::AlreadyInGroup {
                candidate: candidate_id.to_string(),
                parent: parent.to_string(),
            });
        }
        Ok(())
    }

    pub fn can_add_to_group(&self, candidate_id: &str, group_id: &str) -> bool {
        self.check_add_to_group(candidate_id, group_id).is_ok()
    }

    /// Validates a version with the default repeat limits.
    pub fn validate(version: &SurveyVersion) -> Vec<Violation> {
        Self::validate_with_limits(version, &RepeatLimits::default())
    }

    pub fn validate_with_limits(version: &SurveyVersion, limits: &RepeatLimits) -> Vec<Violation> {
        QuestionGraph::from_version(version).violations(&version.pages, limits)
    }

    /// Every structural violation of this graph, in a stable order.
    pub fn violations(&self, pages: &[Page], limits: &RepeatLimits) -> Vec<Violation> {
        let mut violations = Vec::new();
        self.check_identities(&mut violations);
        self.check_pages(pages, &mut violations);
        self.check_groups(&mut violations);
        self.check_membership(&mut violations);
        violations.extend(transition::rule_violations(self));
        self.check_repeat_bounds(limits, &mut violations);
        violations
    }

    fn check_identities(&self, violations: &mut Vec<Violation>) {
        let mut seen = BTreeSet::new();
        for question in &self.order {
            if !seen.insert(question.id.as_str()) {
                violations.push(Violation::new(
                    ViolationKind::DuplicateQuestionId,
                    &question.id,
                    "question id is used more than once",
                ));
            }
        }
    }

    fn check_pages(&self, pages: &[Page], violations: &mut Vec<Violation>) {
        for question in &self.order {
            if self.is_nested(&question.id) {
                continue;
            }
            match question.page_id.as_deref() {
                None => violations.push(Violation::new(
                    ViolationKind::MissingPage,
                    &question.id,
                    "question is not assigned to a page",
                )),
                Some(page_id) if !pages.iter().any(|page| page.id == page_id) => {
                    violations.push(Violation::new(
                        ViolationKind::MissingPage,
                        &question.id,
                        format!("page '{page_id}' does not exist"),
                    ))
                }
                Some(_) => {}
            }
        }
    }

    fn check_groups(&self, violations: &mut Vec<Violation>) {
        for question in &self.order {
            if !question.is_group() {
                if !question.parallel_questions.is_empty() {
                    violations.push(Violation::new(
                        ViolationKind::MembersOnNonGroup,
                        &question.id,
                        format!(
                            "'{}' questions cannot hold parallel members",
                            question.kind().as_str()
                        ),
                    ));
                }
                continue;
            }

            let cyclic = self.reaches(&question.id, &question.id);
            if cyclic {
                violations.push(Violation::new(
                    ViolationKind::Cycle,
                    &question.id,
                    "group contains itself directly or transitively",
                ));
            }

            let mut listed = BTreeSet::new();
            for member in self.children(&question.id) {
                if !listed.insert(*member) {
                    violations.push(Violation::new(
                        ViolationKind::DuplicateGroupMembership,
                        *member,
                        format!("listed more than once in group '{}'", question.id),
                    ));
                    continue;
                }
                let Some(child) = self.get(member) else {
                    violations.push(Violation::new(
                        ViolationKind::UnknownGroupMember,
                        &question.id,
                        format!("member '{member}' does not exist"),
                    ));
                    continue;
                };
                if !child.is_group() {
                    continue;
                }
                if cyclic && (child.id == question.id || self.reaches(&child.id, &question.id)) {
                    continue;
                }
                violations.push(Violation::new(
                    ViolationKind::NestingTooDeep,
                    &question.id,
                    format!("group '{}' is nested inside group '{}'", child.id, question.id),
                ));
            }
        }
    }

    fn check_membership(&self, violations: &mut Vec<Violation>) {
        for question in &self.order {
            let Some(parents) = self.parents.get(question.id.as_str()) else {
                continue;
            };
            if parents.len() > 1 {
                violations.push(Violation::new(
                    ViolationKind::DuplicateGroupMembership,
                    &question.id,
                    format!("member of several groups: {}", parents.join(", ")),
                ));
            }
        }
    }

    fn check_repeat_bounds(&self, limits: &RepeatLimits, violations: &mut Vec<Violation>) {
        let engine = ParallelGroupEngine::new(limits.clone());
        for question in &self.order {
            let Some(stored) = question.parallel_settings() else {
                continue;
            };
            let resolved = engine.resolve_settings(stored);
            if resolved.max_items > limits.global_max_items {
                violations.push(Violation::new(
                    ViolationKind::InvalidRepeatBounds,
                    &question.id,
                    format!(
                        "maxItems {} exceeds the ceiling of {}",
                        resolved.max_items, limits.global_max_items
                    ),
                ));
            } else if resolved.min_items > resolved.max_items {
                violations.push(Violation::new(
                    ViolationKind::InvalidRepeatBounds,
                    &question.id,
                    format!(
                        "minItems {} exceeds maxItems {}",
                        resolved.min_items, resolved.max_items
                    ),
                ));
            }
        }
    }
}
