use std::collections::HashMap;

use time::OffsetDateTime;
use tracing::info;

use crate::config::DuplicateConfig;
use crate::ids::IdGenerator;
use crate::spec::{Page, Question, Status, Survey, SurveyVersion, TransitionRule};

/// Deep-copies surveys under fresh identities while keeping every internal reference intact.
#[derive(Debug, Clone, Default)]
pub struct GraphCloner {
    config: DuplicateConfig,
}

/// Old-to-new id mapping that mints ids the first time an old id is seen.
#[derive(Default)]
struct IdMap {
    mapped: HashMap<String, String>,
}

impl IdMap {
    fn map(&mut self, old: &str, ids: &mut impl IdGenerator) -> String {
        if let Some(existing) = self.mapped.get(old) {
            return existing.clone();
        }
        let fresh = ids.next_id();
        self.mapped.insert(old.to_string(), fresh.clone());
        fresh
    }
}

impl GraphCloner {
    pub fn new(config: DuplicateConfig) -> Self {
        Self { config }
    }

    /// Returns an independent draft copy of `survey`; the input is left untouched.
    ///
    /// Versions keep their order and are renumbered from 1.
    pub fn duplicate(
        &self,
        survey: &Survey,
        ids: &mut impl IdGenerator,
        now: OffsetDateTime,
    ) -> Survey {
        let versions = survey
            .versions
            .iter()
            .enumerate()
            .map(|(position, version)| {
                let number = u32::try_from(position + 1).unwrap_or(u32::MAX);
                self.duplicate_version(version, number, ids, now)
            })
            .collect::<Vec<_>>();

        let copy = Survey {
            id: ids.next_id(),
            title: self.with_suffix(&survey.title),
            description: survey.description.clone(),
            status: Status::Draft,
            current_version: versions.last().map(|version| version.version).unwrap_or(1),
            published_version: None,
            versions,
            created_at: now,
            updated_at: now,
        };
        info!(
            source = %survey.id,
            copy = %copy.id,
            versions = copy.versions.len(),
            "duplicated survey"
        );
        copy
    }

    fn duplicate_version(
        &self,
        version: &SurveyVersion,
        number: u32,
        ids: &mut impl IdGenerator,
        now: OffsetDateTime,
    ) -> SurveyVersion {
        let version_id = ids.next_id();
        let mut page_ids = IdMap::default();
        let pages = version
            .pages
            .iter()
            .map(|page| Page {
                id: page_ids.map(&page.id, ids),
                ..page.clone()
            })
            .collect::<Vec<_>>();

        // Stale page ids on nested questions get fresh ids too.
        let mut question_ids = IdMap::default();
        let questions = version
            .questions
            .iter()
            .map(|question| Question {
                id: question_ids.map(&question.id, ids),
                page_id: question
                    .page_id
                    .as_deref()
                    .map(|old| page_ids.map(old, ids)),
                parallel_questions: question
                    .parallel_questions
                    .iter()
                    .map(|child| question_ids.map(child, ids))
                    .collect(),
                transition_rules: question
                    .transition_rules
                    .iter()
                    .map(|rule| TransitionRule {
                        id: ids.next_id(),
                        answer: rule.answer.clone(),
                        next_question_id: question_ids.map(&rule.next_question_id, ids),
                    })
                    .collect(),
                ..question.clone()
            })
            .collect();

        SurveyVersion {
            id: version_id,
            version: number,
            status: Status::Draft,
            title: self.with_suffix(&version.title),
            description: version.description.clone(),
            pages,
            questions,
            created_at: now,
            updated_at: now,
            published_at: None,
            archived_at: None,
        }
    }

    fn with_suffix(&self, title: &str) -> String {
        format!("{title}{}", self.config.copy_suffix)
    }
}
