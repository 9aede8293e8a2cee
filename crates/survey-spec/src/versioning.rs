use dashmap::DashMap;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::config::RepeatLimits;
use crate::graph::{QuestionGraph, Violation};
use crate::ids::IdGenerator;
use crate::spec::{Status, Survey, SurveyVersion};

/// Errors raised by lifecycle transitions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VersionError {
    #[error("version {0} does not exist")]
    UnknownVersion(u32),
    #[error("version {version} is {status:?} and cannot be edited")]
    Immutable { version: u32, status: Status },
    #[error("version {version} cannot move from {from:?} to {to:?}")]
    InvalidTransition { version: u32, from: Status, to: Status },
}

/// Errors raised by [`VersionManager::publish`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PublishError {
    #[error("version {version} has {} structural violation(s)", .violations.len())]
    Validation {
        version: u32,
        violations: Vec<Violation>,
    },
    #[error(transparent)]
    Version(#[from] VersionError),
}

/// Owns the draft/published/archived lifecycle of one survey's versions.
#[derive(Debug, Clone)]
pub struct VersionManager {
    survey: Survey,
    limits: RepeatLimits,
}

impl VersionManager {
    pub fn new(survey: Survey) -> Self {
        Self {
            survey,
            limits: RepeatLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: RepeatLimits) -> Self {
        self.limits = limits;
        self
    }

    /// A new survey with an empty draft as version 1.
    pub fn create_survey(
        title: impl Into<String>,
        description: impl Into<String>,
        ids: &mut impl IdGenerator,
        now: OffsetDateTime,
    ) -> Survey {
        let title = title.into();
        let description = description.into();
        let mut first = SurveyVersion::draft(ids.next_id(), 1, title.clone(), now);
        first.description = description.clone();
        Survey {
            id: ids.next_id(),
            title,
            description,
            status: Status::Draft,
            current_version: 1,
            published_version: None,
            versions: vec![first],
            created_at: now,
            updated_at: now,
        }
    }

    pub fn survey(&self) -> &Survey {
        &self.survey
    }

    pub fn into_survey(self) -> Survey {
        self.survey
    }

    pub fn load_version(&self, version: u32) -> Option<&SurveyVersion> {
        self.survey.version(version)
    }

    pub fn current_version(&self) -> Option<&SurveyVersion> {
        self.survey.version(self.survey.current_version)
    }

    pub fn published_version(&self) -> Option<&SurveyVersion> {
        self.survey
            .published_version
            .and_then(|number| self.survey.version(number))
    }

    /// Starts a new draft copied from `baseline`, or from the current version.
    ///
    /// Question and page ids are kept so answers stay addressable across versions.
    pub fn create_new_version(
        &mut self,
        baseline: Option<u32>,
        ids: &mut impl IdGenerator,
        now: OffsetDateTime,
    ) -> Result<&SurveyVersion, VersionError> {
        let source_number = baseline.unwrap_or(self.survey.current_version);
        let next_number = self.next_version_number();
        let draft = match self.survey.version(source_number) {
            Some(source) => SurveyVersion {
                id: ids.next_id(),
                version: next_number,
                status: Status::Draft,
                title: source.title.clone(),
                description: source.description.clone(),
                pages: source.pages.clone(),
                questions: source.questions.clone(),
                created_at: now,
                updated_at: now,
                published_at: None,
                archived_at: None,
            },
            None if baseline.is_some() => return Err(VersionError::UnknownVersion(source_number)),
            None => {
                let mut empty =
                    SurveyVersion::draft(ids.next_id(), next_number, self.survey.title.clone(), now);
                empty.description = self.survey.description.clone();
                empty
            }
        };

        info!(
            survey = %self.survey.id,
            version = next_number,
            baseline = source_number,
            "created draft version"
        );
        self.survey.versions.push(draft);
        self.survey.current_version = next_number;
        self.survey.updated_at = now;
        self.survey
            .version(next_number)
            .ok_or(VersionError::UnknownVersion(next_number))
    }

    /// Applies `edit` to a draft; published and archived versions are immutable.
    pub fn edit_draft<F>(&mut self, version: u32, now: OffsetDateTime, edit: F) -> Result<(), VersionError>
    where
        F: FnOnce(&mut SurveyVersion),
    {
        let target = self
            .survey
            .version_mut(version)
            .ok_or(VersionError::UnknownVersion(version))?;
        if target.status != Status::Draft {
            return Err(VersionError::Immutable {
                version,
                status: target.status,
            });
        }
        edit(target);
        target.updated_at = now;
        self.survey.updated_at = now;
        Ok(())
    }

    /// Structural violations of a version, or `None` when it does not exist.
    pub fn validate(&self, version: u32) -> Option<Vec<Violation>> {
        self.survey
            .version(version)
            .map(|target| QuestionGraph::validate_with_limits(target, &self.limits))
    }

    /// Publishes `version`, archiving the previously published one.
    ///
    /// Re-publishing the published version is a no-op, so retries leave exactly one
    /// published version.
    pub fn publish(&mut self, version: u32, now: OffsetDateTime) -> Result<&Survey, PublishError> {
        let target = self
            .survey
            .version(version)
            .ok_or(VersionError::UnknownVersion(version))?;
        match target.status {
            Status::Published => return Ok(&self.survey),
            Status::Archived => {
                return Err(VersionError::InvalidTransition {
                    version,
                    from: Status::Archived,
                    to: Status::Published,
                }
                .into());
            }
            Status::Draft => {}
        }

        let violations = QuestionGraph::validate_with_limits(target, &self.limits);
        if !violations.is_empty() {
            warn!(
                survey = %self.survey.id,
                version,
                violations = violations.len(),
                "publish blocked by structural violations"
            );
            return Err(PublishError::Validation {
                version,
                violations,
            });
        }

        for existing in &mut self.survey.versions {
            if existing.status == Status::Published && existing.version != version {
                existing.status = Status::Archived;
                existing.archived_at = Some(now);
                existing.updated_at = now;
            }
        }
        if let Some(target) = self.survey.version_mut(version) {
            target.status = Status::Published;
            target.published_at = Some(now);
            target.updated_at = now;
        }
        self.survey.published_version = Some(version);
        self.survey.status = Status::Published;
        self.survey.updated_at = now;
        info!(survey = %self.survey.id, version, "published version");
        Ok(&self.survey)
    }

    /// Archives a published or draft version. Archived versions stay archived.
    pub fn archive(&mut self, version: u32, now: OffsetDateTime) -> Result<(), VersionError> {
        let target = self
            .survey
            .version_mut(version)
            .ok_or(VersionError::UnknownVersion(version))?;
        if target.status == Status::Archived {
            return Ok(());
        }
        target.status = Status::Archived;
        target.archived_at = Some(now);
        target.updated_at = now;
        if self.survey.published_version == Some(version) {
            self.survey.published_version = None;
            self.survey.status = Status::Archived;
        }
        self.survey.updated_at = now;
        info!(survey = %self.survey.id, version, "archived version");
        Ok(())
    }

    fn next_version_number(&self) -> u32 {
        self.survey
            .versions
            .iter()
            .map(|version| version.version)
            .max()
            .unwrap_or(0)
            .max(self.survey.current_version)
            + 1
    }
}

/// A survey document together with the revision counter guarding writes.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub revision: u64,
    pub survey: Survey,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("survey '{0}' not found")]
    NotFound(String),
    #[error("survey '{survey_id}' changed concurrently (expected revision {expected}, found {actual})")]
    Conflict {
        survey_id: String,
        expected: u64,
        actual: u64,
    },
}

/// Persistence collaborator providing compare-and-set writes of survey documents.
pub trait SurveyStore {
    fn load(&self, survey_id: &str) -> Result<Snapshot, StoreError>;

    /// Replaces the document if its revision still equals `expected_revision`.
    fn atomic_update(
        &self,
        survey_id: &str,
        expected_revision: u64,
        updated: Survey,
    ) -> Result<Snapshot, StoreError>;
}

/// Process-local store, mostly for tests and the command-line tool.
#[derive(Debug, Default)]
pub struct InMemorySurveyStore {
    documents: DashMap<String, Snapshot>,
}

impl InMemorySurveyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a document at revision 0.
    pub fn insert(&self, survey: Survey) {
        self.documents.insert(
            survey.id.clone(),
            Snapshot {
                revision: 0,
                survey,
            },
        );
    }
}

impl SurveyStore for InMemorySurveyStore {
    fn load(&self, survey_id: &str) -> Result<Snapshot, StoreError> {
        self.documents
            .get(survey_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::NotFound(survey_id.to_string()))
    }

    fn atomic_update(
        &self,
        survey_id: &str,
        expected_revision: u64,
        updated: Survey,
    ) -> Result<Snapshot, StoreError> {
        let mut entry = self
            .documents
            .get_mut(survey_id)
            .ok_or_else(|| StoreError::NotFound(survey_id.to_string()))?;
        if entry.revision != expected_revision {
            return Err(StoreError::Conflict {
                survey_id: survey_id.to_string(),
                expected: expected_revision,
                actual: entry.revision,
            });
        }
        entry.revision += 1;
        entry.survey = updated;
        Ok(entry.value().clone())
    }
}

#[derive(Debug, Error)]
pub enum PublishFlowError {
    #[error(transparent)]
    Publish(#[from] PublishError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("gave up publishing survey '{survey_id}' after {attempts} conflicting attempt(s)")]
    RetriesExhausted { survey_id: String, attempts: u32 },
}

/// Read-validate-write publish against a store, re-validating on revision conflicts.
pub fn publish_with_store<S: SurveyStore + ?Sized>(
    store: &S,
    survey_id: &str,
    version: u32,
    now: OffsetDateTime,
    limits: &RepeatLimits,
    max_attempts: u32,
) -> Result<Snapshot, PublishFlowError> {
    let attempts = max_attempts.max(1);
    for attempt in 1..=attempts {
        let snapshot = store.load(survey_id)?;
        let mut manager = VersionManager::new(snapshot.survey).with_limits(limits.clone());
        manager.publish(version, now)?;
        match store.atomic_update(survey_id, snapshot.revision, manager.into_survey()) {
            Ok(updated) => return Ok(updated),
            Err(StoreError::Conflict { .. }) => {
                warn!(survey = survey_id, attempt, "publish raced with another writer, retrying");
            }
            Err(err) => return Err(err.into()),
        }
    }
    Err(PublishFlowError::RetriesExhausted {
        survey_id: survey_id.to_string(),
        attempts,
    })
}
