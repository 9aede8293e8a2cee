use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::spec::page::Page;
use crate::spec::question::Question;

pub type SurveyId = String;
pub type VersionId = String;

/// Lifecycle state shared by surveys and their versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Draft,
    Published,
    Archived,
}

/// Snapshot of a survey's pages and questions at one version number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SurveyVersion {
    pub id: VersionId,
    pub version: u32,
    pub status: Status,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub pages: Vec<Page>,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(with = "time::serde::rfc3339")]
    #[schemars(with = "String")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    #[schemars(with = "String")]
    pub updated_at: OffsetDateTime,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    #[schemars(with = "Option<String>")]
    pub published_at: Option<OffsetDateTime>,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    #[schemars(with = "Option<String>")]
    pub archived_at: Option<OffsetDateTime>,
}

impl SurveyVersion {
    /// Creates an empty draft.
    pub fn draft(
        id: impl Into<String>,
        version: u32,
        title: impl Into<String>,
        now: OffsetDateTime,
    ) -> Self {
        Self {
            id: id.into(),
            version,
            status: Status::Draft,
            title: title.into(),
            description: String::new(),
            pages: Vec::new(),
            questions: Vec::new(),
            created_at: now,
            updated_at: now,
            published_at: None,
            archived_at: None,
        }
    }

    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|question| question.id == id)
    }

    pub fn question_mut(&mut self, id: &str) -> Option<&mut Question> {
        self.questions.iter_mut().find(|question| question.id == id)
    }

    pub fn page(&self, id: &str) -> Option<&Page> {
        self.pages.iter().find(|page| page.id == id)
    }
}

/// Top-level authored entity holding every version of a questionnaire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Survey {
    pub id: SurveyId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: Status,
    pub current_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_version: Option<u32>,
    #[serde(default)]
    pub versions: Vec<SurveyVersion>,
    #[serde(with = "time::serde::rfc3339")]
    #[schemars(with = "String")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    #[schemars(with = "String")]
    pub updated_at: OffsetDateTime,
}

impl Survey {
    pub fn version(&self, number: u32) -> Option<&SurveyVersion> {
        self.versions.iter().find(|version| version.version == number)
    }

    pub fn version_mut(&mut self, number: u32) -> Option<&mut SurveyVersion> {
        self.versions
            .iter_mut()
            .find(|version| version.version == number)
    }

    /// Number of versions currently in the `published` state.
    pub fn published_count(&self) -> usize {
        self.versions
            .iter()
            .filter(|version| version.status == Status::Published)
            .count()
    }
}
