use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Identifier of a page inside a survey version.
pub type PageId = String;

/// Placement of a page description relative to its questions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DescriptionPosition {
    #[default]
    Before,
    After,
}

/// A page groups top-level questions of one version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: PageId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_position: Option<DescriptionPosition>,
}

impl Page {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            description_position: None,
        }
    }

    pub fn description_position(&self) -> DescriptionPosition {
        self.description_position.unwrap_or_default()
    }
}
