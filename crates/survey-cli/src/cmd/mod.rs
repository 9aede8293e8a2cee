pub mod check_answers;
pub mod duplicate;
pub mod new_version;
pub mod publish;
pub mod render;
pub mod schema;
pub mod validate;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use survey_spec::{EngineConfig, IdGenerator, SequentialIds, Survey, SurveyVersion, UuidGenerator};

pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(EngineConfig::default()),
    }
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let encoded = serde_json::to_string_pretty(value)?;
    fs::write(path, encoded + "\n").with_context(|| format!("failed to write {}", path.display()))
}

/// The requested version, or the published one, or the current one.
pub(crate) fn pick_version(survey: &Survey, requested: Option<u32>) -> Result<&SurveyVersion> {
    let number = requested
        .or(survey.published_version)
        .unwrap_or(survey.current_version);
    survey
        .version(number)
        .with_context(|| format!("survey '{}' has no version {number}", survey.id))
}

/// Id source selected by `--deterministic-ids`.
pub(crate) enum CliIds {
    Random(UuidGenerator),
    Sequential(SequentialIds),
}

impl CliIds {
    pub(crate) fn new(deterministic: bool, prefix: &str) -> Self {
        if deterministic {
            CliIds::Sequential(SequentialIds::new(prefix))
        } else {
            CliIds::Random(UuidGenerator)
        }
    }
}

impl IdGenerator for CliIds {
    fn next_id(&mut self) -> String {
        match self {
            CliIds::Random(ids) => ids.next_id(),
            CliIds::Sequential(ids) => ids.next_id(),
        }
    }
}
