use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use survey_spec::{EngineConfig, Survey, VersionManager};
use time::OffsetDateTime;

use super::{CliIds, read_json, write_json};

#[derive(Args, Debug, Clone)]
pub struct NewVersionArgs {
    #[arg(long, value_name = "survey.json")]
    pub survey: PathBuf,
    /// Version to copy; defaults to the current version
    #[arg(long)]
    pub baseline: Option<u32>,
    #[arg(long, value_name = "survey.json")]
    pub out: Option<PathBuf>,
    /// Derive new ids from the survey id instead of random UUIDs
    #[arg(long = "deterministic-ids")]
    pub deterministic_ids: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVersionReport {
    pub survey_id: String,
    pub version: u32,
    pub version_id: String,
}

pub fn run(args: &NewVersionArgs, config: &EngineConfig) -> Result<NewVersionReport> {
    let survey: Survey = read_json(&args.survey)?;
    let mut ids = CliIds::new(
        args.deterministic_ids,
        &format!("{}-v{}", survey.id, survey.versions.len() + 1),
    );
    let mut manager = VersionManager::new(survey).with_limits(config.repeat.clone());
    let (version, version_id) = manager
        .create_new_version(args.baseline, &mut ids, OffsetDateTime::now_utc())
        .map(|draft| (draft.version, draft.id.clone()))
        .context("failed to create a new version")?;

    let survey = manager.into_survey();
    write_json(args.out.as_ref().unwrap_or(&args.survey), &survey)?;
    Ok(NewVersionReport {
        survey_id: survey.id,
        version,
        version_id,
    })
}
