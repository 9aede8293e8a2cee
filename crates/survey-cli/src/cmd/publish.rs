use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use survey_spec::{EngineConfig, InMemorySurveyStore, Status, Survey, publish_with_store};
use time::OffsetDateTime;

use super::{read_json, write_json};

#[derive(Args, Debug, Clone)]
pub struct PublishArgs {
    #[arg(long, value_name = "survey.json")]
    pub survey: PathBuf,
    /// Version to publish; defaults to the current version
    #[arg(long)]
    pub version: Option<u32>,
    /// Where to write the updated survey; defaults to overwriting `--survey`
    #[arg(long, value_name = "survey.json")]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishReport {
    pub survey_id: String,
    pub published_version: u32,
    pub archived_versions: Vec<u32>,
}

pub fn run(args: &PublishArgs, config: &EngineConfig) -> Result<PublishReport> {
    let survey: Survey = read_json(&args.survey)?;
    let survey_id = survey.id.clone();
    let version = args.version.unwrap_or(survey.current_version);

    let store = InMemorySurveyStore::new();
    store.insert(survey);
    let snapshot = publish_with_store(
        &store,
        &survey_id,
        version,
        OffsetDateTime::now_utc(),
        &config.repeat,
        config.publish.max_attempts,
    )
    .with_context(|| format!("failed to publish version {version} of '{survey_id}'"))?;

    let out = args.out.as_ref().unwrap_or(&args.survey);
    write_json(out, &snapshot.survey)?;
    Ok(PublishReport {
        survey_id,
        published_version: version,
        archived_versions: snapshot
            .survey
            .versions
            .iter()
            .filter(|candidate| candidate.status == Status::Archived)
            .map(|candidate| candidate.version)
            .collect(),
    })
}
