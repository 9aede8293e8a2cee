use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use survey_spec::{EngineConfig, GraphCloner, Survey};
use time::OffsetDateTime;

use super::{CliIds, read_json, write_json};

#[derive(Args, Debug, Clone)]
pub struct DuplicateArgs {
    #[arg(long, value_name = "survey.json")]
    pub survey: PathBuf,
    /// Where to write the copy
    #[arg(long, value_name = "copy.json")]
    pub out: PathBuf,
    #[arg(long = "deterministic-ids")]
    pub deterministic_ids: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateReport {
    pub source_id: String,
    pub copy_id: String,
    pub versions: usize,
}

pub fn run(args: &DuplicateArgs, config: &EngineConfig) -> Result<DuplicateReport> {
    let survey: Survey = read_json(&args.survey)?;
    let mut ids = CliIds::new(args.deterministic_ids, &format!("{}-copy", survey.id));
    let copy = GraphCloner::new(config.duplicate.clone()).duplicate(
        &survey,
        &mut ids,
        OffsetDateTime::now_utc(),
    );
    write_json(&args.out, &copy)?;
    Ok(DuplicateReport {
        source_id: survey.id,
        copy_id: copy.id,
        versions: copy.versions.len(),
    })
}
