use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde_json::Value;
use survey_spec::{
    EngineConfig, ParallelGroupEngine, Survey, ValidationResult, validate_answers_with,
};

use super::{pick_version, read_json};

#[derive(Args, Debug, Clone)]
pub struct CheckAnswersArgs {
    #[arg(long, value_name = "survey.json")]
    pub survey: PathBuf,
    #[arg(long, value_name = "answers.json")]
    pub answers: PathBuf,
    #[arg(long)]
    pub version: Option<u32>,
}

pub fn run(args: &CheckAnswersArgs, config: &EngineConfig) -> Result<ValidationResult> {
    let survey: Survey = read_json(&args.survey)?;
    let answers: Value = read_json(&args.answers)?;
    let version = pick_version(&survey, args.version)?;
    let result = validate_answers_with(
        version,
        &answers,
        &ParallelGroupEngine::new(config.repeat.clone()),
    );
    tracing::debug!(
        survey = %survey.id,
        version = version.version,
        valid = result.valid,
        "checked answers"
    );
    Ok(result)
}
