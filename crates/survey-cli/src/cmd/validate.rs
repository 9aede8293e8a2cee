use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use survey_spec::{EngineConfig, QuestionGraph, Survey, Violation};

use super::{pick_version, read_json};

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    /// Survey document (JSON)
    #[arg(long, value_name = "survey.json")]
    pub survey: PathBuf,
    /// Version number; defaults to the published, then the current version
    #[arg(long)]
    pub version: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateReport {
    pub survey_id: String,
    pub version: u32,
    pub violations: Vec<Violation>,
}

pub fn run(args: &ValidateArgs, config: &EngineConfig) -> Result<ValidateReport> {
    let survey: Survey = read_json(&args.survey)?;
    let version = pick_version(&survey, args.version)?;
    let violations = QuestionGraph::validate_with_limits(version, &config.repeat);
    tracing::info!(
        survey = %survey.id,
        version = version.version,
        violations = violations.len(),
        "validated survey version"
    );
    Ok(ValidateReport {
        survey_id: survey.id.clone(),
        version: version.version,
        violations,
    })
}
