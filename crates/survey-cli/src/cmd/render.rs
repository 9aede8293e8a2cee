use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde_json::Value;
use survey_spec::{
    EngineConfig, ParallelGroupEngine, PlaceholderResolver, ResponseView, Survey,
    render_response_with,
};

use super::{pick_version, read_json};

#[derive(Args, Debug, Clone)]
pub struct RenderArgs {
    #[arg(long, value_name = "survey.json")]
    pub survey: PathBuf,
    /// Stored answers (JSON object keyed by question id)
    #[arg(long, value_name = "answers.json")]
    pub answers: PathBuf,
    #[arg(long)]
    pub version: Option<u32>,
}

pub fn run(args: &RenderArgs, config: &EngineConfig) -> Result<ResponseView> {
    let survey: Survey = read_json(&args.survey)?;
    let answers: Value = read_json(&args.answers)?;
    let version = pick_version(&survey, args.version)?;
    Ok(render_response_with(
        version,
        &answers,
        &PlaceholderResolver::new(config.placeholder.clone()),
        &ParallelGroupEngine::new(config.repeat.clone()),
    ))
}
