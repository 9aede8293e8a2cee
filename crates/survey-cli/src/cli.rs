use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::cmd::{
    self, check_answers::CheckAnswersArgs, duplicate::DuplicateArgs,
    new_version::NewVersionArgs, publish::PublishArgs, render::RenderArgs,
    schema::SchemaArgs, validate::ValidateArgs,
};

#[derive(Parser, Debug)]
#[command(
    name = "survey",
    about = "Validate, publish and duplicate versioned survey documents",
    version,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Engine configuration (TOML)
    #[arg(long = "config", value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Report structural violations of a survey version
    Validate(ValidateArgs),
    /// Publish a version, archiving the previously published one
    Publish(PublishArgs),
    /// Start a new draft version from a baseline
    NewVersion(NewVersionArgs),
    /// Copy a survey under fresh identities
    Duplicate(DuplicateArgs),
    /// Render stored answers against a survey version
    Render(RenderArgs),
    /// Validate stored answers against a survey version
    CheckAnswers(CheckAnswersArgs),
    /// Print JSON Schemas of the document formats
    Schema(SchemaArgs),
}

pub fn main() -> Result<()> {
    run(Cli::parse())
}

pub fn run(cli: Cli) -> Result<()> {
    let config = cmd::load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::Validate(args) => {
            let report = cmd::validate::run(&args, &config)?;
            emit(&report)?;
            if !report.violations.is_empty() {
                bail!(
                    "version {} has {} violation(s)",
                    report.version,
                    report.violations.len()
                );
            }
            Ok(())
        }
        Commands::Publish(args) => emit(&cmd::publish::run(&args, &config)?),
        Commands::NewVersion(args) => emit(&cmd::new_version::run(&args, &config)?),
        Commands::Duplicate(args) => emit(&cmd::duplicate::run(&args, &config)?),
        Commands::Render(args) => emit(&cmd::render::run(&args, &config)?),
        Commands::CheckAnswers(args) => {
            let result = cmd::check_answers::run(&args, &config)?;
            emit(&result)?;
            if !result.valid {
                bail!("answers are not valid");
            }
            Ok(())
        }
        Commands::Schema(args) => emit(&cmd::schema::run(&args)),
    }
}

fn emit<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
