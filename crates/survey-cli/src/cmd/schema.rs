use clap::{Args, ValueEnum};
use serde_json::Value;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchemaKind {
    #[default]
    Survey,
    Version,
    Progress,
    Validation,
}

#[derive(Args, Debug, Clone)]
pub struct SchemaArgs {
    #[arg(long, value_enum, default_value = "survey")]
    pub kind: SchemaKind,
}

pub fn run(args: &SchemaArgs) -> Value {
    match args.kind {
        SchemaKind::Survey => survey_spec::survey_schema(),
        SchemaKind::Version => survey_spec::version_schema(),
        SchemaKind::Progress => survey_spec::progress_schema(),
        SchemaKind::Validation => survey_spec::validation_result_schema(),
    }
}
