use serde_json::Value;

use crate::answers::ValidationResult;
use crate::progress::ProgressState;
use crate::spec::{Survey, SurveyVersion};

/// JSON Schema of a full survey document.
pub fn survey_schema() -> Value {
    serde_json::to_value(schemars::schema_for!(Survey)).unwrap_or(Value::Null)
}

pub fn version_schema() -> Value {
    serde_json::to_value(schemars::schema_for!(SurveyVersion)).unwrap_or(Value::Null)
}

pub fn progress_schema() -> Value {
    serde_json::to_value(schemars::schema_for!(ProgressState)).unwrap_or(Value::Null)
}

pub fn validation_result_schema() -> Value {
    serde_json::to_value(schemars::schema_for!(ValidationResult)).unwrap_or(Value::Null)
}
