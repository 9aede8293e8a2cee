#![allow(missing_docs)]

pub mod answers;
pub mod clone;
pub mod config;
pub mod graph;
pub mod ids;
pub mod parallel;
pub mod placeholder;
pub mod progress;
pub mod render;
pub mod schema;
pub mod spec;
pub mod transition;
pub mod versioning;

pub use answers::{ValidationError, ValidationResult, validate_answers, validate_answers_with};
pub use clone::GraphCloner;
pub use config::{
    ConfigError, DuplicateConfig, EngineConfig, GLOBAL_MAX_ITEMS, PlaceholderConfig,
    PublishConfig, RepeatLimits,
};
pub use graph::{AddToGroupError, QuestionGraph, Violation, ViolationKind};
pub use ids::{IdGenerator, SequentialIds, UuidGenerator};
pub use parallel::{
    InstanceAnswerKey, InstanceQuestion, MaxItemsUpdate, ParallelGroupEngine, RepeatInstance,
    RepeatState, ResolvedParallelSettings,
};
pub use placeholder::{
    PlaceholderResolver, RenderedPart, RenderedText, TemplatePart, Tokens, tokenize,
};
pub use progress::{
    InMemoryProgressStore, ProgressState, ProgressStore, advance, advance_with, back,
};
pub use render::{
    InstanceView, PageView, QuestionView, ResponseView, render_response, render_response_with,
};
pub use schema::{progress_schema, survey_schema, validation_result_schema, version_schema};
pub use spec::{
    DescriptionPosition, DisplayMode, Page, ParallelBranchSettings, Question, QuestionOption,
    QuestionSettings, QuestionType, Status, Survey, SurveyVersion, TransitionRule,
};
pub use transition::{NextStep, TransitionRuleEngine, answer_matches};
pub use versioning::{
    InMemorySurveyStore, PublishError, PublishFlowError, Snapshot, StoreError, SurveyStore,
    VersionError, VersionManager, publish_with_store,
};
