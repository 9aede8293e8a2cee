pub mod page;
pub mod question;
pub mod survey;

pub use page::{DescriptionPosition, Page, PageId};
pub use question::{
    CheckboxSettings, ChoiceSettings, ContactSettings, DateSettings, DisplayMode, FileSettings,
    NumberSettings, ParallelBranchSettings, Question, QuestionDecodeError, QuestionId,
    QuestionOption, QuestionSettings, QuestionType, ResolutionSettings, TextSettings,
    TransitionRule,
};
pub use survey::{Status, Survey, SurveyId, SurveyVersion, VersionId};
