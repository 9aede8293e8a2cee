use serde_json::json;
use time::OffsetDateTime;

use survey_spec::{
    InMemoryProgressStore, Page, ParallelGroupEngine, ProgressState, ProgressStore, Question,
    QuestionType, RepeatLimits, SurveyVersion, TransitionRule, advance, advance_with, back,
};

fn version() -> SurveyVersion {
    let mut gate = Question::new("gate", QuestionType::Radio, "Continue?").on_page("p1");
    gate.transition_rules = vec![TransitionRule {
        id: "r".into(),
        answer: "stop".into(),
        next_question_id: "bye".into(),
    }];
    let mut group = Question::new("g", QuestionType::ParallelGroup, "Items").on_page("p1");
    group.parallel_questions = vec!["item".into()];
    let mut version = SurveyVersion::draft("v", 1, "Flow", OffsetDateTime::UNIX_EPOCH);
    version.pages = vec![Page::new("p1", "One"), Page::new("p2", "Two")];
    version.questions = vec![
        gate,
        group,
        Question::new("item", QuestionType::Text, "Item"),
        Question::new("last", QuestionType::Text, "Last").on_page("p2"),
        Question::new("bye", QuestionType::Resolution, "Bye").on_page("p2"),
    ];
    version
}

#[test]
fn walks_forward_and_back() {
    let version = version();
    let answers = json!({ "gate": "go" });
    let start = advance(&version, &ProgressState::new("s", 1), &answers);
    assert_eq!(start.current_question.as_deref(), Some("gate"));
    assert!(start.history.is_empty());

    let second = advance(&version, &start, &answers);
    assert_eq!(second.current_question.as_deref(), Some("g"));
    let third = advance(&version, &second, &answers);
    assert_eq!(third.current_question.as_deref(), Some("last"));
    assert_eq!(third.history, vec!["gate", "g"]);

    let previous = back(&third);
    assert_eq!(previous.current_question.as_deref(), Some("g"));
    assert_eq!(previous.history, vec!["gate"]);
}

#[test]
fn resolution_completes_the_flow() {
    let version = version();
    let answers = json!({ "gate": "stop" });
    let state = advance(&version, &ProgressState::new("s", 1), &answers);
    let state = advance(&version, &state, &answers);
    assert_eq!(state.current_question.as_deref(), Some("bye"));
    assert!(!state.completed);

    let done = advance(&version, &state, &answers);
    assert!(done.completed);
    assert_eq!(done.current_question, None);
    assert_eq!(advance(&version, &done, &answers), done);

    let reopened = back(&done);
    assert!(!reopened.completed);
    assert_eq!(reopened.current_question.as_deref(), Some("bye"));
}

#[test]
fn active_tabs_follow_the_instance_count() {
    let version = version();
    let state = ProgressState::new("s", 1).select_instance("g", 3, 4);
    let state = advance(&version, &state, &json!({ "g_count": 2 }));
    assert_eq!(state.active_instances.get("g"), Some(&1));
}

#[test]
fn active_tabs_respect_configured_max_items() {
    let version = version();
    let answers = json!({ "g_count": 8 });
    let state = ProgressState::new("s", 1).select_instance("g", 7, 8);

    let bounded = advance(&version, &state, &answers);
    assert_eq!(bounded.active_instances.get("g"), Some(&4));

    let repeat = ParallelGroupEngine::new(RepeatLimits {
        max_items: 10,
        ..RepeatLimits::default()
    });
    let widened = advance_with(&version, &state, &answers, &repeat);
    assert_eq!(widened.active_instances.get("g"), Some(&7));
}

#[test]
fn store_keeps_state_between_requests() {
    let version = version();
    let store = InMemoryProgressStore::new();
    let state = advance(&version, &ProgressState::new("s", 1), &json!({}));
    store.save("respondent-1", state.clone());
    assert_eq!(store.load("respondent-1"), Some(state));

    let encoded = serde_json::to_value(store.load("respondent-1")).expect("serializes");
    assert_eq!(encoded["currentQuestion"], json!("gate"));
    store.clear("respondent-1");
    assert_eq!(store.load("respondent-1"), None);
}
