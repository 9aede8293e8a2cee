use serde_json::json;
use time::OffsetDateTime;

use survey_spec::{
    Page, ParallelGroupEngine, Question, QuestionOption, QuestionType, RepeatLimits,
    SurveyVersion, TransitionRule, validate_answers, validate_answers_with,
};

fn household() -> SurveyVersion {
    let mut owns_car = Question::new("car", QuestionType::Radio, "Car?").on_page("p1");
    owns_car.options = vec![QuestionOption::new("yes", "Yes"), QuestionOption::new("no", "No")];
    owns_car.transition_rules = vec![TransitionRule {
        id: "r1".into(),
        answer: "no".into(),
        next_question_id: "kids".into(),
    }];
    owns_car.required = true;

    let mut model = Question::new("model", QuestionType::Text, "Model").on_page("p1");
    model.required = true;

    let kids: Question = serde_json::from_value(json!({
        "id": "kids",
        "pageId": "p2",
        "type": "parallel_group",
        "title": "Children",
        "parallelQuestions": ["kid_name", "kid_birth"],
        "settings": { "maxItems": 3, "countRequired": true }
    }))
    .expect("group decodes");

    let mut kid_name = Question::new("kid_name", QuestionType::Text, "Name");
    kid_name.required = true;

    let mut version = SurveyVersion::draft("v1", 1, "Household", OffsetDateTime::UNIX_EPOCH);
    version.pages = vec![Page::new("p1", "Car"), Page::new("p2", "Kids")];
    version.questions = vec![
        owns_car,
        model,
        kids,
        kid_name,
        Question::new("kid_birth", QuestionType::Date, "Born"),
        Question::new("email", QuestionType::Email, "Email").on_page("p2"),
    ];
    version
}

#[test]
fn complete_answers_are_valid() {
    let result = validate_answers(
        &household(),
        &json!({
            "car": "yes",
            "model": "Lada",
            "kids_count": 2,
            "kids[0].kid_name": "Ann",
            "kids[0].kid_birth": "2015-04-01",
            "kids[1].kid_name": "Bob",
            "email": "parent@example.org"
        }),
    );
    assert!(result.valid, "{result:?}");
}

#[test]
fn skipped_questions_are_not_required() {
    let result = validate_answers(
        &household(),
        &json!({ "car": "no", "kids_count": 0 }),
    );
    assert!(result.valid, "{result:?}");
}

#[test]
fn missing_required_answers_are_listed() {
    let result = validate_answers(&household(), &json!({ "car": "yes", "kids_count": "1" }));
    assert!(!result.valid);
    assert_eq!(result.missing_required, vec!["model", "kids[0].kid_name"]);

    let result = validate_answers(&household(), &json!({ "car": "no" }));
    assert_eq!(result.missing_required, vec!["kids_count"]);
}

#[test]
fn shape_errors_carry_codes_and_paths() {
    let result = validate_answers(
        &household(),
        &json!({
            "car": "maybe",
            "model": "x",
            "kids_count": 1,
            "kids[0].kid_name": "Ann",
            "kids[0].kid_birth": "01.04.2015",
            "email": "nope"
        }),
    );
    let codes = result
        .errors
        .iter()
        .filter_map(|error| error.code.as_deref())
        .collect::<Vec<_>>();
    assert_eq!(codes, vec!["unknown_option", "date_format", "email_format"]);
    let date = &result.errors[1];
    assert_eq!(date.question_id.as_deref(), Some("kids[0].kid_birth"));
    assert_eq!(date.path.as_deref(), Some("/kids/0/kid_birth"));
}

#[test]
fn counts_above_max_items_are_errors() {
    let result = validate_answers(&household(), &json!({ "car": "no", "kids_count": 7 }));
    assert_eq!(
        result.errors.first().and_then(|error| error.code.as_deref()),
        Some("count_range")
    );
}

#[test]
fn unknown_keys_are_reported() {
    let result = validate_answers(
        &household(),
        &json!({
            "car": "no",
            "kids_count": 0,
            "stray": 1,
            "kids[0].email": "a@b.co",
            "other[0].kid_name": "x"
        }),
    );
    assert!(!result.valid);
    let mut unknown = result.unknown_fields.clone();
    unknown.sort();
    assert_eq!(unknown, vec!["kids[0].email", "other[0].kid_name", "stray"]);
}

#[test]
fn result_serializes_camel_case() {
    let result = validate_answers(&household(), &json!({}));
    let value = serde_json::to_value(&result).expect("serializes");
    assert_eq!(value["valid"], json!(false));
    assert_eq!(value["missingRequired"], json!(["car", "model", "kids_count"]));
}

#[test]
fn configured_repeat_limits_bound_the_count() {
    let mut group = Question::new("g", QuestionType::ParallelGroup, "Items").on_page("p1");
    group.parallel_questions = vec!["item".into()];
    let mut version = SurveyVersion::draft("v1", 1, "Items", OffsetDateTime::UNIX_EPOCH);
    version.pages = vec![Page::new("p1", "Items")];
    version.questions = vec![group, Question::new("item", QuestionType::Text, "Item")];
    let answers = json!({ "g_count": 7 });

    let result = validate_answers(&version, &answers);
    assert_eq!(
        result.errors.first().and_then(|error| error.code.as_deref()),
        Some("count_range")
    );

    let repeat = ParallelGroupEngine::new(RepeatLimits {
        max_items: 10,
        ..RepeatLimits::default()
    });
    let result = validate_answers_with(&version, &answers, &repeat);
    assert!(result.valid, "{result:?}");
}
