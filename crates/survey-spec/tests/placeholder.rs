use proptest::prelude::*;
use serde_json::json;

use survey_spec::{
    PlaceholderConfig, PlaceholderResolver, Question, QuestionOption, QuestionType, TemplatePart,
    tokenize,
};

fn questions() -> Vec<Question> {
    let mut color = Question::new("color", QuestionType::Radio, "Color");
    color.options = vec![
        QuestionOption::new("r", "Red"),
        QuestionOption::new("g", "Green"),
        QuestionOption::new("blank", ""),
    ];
    let mut pets = Question::new("pets", QuestionType::Checkbox, "Pets");
    pets.options = vec![QuestionOption::new("cat", "Cat"), QuestionOption::new("dog", "Dog")];
    vec![
        Question::new("q1", QuestionType::Text, "Name"),
        color,
        pets,
        Question::new("address", QuestionType::Text, "Address"),
    ]
}

#[test]
fn resolves_plain_answers() {
    let resolver = PlaceholderResolver::default();
    let rendered = resolver.resolve_text("Hello {{q1}}", &json!({ "q1": "World" }), &questions());
    assert_eq!(rendered.display(), "Hello World");
    assert!(!rendered.has_truncation());
}

#[test]
fn unresolved_keys_render_as_undefined() {
    let resolver = PlaceholderResolver::default();
    let rendered = resolver.resolve_text("{{missing}}", &json!({}), &questions());
    assert_eq!(rendered.display(), "undefined");
    let rendered = resolver.resolve_text("{{q1}}", &json!({ "q1": null }), &questions());
    assert_eq!(rendered.display(), "undefined");
}

#[test]
fn option_ids_render_as_labels() {
    let resolver = PlaceholderResolver::default();
    let answers = json!({ "color": "g", "pets": ["dog", "cat"] });
    let rendered = resolver.resolve_text("{{color}} / {{pets}}", &answers, &questions());
    assert_eq!(rendered.display(), "Green / Dog, Cat");
}

#[test]
fn options_without_text_are_marked() {
    let resolver = PlaceholderResolver::default();
    let rendered = resolver.resolve_text("{{color}}", &json!({ "color": "blank" }), &questions());
    assert_eq!(rendered.display(), "blank (нет текста)");
    let rendered = resolver.resolve_text("{{color}}", &json!({ "color": "zzz" }), &questions());
    assert_eq!(rendered.display(), "zzz (нет текста)");
}

#[test]
fn object_answers_need_a_field() {
    let resolver = PlaceholderResolver::default();
    let answers = json!({ "address": { "city": "Kazan", "zip": 420000 } });
    let rendered =
        resolver.resolve_text("{{address.city}} {{address.zip}} {{address}} {{address.street}}", &answers, &questions());
    assert_eq!(rendered.display(), "Kazan 420000 — undefined");
}

#[test]
fn custom_undefined_literal() {
    let resolver = PlaceholderResolver::new(PlaceholderConfig {
        undefined_literal: "?".into(),
        ..Default::default()
    });
    assert_eq!(resolver.resolve_text("a{{x}}b", &json!({}), &[]).display(), "a?b");
}

#[test]
fn long_values_are_truncated_for_display_only() {
    let resolver = PlaceholderResolver::default();
    let long = "x".repeat(45);
    let rendered = resolver.resolve_text("{{q1}}", &json!({ "q1": long.clone() }), &questions());
    assert!(rendered.has_truncation());
    assert_eq!(rendered.display(), format!("{}…", "x".repeat(40)));
    assert_eq!(rendered.full(), long);
}

#[test]
fn tokens_keep_field_access() {
    let parts = tokenize("{{a.b}}").collect::<Vec<_>>();
    assert_eq!(
        parts,
        vec![TemplatePart::Placeholder {
            value: "{{a.b}}",
            key: "a",
            field: Some("b"),
        }]
    );
}

#[test]
fn keys_are_ascii_words() {
    let parts = tokenize("Привет, {{имя}} и {{q1}}!").collect::<Vec<_>>();
    assert_eq!(
        parts,
        vec![
            TemplatePart::Text {
                value: "Привет, {{имя}} и ",
            },
            TemplatePart::Placeholder {
                value: "{{q1}}",
                key: "q1",
                field: None,
            },
            TemplatePart::Text { value: "!" },
        ]
    );
}

proptest! {
    #[test]
    fn tokenize_round_trips_any_text(text in "[a-z {}.]{0,40}") {
        let joined = tokenize(&text).map(|part| part.value()).collect::<String>();
        prop_assert_eq!(joined, text);
    }

    #[test]
    fn text_without_tokens_renders_unchanged(text in "[^{}]{0,60}") {
        let resolver = PlaceholderResolver::default();
        let rendered = resolver.resolve_text(&text, &json!({}), &[]);
        prop_assert_eq!(rendered.display(), text);
    }
}
