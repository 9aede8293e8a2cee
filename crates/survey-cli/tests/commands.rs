use std::fs;
use std::path::Path;

use serde_json::json;
use survey_cli::cmd::{
    check_answers::{self, CheckAnswersArgs},
    duplicate::{self, DuplicateArgs},
    new_version::{self, NewVersionArgs},
    publish::{self, PublishArgs},
    render::{self, RenderArgs},
    schema::{self, SchemaArgs, SchemaKind},
    validate::{self, ValidateArgs},
};
use survey_spec::{EngineConfig, Status, Survey, ViolationKind};

fn write_survey(dir: &Path) -> std::path::PathBuf {
    let survey = json!({
        "id": "s1",
        "title": "Feedback",
        "status": "draft",
        "currentVersion": 1,
        "createdAt": "2024-05-01T10:00:00Z",
        "updatedAt": "2024-05-01T10:00:00Z",
        "versions": [{
            "id": "v1",
            "version": 1,
            "status": "draft",
            "title": "Feedback",
            "createdAt": "2024-05-01T10:00:00Z",
            "updatedAt": "2024-05-01T10:00:00Z",
            "pages": [{ "id": "p1", "title": "Main" }],
            "questions": [
                { "id": "name", "pageId": "p1", "type": "text", "title": "Name", "required": true },
                {
                    "id": "mood",
                    "pageId": "p1",
                    "type": "radio",
                    "title": "How was it, {{name}}?",
                    "options": [{ "id": "good", "text": "Good" }, { "id": "bad", "text": "Bad" }]
                }
            ]
        }]
    });
    let path = dir.join("survey.json");
    fs::write(&path, serde_json::to_string_pretty(&survey).expect("encode")).expect("write survey");
    path
}

fn read_survey(path: &Path) -> Survey {
    serde_json::from_str(&fs::read_to_string(path).expect("read")).expect("decode")
}

#[test]
fn validate_reports_clean_version() {
    let temp = tempfile::TempDir::new().expect("tempdir");
    let survey = write_survey(temp.path());
    let report = validate::run(
        &ValidateArgs {
            survey,
            version: None,
        },
        &EngineConfig::default(),
    )
    .expect("validate runs");
    assert_eq!(report.version, 1);
    assert!(report.violations.is_empty());
}

#[test]
fn validate_reports_violations() {
    let temp = tempfile::TempDir::new().expect("tempdir");
    let path = write_survey(temp.path());
    let mut survey = read_survey(&path);
    survey.versions[0].questions[0].page_id = Some("missing".into());
    fs::write(&path, serde_json::to_string(&survey).expect("encode")).expect("write");

    let report = validate::run(
        &ValidateArgs {
            survey: path,
            version: Some(1),
        },
        &EngineConfig::default(),
    )
    .expect("validate runs");
    assert_eq!(report.violations.len(), 1);
    assert_eq!(report.violations[0].kind, ViolationKind::MissingPage);
}

#[test]
fn publish_then_new_version_then_publish() {
    let temp = tempfile::TempDir::new().expect("tempdir");
    let path = write_survey(temp.path());
    let config = EngineConfig::default();

    let report = publish::run(
        &PublishArgs {
            survey: path.clone(),
            version: None,
            out: None,
        },
        &config,
    )
    .expect("publish v1");
    assert_eq!(report.published_version, 1);
    assert!(report.archived_versions.is_empty());

    let created = new_version::run(
        &NewVersionArgs {
            survey: path.clone(),
            baseline: None,
            out: None,
            deterministic_ids: true,
        },
        &config,
    )
    .expect("new version");
    assert_eq!(created.version, 2);
    assert_eq!(created.version_id, "s1-v2-1");

    let report = publish::run(
        &PublishArgs {
            survey: path.clone(),
            version: Some(2),
            out: None,
        },
        &config,
    )
    .expect("publish v2");
    assert_eq!(report.archived_versions, vec![1]);

    let survey = read_survey(&path);
    assert_eq!(survey.published_version, Some(2));
    assert_eq!(survey.published_count(), 1);
    assert_eq!(survey.version(1).map(|v| v.status), Some(Status::Archived));
}

#[test]
fn duplicate_writes_a_fresh_copy() {
    let temp = tempfile::TempDir::new().expect("tempdir");
    let path = write_survey(temp.path());
    let out = temp.path().join("copy.json");
    let report = duplicate::run(
        &DuplicateArgs {
            survey: path.clone(),
            out: out.clone(),
            deterministic_ids: true,
        },
        &EngineConfig::default(),
    )
    .expect("duplicate");
    assert_eq!(report.source_id, "s1");
    assert_ne!(report.copy_id, "s1");

    let copy = read_survey(&out);
    assert_eq!(copy.title, "Feedback (Копия)");
    assert!(copy.versions[0].question("name").is_none());
    assert_eq!(read_survey(&path).title, "Feedback");
}

#[test]
fn render_and_check_answers() {
    let temp = tempfile::TempDir::new().expect("tempdir");
    let survey = write_survey(temp.path());
    let answers = temp.path().join("answers.json");
    fs::write(&answers, r#"{ "name": "Ira", "mood": "good" }"#).expect("write answers");
    let config = EngineConfig::default();

    let view = render::run(
        &RenderArgs {
            survey: survey.clone(),
            answers: answers.clone(),
            version: None,
        },
        &config,
    )
    .expect("render");
    let mood = &view.pages[0].questions[1];
    assert_eq!(mood.title.display(), "How was it, Ira?");
    assert_eq!(mood.answer.as_deref(), Some("Good"));

    let result = check_answers::run(
        &CheckAnswersArgs {
            survey: survey.clone(),
            answers: answers.clone(),
            version: None,
        },
        &config,
    )
    .expect("check");
    assert!(result.valid, "{result:?}");

    fs::write(&answers, r#"{ "mood": "meh" }"#).expect("rewrite answers");
    let result = check_answers::run(
        &CheckAnswersArgs {
            survey,
            answers,
            version: None,
        },
        &config,
    )
    .expect("check");
    assert_eq!(result.missing_required, vec!["name"]);
    assert_eq!(result.errors.len(), 1);
}

#[test]
fn check_answers_uses_configured_repeat_limits() {
    let temp = tempfile::TempDir::new().expect("tempdir");
    let survey = temp.path().join("survey.json");
    let document = json!({
        "id": "s2",
        "title": "Items",
        "status": "draft",
        "currentVersion": 1,
        "createdAt": "2024-05-01T10:00:00Z",
        "updatedAt": "2024-05-01T10:00:00Z",
        "versions": [{
            "id": "v1",
            "version": 1,
            "status": "draft",
            "title": "Items",
            "createdAt": "2024-05-01T10:00:00Z",
            "updatedAt": "2024-05-01T10:00:00Z",
            "pages": [{ "id": "p1", "title": "Main" }],
            "questions": [
                {
                    "id": "g",
                    "pageId": "p1",
                    "type": "parallel_group",
                    "title": "Items",
                    "parallelQuestions": ["item"]
                },
                { "id": "item", "type": "text", "title": "Item" }
            ]
        }]
    });
    fs::write(&survey, serde_json::to_string_pretty(&document).expect("encode")).expect("write survey");
    let answers = temp.path().join("answers.json");
    fs::write(&answers, r#"{ "g_count": 7 }"#).expect("write answers");
    let config = EngineConfig::from_toml_str("[repeat]\nmax_items = 10\n").expect("config");

    let report = validate::run(
        &ValidateArgs {
            survey: survey.clone(),
            version: None,
        },
        &config,
    )
    .expect("validate");
    assert!(report.violations.is_empty(), "{:?}", report.violations);

    let args = CheckAnswersArgs {
        survey,
        answers,
        version: None,
    };
    let result = check_answers::run(&args, &config).expect("check");
    assert!(result.valid, "{result:?}");

    let result = check_answers::run(&args, &EngineConfig::default()).expect("check");
    assert_eq!(
        result.errors.first().and_then(|error| error.code.as_deref()),
        Some("count_range")
    );
}

#[test]
fn missing_files_carry_context() {
    let temp = tempfile::TempDir::new().expect("tempdir");
    let err = validate::run(
        &ValidateArgs {
            survey: temp.path().join("nope.json"),
            version: None,
        },
        &EngineConfig::default(),
    )
    .expect_err("missing file");
    assert!(format!("{err:#}").contains("failed to read"));
}

#[test]
fn schema_lists_question_types() {
    let schema = schema::run(&SchemaArgs {
        kind: SchemaKind::Survey,
    });
    assert!(schema.to_string().contains("parallel_group"));
}
