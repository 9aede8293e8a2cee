use std::collections::HashSet;

use proptest::prelude::*;
use time::OffsetDateTime;

use survey_spec::{
    GraphCloner, IdGenerator, Page, Question, QuestionGraph, QuestionType, SequentialIds, Status,
    Survey, SurveyVersion, TransitionRule, UuidGenerator, VersionManager,
};

fn source_survey(versions: usize) -> Survey {
    let now = OffsetDateTime::UNIX_EPOCH;
    let mut ids = SequentialIds::new("orig");
    let mut manager = VersionManager::new(VersionManager::create_survey(
        "Household",
        "Who lives here",
        &mut ids,
        now,
    ));
    manager
        .edit_draft(1, now, |draft| {
            draft.pages.push(Page::new("p1", "People"));
            let mut count = Question::new("adults", QuestionType::Number, "Adults").on_page("p1");
            count.transition_rules.push(TransitionRule {
                id: "r1".into(),
                answer: "0".into(),
                next_question_id: "end".into(),
            });
            let mut group = Question::new("kids", QuestionType::ParallelGroup, "Kids").on_page("p1");
            group.parallel_questions = vec!["kid_name".into(), "kid_age".into()];
            draft.questions = vec![
                count,
                group,
                Question::new("kid_name", QuestionType::Text, "Name"),
                Question::new("kid_age", QuestionType::Number, "Age"),
                Question::new("end", QuestionType::Resolution, "Done").on_page("p1"),
            ];
        })
        .expect("editable");
    manager.publish(1, now).expect("publishes");
    for _ in 1..versions {
        manager
            .create_new_version(None, &mut ids, now)
            .expect("new version");
    }
    manager.into_survey()
}

fn identities(survey: &Survey) -> HashSet<String> {
    let mut ids = HashSet::new();
    ids.insert(survey.id.clone());
    for version in &survey.versions {
        ids.insert(version.id.clone());
        ids.extend(version.pages.iter().map(|page| page.id.clone()));
        for question in &version.questions {
            ids.insert(question.id.clone());
            ids.extend(question.transition_rules.iter().map(|rule| rule.id.clone()));
        }
    }
    ids
}

fn assert_references_resolve(version: &SurveyVersion) {
    assert!(QuestionGraph::validate(version).is_empty(), "{:?}", QuestionGraph::validate(version));
}

#[test]
fn duplicate_is_a_fresh_draft_with_suffix() {
    let source = source_survey(2);
    let mut ids = SequentialIds::new("copy");
    let copy = GraphCloner::default().duplicate(&source, &mut ids, OffsetDateTime::UNIX_EPOCH);

    assert_eq!(copy.title, "Household (Копия)");
    assert_eq!(copy.status, Status::Draft);
    assert_eq!(copy.published_version, None);
    assert_eq!(copy.current_version, 2);
    assert_eq!(
        copy.versions.iter().map(|v| v.version).collect::<Vec<_>>(),
        vec![1, 2]
    );
    assert!(copy.versions.iter().all(|v| v.status == Status::Draft && v.published_at.is_none()));
    for version in &copy.versions {
        assert_references_resolve(version);
    }
    assert!(identities(&source).is_disjoint(&identities(&copy)));
}

#[test]
fn duplicate_keeps_structure_and_remaps_references() {
    let source = source_survey(1);
    let copy = GraphCloner::default().duplicate(&source, &mut UuidGenerator, OffsetDateTime::UNIX_EPOCH);
    let original = &source.versions[0];
    let cloned = &copy.versions[0];

    assert_eq!(cloned.questions.len(), original.questions.len());
    assert_eq!(cloned.pages.len(), original.pages.len());
    let group = cloned
        .questions
        .iter()
        .find(|question| question.is_group())
        .expect("group copied");
    let members = group
        .parallel_questions
        .iter()
        .map(|id| cloned.question(id).map(|q| q.title.as_str()))
        .collect::<Vec<_>>();
    assert_eq!(members, vec![Some("Name"), Some("Age")]);

    let rule = &cloned.questions[0].transition_rules[0];
    assert_eq!(
        cloned.question(&rule.next_question_id).map(|q| q.kind()),
        Some(QuestionType::Resolution)
    );
    assert_eq!(source.versions[0].questions[0].id, "adults");
}

#[test]
fn renumbering_ignores_gaps() {
    let mut source = source_survey(3);
    source.versions.remove(1);
    let copy = GraphCloner::default().duplicate(&source, &mut SequentialIds::new("c"), OffsetDateTime::UNIX_EPOCH);
    assert_eq!(copy.versions.iter().map(|v| v.version).collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(copy.current_version, 2);
}

#[test]
fn stale_page_id_on_nested_question_is_not_carried_over() {
    let mut source = source_survey(1);
    let version = &mut source.versions[0];
    if let Some(child) = version.questions.iter_mut().find(|q| q.id == "kid_name") {
        child.page_id = Some("old-page".into());
    }
    assert!(QuestionGraph::validate(&source.versions[0]).is_empty());

    let copy = GraphCloner::default().duplicate(&source, &mut SequentialIds::new("c"), OffsetDateTime::UNIX_EPOCH);
    let cloned = &copy.versions[0];
    let child = cloned
        .questions
        .iter()
        .find(|question| question.title == "Name")
        .expect("nested question copied");
    let page_id = child.page_id.as_deref().expect("page id kept");
    assert_ne!(page_id, "old-page");
    assert!(!identities(&source).contains(page_id));
    assert!(cloned.pages.iter().all(|page| page.id != "old-page"));
}

proptest! {
    #[test]
    fn duplicate_preserves_counts_and_never_reuses_ids(versions in 1usize..5) {
        let source = source_survey(versions);
        let mut ids = SequentialIds::new("dup");
        let copy = GraphCloner::default().duplicate(&source, &mut ids, OffsetDateTime::UNIX_EPOCH);
        prop_assert_eq!(copy.versions.len(), source.versions.len());
        for (left, right) in source.versions.iter().zip(&copy.versions) {
            prop_assert_eq!(left.questions.len(), right.questions.len());
            prop_assert_eq!(left.pages.len(), right.pages.len());
        }
        prop_assert!(identities(&source).is_disjoint(&identities(&copy)));
        prop_assert!(ids.next_id().starts_with("dup-"));
    }
}
