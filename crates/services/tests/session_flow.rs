use std::sync::Arc;

use exam_core::model::{
    Answer, ChapterId, Difficulty, ExamId, ExamKind, ProjectId, QuestionForm, QuestionId,
    QuestionKind, QuestionOption, QuestionSource, SubjectId,
};
use exam_core::time::fixed_clock;
use services::sessions::{CollectingNotifier, ExamSessionService};
use services::{AppServices, Clock, QuestionBank};
use storage::repository::{AutoRemovePolicy, InMemoryStateStore, RemovalPolicyRepository, Storage};

fn form(chapter: &str, kind: QuestionKind, stem: &str, answer: Answer) -> QuestionForm {
    QuestionForm {
        project_id: ProjectId::new("p1"),
        subject_id: SubjectId::new("s1"),
        chapter_id: ChapterId::new(chapter),
        kind,
        source: QuestionSource::Official,
        year: Some("2025".into()),
        difficulty: Some(Difficulty::Medium),
        frequency: None,
        knowledge_point_ids: Vec::new(),
        stem: stem.into(),
        options: vec![
            QuestionOption { label: "A".into(), content: "first".into() },
            QuestionOption { label: "B".into(), content: "second".into() },
            QuestionOption { label: "C".into(), content: "third".into() },
            QuestionOption { label: "D".into(), content: "fourth".into() },
        ],
        answer,
        explanation: "see the chapter".into(),
        main_stem: None,
        sub_questions: Vec::new(),
        payment_rule_id: None,
        inherit_chapter_rule: false,
    }
}

fn seeded_bank(clock: Clock) -> QuestionBank {
    let mut bank = QuestionBank::new(clock);
    bank.add_question(
        form("ch-001", QuestionKind::Single, "pick one", Answer::One("A".into())),
        "admin",
    )
    .unwrap();
    bank.add_question(
        form(
            "ch-001",
            QuestionKind::Multiple,
            "pick several",
            Answer::Many(vec!["A".into(), "C".into(), "D".into()]),
        ),
        "admin",
    )
    .unwrap();
    bank.add_question(
        form("ch-002", QuestionKind::Judgment, "true or false", Answer::One("false".into())),
        "admin",
    )
    .unwrap();
    bank
}

#[tokio::test]
async fn full_attempt_survives_a_process_restart() {
    let store = InMemoryStateStore::new();
    let storage = Storage::from_store(store.clone());
    let clock = fixed_clock();

    let bank = seeded_bank(clock);
    let page = bank.paginated(&services::QuestionFilter::default(), 1, 10);
    let questions = page.data.clone();
    let ids: Vec<QuestionId> = questions.iter().map(|q| q.id().clone()).collect();

    let mut engine =
        ExamSessionService::from_storage(clock, &storage, Arc::new(CollectingNotifier::new()));
    engine
        .start_exam(
            ExamId::new("exam-1"),
            ExamKind::RealExam,
            "2025 finals",
            SubjectId::new("s1"),
            "Strategy",
            questions,
            0,
        )
        .await
        .unwrap();

    engine
        .save_answer(&ids[0], Some(Answer::Many(vec!["A".into(), "C".into()])))
        .await
        .unwrap();
    engine.next_question().await.unwrap();

    // The "reloaded page": a fresh engine over the same storage.
    let mut revived =
        ExamSessionService::from_storage(clock, &storage, Arc::new(CollectingNotifier::new()));
    assert!(revived.restore().await.unwrap());
    assert_eq!(revived.session().unwrap().current_index(), 1);
    assert_eq!(revived.statistics().answered, 1);

    // Finish the attempt on the revived engine.
    for id in &ids[1..] {
        revived
            .save_answer(id, Some(Answer::One("A".into())))
            .await
            .unwrap();
    }
    let report = revived.submit_exam().await.unwrap().unwrap();
    assert_eq!(report.total_questions, 3);
    assert_eq!(report.unanswered_count, 0);
    assert!(!revived.has_unfinished_session());
}

#[tokio::test]
async fn wrong_question_drill_feeds_the_auto_removal_loop() {
    let store = InMemoryStateStore::new();
    store
        .set_policy(&AutoRemovePolicy { enabled: true, remove_after: 2 })
        .await
        .unwrap();
    let storage = Storage::from_store(store.clone());
    let clock = fixed_clock();

    let bank = seeded_bank(clock);
    let single = bank
        .paginated(&services::QuestionFilter::default(), 1, 10)
        .data
        .into_iter()
        .find(|q| q.kind() == QuestionKind::Single)
        .unwrap();

    let notifier = CollectingNotifier::new();
    let mut engine =
        ExamSessionService::from_storage(clock, &storage, Arc::new(notifier.clone()));

    // Two drills; the question is answered correctly once per drill.
    for _ in 0..2 {
        engine
            .start_wrong_questions_practice(
                &[single.id().clone()],
                SubjectId::new("s1"),
                "Strategy",
                None,
                0,
                &bank,
            )
            .await
            .unwrap();
        engine
            .save_answer(single.id(), Some(Answer::One("A".into())))
            .await
            .unwrap();
        engine.submit_exam().await.unwrap();
    }

    // The counter survived the first session and tripped in the second.
    assert_eq!(notifier.removed(), vec![single.id().clone()]);
}

#[tokio::test]
async fn app_services_wire_the_catalog_to_the_engine() {
    let storage = Storage::in_memory();
    let mut app = AppServices::with_storage(
        fixed_clock(),
        &storage,
        Arc::new(CollectingNotifier::new()),
    )
    .await
    .unwrap();

    let chapter = app
        .chapters()
        .add_chapter(services::chapters::ChapterForm {
            subject_id: SubjectId::new("s1"),
            subject_name: "Strategy".into(),
            name: "Chapter 1".into(),
            status: exam_core::model::EntityStatus::Active,
            order: 1,
        })
        .unwrap();

    let question = app
        .question_bank()
        .add_question(
            form(
                chapter.id.as_str(),
                QuestionKind::Single,
                "pick one",
                Answer::One("A".into()),
            ),
            "admin",
        )
        .unwrap();

    app.start_wrong_questions_practice(
        &[question.id().clone()],
        SubjectId::new("s1"),
        "Strategy",
        None,
        0,
    )
    .await
    .unwrap();

    assert!(app.session_ref().has_unfinished_session());
    assert_eq!(
        app.session_ref().session().unwrap().kind(),
        ExamKind::WrongQuestions
    );

    // The chapter delete guard sees the bank question.
    let err = app.delete_chapter(&chapter.id).unwrap_err();
    assert_eq!(err, services::CatalogError::ChapterInUse { count: 1 });

    app.question_bank()
        .delete_question(question.id())
        .unwrap();
    app.delete_chapter(&chapter.id).unwrap();
}
