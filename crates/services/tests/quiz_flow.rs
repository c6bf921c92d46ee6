use std::sync::Arc;

use quiz_core::model::{Question, QuestionId, Quiz, QuizId, QuizStatus};
use quiz_core::time::fixed_now;
use services::{
    AppServices, Clock, ControllerError, InMemoryQuizSource, LocalReporter, QuizSettings,
    QuizSourceError,
};

fn capitals() -> Quiz {
    let questions = vec![
        Question::new(
            QuestionId::new(1),
            "Capital of France?",
            vec!["Paris".into(), "Lyon".into(), "Nice".into()],
            "Paris",
        )
        .unwrap(),
        Question::new(
            QuestionId::new(2),
            "Capital of Italy?",
            vec!["Milan".into(), "Rome".into()],
            "Rome",
        )
        .unwrap(),
        Question::new(
            QuestionId::new(3),
            "Capital of Spain?",
            vec!["Madrid".into(), "Seville".into()],
            "Madrid",
        )
        .unwrap(),
    ];
    Quiz::new(QuizId::new(42), "Capitals", questions, 60, 120).unwrap()
}

fn services() -> AppServices {
    AppServices::in_memory(
        Clock::fixed(fixed_now()),
        QuizSettings::default(),
        Arc::new(InMemoryQuizSource::new([capitals()])),
        Arc::new(LocalReporter),
    )
}

#[tokio::test]
async fn submitted_attempt_is_reported_and_listed() {
    let app = services();
    let quiz_loop = app.quiz_loop();

    let (mut controller, _ticks) = quiz_loop.start(QuizId::new(42)).await.unwrap();
    assert!(!controller.was_restored());
    controller.select_answer(QuestionId::new(1), "Paris").await.unwrap();
    controller.next();
    controller.select_answer(QuestionId::new(2), "Milan").await.unwrap();
    controller.next();
    controller.select_answer(QuestionId::new(3), "Madrid").await.unwrap();

    let score = controller.submit().await.unwrap();
    assert_eq!(score, 67);
    assert!(!controller.is_counting_down());

    let receipt = controller.deliver().await.unwrap();
    assert!(receipt.passed);
    assert!(controller.pending_report().is_none());

    let history = app.history().recent(QuizId::new(42), 10).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].attempt_id, controller.attempt_id());
    assert_eq!(history[0].status, QuizStatus::Submitted);
    assert_eq!(history[0].score, 67);
    assert_eq!(app.history().best_score(QuizId::new(42)).await.unwrap(), Some(67));
}

#[tokio::test]
async fn answers_survive_a_remount() {
    let app = services();
    let quiz_loop = app.quiz_loop();

    let (mut first, _ticks) = quiz_loop.start(QuizId::new(42)).await.unwrap();
    first.select_answer(QuestionId::new(2), "Rome").await.unwrap();
    first.unmount();
    drop(first);

    let (second, _ticks) = quiz_loop.start(QuizId::new(42)).await.unwrap();
    assert!(second.was_restored());
    assert_eq!(
        second.session().answer_for(QuestionId::new(2)),
        Some("Rome")
    );
    assert_eq!(second.progress().answered, 1);
    assert_eq!(second.progress().remaining_seconds, 120);
}

#[tokio::test]
async fn cleared_cache_starts_fresh() {
    let app = services();
    let quiz_loop = app.quiz_loop();

    let (mut first, _ticks) = quiz_loop.start(QuizId::new(42)).await.unwrap();
    first.select_answer(QuestionId::new(1), "Lyon").await.unwrap();
    drop(first);

    quiz_loop.clear_cached_answers(QuizId::new(42)).await.unwrap();
    let (second, _ticks) = quiz_loop.start(QuizId::new(42)).await.unwrap();
    assert!(!second.was_restored());
    assert_eq!(second.progress().answered, 0);
}

#[tokio::test]
async fn unknown_quiz_is_reported_by_the_source() {
    let app = services();
    let err = app.quiz_loop().start(QuizId::new(7)).await.unwrap_err();
    assert!(matches!(
        err,
        ControllerError::Source(QuizSourceError::NotFound(id)) if id == QuizId::new(7)
    ));
    assert!(app.history().recent(QuizId::new(7), 5).await.unwrap().is_empty());
}
