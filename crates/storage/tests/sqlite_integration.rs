use chrono::Duration;
use quiz_core::model::{Answers, AttemptId, QuestionId, QuizId, QuizStatus};
use quiz_core::time::fixed_now;
use storage::cache::{AnswerCache, CachedAnswers, LocalAnswerCache};
use storage::repository::{AttemptRecord, AttemptRepository, KeyValueStore, StorageError};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn attempt(quiz: u64, finished_offset: i64, status: QuizStatus) -> AttemptRecord {
    let mut answers = Answers::new();
    answers.insert(QuestionId::new(1), "A".into());
    answers.insert(QuestionId::new(2), "C".into());
    AttemptRecord {
        attempt_id: AttemptId::new_v4(),
        quiz_id: QuizId::new(quiz),
        status,
        score: 50,
        answers,
        answered: 2,
        total: 2,
        started_at: fixed_now(),
        finished_at: fixed_now() + Duration::seconds(finished_offset),
    }
}

#[tokio::test]
async fn sqlite_local_cache_round_trips_answers() {
    let repo = connect("memdb_local_cache").await;
    let cache = LocalAnswerCache::new(std::sync::Arc::new(repo.clone()));
    let quiz = QuizId::new(77);

    let mut answers = Answers::new();
    answers.insert(QuestionId::new(5), "Paris".into());
    let cached = CachedAnswers {
        answers,
        written_at: fixed_now().timestamp(),
    };
    cache.save(quiz, &cached).await.unwrap();

    let raw = repo.get("quiz_77_answers").await.unwrap();
    assert_eq!(raw.as_deref(), Some(r#"{"5":"Paris"}"#));
    assert_eq!(cache.load(quiz).await.unwrap(), Some(cached));

    cache.clear(quiz).await.unwrap();
    assert_eq!(repo.get("quiz_77_timestamp").await.unwrap(), None);
    assert_eq!(cache.load(quiz).await.unwrap(), None);
}

#[tokio::test]
async fn sqlite_migrations_are_idempotent() {
    let repo = connect("memdb_migrate_twice").await;
    repo.migrate().await.expect("second migrate");
    repo.set("k", "v").await.unwrap();
    assert_eq!(repo.get("k").await.unwrap().as_deref(), Some("v"));
}

#[tokio::test]
async fn sqlite_persists_and_lists_attempts() {
    let repo = connect("memdb_attempts").await;

    let first = attempt(1, 10, QuizStatus::Submitted);
    let second = attempt(1, 20, QuizStatus::TimedOut);
    let other = attempt(2, 30, QuizStatus::Submitted);
    repo.append_attempt(&first).await.unwrap();
    repo.append_attempt(&second).await.unwrap();
    repo.append_attempt(&other).await.unwrap();

    let fetched = repo.get_attempt(first.attempt_id).await.unwrap();
    assert_eq!(fetched, first);

    let listed = repo.list_attempts(QuizId::new(1), 10).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].attempt_id, second.attempt_id);
    assert_eq!(listed[0].status, QuizStatus::TimedOut);

    let err = repo.append_attempt(&first).await.unwrap_err();
    assert!(matches!(err, StorageError::Conflict));

    let missing = repo.get_attempt(AttemptId::new_v4()).await.unwrap_err();
    assert!(matches!(missing, StorageError::NotFound));
}
