use chrono::Duration;
use quiz_core::model::{Answers, AttemptId, QuestionId, QuizId, QuizStatus};
use quiz_core::time::fixed_now;
use serde_json::json;
use services::{HttpReporter, HttpReporterConfig, QuizReport, QuizReporter, SubmissionError};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn report() -> QuizReport {
    let mut answers = Answers::new();
    answers.insert(QuestionId::new(1), "Paris".into());
    answers.insert(QuestionId::new(2), "Rome".into());
    QuizReport {
        quiz_id: QuizId::new(9),
        attempt_id: AttemptId::new_v4(),
        answers,
        score: 100,
        status: QuizStatus::Submitted,
        cutoff_score: 70,
        answered: 2,
        total: 2,
        started_at: fixed_now(),
        finished_at: fixed_now() + Duration::seconds(42),
    }
}

fn reporter(server: &MockServer, token: Option<&str>) -> HttpReporter {
    HttpReporter::new(HttpReporterConfig {
        endpoint: format!("{}/report", server.uri()),
        token: token.map(str::to_string),
    })
}

#[tokio::test]
async fn posts_report_with_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/report"))
        .and(header("authorization", "Bearer secret"))
        .and(body_partial_json(json!({
            "quiz_id": 9,
            "status": "submitted",
            "score": 100,
            "answers": { "1": "Paris", "2": "Rome" }
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "passed": true, "next_module": "geography-2" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let receipt = reporter(&server, Some("secret")).report(&report()).await.unwrap();
    assert!(receipt.passed);
    assert_eq!(receipt.next_module.as_deref(), Some("geography-2"));
}

#[tokio::test]
async fn unprocessable_entity_is_a_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(422).set_body_string("attempt already graded\n"))
        .mount(&server)
        .await;

    let err = reporter(&server, None).report(&report()).await.unwrap_err();
    assert!(matches!(err, SubmissionError::Rejected(ref body) if body == "attempt already graded"));
}

#[tokio::test]
async fn server_errors_carry_the_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = reporter(&server, None).report(&report()).await.unwrap_err();
    assert!(matches!(err, SubmissionError::HttpStatus(status) if status.as_u16() == 503));
}
