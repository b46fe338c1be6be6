//! Integration tests for the fact-check accuracy scorer.

use newsdesk_core::ErrorKind;
use newsdesk_rag::{AccuracyScorer, FactCheckScorer, ScoringMethod};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn scorer(server: &MockServer) -> FactCheckScorer {
    FactCheckScorer::new(&server.uri(), "bespoke-key", 5).expect("client construction")
}

fn context() -> Vec<String> {
    vec![
        "Acme beats earnings".to_string(),
        "ACME - $12.34 (49.8%)".to_string(),
    ]
}

#[tokio::test]
async fn support_prob_becomes_percentage() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v0/minicheck/factcheck"))
        .and(header("authorization", "Bearer bespoke-key"))
        .and(body_json(json!({
            "claim": "Acme rallied.",
            "context": "Acme beats earnings\nACME - $12.34 (49.8%)"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "support_prob": 0.873 })))
        .expect(1)
        .mount(&server)
        .await;

    let report = scorer(&server).score("Acme rallied.", &context()).await;

    assert!((report.score - 87.3).abs() < 1e-9, "score was {}", report.score);
    assert!(report.failure.is_none());
    assert_eq!(report.method, ScoringMethod::FactCheck);
}

#[tokio::test]
async fn out_of_range_probability_is_clamped() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "support_prob": 1.4 })))
        .mount(&server)
        .await;

    let report = scorer(&server).score("claim", &context()).await;
    assert!((report.score - 100.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn missing_field_scores_zero_with_reason() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
        .mount(&server)
        .await;

    let report = scorer(&server).score("claim", &context()).await;

    assert!(report.score.abs() < f64::EPSILON);
    let failure = report.failure.expect("failure reason");
    assert_eq!(failure.kind, ErrorKind::MalformedResponse);
    assert!(failure.message.contains("support_prob"));
}

#[tokio::test]
async fn provider_outage_scores_zero() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let report = scorer(&server).score("claim", &context()).await;
    assert!(report.score.abs() < f64::EPSILON);
    assert_eq!(report.failure.unwrap().kind, ErrorKind::Transport);
}

#[tokio::test]
async fn bad_key_is_provider_quota() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
        .mount(&server)
        .await;

    let report = scorer(&server).score("claim", &context()).await;
    assert_eq!(report.failure.unwrap().kind, ErrorKind::ProviderQuota);
}
