//! Integration tests for the OpenAI-compatible chat and embedding clients.

use newsdesk_core::ErrorKind;
use newsdesk_rag::{ChatMessage, ChatModel, Embedder, OpenAiChat, OpenAiEmbedder, RagError};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn chat_client(server: &MockServer) -> OpenAiChat {
    OpenAiChat::new(&format!("{}/v1", server.uri()), "sk-test", "gpt-4", 5)
        .expect("client construction should not fail")
}

fn embed_client(server: &MockServer) -> OpenAiEmbedder {
    OpenAiEmbedder::new(
        &format!("{}/v1", server.uri()),
        "sk-test",
        "text-embedding-ada-002",
        3,
        5,
    )
    .expect("client construction should not fail")
}

#[tokio::test]
async fn chat_returns_first_choice_content() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({ "model": "gpt-4" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [
                { "index": 0, "message": { "role": "assistant", "content": "Markets were mixed." } }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reply = chat_client(&server)
        .complete(&[ChatMessage::system("sys"), ChatMessage::user("hi")])
        .await
        .expect("completion should parse");
    assert_eq!(reply, "Markets were mixed.");
}

#[tokio::test]
async fn chat_without_choices_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let err = chat_client(&server)
        .complete(&[ChatMessage::user("hi")])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedResponse);
}

#[tokio::test]
async fn insufficient_quota_is_provider_quota() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": { "type": "insufficient_quota", "message": "You exceeded your current quota." }
        })))
        .mount(&server)
        .await;

    let err = chat_client(&server)
        .complete(&[ChatMessage::user("hi")])
        .await
        .unwrap_err();
    assert!(matches!(err, RagError::Quota { .. }), "got: {err:?}");
    assert_eq!(err.kind(), ErrorKind::ProviderQuota);
}

#[tokio::test]
async fn server_error_is_transport() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let err = chat_client(&server)
        .complete(&[ChatMessage::user("hi")])
        .await
        .unwrap_err();
    assert!(matches!(err, RagError::Status { status: 502, .. }));
    assert_eq!(err.kind(), ErrorKind::Transport);
}

#[tokio::test]
async fn embeddings_are_reordered_by_index() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .and(body_partial_json(json!({ "model": "text-embedding-ada-002" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "index": 1, "embedding": [0.0, 1.0, 0.0] },
                { "index": 0, "embedding": [1.0, 0.0, 0.0] }
            ]
        })))
        .mount(&server)
        .await;

    let client = embed_client(&server);
    let vectors = client
        .embed(&["first".to_string(), "second".to_string()])
        .await
        .expect("embeddings should parse");

    assert_eq!(vectors, vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]]);
    assert_eq!(client.dimension(), 3);
}

#[tokio::test]
async fn embedding_count_mismatch_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "index": 0, "embedding": [1.0, 0.0, 0.0] }]
        })))
        .mount(&server)
        .await;

    let err = embed_client(&server)
        .embed(&["a".to_string(), "b".to_string()])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedResponse);
}

#[tokio::test]
async fn rate_limited_embeddings_are_provider_quota() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let err = embed_client(&server)
        .embed(&["a".to_string()])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProviderQuota);
}
