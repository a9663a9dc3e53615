//! Integration tests for `OpenAiBackend` using wiremock HTTP mocks.

use launchpad_backend::{BackendError, FailureKind, GenerativeBackend, OpenAiBackend};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_backend(base_url: &str) -> OpenAiBackend {
    OpenAiBackend::with_base_url("sk-test", "test-model", 5, base_url)
        .expect("client construction should not fail")
}

#[tokio::test]
async fn complete_json_returns_output_text() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/responses"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(serde_json::json!({
            "model": "test-model",
            "text": { "format": { "type": "json_object" } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "resp_1",
            "output_text": "{\"angles\":[]}"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = test_backend(&server.uri());
    let text = backend
        .complete_json("design three angles")
        .await
        .expect("should return text");

    assert_eq!(text, "{\"angles\":[]}");
}

#[tokio::test]
async fn prompt_is_sent_as_input() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/responses"))
        .and(body_partial_json(serde_json::json!({ "input": "persona: chef" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "output": [{
                "type": "message",
                "content": [{ "type": "output_text", "text": "{\"ok\":true}" }]
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = test_backend(&server.uri());
    let text = backend.complete_json("persona: chef").await.expect("text");
    assert_eq!(text, "{\"ok\":true}");
}

#[tokio::test]
async fn unauthorized_is_transport_failure_without_retry() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/responses"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .expect(1)
        .mount(&server)
        .await;

    let backend = test_backend(&server.uri()).with_retry(3, 0);
    let err = backend.complete_json("x").await.unwrap_err();

    assert!(
        matches!(err, BackendError::UnexpectedStatus { status: 401, ref body } if body == "invalid api key"),
        "expected 401, got: {err:?}"
    );
    assert_eq!(err.kind(), FailureKind::TransportFailure);
}

#[tokio::test]
async fn server_errors_are_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/responses"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/responses"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "output_text": "{\"steps\":[]}" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let backend = test_backend(&server.uri()).with_retry(2, 0);
    let text = backend.complete_json("x").await.expect("third attempt succeeds");
    assert_eq!(text, "{\"steps\":[]}");
}

#[tokio::test]
async fn non_json_envelope_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/responses"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let backend = test_backend(&server.uri()).with_retry(3, 0);
    let err = backend.complete_json("x").await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::MalformedResponse);
}

#[tokio::test]
async fn envelope_without_text_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/responses"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "resp_2" })),
        )
        .mount(&server)
        .await;

    let backend = test_backend(&server.uri());
    let err = backend.complete_json("x").await.unwrap_err();
    assert!(
        matches!(err, BackendError::MalformedResponse { .. }),
        "expected MalformedResponse, got: {err:?}"
    );
}

#[tokio::test]
async fn slow_backend_times_out_as_transport_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/responses"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(std::time::Duration::from_secs(3))
                .set_body_json(serde_json::json!({ "output_text": "{}" })),
        )
        .mount(&server)
        .await;

    let backend = OpenAiBackend::with_base_url("sk-test", "test-model", 1, &server.uri())
        .expect("client construction should not fail");
    let err = backend.complete_json("x").await.unwrap_err();

    assert!(
        matches!(err, BackendError::Http(ref e) if e.is_timeout()),
        "expected timeout, got: {err:?}"
    );
    assert_eq!(err.kind(), FailureKind::TransportFailure);
}
