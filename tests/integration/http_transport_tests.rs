/*!
 * Integration tests for the reqwest step transport against a mock endpoint
 */

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bulk_translate::app_config::ApiConfig;
use bulk_translate::errors::TransportError;
use bulk_translate::protocol::{HttpStepTransport, Step, StepRequest, StepTransport};
use bulk_translate::{StepError, StepProtocolClient};

use crate::common;

const STEP_PATH: &str = "/wp-json/translate/v1/translate/chunked";

fn transport_for(server: &MockServer, token: &str) -> HttpStepTransport {
    let config = ApiConfig {
        base_url: format!("{}/wp-json/translate/v1", server.uri()),
        token: token.to_string(),
        timeout_secs: 5,
        ..ApiConfig::default()
    };
    HttpStepTransport::from_config(&config).unwrap()
}

fn init_request(source_post_id: u64) -> StepRequest {
    StepRequest {
        source_post_id,
        target_language: "es".to_string(),
        target_post_id: 0,
        step: Step::Init,
        job_id: 0,
    }
}

#[tokio::test]
async fn test_send_step_withInit_shouldPostJsonWithToken() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(STEP_PATH))
        .and(header("X-WP-Nonce", "nonce-123"))
        .and(body_partial_json(json!({
            "source_post_id": 10,
            "target_language": "es",
            "target_post_id": 0,
            "step": "init",
            "job_id": 0
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "job_id": 77,
            "chunk_count": 2
        })))
        .expect(1)
        .mount(&server)
        .await;

    let transport = transport_for(&server, "nonce-123");
    let response = transport.send_step(&init_request(10)).await.unwrap();

    assert!(response.success);
    assert_eq!(response.job_id, Some(77));
    assert_eq!(response.chunk_count, Some(2));
}

#[tokio::test]
async fn test_send_step_withErrorStatusAndMessage_shouldReturnHttpError() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(STEP_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "code": "rest_cookie_invalid_nonce",
            "message": "Cookie check failed"
        })))
        .mount(&server)
        .await;

    let transport = transport_for(&server, "stale");
    let error = transport.send_step(&init_request(10)).await.unwrap_err();

    match &error {
        TransportError::Http { status, message } => {
            assert_eq!(*status, 403);
            assert_eq!(message.as_deref(), Some("Cookie check failed"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(StepError::from(error).to_string(), "Cookie check failed");
}

#[tokio::test]
async fn test_send_step_withHtmlErrorPage_shouldHaveNoMessage() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(STEP_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>Fatal error</html>"))
        .mount(&server)
        .await;

    let error = transport_for(&server, "")
        .send_step(&init_request(10))
        .await
        .unwrap_err();

    assert!(matches!(error, TransportError::Http { status: 500, message: None }));
    assert_eq!(StepError::from(error).to_string(), "Request failed");
}

#[tokio::test]
async fn test_send_step_withUnparseableBody_shouldReturnMalformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(STEP_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let error = transport_for(&server, "")
        .send_step(&init_request(10))
        .await
        .unwrap_err();
    assert!(matches!(error, TransportError::Malformed(_)));
}

#[tokio::test]
async fn test_send_step_withUnreachableServer_shouldReturnConnectionError() {
    let server = MockServer::start().await;
    let transport = transport_for(&server, "");
    drop(server);

    let error = transport.send_step(&init_request(10)).await.unwrap_err();
    assert!(matches!(error, TransportError::Connection(_)));
}

#[tokio::test]
async fn test_send_step_withSlowServer_shouldTimeOut() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(STEP_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let transport = HttpStepTransport::new(
        HttpStepTransport::resolve_endpoint(
            &format!("{}/wp-json/translate/v1", server.uri()),
            "translate/chunked",
        )
        .unwrap(),
        "X-WP-Nonce",
        "",
        Duration::from_millis(200),
    );

    let error = transport.send_step(&init_request(10)).await.unwrap_err();
    assert!(matches!(error, TransportError::Connection(_)));
}

#[tokio::test]
async fn test_client_overHttp_shouldRunFullStepSequence() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(STEP_PATH))
        .and(body_partial_json(json!({"step": "init"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "job_id": 5,
            "chunk_count": 2
        })))
        .expect(1)
        .mount(&server)
        .await;
    for step in ["title", "content_0", "content_1", "excerpt", "finalize"] {
        Mock::given(method("POST"))
            .and(path(STEP_PATH))
            .and(body_partial_json(json!({"step": step, "job_id": 5})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;
    }

    let client = StepProtocolClient::new(Arc::new(transport_for(&server, "")));
    let receipt = client
        .translate(&common::item(10, "es"), || false, |_| {})
        .await
        .unwrap();

    assert_eq!(receipt.job_id, 5);
    assert_eq!(receipt.steps_completed, 6);
    server.verify().await;
}
