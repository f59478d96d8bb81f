use agent_market::server::services::LlmService;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn chat_completion_returns_first_choice() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer test-key"))
        .and(body_partial_json(json!({ "model": "gpt-4o" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [
                { "message": { "role": "assistant", "content": "the answer is 42" } }
            ]
        })))
        .mount(&mock_server)
        .await;

    let service = LlmService::new(&mock_server.uri(), "test-key", "gpt-4o");
    let solution = service
        .chat_completion("you are helpful", "what is the answer?")
        .await
        .unwrap();
    assert_eq!(solution, "the answer is 42");
}

#[tokio::test]
async fn chat_completion_surfaces_api_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": { "message": "rate limited" }
        })))
        .mount(&mock_server)
        .await;

    let service = LlmService::new(&mock_server.uri(), "test-key", "gpt-4o");
    let err = service
        .chat_completion("system", "user")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("rate limited"));
}

#[tokio::test]
async fn chat_completion_times_out_on_slow_upstream() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(std::time::Duration::from_secs(5))
                .set_body_json(json!({
                    "choices": [
                        { "message": { "role": "assistant", "content": "too late" } }
                    ]
                })),
        )
        .mount(&mock_server)
        .await;

    let service = LlmService::with_timeout(
        &mock_server.uri(),
        "test-key",
        "gpt-4o",
        std::time::Duration::from_millis(200),
    );
    let err = service.chat_completion("system", "user").await.unwrap_err();
    assert!(err.to_string().contains("Failed to reach completion API"));
}

#[tokio::test]
async fn chat_completion_rejects_empty_choices() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&mock_server)
        .await;

    let service = LlmService::new(&mock_server.uri(), "test-key", "gpt-4o");
    assert!(service.chat_completion("system", "user").await.is_err());
}
