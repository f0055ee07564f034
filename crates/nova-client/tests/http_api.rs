use futures::StreamExt;
use nova_client::{
    ChatCompletionRequest, EmbeddingRequest, Error, Message, SenseNovaApi, SenseNovaClient,
    SenseNovaConfig,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> SenseNovaClient {
    let config = SenseNovaConfig::new("ak-test", "sk-test").with_api_base(server.uri());
    SenseNovaClient::new(config).expect("client")
}

fn chat_request(prompt: &str) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: "SenseChat-32K".to_string(),
        messages: vec![Message::new("user", prompt)],
        ..Default::default()
    }
}

#[tokio::test]
async fn chat_completion_returns_top_choice() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat-completions"))
        .and(header_exists("authorization"))
        .and(body_partial_json(json!({
            "model": "SenseChat-32K",
            "messages": [{"role": "user", "content": "Say this is a test!"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "id": "chat-1",
                "choices": [{"index": 0, "role": "assistant", "message": "This is a test!", "finish_reason": "stop"}],
                "usage": {"prompt_tokens": 6, "completion_tokens": 5, "total_tokens": 11}
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let response = client
        .chat_completion(&chat_request("Say this is a test!"))
        .await
        .unwrap();

    assert_eq!(response.first_message(), Some("This is a test!"));
}

#[tokio::test]
async fn vendor_error_is_surfaced_with_code() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat-completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"code": 16, "message": "invalid access key", "details": []}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.chat_completion(&chat_request("hi")).await.unwrap_err();

    match err {
        Error::Api { status, code, message } => {
            assert_eq!(status, 401);
            assert_eq!(code, Some(16));
            assert_eq!(message, "invalid access key");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn non_json_error_body_is_kept_verbatim() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let request = EmbeddingRequest {
        model: "nova-embedding-stable".to_string(),
        input: vec!["hello".to_string()],
    };
    let err = client.embeddings(&request).await.unwrap_err();

    assert!(matches!(
        err,
        Error::Api { status: 503, code: None, ref message } if message == "upstream unavailable"
    ));
}

#[tokio::test]
async fn stream_yields_deltas_until_done() {
    let server = MockServer::start().await;

    let body = [
        r#"data:{"data":{"id":"s1","choices":[{"index":0,"role":"assistant","delta":"This ","finish_reason":""}]}}"#,
        r#"data:{"data":{"id":"s1","choices":[{"index":0,"role":"assistant","delta":"is a ","finish_reason":""}]}}"#,
        r#"data:{"data":{"id":"s1","choices":[{"index":0,"role":"assistant","delta":"test!","finish_reason":"stop"}]}}"#,
        "data:[DONE]",
    ]
    .join("\n\n")
        + "\n\n";

    Mock::given(method("POST"))
        .and(path("/chat-completions"))
        .and(body_partial_json(json!({"stream": true})))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut stream = client
        .chat_completion_stream(&chat_request("Say this is a test!"))
        .await
        .unwrap();

    let mut pieces = Vec::new();
    while let Some(chunk) = stream.next().await {
        pieces.push(chunk.unwrap().first_message().unwrap_or_default().to_string());
    }

    assert_eq!(pieces, vec!["This ", "is a ", "test!"]);
}

#[tokio::test]
async fn embeddings_preserve_vendor_order() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .and(body_partial_json(json!({"model": "nova-embedding-stable", "input": ["What I Worked On"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embeddings": [{"index": 0, "embedding": [0.5, 0.25], "status_code": 0, "status_message": "success"}],
            "usage": {"prompt_tokens": 4, "total_tokens": 4}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let request = EmbeddingRequest {
        model: "nova-embedding-stable".to_string(),
        input: vec!["What I Worked On".to_string()],
    };
    let response = client.embeddings(&request).await.unwrap();

    assert_eq!(response.embeddings[0].embedding, vec![0.5, 0.25]);
}
