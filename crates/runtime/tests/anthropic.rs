//! Anthropic backend against a local mock server.

use pretty_assertions::assert_eq;
use runtime::{
    AnthropicAuth, AnthropicBackend, Arguments, ChatMessage, ContentBlock, Converse,
    ConverseRequest, ConversationRequest, InvokeModel, InvokeRequest, Message, ModelError,
    Registry, Role, StopReason, TextOrchestrator, Tool, ToolResult, ToolSpec,
};
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend(server: &MockServer) -> AnthropicBackend {
    AnthropicBackend::builder(AnthropicAuth::ApiKey("test-key".into()))
        .base_url(server.uri())
        .max_tokens(512)
        .build()
}

fn text_reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "msg_01",
        "type": "message",
        "role": "assistant",
        "content": [{"type": "text", "text": text}],
        "stop_reason": "end_turn",
        "usage": {"input_tokens": 12, "output_tokens": 4}
    }))
}

async fn received_bodies(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|request| request.body_json().unwrap())
        .collect()
}

#[tokio::test]
async fn invoke_model_moves_version_into_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "test-key"))
        .and(header("anthropic-version", "bedrock-2023-05-31"))
        .and(header("content-type", "application/json"))
        .respond_with(text_reply("not_found()"))
        .expect(1)
        .mount(&server)
        .await;

    let body = json!({
        "max_tokens": 100,
        "messages": [{"role": "user", "content": "hi"}],
        "anthropic_version": "bedrock-2023-05-31"
    })
    .to_string();
    let raw = backend(&server)
        .invoke_model(InvokeRequest {
            model_id: "claude-sonnet-4-20250514",
            body: &body,
            content_type: "application/json",
        })
        .await
        .unwrap();

    let response: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(response["content"][0]["text"], json!("not_found()"));
    assert_eq!(
        received_bodies(&server).await,
        [json!({
            "max_tokens": 100,
            "messages": [{"role": "user", "content": "hi"}],
            "model": "claude-sonnet-4-20250514"
        })]
    );
}

#[tokio::test]
async fn api_errors_carry_provider_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "type": "error",
            "error": {"type": "invalid_request_error", "message": "max_tokens: must be positive"}
        })))
        .mount(&server)
        .await;

    let err = backend(&server)
        .invoke_model(InvokeRequest {
            model_id: "m",
            body: r#"{"max_tokens": 0, "messages": []}"#,
            content_type: "application/json",
        })
        .await
        .unwrap_err();

    match err {
        ModelError::Api { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "max_tokens: must be positive");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn non_object_body_is_rejected_locally() {
    let server = MockServer::start().await;
    let err = backend(&server)
        .invoke_model(InvokeRequest {
            model_id: "m",
            body: "[1, 2]",
            content_type: "application/json",
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ModelError::InvalidRequest(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn bearer_auth_header() {
    let server = MockServer::start().await;
    Mock::given(header("authorization", "Bearer gateway-token"))
        .respond_with(text_reply("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let backend = AnthropicBackend::builder(AnthropicAuth::Bearer("gateway-token".into()))
        .base_url(server.uri())
        .build();
    backend
        .invoke_model(InvokeRequest {
            model_id: "m",
            body: r#"{"messages": []}"#,
            content_type: "application/json",
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn converse_translates_tool_use_both_ways() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({"model": "m", "max_tokens": 512})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [
                {"type": "text", "text": "Calculating."},
                {"type": "tool_use", "id": "toolu_9", "name": "calc", "input": {"a": 3, "b": 2}}
            ],
            "stop_reason": "tool_use",
            "usage": {"input_tokens": 30, "output_tokens": 12}
        })))
        .mount(&server)
        .await;

    let tools = [ToolSpec {
        name: "calc".into(),
        description: "Add two numbers.".into(),
        input_schema: json!({"type": "object", "required": ["a", "b"]}),
    }];
    let messages = [
        Message::user("Add 3 and 2"),
        Message {
            role: Role::User,
            content: vec![ContentBlock::ToolResult(ToolResult::json("toolu_0", json!(1)))],
        },
    ];
    let response = backend(&server)
        .converse(ConverseRequest {
            model_id: "m",
            messages: &messages,
            tools: &tools,
        })
        .await
        .unwrap();

    assert_eq!(response.stop_reason, StopReason::ToolUse);
    assert_eq!(response.usage.input_tokens, 30);
    let uses = response.output.tool_uses();
    assert_eq!(uses[0].tool_use_id, "toolu_9");
    assert_eq!(uses[0].input, json!({"a": 3, "b": 2}));

    let bodies = received_bodies(&server).await;
    let sent = &bodies[0];
    assert_eq!(
        sent["tools"],
        json!([{
            "name": "calc",
            "description": "Add two numbers.",
            "input_schema": {"type": "object", "required": ["a", "b"]}
        }])
    );
    assert_eq!(
        sent["messages"],
        json!([
            {"role": "user", "content": [{"type": "text", "text": "Add 3 and 2"}]},
            {"role": "user", "content": [{"type": "tool_result", "tool_use_id": "toolu_0", "content": "1"}]}
        ])
    );
}

#[tokio::test]
async fn undecodable_converse_response_is_invalid() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = backend(&server)
        .converse(ConverseRequest {
            model_id: "m",
            messages: &[Message::user("hi")],
            tools: &[],
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ModelError::InvalidResponse(_)));
}

#[tokio::test]
async fn text_protocol_over_http() {
    let server = MockServer::start().await;
    Mock::given(body_partial_json(json!({"max_tokens": 1024})))
        .respond_with(text_reply("add_wrong_math(6, 12)"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(text_reply("19 is odd."))
        .mount(&server)
        .await;

    let tool = Tool::new("add_wrong_math", "Adds two numbers, wrongly.", |args: &Arguments| {
        let a = args.number(0, "a")?.as_i64().unwrap_or_default();
        let b = args.number(1, "b")?.as_i64().unwrap_or_default();
        Ok(json!(a + b + 1))
    })
    .unwrap();
    let orchestrator = TextOrchestrator::new(backend(&server), Registry::from_tools([tool]).unwrap());

    let request = ConversationRequest::new(
        1024,
        "bedrock-2023-05-31",
        vec![ChatMessage::user("Sum 6 and 12, is it even?")],
    );
    let result = orchestrator.run("m", &request).await.unwrap();

    assert_eq!(result.tool_info.result, Some(json!(19)));
    assert_eq!(result.invoke_response["content"][0]["text"], json!("19 is odd."));
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}
