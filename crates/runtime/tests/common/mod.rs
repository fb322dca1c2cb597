//! Scripted in-memory model clients.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use runtime::{
    Converse, ConverseRequest, ConverseResponse, InvokeModel, InvokeRequest, Message, ModelError,
};
use serde_json::{Value, json};

/// A raw request as seen by the client.
#[derive(Debug, Clone)]
pub struct RecordedInvoke {
    pub model_id: String,
    pub body: Value,
    pub content_type: String,
}

/// Replays canned raw responses in order and records every request.
#[derive(Default)]
pub struct ScriptedInvoke {
    replies: Mutex<VecDeque<Result<String, ModelError>>>,
    requests: Mutex<Vec<RecordedInvoke>>,
}

impl ScriptedInvoke {
    pub fn new(replies: impl IntoIterator<Item = Result<String, ModelError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::default(),
        }
    }

    /// Replies with Messages-style text responses.
    pub fn texts<'a>(texts: impl IntoIterator<Item = &'a str>) -> Self {
        Self::new(texts.into_iter().map(|text| Ok(text_response(text).to_string())))
    }

    pub fn requests(&self) -> Vec<RecordedInvoke> {
        self.requests.lock().unwrap().clone()
    }

    /// The prompt of the `n`th request.
    pub fn prompt(&self, n: usize) -> String {
        self.requests()[n].body["messages"][0]["content"]
            .as_str()
            .unwrap()
            .to_string()
    }
}

impl InvokeModel for ScriptedInvoke {
    async fn invoke_model(&self, request: InvokeRequest<'_>) -> Result<String, ModelError> {
        self.requests.lock().unwrap().push(RecordedInvoke {
            model_id: request.model_id.to_string(),
            body: serde_json::from_str(request.body).unwrap(),
            content_type: request.content_type.to_string(),
        });
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected model round")
    }
}

pub fn text_response(text: &str) -> Value {
    json!({
        "id": "msg_01",
        "type": "message",
        "role": "assistant",
        "content": [{"type": "text", "text": text}],
        "stop_reason": "end_turn"
    })
}

/// Replays canned structured responses and records the history each round saw.
#[derive(Default)]
pub struct ScriptedConverse {
    replies: Mutex<VecDeque<Result<ConverseResponse, ModelError>>>,
    seen: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedConverse {
    pub fn new(replies: impl IntoIterator<Item = Result<ConverseResponse, ModelError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            seen: Mutex::default(),
        }
    }

    pub fn rounds(&self) -> Vec<Vec<Message>> {
        self.seen.lock().unwrap().clone()
    }
}

impl Converse for ScriptedConverse {
    async fn converse(&self, request: ConverseRequest<'_>) -> Result<ConverseResponse, ModelError> {
        assert!(!request.tools.is_empty(), "tool specs must accompany every round");
        self.seen.lock().unwrap().push(request.messages.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected model round")
    }
}

/// Builds a structured response from its JSON form.
pub fn converse_response(value: Value) -> ConverseResponse {
    serde_json::from_value(value).unwrap()
}
