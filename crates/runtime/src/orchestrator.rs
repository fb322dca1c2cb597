//! Two-round text protocol.
//!
//! Round 1 shows the model the registry's documentation and asks for a
//! single call expression, or [`NO_TOOL_SENTINEL`] when no tool applies.
//! The call text goes through the invocation engine. If a tool ran, round 2
//! asserts its result as fact and asks the model to answer the original
//! message with it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::model::{InvokeModel, InvokeRequest, Role};
use crate::tools::{self, Registry};
use crate::{Error, Result};

/// The exact round-1 output meaning "no tool applies".
///
/// Its callee `not_found` is reserved: [`Tool::new`](crate::Tool::new)
/// rejects that name.
pub const NO_TOOL_SENTINEL: &str = "not_found()";

const CONTENT_TYPE: &str = "application/json";

/// One message of the caller's conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// The caller's request. Never modified; each round derives its own
/// single-message request from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationRequest {
    pub max_tokens: u32,
    pub messages: Vec<ChatMessage>,
    /// Protocol tag, forwarded verbatim.
    pub anthropic_version: String,
}

#[derive(Serialize)]
struct DerivedRequest<'a> {
    max_tokens: u32,
    messages: [DerivedMessage; 1],
    anthropic_version: &'a str,
}

#[derive(Serialize)]
struct DerivedMessage {
    role: Role,
    content: String,
}

impl ConversationRequest {
    pub fn new(
        max_tokens: u32,
        anthropic_version: impl Into<String>,
        messages: Vec<ChatMessage>,
    ) -> Self {
        Self {
            max_tokens,
            messages,
            anthropic_version: anthropic_version.into(),
        }
    }

    /// Content of the last message, after checking the request is usable.
    fn latest_content(&self) -> Result<&str> {
        if self.max_tokens == 0 {
            return Err(Error::InvalidRequest("max_tokens must be positive".into()));
        }
        self.messages
            .last()
            .map(|message| message.content.as_str())
            .ok_or_else(|| Error::InvalidRequest("messages must not be empty".into()))
    }

    /// Serialized single-message request carrying `prompt`.
    fn derive(&self, prompt: String) -> Result<String> {
        let request = DerivedRequest {
            max_tokens: self.max_tokens,
            messages: [DerivedMessage {
                role: Role::User,
                content: prompt,
            }],
            anthropic_version: &self.anthropic_version,
        };
        serde_json::to_string(&request).map_err(|e| Error::InvalidRequest(e.to_string()))
    }
}

/// Which call was attempted and what it returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInfo {
    pub tool_used: Option<String>,
    pub result: Option<Value>,
}

/// The outcome of one orchestration run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationResult {
    /// Raw response payload of the final round.
    pub invoke_response: Value,
    pub tool_info: ToolInfo,
}

/// What to do when the round-1 call text cannot be run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnInvalidCall {
    /// Return the validation, resolution or execution error.
    #[default]
    Fail,
    /// Finish without a tool, keeping the attempted text in `tool_used`.
    NoTool,
}

enum Selection {
    NoToolApplicable { attempted: Option<String> },
    ToolInvoked { call_text: String, result: Value },
}

/// Drives the text protocol against an [`InvokeModel`] client.
///
/// `run` borrows the orchestrator immutably and the registry can only be
/// changed through `registry_mut`, so it cannot change mid-run.
pub struct TextOrchestrator<C> {
    client: C,
    registry: Registry,
    on_invalid_call: OnInvalidCall,
}

impl<C: InvokeModel> TextOrchestrator<C> {
    pub fn new(client: C, registry: Registry) -> Self {
        Self {
            client,
            registry,
            on_invalid_call: OnInvalidCall::default(),
        }
    }

    pub fn on_invalid_call(mut self, policy: OnInvalidCall) -> Self {
        self.on_invalid_call = policy;
        self
    }

    pub fn policy(&self) -> OnInvalidCall {
        self.on_invalid_call
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Run both rounds for the latest message of `request`.
    ///
    /// Client errors are returned as [`Error::Model`] and no partial result
    /// is produced.
    pub async fn run(&self, model_id: &str, request: &ConversationRequest) -> Result<InvocationResult> {
        let content = request.latest_content()?;

        info!(model = model_id, tools = self.registry.len(), "Requesting tool selection");
        let response = self
            .round(model_id, request, selection_prompt(&self.registry.render_docs(), content))
            .await?;
        let call_text = response_text(&response)?.to_string();
        debug!(call = %call_text, "Model selected");

        match self.select(&call_text)? {
            Selection::NoToolApplicable { attempted } => {
                info!("No tool applied");
                Ok(InvocationResult {
                    invoke_response: response,
                    tool_info: ToolInfo {
                        tool_used: attempted,
                        result: None,
                    },
                })
            }
            Selection::ToolInvoked { call_text, result } => {
                info!(call = %call_text, result = %result, "Tool invoked, requesting final answer");
                let prompt = answer_prompt(&call_text, &result, content);
                let response = self.round(model_id, request, prompt).await?;
                Ok(InvocationResult {
                    invoke_response: response,
                    tool_info: ToolInfo {
                        tool_used: Some(call_text),
                        result: Some(result),
                    },
                })
            }
        }
    }

    fn select(&self, call_text: &str) -> Result<Selection> {
        if call_text == NO_TOOL_SENTINEL {
            return Ok(Selection::NoToolApplicable { attempted: None });
        }

        match tools::invoke(&self.registry, call_text) {
            Ok(result) => Ok(Selection::ToolInvoked {
                call_text: call_text.to_string(),
                result,
            }),
            Err(err) => match self.on_invalid_call {
                OnInvalidCall::Fail => Err(err),
                OnInvalidCall::NoTool => {
                    warn!(call = call_text, error = %err, "Tool selection failed, continuing without a tool");
                    Ok(Selection::NoToolApplicable {
                        attempted: Some(call_text.to_string()),
                    })
                }
            },
        }
    }

    async fn round(
        &self,
        model_id: &str,
        request: &ConversationRequest,
        prompt: String,
    ) -> Result<Value> {
        debug!(%prompt, "Sending round");
        let body = request.derive(prompt)?;
        let raw = self
            .client
            .invoke_model(InvokeRequest {
                model_id,
                body: &body,
                content_type: CONTENT_TYPE,
            })
            .await?;
        serde_json::from_str(&raw).map_err(|e| Error::MalformedResponse(e.to_string()))
    }
}

fn selection_prompt(docs: &str, content: &str) -> String {
    format!(
        "Considering the available functions below and only the functions below:\n{docs}\n\
         Generate a single function call in Python that supports part of the following prompt \
         (do not add any explanation, simply show the function call in Python):\n\
         {content}\n\
         If there are no available functions to support the prompt, return simply '{NO_TOOL_SENTINEL}'"
    )
}

fn answer_prompt(call_text: &str, result: &Value, content: &str) -> String {
    format!(
        "Considering, despite the information being right or wrong, that {call_text} = {}:\n\
         Simply answer without any comment regarding the fact that it's right or wrong:\n\
         {content}",
        display_value(result)
    )
}

/// Strings read naturally unquoted; everything else as JSON.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// The generated text of a Messages-style response.
fn response_text(response: &Value) -> Result<&str> {
    response
        .pointer("/content/0/text")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::MalformedResponse("missing content[0].text".into()))
}
