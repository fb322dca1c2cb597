//! Provider-native tool use loop.

use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::model::{
    ContentBlock, Converse, ConverseRequest, ConverseResponse, Message, Role, StopReason,
    ToolResult, ToolSpec,
};
use crate::tools::DispatchTable;
use crate::{Error, Result};

/// One executed tool request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolUseRecord {
    pub tool_use_id: String,
    pub name: String,
    pub input: Value,
    pub output: Value,
}

/// The outcome of a structured exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredOutcome {
    /// The final round's response.
    pub response: ConverseResponse,
    /// The full history, including every model output and tool result.
    pub messages: Vec<Message>,
    /// Tools run between the rounds, in request order. Empty when the model
    /// answered directly.
    pub tool_uses: Vec<ToolUseRecord>,
}

/// Drives at most two [`Converse`] rounds against a fixed dispatch table.
pub struct StructuredLoop<C> {
    client: C,
    tools: DispatchTable,
}

impl<C: Converse> StructuredLoop<C> {
    pub fn new(client: C, tools: DispatchTable) -> Self {
        Self { client, tools }
    }

    pub fn tools(&self) -> &DispatchTable {
        &self.tools
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Start a conversation from a single user message.
    pub async fn ask(&self, model_id: &str, input_text: impl Into<String>) -> Result<StructuredOutcome> {
        self.run(model_id, vec![Message::user(input_text)]).await
    }

    /// Send `messages`, run every requested tool, and send the results back.
    pub async fn run(&self, model_id: &str, mut messages: Vec<Message>) -> Result<StructuredOutcome> {
        if messages.is_empty() {
            return Err(Error::InvalidRequest("messages must not be empty".into()));
        }
        let specs = self.tools.specs();

        info!(model = model_id, "Generating text");
        let response = self.send(model_id, &messages, &specs).await?;
        messages.push(response.output.clone());

        if response.stop_reason != StopReason::ToolUse {
            return Ok(StructuredOutcome {
                response,
                messages,
                tool_uses: Vec::new(),
            });
        }

        let mut records = Vec::new();
        for tool_use in response.output.tool_uses() {
            info!(tool = %tool_use.name, id = %tool_use.tool_use_id, "Requesting tool");
            let output = self.tools.call(&tool_use.name, &tool_use.input)?;
            info!(id = %tool_use.tool_use_id, %output, "Tool returned");
            records.push(ToolUseRecord {
                tool_use_id: tool_use.tool_use_id.clone(),
                name: tool_use.name.clone(),
                input: tool_use.input.clone(),
                output,
            });
        }
        if records.is_empty() {
            return Err(Error::MalformedResponse(
                "stop reason is tool_use but no tool was requested".into(),
            ));
        }

        messages.push(Message {
            role: Role::User,
            content: records
                .iter()
                .map(|record| {
                    ContentBlock::ToolResult(ToolResult::json(
                        record.tool_use_id.clone(),
                        record.output.clone(),
                    ))
                })
                .collect(),
        });

        let response = self.send(model_id, &messages, &specs).await?;
        messages.push(response.output.clone());
        info!(stop_reason = response.stop_reason.as_str(), "Final answer received");

        Ok(StructuredOutcome {
            response,
            messages,
            tool_uses: records,
        })
    }

    async fn send(
        &self,
        model_id: &str,
        messages: &[Message],
        tools: &[ToolSpec],
    ) -> Result<ConverseResponse> {
        let request = ConverseRequest {
            model_id,
            messages,
            tools,
        };
        Ok(self.client.converse(request).await?)
    }
}
