//! Anthropic Messages API backend.

use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::model::{
    ContentBlock, Converse, ConverseRequest, ConverseResponse, InvokeModel, InvokeRequest,
    Message, ModelError, Role, StopReason, ToolResult, ToolResultContent, ToolResultStatus,
    ToolSpec, ToolUse, Usage,
};

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_ANTHROPIC_VERSION: &str = "2023-06-01";
const JSON: &str = "application/json";

/// Authentication mode for Anthropic API.
#[derive(Debug, Clone)]
pub enum AnthropicAuth {
    /// Standard API key authentication.
    ApiKey(String),
    /// Bearer token, for gateways in front of the API.
    Bearer(String),
}

impl std::fmt::Display for AnthropicAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ApiKey(_) => write!(f, "api_key"),
            Self::Bearer(_) => write!(f, "bearer"),
        }
    }
}

impl AnthropicAuth {
    fn apply_headers(&self, req: RequestBuilder) -> RequestBuilder {
        match self {
            Self::ApiKey(key) => req.header("x-api-key", key),
            Self::Bearer(token) => req.header("Authorization", format!("Bearer {token}")),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// API Wire Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ApiTool<'a>>,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: &'static str,
    content: Vec<ApiContentBlock>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        is_error: bool,
    },
}

#[derive(Debug, Serialize)]
struct ApiTool<'a> {
    name: &'a str,
    description: &'a str,
    input_schema: &'a Value,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    content: Vec<ApiResponseBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiResponseBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    input_tokens: u32,
    output_tokens: u32,
}

// ─────────────────────────────────────────────────────────────────────────────
// Backend Implementation
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for creating an Anthropic backend.
#[derive(Debug, Clone)]
pub struct AnthropicBackendBuilder {
    auth: AnthropicAuth,
    base_url: String,
    anthropic_version: String,
    max_tokens: u32,
}

impl AnthropicBackendBuilder {
    pub fn new(auth: AnthropicAuth) -> Self {
        Self {
            auth,
            base_url: DEFAULT_BASE_URL.to_string(),
            anthropic_version: DEFAULT_ANTHROPIC_VERSION.to_string(),
            max_tokens: 4096,
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Version header used when a raw body carries none.
    pub fn anthropic_version(mut self, version: impl Into<String>) -> Self {
        self.anthropic_version = version.into();
        self
    }

    /// Token budget for structured requests.
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn build(self) -> AnthropicBackend {
        AnthropicBackend {
            client: reqwest::Client::new(),
            auth: self.auth,
            endpoint: format!("{}/v1/messages", self.base_url.trim_end_matches('/')),
            anthropic_version: self.anthropic_version,
            max_tokens: self.max_tokens,
        }
    }
}

/// Anthropic API backend.
///
/// Serves both client contracts: raw bodies for the text protocol and
/// Converse-shaped messages for structured tool use.
pub struct AnthropicBackend {
    client: reqwest::Client,
    auth: AnthropicAuth,
    endpoint: String,
    anthropic_version: String,
    max_tokens: u32,
}

impl AnthropicBackend {
    pub fn builder(auth: AnthropicAuth) -> AnthropicBackendBuilder {
        AnthropicBackendBuilder::new(auth)
    }

    fn role_to_api(role: Role) -> &'static str {
        match role {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    fn message_to_api(msg: &Message) -> ApiMessage {
        let content = msg
            .content
            .iter()
            .map(|block| match block {
                ContentBlock::Text(text) => ApiContentBlock::Text { text: text.clone() },
                ContentBlock::ToolUse(tool_use) => ApiContentBlock::ToolUse {
                    id: tool_use.tool_use_id.clone(),
                    name: tool_use.name.clone(),
                    input: tool_use.input.clone(),
                },
                ContentBlock::ToolResult(result) => Self::tool_result_to_api(result),
            })
            .collect();

        ApiMessage {
            role: Self::role_to_api(msg.role),
            content,
        }
    }

    fn tool_result_to_api(result: &ToolResult) -> ApiContentBlock {
        let content = result
            .content
            .iter()
            .map(|part| match part {
                ToolResultContent::Json(value) => value.to_string(),
                ToolResultContent::Text(text) => text.clone(),
            })
            .collect::<Vec<_>>()
            .join("\n");
        ApiContentBlock::ToolResult {
            tool_use_id: result.tool_use_id.clone(),
            content,
            is_error: result.status == Some(ToolResultStatus::Error),
        }
    }

    fn tool_to_api(spec: &ToolSpec) -> ApiTool<'_> {
        ApiTool {
            name: &spec.name,
            description: &spec.description,
            input_schema: &spec.input_schema,
        }
    }

    fn response_to_converse(response: ApiResponse) -> ConverseResponse {
        let content = response
            .content
            .into_iter()
            .filter_map(|block| match block {
                ApiResponseBlock::Text { text } => Some(ContentBlock::Text(text)),
                ApiResponseBlock::ToolUse { id, name, input } => Some(ContentBlock::ToolUse(ToolUse {
                    tool_use_id: id,
                    name,
                    input,
                })),
                ApiResponseBlock::Unknown => None,
            })
            .collect();

        ConverseResponse {
            output: Message {
                role: Role::Assistant,
                content,
            },
            stop_reason: response.stop_reason.map(StopReason::from).unwrap_or_default(),
            usage: response
                .usage
                .map(|usage| Usage {
                    input_tokens: usage.input_tokens,
                    output_tokens: usage.output_tokens,
                })
                .unwrap_or_default(),
        }
    }

    async fn post(&self, version: &str, content_type: &str, body: String) -> Result<String, ModelError> {
        debug!(endpoint = %self.endpoint, version, "Posting to messages API");
        let req = self
            .client
            .post(&self.endpoint)
            .header("anthropic-version", version)
            .header("content-type", content_type)
            .header("accept", JSON);

        let req = self.auth.apply_headers(req);

        let response = req
            .body(body)
            .send()
            .await
            .map_err(|e| ModelError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ModelError::Network(e.to_string()))?;
        if !status.is_success() {
            return Err(ModelError::api(status.as_u16(), &text));
        }
        Ok(text)
    }
}

impl std::fmt::Display for AnthropicBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "anthropic({}, auth={})", self.endpoint, self.auth)
    }
}

impl InvokeModel for AnthropicBackend {
    async fn invoke_model(&self, request: InvokeRequest<'_>) -> Result<String, ModelError> {
        let mut body: Value = serde_json::from_str(request.body)
            .map_err(|e| ModelError::InvalidRequest(e.to_string()))?;
        let Some(object) = body.as_object_mut() else {
            return Err(ModelError::InvalidRequest("body must be a JSON object".into()));
        };

        let version = match object.remove("anthropic_version") {
            Some(Value::String(version)) => version,
            Some(_) => {
                return Err(ModelError::InvalidRequest(
                    "anthropic_version must be a string".into(),
                ));
            }
            None => self.anthropic_version.clone(),
        };
        object.insert("model".into(), Value::String(request.model_id.to_string()));

        self.post(&version, request.content_type, body.to_string()).await
    }
}

impl Converse for AnthropicBackend {
    async fn converse(&self, request: ConverseRequest<'_>) -> Result<ConverseResponse, ModelError> {
        let api_request = ApiRequest {
            model: request.model_id,
            max_tokens: self.max_tokens,
            messages: request.messages.iter().map(Self::message_to_api).collect(),
            tools: request.tools.iter().map(Self::tool_to_api).collect(),
        };
        let body = serde_json::to_string(&api_request)
            .map_err(|e| ModelError::InvalidRequest(e.to_string()))?;

        let text = self.post(&self.anthropic_version, JSON, body).await?;
        let api_response: ApiResponse = serde_json::from_str(&text)
            .map_err(|e| ModelError::InvalidResponse(e.to_string()))?;

        Ok(Self::response_to_converse(api_response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn auth_display() {
        let api = AnthropicAuth::ApiKey("test".into());
        let bearer = AnthropicAuth::Bearer("test".into());
        assert_eq!(api.to_string(), "api_key");
        assert_eq!(bearer.to_string(), "bearer");
    }

    #[test]
    fn backend_display_hides_credentials() {
        let backend = AnthropicBackend::builder(AnthropicAuth::ApiKey("sk-secret".into()))
            .base_url("http://localhost:9000/")
            .build();
        let shown = backend.to_string();
        assert_eq!(shown, "anthropic(http://localhost:9000/v1/messages, auth=api_key)");
        assert!(!shown.contains("sk-secret"));
    }

    #[test]
    fn tool_results_become_api_blocks() {
        let message = Message {
            role: Role::User,
            content: vec![ContentBlock::ToolResult(ToolResult::json(
                "toolu_1",
                json!({"operation": 5}),
            ))],
        };
        let api = serde_json::to_value(AnthropicBackend::message_to_api(&message)).unwrap();
        assert_eq!(
            api,
            json!({
                "role": "user",
                "content": [{
                    "type": "tool_result",
                    "tool_use_id": "toolu_1",
                    "content": "{\"operation\":5}"
                }]
            })
        );
    }

    #[test]
    fn error_results_are_flagged() {
        let result = ToolResult {
            tool_use_id: "t".into(),
            content: vec![ToolResultContent::Text("boom".into())],
            status: Some(ToolResultStatus::Error),
        };
        let api = serde_json::to_value(AnthropicBackend::tool_result_to_api(&result)).unwrap();
        assert_eq!(api["is_error"], json!(true));
        assert_eq!(api["content"], json!("boom"));
    }

    #[test]
    fn response_maps_to_converse_shape() {
        let response: ApiResponse = serde_json::from_value(json!({
            "content": [
                {"type": "text", "text": "Let me add."},
                {"type": "thinking", "thinking": "..."},
                {"type": "tool_use", "id": "toolu_1", "name": "calc", "input": {"a": 3, "b": 2}}
            ],
            "stop_reason": "tool_use",
            "usage": {"input_tokens": 10, "output_tokens": 5}
        }))
        .unwrap();

        let converse = AnthropicBackend::response_to_converse(response);
        assert_eq!(converse.stop_reason, StopReason::ToolUse);
        assert_eq!(converse.output.content.len(), 2);
        assert_eq!(converse.output.tool_uses()[0].tool_use_id, "toolu_1");
        assert_eq!(converse.usage.output_tokens, 5);
    }
}
