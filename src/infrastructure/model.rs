use crate::tooling::ToolSchema;
use crate::types::{InvalidToolCallRequest, Message, ToolCallRequest};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub tools: Vec<ToolSchema>,
}

#[derive(Debug, Clone)]
pub struct ModelReply {
    /// Always an `AssistantResponse`, with tool calls already split into
    /// valid and invalid.
    pub message: Message,
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("model endpoint returned status {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("model provider returned invalid response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait ModelProvider: Send + Sync {
    async fn chat(&self, request: ModelRequest) -> Result<ModelReply, ModelError>;
}

/// Client for OpenAI-compatible chat-completion endpoints with native tool
/// calling (works against Ollama's /v1 surface and hosted providers alike).
#[derive(Clone)]
pub struct OpenAiCompatClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenAiCompatClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self::with_client(base_url, api_key, Client::new())
    }

    pub fn with_client(
        base_url: impl Into<String>,
        api_key: Option<String>,
        client: Client,
    ) -> Self {
        Self {
            http: client,
            base_url: base_url.into(),
            api_key,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        let trimmed = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{trimmed}/{path}")
    }
}

#[async_trait]
impl ModelProvider for OpenAiCompatClient {
    async fn chat(&self, request: ModelRequest) -> Result<ModelReply, ModelError> {
        let url = self.endpoint("/chat/completions");
        let payload = ChatCompletionRequest::build(&request);
        info!(
            model = request.model.as_str(),
            url = %url,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Sending request to model provider"
        );

        let mut http_request = self.http.post(&url).json(&payload);
        if let Some(key) = &self.api_key {
            http_request = http_request.bearer_auth(key);
        }
        let response = http_request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Status { status, body });
        }

        let completion: ChatCompletionResponse = response.json().await?;
        debug!("Received response from model provider");

        let message = completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| ModelError::InvalidResponse("missing choices in completion".into()))?;

        Ok(ModelReply {
            message: into_assistant_message(message, &request.tools),
        })
    }
}

impl ModelError {
    pub fn user_message(&self) -> String {
        match self {
            ModelError::Network(err) => {
                if err.is_connect() {
                    "Cannot reach the model endpoint. Check that the inference service is running and the URL is correct."
                        .to_string()
                } else if err.is_timeout() {
                    "The model request timed out. Try again in a moment.".to_string()
                } else {
                    "A network error occurred while contacting the model endpoint. Try again later."
                        .to_string()
                }
            }
            ModelError::Status { status, .. } => match *status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    "The model endpoint rejected the credentials. Check ORRERY_API_KEY."
                        .to_string()
                }
                StatusCode::NOT_FOUND => {
                    "Model endpoint not found (404). Check that the inference URL points at an OpenAI-compatible /v1 base."
                        .to_string()
                }
                StatusCode::SERVICE_UNAVAILABLE | StatusCode::BAD_GATEWAY => {
                    "The model service is unavailable right now. Try again later.".to_string()
                }
                other => format!(
                    "The model request failed with status {}. Try again later.",
                    other.as_u16()
                ),
            },
            ModelError::InvalidResponse(_) => {
                "The model returned a response that could not be processed. Try again.".to_string()
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<String>,
    stream: bool,
}

impl ChatCompletionRequest {
    fn build(request: &ModelRequest) -> Self {
        let tools: Vec<WireTool> = request.tools.iter().map(WireTool::from).collect();
        Self {
            model: request.model.clone(),
            messages: request.messages.iter().map(WireMessage::from).collect(),
            tool_choice: if tools.is_empty() {
                None
            } else {
                Some("auto".to_string())
            },
            tools: if tools.is_empty() { None } else { Some(tools) },
            stream: false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: WireMessage,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(rename = "type", default = "function_call_type")]
    kind: String,
    function: WireFunctionCall,
}

fn function_call_type() -> String {
    "function".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}

#[derive(Debug, Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    kind: String,
    function: WireFunctionDef,
}

#[derive(Debug, Serialize)]
struct WireFunctionDef {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    parameters: Value,
}

impl From<&ToolSchema> for WireTool {
    fn from(value: &ToolSchema) -> Self {
        Self {
            kind: "function".to_string(),
            function: WireFunctionDef {
                name: value.name.clone(),
                description: value.description.clone(),
                parameters: value
                    .input_schema
                    .clone()
                    .unwrap_or_else(|| json!({ "type": "object" })),
            },
        }
    }
}

impl From<&Message> for WireMessage {
    fn from(value: &Message) -> Self {
        let role = value.role_label().to_string();
        match value {
            Message::SystemDirective { content } | Message::UserQuery { content } => WireMessage {
                role,
                content: Some(content.clone()),
                tool_calls: None,
                tool_call_id: None,
            },
            Message::AssistantResponse {
                content,
                tool_calls,
                invalid_calls,
            } => {
                // Invalid calls are re-sent too so every correlated tool
                // message in later requests has a matching call id.
                let mut calls: Vec<WireToolCall> = tool_calls
                    .iter()
                    .map(|call| WireToolCall {
                        id: Some(call.id.clone()),
                        kind: "function".to_string(),
                        function: WireFunctionCall {
                            name: Some(call.name.clone()),
                            arguments: Some(call.arguments.to_string()),
                        },
                    })
                    .collect();
                calls.extend(invalid_calls.iter().map(|call| WireToolCall {
                    id: Some(call.id.clone()),
                    kind: "function".to_string(),
                    function: WireFunctionCall {
                        name: Some(
                            call.name
                                .clone()
                                .unwrap_or_else(|| "unknown".to_string()),
                        ),
                        arguments: Some(call.arguments.clone()),
                    },
                }));
                WireMessage {
                    role,
                    content: Some(content.clone()),
                    tool_calls: if calls.is_empty() { None } else { Some(calls) },
                    tool_call_id: None,
                }
            }
            Message::ToolResult {
                call_id, content, ..
            } => WireMessage {
                role,
                content: Some(content.clone()),
                tool_calls: None,
                tool_call_id: Some(call_id.clone()),
            },
        }
    }
}

/// Split the raw completion message into the domain assistant response,
/// sorting each raw tool call into the valid or the invalid list.
fn into_assistant_message(message: WireMessage, tools: &[ToolSchema]) -> Message {
    let content = message.content.unwrap_or_default();
    let mut tool_calls = Vec::new();
    let mut invalid_calls = Vec::new();

    for raw in message.tool_calls.unwrap_or_default() {
        let id = raw
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(generated_call_id);
        match classify_raw_call(&raw.function, tools) {
            Ok((name, arguments)) => tool_calls.push(ToolCallRequest {
                id,
                name,
                arguments,
            }),
            Err(reason) => invalid_calls.push(InvalidToolCallRequest {
                id,
                name: raw
                    .function
                    .name
                    .clone()
                    .filter(|name| !name.trim().is_empty()),
                arguments: raw.function.arguments.clone().unwrap_or_default(),
                reason,
            }),
        }
    }

    Message::assistant(content, tool_calls, invalid_calls)
}

/// Schema validation for one raw call: the name must be present, the
/// argument text must decode to a JSON object, and arguments required by
/// the tool's input schema must all be present.
fn classify_raw_call(
    function: &WireFunctionCall,
    tools: &[ToolSchema],
) -> Result<(String, Value), String> {
    let name = function
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| "missing function name".to_string())?;

    let raw_arguments = match function.arguments.as_deref() {
        Some(text) if !text.trim().is_empty() => text,
        _ => "{}",
    };
    let arguments: Value = serde_json::from_str(raw_arguments)
        .map_err(|err| format!("arguments are not valid JSON: {err}"))?;
    if !arguments.is_object() {
        return Err("arguments did not decode to an object".to_string());
    }

    if let Some(schema) = tools
        .iter()
        .find(|tool| tool.name.eq_ignore_ascii_case(name))
    {
        if let Some(required) = schema
            .input_schema
            .as_ref()
            .and_then(|schema| schema.get("required"))
            .and_then(Value::as_array)
        {
            for field in required.iter().filter_map(Value::as_str) {
                if arguments.get(field).is_none() {
                    return Err(format!("missing required argument '{field}'"));
                }
            }
        }
    }

    Ok((name.to_string(), arguments))
}

fn generated_call_id() -> String {
    format!("call_{}", Uuid::new_v4().simple())
}
