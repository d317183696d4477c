use super::error::ToolInvokeError;
use super::interface::{ToolSchema, ToolServiceInterface};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

/// Tool service client speaking JSON-RPC over a single HTTP endpoint
/// (`tools/list` for discovery, `tools/call` for execution).
pub struct HttpToolService {
    http: Client,
    base_url: String,
    auth_token: Option<String>,
    id_counter: AtomicU64,
}

impl HttpToolService {
    pub fn new(base_url: impl Into<String>, auth_token: Option<String>) -> Self {
        Self::with_client(base_url, auth_token, Client::new())
    }

    pub fn with_client(
        base_url: impl Into<String>,
        auth_token: Option<String>,
        client: Client,
    ) -> Self {
        Self {
            http: client,
            base_url: base_url.into(),
            auth_token,
            id_counter: AtomicU64::new(1),
        }
    }

    async fn send_request(&self, method: &str, params: Value) -> Result<Value, ToolInvokeError> {
        let id = self.id_counter.fetch_add(1, Ordering::SeqCst);
        let payload = json!({
            "jsonrpc": "2.0",
            "id": format!("req-{id}"),
            "method": method,
            "params": params
        });

        debug!(method, url = %self.base_url, "Sending request to tool service");
        let mut request = self.http.post(&self.base_url).json(&payload);
        if let Some(token) = &self.auth_token {
            request = request.header("Authorization", token);
        }

        let response = request
            .send()
            .await
            .map_err(|source| ToolInvokeError::Transport { source })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .ok()
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty());
            warn!(method, %status, "Tool service returned an error status");
            return Err(ToolInvokeError::Http { status, body });
        }

        let text = response
            .text()
            .await
            .map_err(|source| ToolInvokeError::Transport { source })?;
        let envelope: Value = serde_json::from_str(&text)
            .map_err(|source| ToolInvokeError::InvalidJson { source })?;
        unwrap_envelope(envelope)
    }
}

/// Stand-in used when no tool service is configured; the agent then runs
/// chat-only with an empty tool catalog.
pub struct DisabledToolService;

#[async_trait]
impl ToolServiceInterface for DisabledToolService {
    async fn invoke_tool(&self, _tool: &str, _arguments: Value) -> Result<Value, ToolInvokeError> {
        Err(ToolInvokeError::NotConfigured)
    }

    async fn list_tools(&self) -> Result<Vec<ToolSchema>, ToolInvokeError> {
        Ok(Vec::new())
    }
}

#[async_trait]
impl ToolServiceInterface for HttpToolService {
    async fn invoke_tool(&self, tool: &str, arguments: Value) -> Result<Value, ToolInvokeError> {
        let params = json!({
            "name": tool,
            "arguments": match arguments {
                Value::Null => Value::Object(Default::default()),
                other => other,
            }
        });
        let result = self.send_request("tools/call", params).await?;
        interpret_call_result(tool, result)
    }

    async fn list_tools(&self) -> Result<Vec<ToolSchema>, ToolInvokeError> {
        let result = self.send_request("tools/list", json!({})).await?;
        Ok(parse_tool_list(&result))
    }
}

/// Split a JSON-RPC envelope into its result, mapping `error` payloads.
fn unwrap_envelope(envelope: Value) -> Result<Value, ToolInvokeError> {
    if let Some(error) = envelope.get("error") {
        let code = error.get("code").and_then(Value::as_i64).unwrap_or(-32000);
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        return Err(ToolInvokeError::Rpc { code, message });
    }
    Ok(envelope.get("result").cloned().unwrap_or(Value::Null))
}

/// A `tools/call` result with `isError: true` becomes a failure so the
/// caller classifies it like any other invocation error.
fn interpret_call_result(tool: &str, result: Value) -> Result<Value, ToolInvokeError> {
    let is_error = result
        .get("isError")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if is_error {
        let message = extract_text(&result)
            .unwrap_or_else(|| "tool reported an unspecified failure".to_string());
        return Err(ToolInvokeError::Failed {
            tool: tool.to_string(),
            message,
        });
    }
    Ok(result)
}

/// Join the text blocks of a tool result payload.
pub(crate) fn extract_text(result: &Value) -> Option<String> {
    let array = result.get("content").and_then(Value::as_array)?;
    let mut blocks = Vec::new();
    for block in array {
        let is_text = block
            .get("type")
            .and_then(Value::as_str)
            .map(|value| value.eq_ignore_ascii_case("text"))
            .unwrap_or(false);
        if is_text {
            if let Some(text) = block.get("text").and_then(Value::as_str) {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    blocks.push(trimmed.to_string());
                }
            }
        }
    }
    if blocks.is_empty() {
        None
    } else {
        Some(blocks.join("\n"))
    }
}

fn parse_tool_list(result: &Value) -> Vec<ToolSchema> {
    let mut schemas = Vec::new();
    if let Some(array) = result.get("tools").and_then(Value::as_array) {
        for tool in array {
            if let Some(name) = tool.get("name").and_then(Value::as_str) {
                schemas.push(ToolSchema {
                    name: name.to_string(),
                    description: tool
                        .get("description")
                        .and_then(Value::as_str)
                        .map(|text| text.to_string()),
                    input_schema: tool.get("inputSchema").cloned(),
                });
            }
        }
    }
    schemas
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_surfaces_rpc_errors() {
        let envelope = json!({
            "jsonrpc": "2.0",
            "id": "req-1",
            "error": { "code": -32601, "message": "method not found" }
        });
        let err = unwrap_envelope(envelope).expect_err("rpc error");
        assert!(matches!(
            err,
            ToolInvokeError::Rpc { code: -32601, ref message } if message == "method not found"
        ));
    }

    #[test]
    fn envelope_unwraps_result() {
        let envelope = json!({ "jsonrpc": "2.0", "id": "req-2", "result": { "ok": true } });
        let result = unwrap_envelope(envelope).expect("result");
        assert_eq!(result, json!({ "ok": true }));
    }

    #[test]
    fn call_result_with_is_error_becomes_failure() {
        let result = json!({
            "content": [ { "type": "text", "text": "no such region" } ],
            "isError": true
        });
        let err = interpret_call_result("getCost", result).expect_err("failure");
        assert!(matches!(
            err,
            ToolInvokeError::Failed { ref tool, ref message }
                if tool == "getCost" && message == "no such region"
        ));
    }

    #[test]
    fn text_blocks_are_joined() {
        let result = json!({
            "content": [
                { "type": "text", "text": " first " },
                { "type": "image", "data": "..." },
                { "type": "text", "text": "second" }
            ]
        });
        assert_eq!(extract_text(&result).as_deref(), Some("first\nsecond"));
    }

    #[test]
    fn tool_list_parses_schemas() {
        let result = json!({
            "tools": [
                {
                    "name": "getCost",
                    "description": "Query cost records",
                    "inputSchema": { "type": "object" }
                },
                { "name": "getUsage" }
            ]
        });
        let schemas = parse_tool_list(&result);
        assert_eq!(schemas.len(), 2);
        assert_eq!(schemas[0].name, "getCost");
        assert_eq!(schemas[0].description.as_deref(), Some("Query cost records"));
        assert!(schemas[1].input_schema.is_none());
    }
}
