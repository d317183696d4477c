use async_trait::async_trait;
use serde_json::Value;

use super::error::ToolInvokeError;

/// Tool description as reported by the tool service and forwarded to the
/// model provider.
#[derive(Debug, Clone)]
pub struct ToolSchema {
    pub name: String,
    pub description: Option<String>,
    pub input_schema: Option<Value>,
}

#[async_trait]
pub trait ToolServiceInterface: Send + Sync {
    async fn invoke_tool(&self, tool: &str, arguments: Value) -> Result<Value, ToolInvokeError>;

    async fn list_tools(&self) -> Result<Vec<ToolSchema>, ToolInvokeError>;
}
