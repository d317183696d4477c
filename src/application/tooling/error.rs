use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolInvokeError {
    #[error("no tool service is configured")]
    NotConfigured,
    #[error("tool service transport error: {source}")]
    Transport {
        #[source]
        source: reqwest::Error,
    },
    // StatusCode displays as "400 Bad Request"; the normalizer keys off
    // that signature and surfaces the body separately.
    #[error("tool service request failed with {status}")]
    Http {
        status: StatusCode,
        body: Option<String>,
    },
    #[error("tool service returned invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },
    #[error("tool service returned JSON-RPC error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("tool '{tool}' reported failure: {message}")]
    Failed { tool: String, message: String },
}

impl ToolInvokeError {
    /// HTTP response body attached to the failure, if any.
    pub fn response_body(&self) -> Option<&str> {
        match self {
            ToolInvokeError::Http { body, .. } => body.as_deref(),
            _ => None,
        }
    }
}
