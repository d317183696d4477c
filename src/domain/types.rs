use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Marker that flags a tool result as failed. The outcome classifier keys
/// off its presence anywhere in the content.
pub const FAILURE_MARKER: &str = "Error:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "400_bad_request")]
    BadRequest,
    #[serde(rename = "timeout")]
    Timeout,
    #[serde(rename = "unknown")]
    Unknown,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::BadRequest => "400_bad_request",
            ErrorCode::Timeout => "timeout",
            ErrorCode::Unknown => "unknown",
        }
    }
}

/// Structured error payload attached to failed tool results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMetadata {
    pub error: ErrorCode,
    pub details: String,
}

impl ErrorMetadata {
    pub fn new(error: ErrorCode, details: impl Into<String>) -> Self {
        Self {
            error,
            details: details.into(),
        }
    }
}

/// A syntactically valid tool call emitted by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// A tool call the model emitted but that failed schema validation: the
/// name may be missing and the arguments are kept as raw text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidToolCallRequest {
    pub id: String,
    pub name: Option<String>,
    pub arguments: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Message {
    SystemDirective {
        content: String,
    },
    UserQuery {
        content: String,
    },
    AssistantResponse {
        content: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCallRequest>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        invalid_calls: Vec<InvalidToolCallRequest>,
    },
    ToolResult {
        call_id: String,
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        metadata: Option<ErrorMetadata>,
    },
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Message::SystemDirective {
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Message::UserQuery {
            content: content.into(),
        }
    }

    pub fn assistant(
        content: impl Into<String>,
        tool_calls: Vec<ToolCallRequest>,
        invalid_calls: Vec<InvalidToolCallRequest>,
    ) -> Self {
        Message::AssistantResponse {
            content: content.into(),
            tool_calls,
            invalid_calls,
        }
    }

    pub fn assistant_text(content: impl Into<String>) -> Self {
        Message::assistant(content, Vec::new(), Vec::new())
    }

    pub fn tool_result(
        call_id: impl Into<String>,
        content: impl Into<String>,
        metadata: Option<ErrorMetadata>,
    ) -> Self {
        Message::ToolResult {
            call_id: call_id.into(),
            content: content.into(),
            metadata,
        }
    }

    pub fn role_label(&self) -> &'static str {
        match self {
            Message::SystemDirective { .. } => "system",
            Message::UserQuery { .. } => "user",
            Message::AssistantResponse { .. } => "assistant",
            Message::ToolResult { .. } => "tool",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    SchemaOrRequestError,
    TransportError,
    Unknown,
}

/// Classification of a tool result. Structured metadata wins; without it,
/// the failure marker in the content decides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutcome {
    Success,
    Failure { kind: FailureKind, detail: String },
}

impl ToolOutcome {
    pub fn classify(content: &str, metadata: Option<&ErrorMetadata>) -> Self {
        if let Some(meta) = metadata {
            let kind = match meta.error {
                ErrorCode::BadRequest => FailureKind::SchemaOrRequestError,
                ErrorCode::Timeout => FailureKind::TransportError,
                ErrorCode::Unknown => FailureKind::Unknown,
            };
            return ToolOutcome::Failure {
                kind,
                detail: meta.details.clone(),
            };
        }
        if content.contains(FAILURE_MARKER) {
            return ToolOutcome::Failure {
                kind: FailureKind::Unknown,
                detail: content.to_string(),
            };
        }
        ToolOutcome::Success
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ToolOutcome::Failure { .. })
    }
}
