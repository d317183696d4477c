use super::ToolServiceInterface;
use crate::tooling::{ToolInvokeError, extract_text};
use crate::types::{ErrorCode, ErrorMetadata, ToolCallRequest};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Dispatches one call through the service and always yields a
/// `(content, metadata)` pair. Service failures and timeouts become
/// model-readable error content; nothing propagates.
pub(super) async fn dispatch(
    bridge: &dyn ToolServiceInterface,
    call: &ToolCallRequest,
    call_timeout: Duration,
) -> (String, Option<ErrorMetadata>) {
    let arguments = decode_variables(call.arguments.clone());

    match tokio::time::timeout(call_timeout, bridge.invoke_tool(&call.name, arguments)).await {
        Ok(Ok(result)) => (render_success(&result), None),
        Ok(Err(err)) => failure_content(&call.name, err),
        Err(_) => {
            let seconds = call_timeout.as_secs();
            warn!(
                tool = %call.name,
                code = ErrorCode::Timeout.as_str(),
                seconds,
                "Tool call timed out"
            );
            (
                format!("Error: Tool call timed out after {seconds}s."),
                Some(ErrorMetadata::new(
                    ErrorCode::Timeout,
                    format!("no response from the tool service within {seconds}s"),
                )),
            )
        }
    }
}

/// Models commonly string-encode the `variables` argument. Decode it to its
/// JSON structure when possible; anything undecodable passes through
/// verbatim.
fn decode_variables(mut arguments: Value) -> Value {
    if let Some(object) = arguments.as_object_mut() {
        let decoded = match object.get("variables") {
            Some(Value::String(raw)) => serde_json::from_str::<Value>(raw).ok(),
            _ => None,
        };
        if let Some(decoded) = decoded {
            debug!("Decoded string-encoded variables argument");
            object.insert("variables".to_string(), decoded);
        }
    }
    arguments
}

fn render_success(result: &Value) -> String {
    extract_text(result).unwrap_or_else(|| result.to_string())
}

fn failure_content(tool: &str, err: ToolInvokeError) -> (String, Option<ErrorMetadata>) {
    let detail = err.to_string();

    let (content, metadata) = if is_bad_request(&err, &detail) {
        let mut content = String::from("Error: Tool call failed with 400 Bad Request.");
        if let Some(body) = err.response_body() {
            content.push_str(&format!("\n\nDetailed error from API:\n{body}"));
        }
        content.push_str(&format!("\n\nFull exception: {detail}"));
        content.push_str("\n\nPlease fix the query based on the error details and try again.");
        (content, ErrorMetadata::new(ErrorCode::BadRequest, detail))
    } else {
        (
            format!("Error: Tool call failed with: {detail}"),
            ErrorMetadata::new(ErrorCode::Unknown, detail),
        )
    };

    warn!(
        tool,
        code = metadata.error.as_str(),
        error = %metadata.details,
        "Tool call failed"
    );
    (content, Some(metadata))
}

fn is_bad_request(err: &ToolInvokeError, detail: &str) -> bool {
    if let ToolInvokeError::Http { status, .. } = err {
        if status.is_client_error() {
            return true;
        }
    }
    detail.contains("400 Bad Request")
}
