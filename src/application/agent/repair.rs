use crate::types::{InvalidToolCallRequest, Message};
use tracing::warn;

/// One corrective, tool-result-shaped message per invalid call, correlated
/// by call id. No directive accompanies these; the model is asked to fix
/// its own formatting on the next invocation.
pub(super) fn corrective_results(invalid_calls: &[InvalidToolCallRequest]) -> Vec<Message> {
    invalid_calls
        .iter()
        .map(|call| {
            warn!(
                tool = call.name.as_deref().unwrap_or("unknown"),
                reason = %call.reason,
                "Model produced an invalid tool call"
            );
            let content = format!(
                "Error: The model generated an invalid tool call for tool '{name}' \
with arguments '{arguments}'. \
Please check the tool's schema and your formatting and try again.",
                name = call.name.as_deref().unwrap_or("unknown"),
                arguments = call.arguments,
            );
            Message::tool_result(call.id.clone(), content, None)
        })
        .collect()
}
