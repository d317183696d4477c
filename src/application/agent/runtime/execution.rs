use super::normalize;
use super::{AgentEvent, ToolRuntime};
use crate::types::{Message, ToolCallRequest, ToolOutcome};
use futures::future::join_all;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

impl ToolRuntime {
    /// Runs every call of one assistant response concurrently and returns
    /// one correlated result per call, in issue order regardless of
    /// completion order.
    pub(crate) async fn execute_round(
        &self,
        calls: &[ToolCallRequest],
        events: &UnboundedSender<AgentEvent>,
    ) -> Vec<(Message, ToolOutcome)> {
        debug!(calls = calls.len(), "Dispatching tool round");

        let dispatches = calls.iter().map(|call| async move {
            let _ = events.send(AgentEvent::ToolStarted {
                name: call.name.clone(),
                input: call.arguments.clone(),
            });

            let (content, metadata) =
                normalize::dispatch(self.bridge.as_ref(), call, self.call_timeout).await;
            let outcome = ToolOutcome::classify(&content, metadata.as_ref());
            match &outcome {
                ToolOutcome::Success => info!(tool = %call.name, "Tool executed"),
                ToolOutcome::Failure { kind, detail } => {
                    warn!(tool = %call.name, ?kind, detail = %detail, "Tool execution failed");
                }
            }

            let _ = events.send(AgentEvent::ToolFinished {
                name: call.name.clone(),
                output: content.clone(),
            });

            (
                Message::tool_result(call.id.clone(), content, metadata),
                outcome,
            )
        });

        join_all(dispatches).await
    }
}
