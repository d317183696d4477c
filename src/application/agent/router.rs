use crate::types::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum RouteDecision {
    RepairCalls,
    ExecuteTools,
    EndTurn,
}

/// Precedence is fixed: invalid calls are repaired before anything else,
/// valid calls execute next, and a response with neither ends the turn.
pub(super) fn route(message: &Message) -> RouteDecision {
    let Message::AssistantResponse {
        tool_calls,
        invalid_calls,
        ..
    } = message
    else {
        return RouteDecision::EndTurn;
    };

    if !invalid_calls.is_empty() {
        RouteDecision::RepairCalls
    } else if !tool_calls.is_empty() {
        RouteDecision::ExecuteTools
    } else {
        RouteDecision::EndTurn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{InvalidToolCallRequest, ToolCallRequest};
    use serde_json::json;

    fn valid_call() -> ToolCallRequest {
        ToolCallRequest {
            id: "call_1".into(),
            name: "getCost".into(),
            arguments: json!({}),
        }
    }

    fn invalid_call() -> InvalidToolCallRequest {
        InvalidToolCallRequest {
            id: "call_2".into(),
            name: None,
            arguments: "{".into(),
            reason: "arguments are not valid JSON".into(),
        }
    }

    #[test]
    fn free_text_ends_the_turn() {
        let message = Message::assistant_text("final answer");
        assert_eq!(route(&message), RouteDecision::EndTurn);
    }

    #[test]
    fn valid_calls_execute() {
        let message = Message::assistant("", vec![valid_call()], Vec::new());
        assert_eq!(route(&message), RouteDecision::ExecuteTools);
    }

    #[test]
    fn invalid_calls_take_precedence_over_valid_ones() {
        let message = Message::assistant("", vec![valid_call()], vec![invalid_call()]);
        assert_eq!(route(&message), RouteDecision::RepairCalls);
    }

    #[test]
    fn non_assistant_messages_end_the_turn() {
        assert_eq!(route(&Message::user("hello")), RouteDecision::EndTurn);
    }
}
