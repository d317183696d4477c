use crate::types::Message;
use std::collections::HashSet;

/// Ordered conversation state for one session. The seed directive is held
/// apart from the working messages so it is sent first on every model call
/// without ever appearing in snapshots or being duplicated by appends.
pub struct ConversationHistory {
    seed: Message,
    working: Vec<Message>,
}

impl ConversationHistory {
    pub fn new(seed_content: impl Into<String>) -> Self {
        Self {
            seed: Message::system(seed_content),
            working: Vec::new(),
        }
    }

    pub fn append(&mut self, message: Message) {
        self.working.push(message);
    }

    /// Everything the model sees: the seed first, then the working sequence
    /// including any forced directives of the current turn.
    pub fn messages_for_model(&self) -> Vec<Message> {
        let mut messages = Vec::with_capacity(self.working.len() + 1);
        messages.push(self.seed.clone());
        messages.extend(self.working.iter().cloned());
        messages
    }

    /// Externally visible history: ordered, without the seed or any forced
    /// directive.
    pub fn snapshot(&self) -> Vec<Message> {
        self.working
            .iter()
            .filter(|message| !matches!(message, Message::SystemDirective { .. }))
            .cloned()
            .collect()
    }

    /// Turn-end cleanup: drops forced directives so later turns never
    /// re-send them, and prunes a trailing round whose calls never received
    /// results so every call id in a re-sent history still correlates. The
    /// seed is untouched.
    pub fn compact(&mut self) {
        self.working
            .retain(|message| !matches!(message, Message::SystemDirective { .. }));
        self.prune_unresolved_round();
    }

    /// An aborted or dropped turn can leave its last tool round half
    /// recorded: the response carrying the calls is present but some results
    /// never arrived. Only the trailing round can be incomplete; it is
    /// removed wholesale, partial results included.
    fn prune_unresolved_round(&mut self) {
        let Some(index) = self.working.iter().rposition(|message| {
            matches!(
                message,
                Message::AssistantResponse { tool_calls, invalid_calls, .. }
                    if !tool_calls.is_empty() || !invalid_calls.is_empty()
            )
        }) else {
            return;
        };

        let Message::AssistantResponse {
            tool_calls,
            invalid_calls,
            ..
        } = &self.working[index]
        else {
            return;
        };
        let resolved: HashSet<&str> = self.working[index + 1..]
            .iter()
            .filter_map(|message| match message {
                Message::ToolResult { call_id, .. } => Some(call_id.as_str()),
                _ => None,
            })
            .collect();
        let dangling = tool_calls
            .iter()
            .map(|call| call.id.as_str())
            .chain(invalid_calls.iter().map(|call| call.id.as_str()))
            .any(|id| !resolved.contains(id));
        if dangling {
            self.working.truncate(index);
        }
    }

    /// Clears every turn and re-seeds. Used for the clear command and for
    /// model switches.
    pub fn reset(&mut self, seed_content: impl Into<String>) {
        self.seed = Message::system(seed_content);
        self.working.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{InvalidToolCallRequest, ToolCallRequest};
    use serde_json::json;

    fn call_response(id: &str) -> Message {
        Message::assistant(
            "",
            vec![ToolCallRequest {
                id: id.into(),
                name: "getCost".into(),
                arguments: json!({}),
            }],
            Vec::new(),
        )
    }

    #[test]
    fn seed_leads_every_model_view() {
        let mut history = ConversationHistory::new("be terse");
        history.append(Message::user("hi"));

        let messages = history.messages_for_model();
        assert_eq!(messages.len(), 2);
        assert!(matches!(
            &messages[0],
            Message::SystemDirective { content } if content == "be terse"
        ));
    }

    #[test]
    fn snapshot_excludes_directives() {
        let mut history = ConversationHistory::new("seed");
        history.append(Message::user("question"));
        history.append(Message::assistant_text("answer"));
        history.append(Message::system("forced directive"));

        let snapshot = history.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert!(
            snapshot
                .iter()
                .all(|message| !matches!(message, Message::SystemDirective { .. }))
        );
    }

    #[test]
    fn compact_drops_forced_directives() {
        let mut history = ConversationHistory::new("seed");
        history.append(Message::user("question"));
        history.append(Message::system("retry directive"));
        history.append(Message::assistant_text("answer"));

        history.compact();

        let messages = history.messages_for_model();
        assert_eq!(messages.len(), 3);
        assert!(matches!(&messages[1], Message::UserQuery { .. }));
        assert!(matches!(&messages[2], Message::AssistantResponse { .. }));
    }

    #[test]
    fn compact_prunes_a_round_without_results() {
        let mut history = ConversationHistory::new("seed");
        history.append(Message::user("question"));
        history.append(call_response("call_1"));
        history.append(Message::tool_result("call_1", "cost: 42", None));
        history.append(Message::system("finalize directive"));
        history.append(call_response("call_2"));

        history.compact();

        let messages = history.messages_for_model();
        assert_eq!(messages.len(), 4);
        assert!(matches!(
            messages.last(),
            Some(Message::ToolResult { call_id, .. }) if call_id == "call_1"
        ));
    }

    #[test]
    fn compact_drops_partial_results_with_their_round() {
        let mut history = ConversationHistory::new("seed");
        history.append(Message::user("question"));
        history.append(Message::assistant(
            "",
            vec![
                ToolCallRequest {
                    id: "call_1".into(),
                    name: "getCost".into(),
                    arguments: json!({}),
                },
                ToolCallRequest {
                    id: "call_2".into(),
                    name: "getUsage".into(),
                    arguments: json!({}),
                },
            ],
            Vec::new(),
        ));
        history.append(Message::tool_result("call_1", "cost: 42", None));

        history.compact();

        let messages = history.messages_for_model();
        assert_eq!(messages.len(), 2);
        assert!(matches!(&messages[1], Message::UserQuery { .. }));
    }

    #[test]
    fn compact_keeps_correlated_corrective_results() {
        let mut history = ConversationHistory::new("seed");
        history.append(Message::user("question"));
        history.append(Message::assistant(
            "",
            Vec::new(),
            vec![InvalidToolCallRequest {
                id: "call_1".into(),
                name: Some("getCost".into()),
                arguments: "{bad".into(),
                reason: "arguments are not valid JSON".into(),
            }],
        ));
        history.append(Message::tool_result("call_1", "Error: invalid call", None));

        history.compact();

        assert_eq!(history.messages_for_model().len(), 4);
    }

    #[test]
    fn reset_reseeds_and_clears() {
        let mut history = ConversationHistory::new("old seed");
        history.append(Message::user("question"));

        history.reset("new seed");

        assert!(history.snapshot().is_empty());
        let messages = history.messages_for_model();
        assert_eq!(messages.len(), 1);
        assert!(matches!(
            &messages[0],
            Message::SystemDirective { content } if content == "new seed"
        ));
    }
}
