use crate::config::{DEFAULT_MODEL, DEFAULT_PROMPT_TEMPLATE, DEFAULT_TOOL_TIMEOUT_SECS};
use crate::types::Message;
use serde_json::Value;
use std::time::Duration;

/// Progress events a turn publishes while it runs. Sends are
/// fire-and-forget; a closed receiver never stalls the turn.
#[derive(Debug, Clone)]
pub enum AgentEvent {
    ModelChunk {
        text: String,
    },
    ToolStarted {
        name: String,
        input: Value,
    },
    ToolFinished {
        name: String,
        output: String,
    },
    /// Emitted exactly once per turn, on every exit path.
    TurnEnded {
        answer: Option<String>,
        snapshot: Vec<Message>,
    },
}

#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub answer: Option<String>,
    pub tool_rounds: usize,
}

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub model: String,
    pub catalog: Vec<String>,
    pub prompt_template: String,
    pub max_tool_rounds: Option<usize>,
    pub tool_timeout: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            catalog: vec![DEFAULT_MODEL.to_string()],
            prompt_template: DEFAULT_PROMPT_TEMPLATE.to_string(),
            max_tool_rounds: None,
            tool_timeout: Duration::from_secs(DEFAULT_TOOL_TIMEOUT_SECS),
        }
    }
}
