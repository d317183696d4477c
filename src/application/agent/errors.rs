use crate::model::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("turn exceeded the tool round limit of {limit}")]
    RoundLimit { limit: usize },
}

impl AgentError {
    pub fn user_message(&self) -> String {
        match self {
            AgentError::Model(err) => err.user_message(),
            AgentError::RoundLimit { limit } => format!(
                "The agent stopped after {limit} tool rounds without reaching an answer. Rephrase the question or raise max_tool_rounds."
            ),
        }
    }
}
