use crate::types::ToolOutcome;

pub(super) const RETRY_DIRECTIVE: &str = "The previous tool call failed with an error. \
DO NOT explain the error or provide suggestions. \
Instead, make a corrected tool call that fixes the specific error mentioned above. \
Try again with the proper syntax based on the error message.";

pub(super) const FINALIZE_DIRECTIVE: &str = "Based on the tool results above, provide your \
final answer to the user's question. \
Do NOT make any more tool calls. Analyze the data and give a complete response.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ForcedDecision {
    Retry,
    Finalize,
}

impl ForcedDecision {
    /// Any failed result in the round forces a retry; an all-success round
    /// forces the final answer.
    pub(super) fn from_outcomes(outcomes: &[ToolOutcome]) -> Self {
        if outcomes.iter().any(ToolOutcome::is_failure) {
            ForcedDecision::Retry
        } else {
            ForcedDecision::Finalize
        }
    }

    pub(super) fn directive(self) -> &'static str {
        match self {
            ForcedDecision::Retry => RETRY_DIRECTIVE,
            ForcedDecision::Finalize => FINALIZE_DIRECTIVE,
        }
    }
}
