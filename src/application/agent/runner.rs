use super::context::SessionContext;
use super::directive::ForcedDecision;
use super::errors::AgentError;
use super::models::{AgentConfig, AgentEvent, TurnOutcome};
use super::repair;
use super::router::{self, RouteDecision};
use super::runtime::ToolRuntime;
use crate::model::{ModelProvider, ModelRequest};
use crate::tooling::{ToolSchema, ToolServiceInterface};
use crate::types::{InvalidToolCallRequest, Message, ToolCallRequest, ToolOutcome};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

/// Named states of one turn, advanced by an iterative loop rather than
/// recursion. Transitions:
///
///   Invoking  -> Executing | Repairing | Done   (router precedence)
///   Executing -> Forcing
///   Forcing   -> Invoking
///   Repairing -> Invoking
///
/// Each state carries the data its node consumes, so a transition is a plain
/// value handoff and the cycle count stays observable in one place.
enum TurnState {
    Invoking,
    Executing { calls: Vec<ToolCallRequest> },
    Forcing { outcomes: Vec<ToolOutcome> },
    Repairing { invalid: Vec<InvalidToolCallRequest> },
    Done { answer: Option<String> },
}

impl TurnState {
    fn label(&self) -> &'static str {
        match self {
            TurnState::Invoking => "invoking",
            TurnState::Executing { .. } => "executing",
            TurnState::Forcing { .. } => "forcing",
            TurnState::Repairing { .. } => "repairing",
            TurnState::Done { .. } => "done",
        }
    }
}

pub struct Agent {
    context: SessionContext,
    runtime: ToolRuntime,
    max_tool_rounds: Option<usize>,
}

impl Agent {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        bridge: Arc<dyn ToolServiceInterface>,
        schemas: Vec<ToolSchema>,
        config: AgentConfig,
    ) -> Self {
        let runtime = ToolRuntime::new(bridge, schemas, config.tool_timeout);
        Self {
            context: SessionContext::new(provider, &config),
            runtime,
            max_tool_rounds: config.max_tool_rounds,
        }
    }

    pub fn model(&self) -> &str {
        self.context.model()
    }

    pub fn catalog(&self) -> &[String] {
        self.context.catalog()
    }

    pub fn tool_count(&self) -> usize {
        self.runtime.schemas().len()
    }

    pub fn snapshot(&self) -> Vec<Message> {
        self.context.history.snapshot()
    }

    pub fn reset_history(&mut self) {
        self.context.reset_history();
    }

    pub fn swap_model(&mut self, model: &str) -> bool {
        self.context.swap_model(model)
    }

    /// Settles history after a turn future was dropped mid-flight: the
    /// regular turn-end compaction runs so forced directives and a
    /// half-recorded tool round never reach the next request.
    pub fn abandon_turn(&mut self) {
        self.context.history.compact();
    }

    /// Drives one full turn through the state machine until `Done` or a
    /// turn-level error. Exactly one `TurnEnded` event fires on every exit
    /// path, and forced directives never outlive the turn.
    pub async fn run_turn(
        &mut self,
        question: &str,
        events: &UnboundedSender<AgentEvent>,
    ) -> Result<TurnOutcome, AgentError> {
        info!(
            session = self.context.session_id(),
            model = self.context.model(),
            "Turn started"
        );
        self.context.history.append(Message::user(question));

        let mut state = TurnState::Invoking;
        let mut tool_rounds = 0usize;
        let result = loop {
            debug!(state = state.label(), tool_rounds, "Turn state");
            state = match state {
                TurnState::Invoking => match self.invoke_model(events).await {
                    Ok(next) => next,
                    Err(err) => break Err(err),
                },
                TurnState::Executing { calls } => {
                    if let Some(limit) = self.max_tool_rounds {
                        if tool_rounds >= limit {
                            warn!(limit, "Turn exceeded the tool round limit");
                            break Err(AgentError::RoundLimit { limit });
                        }
                    }
                    tool_rounds += 1;

                    let results = self.runtime.execute_round(&calls, events).await;
                    let mut outcomes = Vec::with_capacity(results.len());
                    for (result, outcome) in results {
                        self.context.history.append(result);
                        outcomes.push(outcome);
                    }
                    TurnState::Forcing { outcomes }
                }
                TurnState::Forcing { outcomes } => {
                    let decision = ForcedDecision::from_outcomes(&outcomes);
                    debug!(?decision, "Forcing decision after tool round");
                    self.context
                        .history
                        .append(Message::system(decision.directive()));
                    TurnState::Invoking
                }
                TurnState::Repairing { invalid } => {
                    for corrective in repair::corrective_results(&invalid) {
                        self.context.history.append(corrective);
                    }
                    TurnState::Invoking
                }
                TurnState::Done { answer } => break Ok(answer),
            };
        };

        self.context.history.compact();
        match result {
            Ok(answer) => {
                info!(tool_rounds, "Turn completed");
                let _ = events.send(AgentEvent::TurnEnded {
                    answer: answer.clone(),
                    snapshot: self.context.history.snapshot(),
                });
                Ok(TurnOutcome {
                    answer,
                    tool_rounds,
                })
            }
            Err(err) => {
                warn!(error = %err, "Turn aborted");
                let _ = events.send(AgentEvent::TurnEnded {
                    answer: None,
                    snapshot: self.context.history.snapshot(),
                });
                Err(err)
            }
        }
    }

    /// One inference call: appends exactly one assistant response to history
    /// and routes it to the next state. No retries happen here; a provider
    /// failure surfaces at the turn boundary.
    async fn invoke_model(
        &mut self,
        events: &UnboundedSender<AgentEvent>,
    ) -> Result<TurnState, AgentError> {
        let request = ModelRequest {
            model: self.context.model().to_string(),
            messages: self.context.history.messages_for_model(),
            tools: self.runtime.schemas().to_vec(),
        };
        debug!(
            messages = request.messages.len(),
            "Submitting turn to model provider"
        );
        let reply = self.context.provider().chat(request).await?;
        let message = reply.message;

        let Message::AssistantResponse {
            content,
            tool_calls,
            invalid_calls,
        } = &message
        else {
            self.context.history.append(message);
            return Ok(TurnState::Done { answer: None });
        };

        if !content.is_empty() {
            let _ = events.send(AgentEvent::ModelChunk {
                text: content.clone(),
            });
        }

        let next = match router::route(&message) {
            RouteDecision::RepairCalls => TurnState::Repairing {
                invalid: invalid_calls.clone(),
            },
            RouteDecision::ExecuteTools => TurnState::Executing {
                calls: tool_calls.clone(),
            },
            RouteDecision::EndTurn => {
                let answer = if content.is_empty() {
                    None
                } else {
                    Some(content.clone())
                };
                TurnState::Done { answer }
            }
        };
        self.context.history.append(message);
        Ok(next)
    }
}
