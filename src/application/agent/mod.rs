mod context;
mod directive;
mod errors;
mod history;
mod models;
mod repair;
mod router;
mod runner;
mod runtime;


pub use errors::AgentError;
pub use models::{AgentConfig, AgentEvent, TurnOutcome};
pub use runner::Agent;
