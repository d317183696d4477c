use super::history::ConversationHistory;
use super::models::AgentConfig;
use crate::config::render_prompt;
use crate::model::ModelProvider;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Everything one conversation owns: the provider handle, the active model,
/// the switchable catalog, the seed template, and the history. The outer
/// loop holds it for the whole session and hands it to each turn.
pub struct SessionContext {
    provider: Arc<dyn ModelProvider>,
    model: String,
    catalog: Vec<String>,
    prompt_template: String,
    session_id: String,
    pub(super) history: ConversationHistory,
}

impl SessionContext {
    pub fn new(provider: Arc<dyn ModelProvider>, config: &AgentConfig) -> Self {
        let seed = render_prompt(&config.prompt_template);
        Self {
            provider,
            model: config.model.clone(),
            catalog: config.catalog.clone(),
            prompt_template: config.prompt_template.clone(),
            session_id: Uuid::new_v4().to_string(),
            history: ConversationHistory::new(seed),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn catalog(&self) -> &[String] {
        &self.catalog
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub(super) fn provider(&self) -> &Arc<dyn ModelProvider> {
        &self.provider
    }

    /// Re-renders the seed (the date substitution is fresh) and drops every
    /// prior turn.
    pub fn reset_history(&mut self) {
        self.history.reset(render_prompt(&self.prompt_template));
    }

    /// Switching to the model already in use is a no-op and reports `false`;
    /// any other name takes effect with a history reset.
    pub fn swap_model(&mut self, model: &str) -> bool {
        if self.model == model {
            return false;
        }
        info!(from = %self.model, to = %model, "Switching model");
        self.model = model.to_string();
        self.reset_history();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModelError, ModelReply, ModelRequest};
    use crate::types::Message;
    use async_trait::async_trait;

    struct UnusedProvider;

    #[async_trait]
    impl ModelProvider for UnusedProvider {
        async fn chat(&self, _request: ModelRequest) -> Result<ModelReply, ModelError> {
            Err(ModelError::InvalidResponse("not expected".into()))
        }
    }

    fn context() -> SessionContext {
        let config = AgentConfig {
            model: "llama3".into(),
            catalog: vec!["llama3".into(), "mistral".into()],
            ..AgentConfig::default()
        };
        SessionContext::new(Arc::new(UnusedProvider), &config)
    }

    #[test]
    fn swapping_to_the_same_model_is_a_no_op() {
        let mut ctx = context();
        ctx.history.append(Message::user("hello"));

        assert!(!ctx.swap_model("llama3"));
        assert_eq!(ctx.history.snapshot().len(), 1);
    }

    #[test]
    fn swapping_models_resets_history() {
        let mut ctx = context();
        ctx.history.append(Message::user("hello"));

        assert!(ctx.swap_model("mistral"));
        assert_eq!(ctx.model(), "mistral");
        assert!(ctx.history.snapshot().is_empty());
    }
}
