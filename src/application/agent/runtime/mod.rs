mod execution;
mod normalize;

use std::sync::Arc;
use std::time::Duration;

pub(super) use super::models::AgentEvent;
pub(super) use crate::tooling::{ToolSchema, ToolServiceInterface};

pub(crate) struct ToolRuntime {
    bridge: Arc<dyn ToolServiceInterface>,
    schemas: Vec<ToolSchema>,
    call_timeout: Duration,
}

impl ToolRuntime {
    pub(crate) fn new(
        bridge: Arc<dyn ToolServiceInterface>,
        schemas: Vec<ToolSchema>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            bridge,
            schemas,
            call_timeout,
        }
    }

    pub(crate) fn schemas(&self) -> &[ToolSchema] {
        &self.schemas
    }
}
