mod error;
mod interface;
mod service;

pub use error::ToolInvokeError;
pub use interface::{ToolSchema, ToolServiceInterface};
pub use service::{DisabledToolService, HttpToolService};
pub(crate) use service::extract_text;
