//! Agent core
//!
//! Conversation memory, the tool execution mediator and the two-phase
//! agent loop that ties them to a model provider.

use std::time::Duration;
use thiserror::Error;
use tooluse_provider::ProviderError;

pub mod context;
pub mod history;
pub mod loop_agent;
pub mod mediator;
pub mod state;

pub use context::ContextBuilder;
pub use history::ConversationHistory;
pub use loop_agent::{AgentLoop, AgentSettings, ToolRun, TurnReport};
pub use mediator::{ToolExecution, ToolExecutor, ToolOutcome};
pub use state::ConversationState;

/// Loop-level faults. Tool faults never show up here.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("model call failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("model call timed out after {0:?}")]
    ModelTimeout(Duration),
}

pub type Result<T> = std::result::Result<T, AgentError>;
