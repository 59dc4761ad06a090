//! Tool execution mediator
//!
//! Resolves deictic references, dispatches to the registry and contains
//! every tool fault as text.

use serde_json::Value;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, warn};

use tooluse_tools::{time, ToolRegistry};

use crate::state::ConversationState;

/// Location arguments that point back at the last location discussed
pub const DEICTIC_PLACEHOLDERS: &[&str] = &["that", "it", "there"];

/// Tagged result of one tool call; the model only ever sees [`ToolOutcome::text`]
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    /// The tool ran; domain errors such as an unknown city land here too
    Success(String),
    NotFound(String),
    /// The tool rejected its arguments or panicked
    Failed(String),
}

impl ToolOutcome {
    pub fn text(&self) -> &str {
        match self {
            ToolOutcome::Success(text) | ToolOutcome::NotFound(text) | ToolOutcome::Failed(text) => {
                text
            }
        }
    }

    pub fn into_text(self) -> String {
        match self {
            ToolOutcome::Success(text) | ToolOutcome::NotFound(text) | ToolOutcome::Failed(text) => {
                text
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ToolOutcome::Success(_))
    }
}

/// One mediated tool call
#[derive(Debug, Clone)]
pub struct ToolExecution {
    /// Arguments after reference resolution
    pub args_used: Value,
    /// The placeholder that was substituted, if any
    pub resolved_from: Option<String>,
    pub outcome: ToolOutcome,
}

/// Runs tool calls on behalf of the agent loop
#[derive(Debug, Clone, Default)]
pub struct ToolExecutor {
    registry: ToolRegistry,
}

impl ToolExecutor {
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Resolve, dispatch and invoke
    pub fn execute(&self, tool_name: &str, raw_args: Value, state: &ConversationState) -> ToolExecution {
        let mut args = raw_args;
        let resolved_from = resolve_references(tool_name, &mut args, state);

        let outcome = match self.registry.get(tool_name) {
            Some(kind) => {
                debug!("Executing tool {} with {}", tool_name, args);
                let call_args = args.clone();
                run_guarded(tool_name, move || kind.invoke(call_args))
            }
            None => {
                warn!("Model requested unknown tool: {}", tool_name);
                ToolOutcome::NotFound(format!("Error: Tool '{}' not found", tool_name))
            }
        };

        ToolExecution {
            args_used: args,
            resolved_from,
            outcome,
        }
    }
}

/// Rewrite a placeholder `get_time` location to the remembered one
///
/// Returns the placeholder that was replaced. Nothing changes without a
/// remembered location.
pub fn resolve_references(tool_name: &str, args: &mut Value, state: &ConversationState) -> Option<String> {
    if tool_name != time::TOOL_NAME {
        return None;
    }

    let remembered = state.last_location()?;
    let slot = args.get_mut("location")?;
    let placeholder = slot.as_str()?.trim().to_lowercase();

    if !DEICTIC_PLACEHOLDERS.contains(&placeholder.as_str()) {
        return None;
    }

    debug!("Resolved location '{}' to '{}'", placeholder, remembered);
    *slot = Value::String(remembered.to_string());
    Some(placeholder)
}

fn run_guarded<F>(tool_name: &str, call: F) -> ToolOutcome
where
    F: FnOnce() -> tooluse_tools::Result<String>,
{
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(Ok(text)) => ToolOutcome::Success(text),
        Ok(Err(e)) => {
            warn!("Tool {} failed: {}", tool_name, e);
            ToolOutcome::Failed(format!("Error executing {}: {}", tool_name, e))
        }
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "tool panicked".to_string());
            warn!("Tool {} panicked: {}", tool_name, message);
            ToolOutcome::Failed(format!("Error executing {}: {}", tool_name, message))
        }
    }
}
