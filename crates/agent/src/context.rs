//! Context builder for assembling model requests

use chrono::Local;

use tooluse_provider::Message;
use tooluse_tools::ToolRegistry;

use crate::history::ConversationHistory;

/// Builds the message list for each model call: system prompt + transcript
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    system_prompt: Option<String>,
}

impl ContextBuilder {
    /// Builder using the generated identity prompt
    pub fn new() -> Self {
        Self {
            system_prompt: None,
        }
    }

    /// Builder with a fixed system prompt
    pub fn with_system_prompt(prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: Some(prompt.into()),
        }
    }

    /// System prompt for the given tools
    pub fn build_system_prompt(&self, registry: &ToolRegistry) -> String {
        match &self.system_prompt {
            Some(prompt) => prompt.clone(),
            None => Self::identity(registry),
        }
    }

    fn identity(registry: &ToolRegistry) -> String {
        let now = Local::now().format("%Y-%m-%d %H:%M (%A)");
        let tools: Vec<String> = registry
            .kinds()
            .iter()
            .map(|kind| format!("- {}: {}", kind.name(), kind.description()))
            .collect();

        format!(
            r#"# tooluse

You are a helpful assistant with access to deterministic tools:
{}

## Current Time
{}

Call a tool whenever the question needs one; do not guess times or arithmetic.
When the user says "that", "it" or "there" about a place, pass that word as the
location and it will be resolved to the last location discussed.
Tool results may be error messages. Explain them plainly and suggest a fix.
Be concise."#,
            tools.join("\n"),
            now
        )
    }

    /// Complete message list for one model call
    pub fn build_messages(
        &self,
        registry: &ToolRegistry,
        history: &ConversationHistory,
    ) -> Vec<Message> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(Message::system(self.build_system_prompt(registry)));
        messages.extend_from_slice(history.messages());
        messages
    }
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}
