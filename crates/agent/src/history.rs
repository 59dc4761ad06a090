//! Conversation history
//!
//! The transcript sent to the model. Cleared independently of
//! [`ConversationState`](crate::ConversationState).

use tooluse_provider::{Message, Role, ToolCall};

/// Prefix of the message that carries remembered context into a fresh transcript
pub const CONTEXT_PREFIX: &str = "Context from previous conversation:";

#[derive(Debug, Clone, Default)]
pub struct ConversationHistory {
    messages: Vec<Message>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Carry a state summary into the transcript
    pub fn push_context(&mut self, summary: &str) {
        self.push(Message::system(format!("{} {}", CONTEXT_PREFIX, summary)));
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(Message::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.push(Message::assistant(content));
    }

    /// Assistant turn that requested tools
    pub fn push_tool_calls(&mut self, content: Option<String>, calls: &[ToolCall]) {
        self.push(Message::assistant_tool_calls(content, calls));
    }

    /// Tool output correlated to the request that asked for it
    pub fn push_tool_result(&mut self, call_id: &str, name: &str, result: &str) {
        self.push(Message::tool(call_id, name, result));
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Entries with the given role
    pub fn count_role(&self, role: Role) -> usize {
        self.messages.iter().filter(|m| m.role == role).count()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
