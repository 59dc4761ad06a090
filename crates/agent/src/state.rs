//! Conversation state
//!
//! Facts remembered across turns. Outlives a cleared transcript.

use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::VecDeque;

use tooluse_tools::time;

/// How many user intents are kept
pub const INTENT_CAPACITY: usize = 3;

/// Summary returned when nothing has been recorded
pub const NO_CONTEXT: &str = "No context yet";

/// Memory of recent intents and the last tool invocation
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversationState {
    recent_intents: VecDeque<String>,
    last_tool_name: Option<String>,
    last_tool_args: Option<Map<String, Value>>,
    last_tool_result: Option<String>,
    last_location: Option<String>,
    last_updated: Option<DateTime<Local>>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember a user message, evicting the oldest past capacity
    pub fn record_intent(&mut self, text: impl Into<String>) {
        self.recent_intents.push_back(text.into());
        while self.recent_intents.len() > INTENT_CAPACITY {
            self.recent_intents.pop_front();
        }
        self.touch();
    }

    /// Overwrite the last tool invocation
    ///
    /// `last_location` only changes for `get_time` calls carrying a
    /// `location` argument.
    pub fn record_tool_result(&mut self, name: &str, args: &Value, result: impl Into<String>) {
        self.last_tool_name = Some(name.to_string());
        self.last_tool_args = args.as_object().cloned();
        self.last_tool_result = Some(result.into());

        if name == time::TOOL_NAME {
            if let Some(location) = args.get("location") {
                let location = match location {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                self.last_location = Some(location);
            }
        }

        self.touch();
    }

    /// One-line, human-readable digest for prompt injection
    pub fn context_summary(&self) -> String {
        let mut parts = Vec::new();

        if !self.recent_intents.is_empty() {
            let intents: Vec<&str> = self.recent_intents.iter().map(String::as_str).collect();
            parts.push(format!("Recent intents: {}", intents.join(", ")));
        }

        if let Some(name) = &self.last_tool_name {
            parts.push(format!("Last tool used: {}", name));
        }

        if let Some(args) = self.last_tool_args.as_ref().filter(|a| !a.is_empty()) {
            parts.push(format!("Last tool args: {}", Value::Object(args.clone())));
        }

        if let Some(location) = &self.last_location {
            parts.push(format!("Last location: {}", location));
        }

        if parts.is_empty() {
            NO_CONTEXT.to_string()
        } else {
            parts.join(" | ")
        }
    }

    /// Forget everything
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn recent_intents(&self) -> impl Iterator<Item = &str> {
        self.recent_intents.iter().map(String::as_str)
    }

    pub fn last_tool_name(&self) -> Option<&str> {
        self.last_tool_name.as_deref()
    }

    pub fn last_tool_args(&self) -> Option<&Map<String, Value>> {
        self.last_tool_args.as_ref()
    }

    pub fn last_tool_result(&self) -> Option<&str> {
        self.last_tool_result.as_deref()
    }

    pub fn last_location(&self) -> Option<&str> {
        self.last_location.as_deref()
    }

    pub fn last_updated(&self) -> Option<DateTime<Local>> {
        self.last_updated
    }

    fn touch(&mut self) {
        self.last_updated = Some(Local::now());
    }
}
