//! Scripted provider shared by the agent integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use tooluse_agent::AgentSettings;
use tooluse_provider::{ChatParams, ChatResponse, Provider, ProviderError, ToolCall};

/// Replays canned responses in order and records every request
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<ChatResponse, ProviderError>>>,
    calls: Mutex<Vec<ChatParams>>,
    stall: Mutex<Option<Duration>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Result<ChatResponse, ProviderError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
            stall: Mutex::new(None),
        }
    }

    /// Only successful responses
    pub fn replying(responses: Vec<ChatResponse>) -> Self {
        Self::new(responses.into_iter().map(Ok).collect())
    }

    /// Sleep before answering the first request
    pub fn stall_first(self, delay: Duration) -> Self {
        *self.stall.lock().unwrap() = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<ChatParams> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap().len()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    async fn chat(&self, params: ChatParams) -> Result<ChatResponse, ProviderError> {
        self.calls.lock().unwrap().push(params);

        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(ProviderError::InvalidResponse));

        let stall = self.stall.lock().unwrap().take();
        if let Some(delay) = stall {
            tokio::time::sleep(delay).await;
        }

        next
    }

    fn default_model(&self) -> String {
        "scripted".to_string()
    }

    fn is_configured(&self) -> bool {
        true
    }
}

pub fn settings() -> AgentSettings {
    AgentSettings {
        model: "test-model".to_string(),
        max_tokens: 256,
        temperature: 0.0,
        model_timeout: None,
        system_prompt: None,
    }
}

pub fn call(id: &str, name: &str, args: Value) -> ToolCall {
    ToolCall::new(id, name, args)
}

pub fn time_call(id: &str, location: &str) -> ChatResponse {
    ChatResponse::tool_calls(vec![call(
        id,
        "get_time",
        serde_json::json!({ "location": location }),
    )])
}
