//! Agent loop - core processing engine
//!
//! One turn: record the intent, ask the model, run any requested tools
//! through the mediator, then ask the model once more for the answer.

use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

use tooluse_config::Config;
use tooluse_provider::{ChatParams, ChatResponse, Provider, ToolChoice};
use tooluse_tools::ToolRegistry;

use crate::context::ContextBuilder;
use crate::history::ConversationHistory;
use crate::mediator::{ToolExecutor, ToolOutcome};
use crate::state::ConversationState;
use crate::{AgentError, Result};

/// Model request settings
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Deadline for each model call
    pub model_timeout: Option<Duration>,
    /// Overrides the generated system prompt
    pub system_prompt: Option<String>,
}

impl AgentSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            model: config.model(),
            max_tokens: config.agent.max_tokens,
            temperature: config.agent.temperature,
            model_timeout: config.model_timeout(),
            system_prompt: config.agent.system_prompt.clone(),
        }
    }
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// A tool call executed during a turn
#[derive(Debug, Clone)]
pub struct ToolRun {
    pub request_id: String,
    pub tool_name: String,
    pub args_used: Value,
    pub outcome: ToolOutcome,
}

/// Everything a turn produced
#[derive(Debug, Clone)]
pub struct TurnReport {
    pub answer: String,
    pub tool_runs: Vec<ToolRun>,
}

impl TurnReport {
    pub fn used_tools(&self) -> bool {
        !self.tool_runs.is_empty()
    }
}

/// The agent loop owns one session: a transcript plus remembered facts
pub struct AgentLoop<P: Provider> {
    provider: P,
    settings: AgentSettings,
    context: ContextBuilder,
    executor: ToolExecutor,
    history: ConversationHistory,
    state: ConversationState,
}

impl<P: Provider> AgentLoop<P> {
    /// Create a loop with every tool registered
    pub fn new(provider: P, settings: AgentSettings) -> Self {
        Self::with_registry(provider, settings, ToolRegistry::new())
    }

    /// Create a loop with a restricted tool set
    pub fn with_registry(provider: P, settings: AgentSettings, registry: ToolRegistry) -> Self {
        let context = match &settings.system_prompt {
            Some(prompt) => ContextBuilder::with_system_prompt(prompt.clone()),
            None => ContextBuilder::new(),
        };

        Self {
            provider,
            settings,
            context,
            executor: ToolExecutor::new(registry),
            history: ConversationHistory::new(),
            state: ConversationState::new(),
        }
    }

    pub fn from_config(provider: P, config: &Config) -> Self {
        Self::new(provider, AgentSettings::from_config(config))
    }

    /// Process one user message and return the final answer
    pub async fn run(&mut self, user_text: &str) -> Result<String> {
        self.run_turn(user_text).await.map(|report| report.answer)
    }

    /// Process one user message, reporting the tools that ran
    pub async fn run_turn(&mut self, user_text: &str) -> Result<TurnReport> {
        info!("Processing turn: {}", preview(user_text));

        self.state.record_intent(user_text);

        if self.history.is_empty() && self.state.last_location().is_some() {
            let summary = self.state.context_summary();
            debug!("Injecting remembered context: {}", summary);
            self.history.push_context(&summary);
        }

        self.history.push_user(user_text);

        let response = self.query_model(ToolChoice::Auto).await?;

        if !response.has_tool_calls() {
            let answer = response.content.unwrap_or_default();
            self.history.push_assistant(answer.clone());
            return Ok(TurnReport {
                answer,
                tool_runs: Vec::new(),
            });
        }

        self.history
            .push_tool_calls(response.content.clone(), &response.tool_calls);

        let mut tool_runs = Vec::with_capacity(response.tool_calls.len());
        for call in &response.tool_calls {
            let execution = self
                .executor
                .execute(&call.name, call.arguments.clone(), &self.state);

            self.state
                .record_tool_result(&call.name, &execution.args_used, execution.outcome.text());
            self.history
                .push_tool_result(&call.id, &call.name, execution.outcome.text());

            tool_runs.push(ToolRun {
                request_id: call.id.clone(),
                tool_name: call.name.clone(),
                args_used: execution.args_used,
                outcome: execution.outcome,
            });
        }

        let final_response = self.query_model(ToolChoice::None).await?;
        if final_response.has_tool_calls() {
            warn!(
                "Dropping {} tool call(s) requested during synthesis",
                final_response.tool_calls.len()
            );
        }

        let answer = final_response.content.unwrap_or_default();
        self.history.push_assistant(answer.clone());

        Ok(TurnReport { answer, tool_runs })
    }

    async fn query_model(&self, tool_choice: ToolChoice) -> Result<ChatResponse> {
        let params = ChatParams {
            model: self.settings.model.clone(),
            messages: self
                .context
                .build_messages(self.executor.registry(), &self.history),
            tools: self.executor.registry().definitions(),
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            tool_choice,
        };

        debug!(
            "Model call with {} messages ({:?})",
            params.messages.len(),
            params.tool_choice
        );

        let response = match self.settings.model_timeout {
            Some(deadline) => tokio::time::timeout(deadline, self.provider.chat(params))
                .await
                .map_err(|_| AgentError::ModelTimeout(deadline))??,
            None => self.provider.chat(params).await?,
        };

        Ok(response)
    }

    /// Forget the transcript, keep remembered facts
    pub fn reset(&mut self) {
        info!("Clearing conversation history");
        self.history.clear();
    }

    /// Start a fresh session
    pub fn reset_all(&mut self) {
        info!("Clearing conversation history and state");
        self.history.clear();
        self.state.clear();
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    pub fn tools(&self) -> &ToolRegistry {
        self.executor.registry()
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

fn preview(text: &str) -> String {
    const LIMIT: usize = 80;
    if text.chars().count() <= LIMIT {
        text.to_string()
    } else {
        let head: String = text.chars().take(LIMIT).collect();
        format!("{}...", head)
    }
}
