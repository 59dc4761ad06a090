//! OpenAI-compatible chat-completions provider
//!
//! Works against OpenRouter, OpenAI and Gemini's OpenAI-compatible endpoint.

use crate::*;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, trace};

const OPENROUTER_BASE: &str = "https://openrouter.ai/api/v1";
const GEMINI_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
const OPENAI_BASE: &str = "https://api.openai.com/v1";

/// Which service an API key belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    OpenRouter,
    Gemini,
    OpenAi,
}

impl Backend {
    /// Guess the backend from the key shape, or from a custom base URL
    pub fn detect(api_key: &str, api_base: Option<&str>) -> Self {
        if let Some(base) = api_base {
            if base.contains("openrouter") {
                return Backend::OpenRouter;
            }
            if base.contains("generativelanguage") {
                return Backend::Gemini;
            }
        }
        if api_key.starts_with("sk-or-") {
            Backend::OpenRouter
        } else if api_key.starts_with("AIza") {
            Backend::Gemini
        } else {
            Backend::OpenAi
        }
    }

    fn base_url(&self) -> &'static str {
        match self {
            Backend::OpenRouter => OPENROUTER_BASE,
            Backend::Gemini => GEMINI_BASE,
            Backend::OpenAi => OPENAI_BASE,
        }
    }

    fn default_model(&self) -> &'static str {
        match self {
            Backend::OpenRouter => "google/gemini-2.5-flash",
            Backend::Gemini => "gemini-2.5-flash",
            Backend::OpenAi => "gpt-4o-mini",
        }
    }
}

/// HTTP model collaborator
pub struct OpenAiCompatProvider {
    client: Client,
    api_key: String,
    api_base: String,
    default_model: String,
    backend: Backend,
}

impl OpenAiCompatProvider {
    pub fn new(
        api_key: impl Into<String>,
        api_base: Option<String>,
        default_model: Option<String>,
    ) -> Self {
        let api_key = api_key.into();
        let backend = Backend::detect(&api_key, api_base.as_deref());
        let api_base = api_base
            .map(|b| b.trim_end_matches('/').to_string())
            .unwrap_or_else(|| backend.base_url().to_string());
        let default_model = default_model.unwrap_or_else(|| backend.default_model().to_string());

        Self {
            client: Client::new(),
            api_key,
            api_base,
            default_model,
            backend,
        }
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    fn build_request(&self, params: &ChatParams) -> serde_json::Value {
        let model = if params.model.is_empty() {
            self.default_model.clone()
        } else {
            params.model.clone()
        };

        let messages: Vec<serde_json::Value> = params
            .messages
            .iter()
            .map(|m| {
                let mut obj = json!({ "role": m.role.as_str() });
                if let Some(content) = &m.content {
                    obj["content"] = json!(content);
                }
                if let Some(tool_calls) = &m.tool_calls {
                    // The wire format wants arguments as an encoded JSON string
                    let calls: Vec<serde_json::Value> = tool_calls
                        .iter()
                        .map(|tc| {
                            json!({
                                "id": &tc.id,
                                "type": &tc.call_type,
                                "function": {
                                    "name": &tc.function.name,
                                    "arguments": tc.function.arguments.to_string(),
                                }
                            })
                        })
                        .collect();
                    obj["tool_calls"] = json!(calls);
                }
                if let Some(tool_call_id) = &m.tool_call_id {
                    obj["tool_call_id"] = json!(tool_call_id);
                }
                if let Some(name) = &m.name {
                    obj["name"] = json!(name);
                }
                obj
            })
            .collect();

        let mut body = json!({
            "model": model,
            "messages": messages,
            "max_tokens": params.max_tokens,
            "temperature": params.temperature,
        });

        if !params.tools.is_empty() {
            body["tools"] = json!(params.tools);
            body["tool_choice"] = match &params.tool_choice {
                ToolChoice::Auto => json!("auto"),
                ToolChoice::None => json!("none"),
            };
        }

        body
    }

    fn parse_response(&self, json: serde_json::Value) -> Result<ChatResponse> {
        let choice = json["choices"]
            .get(0)
            .ok_or(ProviderError::InvalidResponse)?;
        let message = &choice["message"];
        let content = message["content"]
            .as_str()
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string());
        let finish_reason = choice["finish_reason"]
            .as_str()
            .unwrap_or("stop")
            .to_string();

        let mut tool_calls = Vec::new();
        if let Some(calls) = message["tool_calls"].as_array() {
            for call in calls {
                let function = &call["function"];
                let name = function["name"]
                    .as_str()
                    .ok_or(ProviderError::InvalidResponse)?
                    .to_string();
                let arguments = match &function["arguments"] {
                    serde_json::Value::String(raw) if raw.trim().is_empty() => json!({}),
                    serde_json::Value::String(raw) => serde_json::from_str(raw)?,
                    serde_json::Value::Null => json!({}),
                    other => other.clone(),
                };
                let id = call["id"]
                    .as_str()
                    .filter(|id| !id.is_empty())
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| format!("call_{}", uuid::Uuid::new_v4().simple()));

                tool_calls.push(ToolCall {
                    id,
                    name,
                    arguments,
                });
            }
        }

        let usage = match json["usage"].as_object() {
            Some(usage) => Usage {
                prompt_tokens: usage
                    .get("prompt_tokens")
                    .and_then(|v| v.as_u64())
                    .unwrap_or(0) as u32,
                completion_tokens: usage
                    .get("completion_tokens")
                    .and_then(|v| v.as_u64())
                    .unwrap_or(0) as u32,
                total_tokens: usage
                    .get("total_tokens")
                    .and_then(|v| v.as_u64())
                    .unwrap_or(0) as u32,
            },
            None => Usage::default(),
        };

        Ok(ChatResponse {
            content,
            tool_calls,
            finish_reason,
            usage,
        })
    }
}

/// `error.message` from a JSON error body, else the raw body
fn error_message(body: &str) -> String {
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| json["error"]["message"].as_str().map(str::to_string));

    match from_json {
        Some(message) => message,
        None if body.trim().is_empty() => "empty response body".to_string(),
        None => body.trim().to_string(),
    }
}

#[async_trait::async_trait]
impl Provider for OpenAiCompatProvider {
    async fn chat(&self, params: ChatParams) -> Result<ChatResponse> {
        if self.api_key.is_empty() {
            return Err(ProviderError::NoApiKey);
        }
        trace!("POST {}/chat/completions ({:?})", self.api_base, self.backend);

        let url = format!("{}/chat/completions", self.api_base);
        let body = self.build_request(&params);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(ProviderError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await?;
            return Err(ProviderError::Api(format!(
                "{}: {}",
                status.as_u16(),
                error_message(&body)
            )));
        }

        let json: serde_json::Value = response.json().await?;
        let parsed = self.parse_response(json)?;
        debug!(
            "Model replied with {} tool call(s), finish_reason={}",
            parsed.tool_calls.len(),
            parsed.finish_reason
        );
        Ok(parsed)
    }

    fn default_model(&self) -> String {
        self.default_model.clone()
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}
