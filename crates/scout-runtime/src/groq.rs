//! Groq LLM Provider
//!
//! Implementation of `LlmProvider` against Groq's OpenAI-compatible
//! chat-completions API, including native function calling.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use scout_core::{
    error::{AgentError, Result},
    message::{Message, Role},
    provider::{Completion, FinishReason, GenerationOptions, LlmProvider, TokenUsage},
    tool::{ToolCall, ToolSchema},
};

/// Groq provider configuration
#[derive(Clone, Debug)]
pub struct GroqConfig {
    /// API key (bearer token)
    pub api_key: String,

    /// API base URL
    pub base_url: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl GroqConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.groq.com/openai/v1".into(),
            timeout_secs: 60,
        }
    }
}

/// Groq LLM provider
pub struct GroqProvider {
    client: reqwest::Client,
    config: GroqConfig,
}

impl GroqProvider {
    /// Create a new provider with the given API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::from_config(GroqConfig::new(api_key))
    }

    /// Create from configuration
    pub fn from_config(config: GroqConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

// ============================================================================
// Wire Format
// ============================================================================

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "type")]
    call_type: String,
    function: WireFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    /// JSON object encoded as a string, per the OpenAI wire format
    arguments: String,
}

#[derive(Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: WireFunctionDef,
}

#[derive(Serialize)]
struct WireFunctionDef {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    model: String,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: WireMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct WireUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

// ============================================================================
// Conversions
// ============================================================================

/// Convert an agent message to the OpenAI wire shape
fn to_wire(message: &Message) -> Result<WireMessage> {
    let role = message.role.to_string();

    match message.role {
        Role::Assistant if message.has_tool_calls() => {
            let calls = message
                .tool_calls
                .iter()
                .map(|call| {
                    Ok(WireToolCall {
                        id: call.id.clone(),
                        call_type: "function".into(),
                        function: WireFunctionCall {
                            name: call.name.clone(),
                            arguments: serde_json::to_string(&call.arguments)?,
                        },
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            Ok(WireMessage {
                role,
                content: (!message.content.is_empty()).then(|| message.content.clone()),
                tool_calls: Some(calls),
                ..Default::default()
            })
        }
        Role::Tool => Ok(WireMessage {
            role,
            content: Some(message.content.clone()),
            tool_call_id: message.tool_call_id.clone(),
            name: message.name.clone(),
            ..Default::default()
        }),
        _ => Ok(WireMessage {
            role,
            content: Some(message.content.clone()),
            ..Default::default()
        }),
    }
}

fn to_wire_tool(schema: &ToolSchema) -> WireTool {
    WireTool {
        tool_type: "function",
        function: WireFunctionDef {
            name: schema.name.clone(),
            description: schema.description.clone(),
            parameters: schema.parameters_json(),
        },
    }
}

/// Convert a chat response into an agent completion
fn convert_completion(response: ChatResponse) -> Result<Completion> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| AgentError::Provider("response contained no choices".into()))?;

    let tool_calls = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|call| {
            let arguments: HashMap<String, serde_json::Value> =
                if call.function.arguments.trim().is_empty() {
                    HashMap::new()
                } else {
                    serde_json::from_str(&call.function.arguments).map_err(|e| {
                        AgentError::Parse(format!("tool call arguments: {}", e))
                    })?
                };

            Ok(ToolCall {
                name: call.function.name,
                arguments,
                id: call.id,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let finish_reason = choice.finish_reason.as_deref().map(|reason| match reason {
        "length" => FinishReason::Length,
        "tool_calls" => FinishReason::ToolUse,
        "content_filter" => FinishReason::ContentFilter,
        _ => FinishReason::Stop,
    });

    Ok(Completion {
        content: choice.message.content.unwrap_or_default(),
        tool_calls,
        model: response.model,
        usage: response.usage.map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        }),
        finish_reason,
    })
}

fn map_transport_error(err: reqwest::Error) -> AgentError {
    if err.is_timeout() {
        AgentError::ProviderUnavailable(format!("request timed out: {}", err))
    } else {
        AgentError::ProviderUnavailable(err.to_string())
    }
}

#[async_trait]
impl LlmProvider for GroqProvider {
    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/models", self.config.base_url);
        match self
            .client
            .get(&url)
            .bearer_auth(&self.config.api_key)
            .timeout(Duration::from_secs(10))
            .send()
            .await
        {
            Ok(response) => Ok(response.status().is_success()),
            Err(e) => {
                tracing::warn!("Groq health check failed: {}", e);
                Ok(false)
            }
        }
    }

    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolSchema],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        let request = ChatRequest {
            model: &options.model,
            messages: messages.iter().map(to_wire).collect::<Result<Vec<_>>>()?,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            top_p: options.top_p,
            tools: tools.iter().map(to_wire_tool).collect(),
        };

        let url = format!("{}/chat/completions", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .json(&request)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Provider(format!("HTTP {}: {}", status, body)));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Provider(format!("malformed response: {}", e)))?;

        convert_completion(parsed)
    }
}
