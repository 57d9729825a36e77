//! Reasoning Steps
//!
//! A reasoning step is one invocation of the LLM, bound to a restricted
//! tool subset, producing exactly one new message: either a final
//! answer or a request for tool calls. Content is non-deterministic;
//! only tool-call presence drives routing.

use std::sync::Arc;

use crate::error::Result;
use crate::message::{Conversation, Message};
use crate::provider::{GenerationOptions, LlmProvider};
use crate::tool::ToolSchema;

/// One specialized reasoning step of the analysis graph
pub struct ReasoningStep {
    /// Step label, used for logging
    name: &'static str,

    provider: Arc<dyn LlmProvider>,

    /// The tool subset this step's model is allowed to request
    tools: Vec<ToolSchema>,

    /// Fixed system instruction prepended to the model input.
    /// Never appended to the transcript itself.
    preamble: Option<String>,

    options: GenerationOptions,
}

impl ReasoningStep {
    pub fn new(
        name: &'static str,
        provider: Arc<dyn LlmProvider>,
        tools: Vec<ToolSchema>,
        preamble: Option<String>,
        options: GenerationOptions,
    ) -> Self {
        Self {
            name,
            provider,
            tools,
            preamble,
            options,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Run this step against the transcript so far, producing one new
    /// assistant message. Missing tool-call ids are filled in so every
    /// call can later be correlated to its result.
    pub async fn invoke(&self, conversation: &Conversation) -> Result<Message> {
        let mut input: Vec<Message> = Vec::with_capacity(conversation.len() + 1);
        if let Some(preamble) = &self.preamble {
            input.push(Message::system(preamble.clone()));
        }
        input.extend_from_slice(conversation.messages());

        let completion = self
            .provider
            .complete(&input, &self.tools, &self.options)
            .await?;

        let mut calls = completion.tool_calls;
        for call in &mut calls {
            if call.id.is_none() {
                call.id = Some(uuid::Uuid::new_v4().to_string());
            }
        }

        tracing::debug!(
            step = self.name,
            tool_calls = calls.len(),
            "reasoning step completed"
        );

        Ok(Message::assistant_with_calls(completion.content, calls))
    }
}
