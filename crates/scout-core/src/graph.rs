//! Analysis Graph
//!
//! The orchestration state machine sequencing the analyst and
//! risk-checker reasoning steps with tool execution in between. The
//! transcript accumulates by order-preserving concatenation; routing
//! depends only on whether the latest step requested tool calls.

use crate::error::{AgentError, Result};
use crate::message::{Conversation, Message};
use crate::step::ReasoningStep;
use crate::tool::{ToolRegistry, ToolResult};
use std::sync::Arc;

/// Nodes of the analysis state machine
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GraphNode {
    Analyst,
    ToolsAfterAnalyst,
    RiskChecker,
    ToolsAfterRisk,
    Done,
}

/// Ceiling on graph steps per conversation, guarding against tool-call
/// loops between the two reasoning steps.
pub const DEFAULT_MAX_STEPS: usize = 10;

/// The two-step analysis graph
///
/// Analyst -> (tool loop) -> RiskChecker -> (tool loop) -> Done.
/// Tool results always route back to the analyst, including results for
/// calls the risk checker requested. That routing is inherited behavior
/// and must stay as is.
pub struct ScoutGraph {
    analyst: ReasoningStep,
    risk_checker: ReasoningStep,
    tools: Arc<ToolRegistry>,
    max_steps: usize,
}

impl ScoutGraph {
    pub fn new(
        analyst: ReasoningStep,
        risk_checker: ReasoningStep,
        tools: Arc<ToolRegistry>,
    ) -> Self {
        Self {
            analyst,
            risk_checker,
            tools,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Drive the graph from its start node to `Done`, appending every
    /// produced message to `conversation`.
    ///
    /// On `IterationLimit` the conversation keeps the partial
    /// transcript accumulated so far.
    pub async fn run(&self, conversation: &mut Conversation) -> Result<()> {
        let mut node = GraphNode::Analyst;
        let mut steps = 0usize;

        while node != GraphNode::Done {
            steps += 1;
            if steps > self.max_steps {
                tracing::warn!(
                    max_steps = self.max_steps,
                    transcript_len = conversation.len(),
                    "iteration limit exceeded, stopping with partial transcript"
                );
                return Err(AgentError::IterationLimit(self.max_steps));
            }

            tracing::debug!(node = ?node, step = steps, "entering graph node");

            node = match node {
                GraphNode::Analyst => {
                    let msg = self.analyst.invoke(conversation).await?;
                    let requested_tools = msg.has_tool_calls();
                    conversation.push(msg);
                    if requested_tools {
                        GraphNode::ToolsAfterAnalyst
                    } else {
                        GraphNode::RiskChecker
                    }
                }
                GraphNode::ToolsAfterAnalyst => {
                    self.run_pending_tools(conversation).await?;
                    GraphNode::Analyst
                }
                GraphNode::RiskChecker => {
                    let msg = self.risk_checker.invoke(conversation).await?;
                    let requested_tools = msg.has_tool_calls();
                    conversation.push(msg);
                    if requested_tools {
                        GraphNode::ToolsAfterRisk
                    } else {
                        GraphNode::Done
                    }
                }
                GraphNode::ToolsAfterRisk => {
                    // Inherited routing: control re-enters the analyst,
                    // not the step that issued the calls.
                    self.run_pending_tools(conversation).await?;
                    GraphNode::Analyst
                }
                GraphNode::Done => GraphNode::Done,
            };
        }

        Ok(())
    }

    /// Execute every tool call pending on the latest message, in
    /// request order, appending one tool-result message per call.
    ///
    /// Execution failures become textual results the next reasoning
    /// step sees as data. An unknown tool name is a programming error
    /// and aborts the run.
    async fn run_pending_tools(&self, conversation: &mut Conversation) -> Result<()> {
        let calls = conversation
            .last()
            .map(|m| m.tool_calls.clone())
            .unwrap_or_default();

        for call in calls {
            tracing::debug!(tool = %call.name, "executing tool");

            let result = match self.tools.execute(&call).await {
                Ok(result) => result,
                Err(err @ AgentError::ToolNotFound(_)) => return Err(err),
                Err(e) => ToolResult::failure(&call.name, format!("Error: {}", e)),
            };

            conversation.push(Message::tool(result.output, &call.name, call.id.clone()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;
    use crate::provider::{Completion, GenerationOptions, LlmProvider};
    use crate::tool::{ParameterSchema, Tool, ToolCall, ToolSchema};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Provider that replays a fixed completion script and records the
    /// tool subset each invocation was bound to.
    struct ScriptedProvider {
        script: Mutex<Vec<Completion>>,
        bound_tools: Mutex<Vec<Vec<String>>>,
    }

    impl ScriptedProvider {
        fn new(script: Vec<Completion>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script),
                bound_tools: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn health_check(&self) -> crate::error::Result<bool> {
            Ok(true)
        }

        async fn complete(
            &self,
            _messages: &[crate::message::Message],
            tools: &[ToolSchema],
            _options: &GenerationOptions,
        ) -> crate::error::Result<Completion> {
            self.bound_tools
                .lock()
                .unwrap()
                .push(tools.iter().map(|t| t.name.clone()).collect());
            Ok(self.script.lock().unwrap().remove(0))
        }
    }

    struct StubTool {
        name: &'static str,
        output: &'static str,
    }

    #[async_trait]
    impl Tool for StubTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: self.name.into(),
                description: "stub".into(),
                parameters: vec![ParameterSchema {
                    name: "asset".into(),
                    param_type: "string".into(),
                    description: "Asset symbol".into(),
                    required: true,
                }],
            }
        }

        async fn execute(&self, _call: &ToolCall) -> crate::error::Result<ToolResult> {
            Ok(ToolResult::success(self.name, self.output))
        }
    }

    fn registry() -> Arc<ToolRegistry> {
        let mut tools = ToolRegistry::new();
        tools.register(StubTool {
            name: "get_stablecoin_yield",
            output: "The current live supply APY for USDC on Aave V3 is 3.00%.",
        });
        tools.register(StubTool {
            name: "check_risk_metrics",
            output: "Oracle price for USDC is $1.0000. Peg status: HEALTHY.",
        });
        Arc::new(tools)
    }

    fn graph(provider: Arc<ScriptedProvider>, tools: Arc<ToolRegistry>) -> ScoutGraph {
        let analyst = ReasoningStep::new(
            "analyst",
            provider.clone(),
            vec![tools.schema("get_stablecoin_yield").unwrap()],
            None,
            GenerationOptions::default(),
        );
        let risk_checker = ReasoningStep::new(
            "risk_checker",
            provider,
            vec![tools.schema("check_risk_metrics").unwrap()],
            Some("Be skeptical.".into()),
            GenerationOptions::default(),
        );
        ScoutGraph::new(analyst, risk_checker, tools)
    }

    fn answer(content: &str) -> Completion {
        Completion {
            content: content.into(),
            tool_calls: Vec::new(),
            model: "test".into(),
            usage: None,
            finish_reason: None,
        }
    }

    fn tool_request(name: &str, id: &str) -> Completion {
        let mut arguments = HashMap::new();
        arguments.insert("asset".into(), serde_json::json!("USDC"));
        Completion {
            content: String::new(),
            tool_calls: vec![ToolCall {
                name: name.into(),
                arguments,
                id: Some(id.into()),
            }],
            model: "test".into(),
            usage: None,
            finish_reason: None,
        }
    }

    #[tokio::test]
    async fn test_happy_path_transcript_order() {
        let provider = ScriptedProvider::new(vec![
            tool_request("get_stablecoin_yield", "call_1"),
            answer("USDC yields 3.00% on Aave V3."),
            answer("Peg looks healthy, no liquidity concerns."),
        ]);
        let graph = graph(provider.clone(), registry());

        let mut conv = Conversation::seeded("What is the USDC yield, and is it safe?");
        graph.run(&mut conv).await.unwrap();

        let roles: Vec<Role> = conv.messages().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                Role::User,
                Role::Assistant,
                Role::Tool,
                Role::Assistant,
                Role::Assistant
            ]
        );

        // Tool result correlates to the call that requested it
        let tool_msg = &conv.messages()[2];
        assert_eq!(tool_msg.tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(tool_msg.name.as_deref(), Some("get_stablecoin_yield"));

        // Each step only ever sees its bound tool
        let bound = provider.bound_tools.lock().unwrap();
        assert_eq!(
            *bound,
            vec![
                vec!["get_stablecoin_yield".to_string()],
                vec!["get_stablecoin_yield".to_string()],
                vec!["check_risk_metrics".to_string()],
            ]
        );
    }

    #[tokio::test]
    async fn test_risk_checker_tool_results_route_to_analyst() {
        let provider = ScriptedProvider::new(vec![
            answer("Yield is around 3% from what I recall."),
            tool_request("check_risk_metrics", "call_9"),
            answer("Confirmed: peg is healthy."),
            answer("No de-peg or liquidity issues."),
        ]);
        let graph = graph(provider.clone(), registry());

        let mut conv = Conversation::seeded("Is USDC safe for a large deposit?");
        graph.run(&mut conv).await.unwrap();

        let roles: Vec<Role> = conv.messages().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                Role::User,
                Role::Assistant,
                Role::Assistant,
                Role::Tool,
                Role::Assistant,
                Role::Assistant
            ]
        );

        // The invocation after the risk checker's tool call was bound to
        // the yield tool: control went back to the analyst, not the step
        // that issued the call.
        let bound = provider.bound_tools.lock().unwrap();
        assert_eq!(bound[2], vec!["get_stablecoin_yield".to_string()]);
    }

    #[tokio::test]
    async fn test_iteration_limit_preserves_partial_transcript() {
        // Analyst requests the same tool forever
        let script: Vec<Completion> = (0..10)
            .map(|i| tool_request("get_stablecoin_yield", &format!("call_{}", i)))
            .collect();
        let provider = ScriptedProvider::new(script);
        let graph = graph(provider, registry()).with_max_steps(4);

        let mut conv = Conversation::seeded("loop forever");
        let err = graph.run(&mut conv).await.unwrap_err();

        assert!(matches!(err, AgentError::IterationLimit(4)));
        assert!(conv.len() > 1);
    }

    #[tokio::test]
    async fn test_unregistered_tool_name_is_fatal() {
        let provider = ScriptedProvider::new(vec![tool_request("drain_wallet", "call_1")]);
        let graph = graph(provider, registry());

        let mut conv = Conversation::seeded("anything");
        let err = graph.run(&mut conv).await.unwrap_err();
        assert!(matches!(err, AgentError::ToolNotFound(_)));
    }

    #[tokio::test]
    async fn test_multiple_calls_execute_in_request_order() {
        let mut arguments = HashMap::new();
        arguments.insert("asset".into(), serde_json::json!("USDC"));
        let both = Completion {
            content: String::new(),
            tool_calls: vec![
                ToolCall {
                    name: "get_stablecoin_yield".into(),
                    arguments: arguments.clone(),
                    id: Some("call_a".into()),
                },
                ToolCall {
                    name: "get_stablecoin_yield".into(),
                    arguments,
                    id: Some("call_b".into()),
                },
            ],
            model: "test".into(),
            usage: None,
            finish_reason: None,
        };
        let provider = ScriptedProvider::new(vec![
            both,
            answer("done"),
            answer("risk: fine"),
        ]);
        let graph = graph(provider, registry());

        let mut conv = Conversation::seeded("double check the yield");
        graph.run(&mut conv).await.unwrap();

        let ids: Vec<&str> = conv
            .messages()
            .iter()
            .filter(|m| m.role == Role::Tool)
            .map(|m| m.tool_call_id.as_deref().unwrap())
            .collect();
        assert_eq!(ids, vec!["call_a", "call_b"]);
    }
}
