//! HTTP Handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use scout_core::{Conversation, Message, Role};

use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub groq_api_configured: bool,
    pub graph_initialized: bool,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub query: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub query: String,
    pub messages: Vec<TranscriptMessage>,
    pub status: &'static str,
}

/// One transcript entry on the wire: `{type, content, name?, tool_calls?}`
#[derive(Debug, Serialize)]
pub struct TranscriptMessage {
    #[serde(rename = "type")]
    pub message_type: &'static str,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<TranscriptToolCall>>,
}

#[derive(Debug, Serialize)]
pub struct TranscriptToolCall {
    pub name: String,
    pub args: HashMap<String, serde_json::Value>,
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'static str>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        groq_api_configured: state.groq_configured,
        graph_initialized: state.graph.is_some(),
    })
}

/// Main analysis endpoint
pub async fn analyze(
    State(state): State<AppState>,
    Json(payload): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, (StatusCode, Json<ErrorResponse>)> {
    let query = match payload.query.as_deref().map(str::trim) {
        Some(q) if !q.is_empty() => q.to_string(),
        _ => {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "Query is required".into(),
                    status: None,
                }),
            ));
        }
    };

    let graph = state.graph.as_ref().ok_or_else(|| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "System not initialized. Check GROQ_API_KEY in .env".into(),
                status: None,
            }),
        )
    })?;

    let mut conversation = Conversation::seeded(query.clone());

    if let Err(e) = graph.run(&mut conversation).await {
        tracing::error!("Analysis failed: {}", e);
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: format!("Analysis failed: {}", e.user_message()),
                status: Some("error"),
            }),
        ));
    }

    // The seeded user message is echoed via `query`; the serialized
    // transcript starts at the analyst's first output.
    let messages = conversation
        .messages()
        .iter()
        .skip(1)
        .map(to_transcript)
        .collect();

    Ok(Json(AnalyzeResponse {
        query,
        messages,
        status: "success",
    }))
}

fn to_transcript(message: &Message) -> TranscriptMessage {
    let message_type = match message.role {
        Role::System => "system",
        Role::User => "human",
        Role::Assistant => "ai",
        Role::Tool => "tool",
    };

    let tool_calls = if message.tool_calls.is_empty() {
        None
    } else {
        Some(
            message
                .tool_calls
                .iter()
                .map(|call| TranscriptToolCall {
                    name: call.name.clone(),
                    args: call.arguments.clone(),
                    id: call.id.clone().unwrap_or_default(),
                })
                .collect(),
        )
    };

    TranscriptMessage {
        message_type,
        content: message.content.clone(),
        name: message.name.clone(),
        tool_calls,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{header, Request},
        routing::{get, post},
        Router,
    };
    use scout_core::{
        provider::{Completion, GenerationOptions, LlmProvider},
        tool::{ParameterSchema, Tool, ToolCall, ToolSchema},
        ReasoningStep, Result as CoreResult, ScoutGraph, ToolRegistry, ToolResult,
    };
    use std::sync::{Arc, Mutex};
    use tower::ServiceExt;

    fn app(state: AppState) -> Router {
        Router::new()
            .route("/api/health", get(health_check))
            .route("/api/analyze", post(analyze))
            .with_state(state)
    }

    fn unconfigured_state() -> AppState {
        AppState {
            graph: None,
            groq_configured: false,
        }
    }

    fn post_analyze(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/analyze")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_missing_query_is_rejected() {
        let response = app(unconfigured_state())
            .oneshot(post_analyze("{}"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Query is required");
    }

    #[tokio::test]
    async fn test_blank_query_is_rejected() {
        let response = app(unconfigured_state())
            .oneshot(post_analyze(r#"{"query": "   "}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unconfigured_system_returns_500_for_any_query() {
        let response = app(unconfigured_state())
            .oneshot(post_analyze(r#"{"query": "What is the USDC yield?"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("GROQ_API_KEY"));
    }

    #[tokio::test]
    async fn test_health_reflects_startup_configuration() {
        let response = app(unconfigured_state())
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["groq_api_configured"], false);
        assert_eq!(body["graph_initialized"], false);
    }

    // ------------------------------------------------------------------
    // Success path against a scripted provider
    // ------------------------------------------------------------------

    struct ScriptedProvider {
        script: Mutex<Vec<Completion>>,
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn health_check(&self) -> CoreResult<bool> {
            Ok(true)
        }

        async fn complete(
            &self,
            _messages: &[Message],
            _tools: &[ToolSchema],
            _options: &GenerationOptions,
        ) -> CoreResult<Completion> {
            Ok(self.script.lock().unwrap().remove(0))
        }
    }

    struct StubYieldTool;

    #[async_trait]
    impl Tool for StubYieldTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "get_stablecoin_yield".into(),
                description: "stub".into(),
                parameters: vec![ParameterSchema {
                    name: "asset".into(),
                    param_type: "string".into(),
                    description: "Asset symbol".into(),
                    required: true,
                }],
            }
        }

        async fn execute(&self, _call: &ToolCall) -> CoreResult<ToolResult> {
            Ok(ToolResult::success(
                "get_stablecoin_yield",
                "The current live supply APY for USDC on Aave V3 is 3.00%.",
            ))
        }
    }

    fn scripted_state(script: Vec<Completion>) -> AppState {
        let provider = Arc::new(ScriptedProvider {
            script: Mutex::new(script),
        });

        let mut tools = ToolRegistry::new();
        tools.register(StubYieldTool);
        let tools = Arc::new(tools);

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
            Vec::new(),
            Some("Be skeptical.".into()),
            GenerationOptions::default(),
        );

        AppState {
            graph: Some(Arc::new(ScoutGraph::new(analyst, risk_checker, tools))),
            groq_configured: true,
        }
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

    fn yield_request(id: &str) -> Completion {
        let mut arguments = HashMap::new();
        arguments.insert("asset".to_string(), serde_json::json!("USDC"));
        Completion {
            content: String::new(),
            tool_calls: vec![ToolCall {
                name: "get_stablecoin_yield".into(),
                arguments,
                id: Some(id.into()),
            }],
            model: "test".into(),
            usage: None,
            finish_reason: None,
        }
    }

    #[tokio::test]
    async fn test_success_transcript_starts_with_analyst_output() {
        let state = scripted_state(vec![
            yield_request("call_1"),
            answer("USDC yields 3.00% on Aave V3."),
            answer("Peg is healthy."),
        ]);

        let response = app(state)
            .oneshot(post_analyze(r#"{"query": "What is the USDC yield?"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;

        assert_eq!(body["status"], "success");
        assert_eq!(body["query"], "What is the USDC yield?");

        let messages = body["messages"].as_array().unwrap();
        assert!(!messages.is_empty());

        // First entry is the analyst's tool request, never the seeded
        // user message or a tool result
        assert_eq!(messages[0]["type"], "ai");
        assert_eq!(messages[0]["tool_calls"][0]["name"], "get_stablecoin_yield");
        assert_eq!(messages[0]["tool_calls"][0]["id"], "call_1");
        assert_eq!(messages[0]["tool_calls"][0]["args"]["asset"], "USDC");

        // The tool result correlates back to the call that produced it
        assert_eq!(messages[1]["type"], "tool");
        assert_eq!(messages[1]["name"], "get_stablecoin_yield");
        assert!(messages[1]["content"]
            .as_str()
            .unwrap()
            .contains("3.00%"));

        assert_eq!(messages[2]["type"], "ai");
        assert_eq!(messages[3]["type"], "ai");
    }
}
