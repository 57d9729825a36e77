//! StableScout HTTP Server
//!
//! Axum-based server exposing the two-step stablecoin analysis graph:
//! an analyst step bound to the Aave yield tool and a skeptical
//! risk-checker step bound to the peg oracle tool.

mod config;
mod handlers;
mod state;

use std::sync::Arc;

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scout_chain::{
    ChainReader, EthRpcClient, RiskMetricsTool, StablecoinYieldTool, RISK_CHECKER_PROMPT,
    RISK_TOOL, YIELD_TOOL,
};
use scout_core::{
    GenerationOptions, LlmProvider, ReasoningStep, ScoutGraph, ToolRegistry,
};
use scout_runtime::GroqProvider;

use crate::config::Config;
use crate::handlers::{analyze, health_check};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    let config = Config::from_env();

    // Initialize tracing
    let default_filter = if config.debug {
        "debug,tower_http=debug"
    } else {
        "info,tower_http=debug"
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Initialize the on-chain reader and tools
    let reader = Arc::new(ChainReader::new(EthRpcClient::new(config.rpc_url.clone())));

    if config.rpc_url.is_none() {
        tracing::warn!("⚠ ALCHEMY_RPC_URL not set - on-chain reads will fail");
    }

    let mut tools = ToolRegistry::new();
    tools.register(StablecoinYieldTool::new(reader.clone()));
    tools.register(RiskMetricsTool::new(reader));
    let tools = Arc::new(tools);

    tracing::info!("Registered {} tools:", tools.len());
    for name in tools.names() {
        tracing::info!("  • {}", name);
    }

    // Initialize the analysis graph (requires the Groq key)
    let graph = match &config.groq_api_key {
        Some(key) => {
            let provider: Arc<dyn LlmProvider> = Arc::new(GroqProvider::new(key.clone()));

            match provider.health_check().await {
                Ok(true) => tracing::info!("✓ Connected to Groq"),
                Ok(false) | Err(_) => {
                    tracing::warn!("⚠ Groq not reachable - analysis requests may fail");
                }
            }

            let options = GenerationOptions::default();
            let analyst = ReasoningStep::new(
                "analyst",
                provider.clone(),
                vec![tools
                    .schema(YIELD_TOOL)
                    .context("yield tool not registered")?],
                None,
                options.clone(),
            );
            let risk_checker = ReasoningStep::new(
                "risk_checker",
                provider,
                vec![tools
                    .schema(RISK_TOOL)
                    .context("risk tool not registered")?],
                Some(RISK_CHECKER_PROMPT.into()),
                options,
            );

            Some(Arc::new(ScoutGraph::new(analyst, risk_checker, tools)))
        }
        None => {
            tracing::warn!("⚠ GROQ_API_KEY not found - analysis disabled");
            None
        }
    };

    // Build application state
    let state = AppState {
        groq_configured: config.groq_api_key.is_some(),
        graph,
    };

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = Router::new()
        .route("/api/health", get(health_check))
        .route("/api/analyze", post(analyze))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 StableScout API server running on http://{}", addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!(
        "GROQ API Key: {}",
        if state.groq_configured { "✓ Configured" } else { "✗ Missing" }
    );
    tracing::info!(
        "Graph Status: {}",
        if state.graph.is_some() { "✓ Ready" } else { "✗ Not Initialized" }
    );
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /api/health   - Health check");
    tracing::info!("  POST /api/analyze  - Run yield/risk analysis");
    tracing::info!("");

    axum::serve(listener, app).await?;

    Ok(())
}
