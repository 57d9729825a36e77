//! # scout-core
//!
//! Core agent logic for the stablecoin scout: provider-agnostic LLM
//! abstraction, tool framework, and the two-step analysis graph.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       ScoutGraph                             │
//! │  ┌───────────┐   ┌──────────────┐   ┌────────────────────┐  │
//! │  │  Analyst  │──▶│  Tool Loop   │──▶│   Risk Checker     │  │
//! │  │   step    │◀──│  (Registry)  │   │      step          │  │
//! │  └───────────┘   └──────────────┘   └────────────────────┘  │
//! │        │                │                     │             │
//! │        └────── LlmProvider (Strategy) ────────┘             │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `LlmProvider` trait enables swapping between Groq, OpenAI, or any
//! other function-calling backend without changing graph logic.

pub mod error;
pub mod graph;
pub mod message;
pub mod provider;
pub mod step;
pub mod tool;

pub use error::{AgentError, Result};
pub use graph::{GraphNode, ScoutGraph};
pub use message::{Conversation, Message, Role};
pub use provider::{GenerationOptions, LlmProvider};
pub use step::ReasoningStep;
pub use tool::{Tool, ToolCall, ToolRegistry, ToolResult, ToolSchema};
