//! # scout-runtime
//!
//! Runtime providers for the stablecoin scout.
//!
//! ## Providers
//!
//! - **Groq**: OpenAI-compatible chat completions with native function
//!   calling, used for both reasoning steps
//!
//! ## Usage
//!
//! ```rust,ignore
//! use scout_runtime::GroqProvider;
//!
//! let provider = Arc::new(GroqProvider::new(api_key));
//! let completion = provider.complete(messages, &tools, &options).await?;
//! ```

pub mod groq;

pub use groq::GroqProvider;

// Re-export core types for convenience
pub use scout_core::{
    AgentError, Conversation, GenerationOptions, LlmProvider, Message, Result, Role,
};
