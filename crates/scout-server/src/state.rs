//! Application State

use std::sync::Arc;

use scout_core::ScoutGraph;

/// Shared application state
///
/// Read-only wiring built once at startup; nothing here is mutated
/// across requests.
#[derive(Clone)]
pub struct AppState {
    /// The analysis graph (None when no Groq key was configured)
    pub graph: Option<Arc<ScoutGraph>>,

    /// Whether a Groq API key was present at startup
    pub groq_configured: bool,
}
