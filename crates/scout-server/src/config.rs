//! Process Configuration
//!
//! Read once at startup, never re-read. A missing Groq key disables
//! analysis but leaves health checks working.

/// Server configuration from the environment
#[derive(Clone, Debug)]
pub struct Config {
    /// Groq API key; analysis is disabled without it
    pub groq_api_key: Option<String>,

    /// Ethereum JSON-RPC endpoint URL
    pub rpc_url: Option<String>,

    /// Listen port
    pub port: u16,

    /// Verbose logging
    pub debug: bool,
}

impl Config {
    pub fn from_env() -> Self {
        let groq_api_key = std::env::var("GROQ_API_KEY")
            .ok()
            .filter(|k| !k.is_empty());
        let rpc_url = std::env::var("ALCHEMY_RPC_URL")
            .ok()
            .filter(|u| !u.is_empty());
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(5000);
        let debug = std::env::var("DEBUG")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Self {
            groq_api_key,
            rpc_url,
            port,
            debug,
        }
    }
}
