//! Ethereum JSON-RPC Client
//!
//! Minimal read-only client: `eth_call` against the latest block. One
//! request per call, bounded timeout, no retries.

use serde::Deserialize;
use std::time::Duration;

use crate::error::{ChainError, Result};

/// Per-request timeout for RPC calls
const RPC_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<String>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// Read-only Ethereum JSON-RPC client
///
/// The endpoint is optional: an unconfigured client is constructible
/// (so the server can boot without an RPC URL) but every call fails
/// with a connection error.
pub struct EthRpcClient {
    http: reqwest::Client,
    endpoint: Option<String>,
}

impl EthRpcClient {
    pub fn new(endpoint: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }

    /// Execute `eth_call` against the latest block and return the raw
    /// ABI-encoded result bytes.
    pub async fn call(&self, to: &str, data: &[u8]) -> Result<Vec<u8>> {
        let endpoint = self
            .endpoint
            .as_deref()
            .ok_or_else(|| ChainError::Connection("RPC endpoint not configured".into()))?;

        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_call",
            "params": [
                {"to": to, "data": format!("0x{}", hex::encode(data))},
                "latest",
            ],
        });

        let response = self
            .http
            .post(endpoint)
            .timeout(RPC_TIMEOUT)
            .json(&payload)
            .send()
            .await
            .map_err(map_transport_error)?;

        if !response.status().is_success() {
            return Err(ChainError::Connection(format!(
                "RPC endpoint returned HTTP {}",
                response.status()
            )));
        }

        let body: RpcResponse = response
            .json()
            .await
            .map_err(|e| ChainError::ContractCall(format!("malformed RPC response: {}", e)))?;

        if let Some(err) = body.error {
            return Err(ChainError::ContractCall(format!(
                "RPC error {}: {}",
                err.code, err.message
            )));
        }

        let result = body
            .result
            .ok_or_else(|| ChainError::ContractCall("RPC response missing result".into()))?;

        decode_hex(&result)
    }
}

fn map_transport_error(err: reqwest::Error) -> ChainError {
    if err.is_timeout() {
        ChainError::UpstreamTimeout(err.to_string())
    } else {
        ChainError::Connection(err.to_string())
    }
}

fn decode_hex(value: &str) -> Result<Vec<u8>> {
    let stripped = value.strip_prefix("0x").unwrap_or(value);
    hex::decode(stripped)
        .map_err(|e| ChainError::ContractCall(format!("invalid hex in result: {}", e)))
}
