//! Error Types for On-Chain Reads

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChainError>;

/// Failures from the blockchain reader
///
/// All of these end up as textual tool results the reasoning steps can
/// comment on, never as aborted requests.
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("Could not connect to the Ethereum network: {0}")]
    Connection(String),

    #[error("Timed out waiting for the RPC endpoint: {0}")]
    UpstreamTimeout(String),

    #[error("Contract call failed: {0}")]
    ContractCall(String),

    #[error("Asset not supported: {0}")]
    UnsupportedAsset(String),
}
