//! # scout-chain
//!
//! Read-only Ethereum Mainnet queries backing the stablecoin scout:
//! the Aave V3 supply rate for an asset and the Chainlink USD price
//! with a peg-health classification, plus the agent tools wrapping
//! them.
//!
//! Contract and oracle addresses are fixed, and only USDC carries an
//! address mapping. That is a scope limit, not a design to generalize.

pub mod error;
pub mod reader;
pub mod rpc;
pub mod tools;

pub use error::{ChainError, Result};
pub use reader::{ChainReader, PegReport, PegStatus};
pub use rpc::EthRpcClient;
pub use tools::{RiskMetricsTool, StablecoinYieldTool, RISK_TOOL, YIELD_TOOL};

/// Fixed preamble for the risk-checker step
pub const RISK_CHECKER_PROMPT: &str = "\
You are a skeptical DeFi risk officer. Your only job is to double-check \
yield opportunities for de-peg and liquidity issues before anyone acts on \
them. Use the check_risk_metrics tool to verify the stablecoin's peg, and \
flag anything outside the expected band. Do not evaluate returns, \
strategy, or anything beyond de-peg and liquidity risk.";
