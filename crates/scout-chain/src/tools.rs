//! Agent Tools
//!
//! The two on-chain readers exposed as schema-described tools. Chain
//! failures become failure results with a textual error, so the
//! reasoning steps can explain them instead of aborting the request.

use std::sync::Arc;

use async_trait::async_trait;

use scout_core::{
    tool::ParameterSchema, Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema,
};

use crate::reader::ChainReader;

/// Name of the yield tool bound to the analyst step
pub const YIELD_TOOL: &str = "get_stablecoin_yield";

/// Name of the risk tool bound to the risk-checker step
pub const RISK_TOOL: &str = "check_risk_metrics";

fn asset_parameter() -> ParameterSchema {
    ParameterSchema {
        name: "asset".into(),
        param_type: "string".into(),
        description: "Stablecoin symbol (e.g., 'USDC')".into(),
        required: true,
    }
}

fn asset_argument(call: &ToolCall) -> String {
    call.arguments
        .get("asset")
        .and_then(|v| v.as_str())
        .unwrap_or("USDC")
        .to_uppercase()
}

/// Tool fetching the live Aave V3 supply APY for a stablecoin
pub struct StablecoinYieldTool {
    reader: Arc<ChainReader>,
}

impl StablecoinYieldTool {
    pub fn new(reader: Arc<ChainReader>) -> Self {
        Self { reader }
    }
}

#[async_trait]
impl Tool for StablecoinYieldTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: YIELD_TOOL.into(),
            description:
                "Fetches real-time supply APY for stablecoins on Ethereum Mainnet from Aave V3. \
                 Supported assets: 'USDC'."
                    .into(),
            parameters: vec![asset_parameter()],
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let asset = asset_argument(call);

        match self.reader.supply_rate(&asset).await {
            Ok(rate) => Ok(ToolResult::success(
                YIELD_TOOL,
                format!(
                    "The current live supply APY for {} on Aave V3 is {}%.",
                    asset, rate
                ),
            )),
            Err(e) => {
                tracing::warn!(asset = %asset, error = %e, "yield lookup failed");
                Ok(ToolResult::failure(YIELD_TOOL, format!("Error: {}", e)))
            }
        }
    }
}

/// Tool checking de-peg risk via the Chainlink USD price feed
pub struct RiskMetricsTool {
    reader: Arc<ChainReader>,
}

impl RiskMetricsTool {
    pub fn new(reader: Arc<ChainReader>) -> Self {
        Self { reader }
    }
}

#[async_trait]
impl Tool for RiskMetricsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: RISK_TOOL.into(),
            description:
                "Checks de-peg risk for a stablecoin using its Chainlink USD price feed on \
                 Ethereum Mainnet. Supported assets: 'USDC'."
                    .into(),
            parameters: vec![asset_parameter()],
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let asset = asset_argument(call);

        match self.reader.peg_status(&asset).await {
            Ok(report) => Ok(ToolResult::success(
                RISK_TOOL,
                format!(
                    "Oracle price for {} is ${}. Peg status: {}.",
                    asset,
                    report.price.round_dp(4),
                    report.status
                ),
            )),
            Err(e) => {
                tracing::warn!(asset = %asset, error = %e, "risk lookup failed");
                Ok(ToolResult::failure(RISK_TOOL, format!("Error: {}", e)))
            }
        }
    }
}
