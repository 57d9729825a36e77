//! On-Chain Readers
//!
//! Two read-only queries against Ethereum Mainnet: the Aave V3 supply
//! rate for an asset, and the Chainlink USD price with a peg-health
//! classification. Contract addresses are fixed and only USDC has an
//! address mapping.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::{ChainError, Result};
use crate::rpc::EthRpcClient;

/// Aave V3 Pool on Ethereum Mainnet
const AAVE_V3_POOL: &str = "0x87870Bca3f3fD6335C3f4ce8392D69350B4fA4E2";

/// USDC token on Ethereum Mainnet
const USDC_ADDRESS: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0ce3606eb48";

/// Chainlink USDC/USD aggregator on Ethereum Mainnet
const CHAINLINK_USDC_USD_FEED: &str = "0x8fFfFfd4AfB6115b954Bd326cbe7B4BA576818f6";

/// `getReserveData(address)`
const GET_RESERVE_DATA_SELECTOR: [u8; 4] = [0x35, 0xea, 0x6a, 0x75];

/// `latestRoundData()`
const LATEST_ROUND_DATA_SELECTOR: [u8; 4] = [0xfe, 0xaf, 0x96, 0x8c];

/// Aave rates are ray-scaled fixed point (1e27)
const RAY_SCALE: u32 = 27;

/// Chainlink USD feeds answer with 8 decimals
const FEED_DECIMALS: u32 = 8;

/// Peg-health classification for a stablecoin price
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PegStatus {
    Healthy,
    DePegged,
}

impl std::fmt::Display for PegStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PegStatus::Healthy => write!(f, "HEALTHY"),
            PegStatus::DePegged => write!(f, "DE-PEGGED"),
        }
    }
}

/// Oracle price and its classification
#[derive(Clone, Copy, Debug)]
pub struct PegReport {
    pub price: Decimal,
    pub status: PegStatus,
}

/// Read-only view over the lending pool and the price oracle
pub struct ChainReader {
    rpc: EthRpcClient,
}

impl ChainReader {
    pub fn new(rpc: EthRpcClient) -> Self {
        Self { rpc }
    }

    fn asset_address(asset: &str) -> Result<&'static str> {
        match asset.to_uppercase().as_str() {
            "USDC" => Ok(USDC_ADDRESS),
            _ => Err(ChainError::UnsupportedAsset(asset.to_string())),
        }
    }

    /// Current supply rate for `asset` on Aave V3, as a percentage
    /// rounded to two decimal places.
    pub async fn supply_rate(&self, asset: &str) -> Result<Decimal> {
        let token = Self::asset_address(asset)?;
        let data = encode_single_address_call(GET_RESERVE_DATA_SELECTOR, token)?;

        let ret = self.rpc.call(AAVE_V3_POOL, &data).await?;

        // getReserveData returns a static 15-word struct;
        // currentLiquidityRate is the third word
        let rate_ray = decode_uint_word(&ret, 2)?;
        ray_to_percent(rate_ray)
    }

    /// Oracle USD price for `asset` and its peg classification.
    pub async fn peg_status(&self, asset: &str) -> Result<PegReport> {
        // Single known feed, but the asset must still map
        Self::asset_address(asset)?;

        let ret = self
            .rpc
            .call(CHAINLINK_USDC_USD_FEED, &LATEST_ROUND_DATA_SELECTOR)
            .await?;

        // latestRoundData returns (roundId, answer, startedAt,
        // updatedAt, answeredInRound); answer is the second word
        let answer = decode_int_word(&ret, 1)?;
        let price = feed_answer_to_price(answer)?;

        Ok(PegReport {
            price,
            status: classify_peg(price),
        })
    }
}

/// Encode a call with a single `address` argument: 4-byte selector plus
/// the address left-padded to a 32-byte word.
fn encode_single_address_call(selector: [u8; 4], address: &str) -> Result<Vec<u8>> {
    let stripped = address.strip_prefix("0x").unwrap_or(address);
    let raw = hex::decode(stripped)
        .map_err(|e| ChainError::ContractCall(format!("invalid contract address: {}", e)))?;
    if raw.len() != 20 {
        return Err(ChainError::ContractCall(format!(
            "invalid contract address length: {}",
            raw.len()
        )));
    }

    let mut data = Vec::with_capacity(36);
    data.extend_from_slice(&selector);
    data.extend_from_slice(&[0u8; 12]);
    data.extend_from_slice(&raw);
    Ok(data)
}

fn word(ret: &[u8], index: usize) -> Result<&[u8]> {
    let start = index * 32;
    ret.get(start..start + 32).ok_or_else(|| {
        ChainError::ContractCall(format!("return data too short for word {}", index))
    })
}

/// Decode an unsigned word, rejecting values wider than 128 bits.
fn decode_uint_word(ret: &[u8], index: usize) -> Result<u128> {
    let w = word(ret, index)?;
    if w[..16].iter().any(|b| *b != 0) {
        return Err(ChainError::ContractCall(format!(
            "word {} exceeds 128 bits",
            index
        )));
    }
    let mut buf = [0u8; 16];
    buf.copy_from_slice(&w[16..]);
    Ok(u128::from_be_bytes(buf))
}

/// Decode a signed (two's complement) word, rejecting values wider
/// than 128 bits.
fn decode_int_word(ret: &[u8], index: usize) -> Result<i128> {
    let w = word(ret, index)?;
    let fill: u8 = if w[0] & 0x80 != 0 { 0xff } else { 0x00 };
    if w[..16].iter().any(|b| *b != fill) {
        return Err(ChainError::ContractCall(format!(
            "word {} exceeds 128 bits",
            index
        )));
    }
    let mut buf = [0u8; 16];
    buf.copy_from_slice(&w[16..]);
    Ok(i128::from_be_bytes(buf))
}

/// Convert a ray-scaled (1e27) rate to a percentage with two decimal
/// places: 3e25 becomes 3.00.
pub fn ray_to_percent(rate_ray: u128) -> Result<Decimal> {
    let raw = i128::try_from(rate_ray)
        .map_err(|_| ChainError::ContractCall("liquidity rate out of range".into()))?;
    let fraction = Decimal::try_from_i128_with_scale(raw, RAY_SCALE)
        .map_err(|_| ChainError::ContractCall("liquidity rate out of range".into()))?;
    Ok((fraction * dec!(100)).round_dp(2))
}

/// Convert a Chainlink 8-decimal integer answer to a USD price.
pub fn feed_answer_to_price(answer: i128) -> Result<Decimal> {
    Decimal::try_from_i128_with_scale(answer, FEED_DECIMALS)
        .map_err(|_| ChainError::ContractCall("oracle answer out of range".into()))
}

/// HEALTHY within [0.99, 1.01] inclusive, DE-PEGGED outside.
pub fn classify_peg(price: Decimal) -> PegStatus {
    if price >= dec!(0.99) && price <= dec!(1.01) {
        PegStatus::Healthy
    } else {
        PegStatus::DePegged
    }
}
