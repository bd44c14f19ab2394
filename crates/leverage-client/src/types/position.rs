//! Open/close parameters, preview results and transaction outcomes.

use std::fmt;

use alloy::primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

use crate::constants::{EXCHANGE_UNSET, SWAP_ROUTE_UNISWAP_V3};
use crate::execution::contracts;

/// Arguments of `PositionOpener.openPosition`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenPositionParams {
    pub collateral_amount: U256,
    pub wbtc_to_borrow: U256,
    pub strategy: Address,
    pub min_strategy_shares: U256,
    pub swap_route: u8,
    pub swap_data: Bytes,
    pub exchange: Address,
}

impl OpenPositionParams {
    /// Params for the single deployed Uniswap V3 route.
    pub fn uniswap_v3(
        collateral_amount: U256,
        wbtc_to_borrow: U256,
        strategy: Address,
        min_strategy_shares: U256,
        swap_data: Bytes,
    ) -> Self {
        Self {
            collateral_amount,
            wbtc_to_borrow,
            strategy,
            min_strategy_shares,
            swap_route: SWAP_ROUTE_UNISWAP_V3,
            swap_data,
            exchange: EXCHANGE_UNSET,
        }
    }
}

impl From<OpenPositionParams> for contracts::OpenPositionParams {
    fn from(p: OpenPositionParams) -> Self {
        Self {
            collateralAmount: p.collateral_amount,
            wbtcToBorrow: p.wbtc_to_borrow,
            strategy: p.strategy,
            minStrategyShares: p.min_strategy_shares,
            swapRoute: p.swap_route,
            swapData: p.swap_data,
            exchange: p.exchange,
        }
    }
}

/// Arguments of `PositionCloser.closePosition`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosePositionParams {
    pub nft_id: U256,
    pub min_wbtc: U256,
    pub swap_route: u8,
    pub swap_data: Bytes,
    pub exchange: Address,
}

impl ClosePositionParams {
    pub fn uniswap_v3(nft_id: U256, min_wbtc: U256, swap_data: Bytes) -> Self {
        Self {
            nft_id,
            min_wbtc,
            swap_route: SWAP_ROUTE_UNISWAP_V3,
            swap_data,
            exchange: EXCHANGE_UNSET,
        }
    }
}

impl From<ClosePositionParams> for contracts::ClosePositionParams {
    fn from(p: ClosePositionParams) -> Self {
        Self {
            nftId: p.nft_id,
            minWBTC: p.min_wbtc,
            swapRoute: p.swap_route,
            swapData: p.swap_data,
            exchange: p.exchange,
        }
    }
}

/// Result of `preview_open`: pass `minimum_expected_shares` and `payload`
/// unchanged to `open`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenPreview {
    pub minimum_expected_shares: U256,
    pub expected_shares: U256,
    pub quoted_swap_output: U256,
    pub payload: Bytes,
}

/// Result of `preview_close`: pass `minimum_out` and `payload` unchanged to
/// `close`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosePreview {
    pub minimum_out: U256,
    pub quoted_swap_output: U256,
    pub expected_assets: U256,
    pub payload: Bytes,
}

/// Confirmed transaction receipt, reduced to what callers inspect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_hash: B256,
    pub block_number: Option<u64>,
    pub gas_used: u64,
    pub status: bool,
}

/// Simulated return data plus the confirmed receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutcome {
    pub result: Bytes,
    pub receipt: TxReceipt,
}

/// Step of a single orchestrator call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    Idle,
    Previewing,
    Approving,
    Simulating,
    Submitting,
    Confirming,
    Done,
    Failed,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Previewing => "previewing",
            Self::Approving => "approving",
            Self::Simulating => "simulating",
            Self::Submitting => "submitting",
            Self::Confirming => "confirming",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
