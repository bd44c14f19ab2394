//! Ledger record snapshot and its decoded lifecycle state.

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::execution::contracts;

/// On-chain lifecycle state of a ledger record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionStatus {
    Active,
    Liquidated,
    Expired,
    Closed,
    Unknown(u8),
}

impl PositionStatus {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::Active,
            1 => Self::Liquidated,
            2 => Self::Expired,
            3 => Self::Closed,
            other => Self::Unknown(other),
        }
    }
}

/// Snapshot of a position record read from the ledger contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub collateral_amount: U256,
    pub strategy_address: Address,
    pub strategy_shares: U256,
    pub wbtc_debt_amount: U256,
    pub position_open_block: U256,
    pub position_expiration_block: U256,
    pub liquidation_buffer: U256,
    pub state: PositionStatus,
    pub claimable_amount: U256,
}

impl From<contracts::LedgerEntry> for LedgerEntry {
    fn from(raw: contracts::LedgerEntry) -> Self {
        Self {
            collateral_amount: raw.collateralAmount,
            strategy_address: raw.strategyAddress,
            strategy_shares: raw.strategyShares,
            wbtc_debt_amount: raw.wbtcDebtAmount,
            position_open_block: raw.positionOpenBlock,
            position_expiration_block: raw.positionExpirationBlock,
            liquidation_buffer: raw.liquidationBuffer,
            state: PositionStatus::from_raw(raw.state),
            claimable_amount: raw.claimableAmount,
        }
    }
}
