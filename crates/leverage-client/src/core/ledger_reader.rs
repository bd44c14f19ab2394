//! Position ledger reads and expiration estimates.
//!
//! The ledger address is resolved from the registry on every call; records
//! are snapshots and are never cached.

use std::sync::Arc;

use alloy::primitives::{Address, U256};
use tracing::debug;

use crate::core::slippage::estimate_minutes_until;
use crate::errors::LeverageError;
use crate::execution::chain::{read_contract, ChainClient};
use crate::execution::contracts::IPositionLedger;
use crate::execution::registry::{resolve_registry, RegistrySource};
use crate::types::{ContractRole, LedgerEntry};

/// Read-only access to position records held by the `PositionLedger`.
pub struct LedgerReader {
    chain: Arc<dyn ChainClient>,
    registry: Arc<dyn RegistrySource>,
    blocks_per_minute: f64,
}

impl LedgerReader {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        registry: Arc<dyn RegistrySource>,
        blocks_per_minute: f64,
    ) -> Self {
        Self {
            chain,
            registry,
            blocks_per_minute,
        }
    }

    async fn ledger_address(&self) -> Result<Address, LeverageError> {
        let chain_id = self.chain.chain_id()?;
        resolve_registry(self.registry.as_ref(), chain_id)
            .await?
            .address(ContractRole::PositionLedger)
    }

    /// Snapshot of the ledger record for `nft_id`.
    pub async fn get_position(&self, nft_id: U256) -> Result<LedgerEntry, LeverageError> {
        let ledger = self.ledger_address().await?;
        let raw = read_contract(
            self.chain.as_ref(),
            ledger,
            IPositionLedger::getPositionCall { nftId: nft_id },
        )
        .await?;
        let entry = LedgerEntry::from(raw);

        debug!(
            %nft_id,
            strategy = %entry.strategy_address,
            shares = %entry.strategy_shares,
            state = ?entry.state,
            "ledger entry read"
        );

        Ok(entry)
    }

    /// Minutes until the position's expiration block; negative once expired.
    pub async fn get_estimated_expiration(&self, nft_id: U256) -> Result<f64, LeverageError> {
        let entry = self.get_position(nft_id).await?;
        let current_block = self.chain.block_number().await?;
        Ok(estimate_minutes_until(
            entry.position_expiration_block,
            current_block,
            self.blocks_per_minute,
        ))
    }
}
