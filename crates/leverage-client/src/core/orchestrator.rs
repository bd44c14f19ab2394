//! Position lifecycle: preview, open, close, approve, claim.
//!
//! Previews quote a swap route, read the strategy's conversion functions and
//! return the slippage-bounded minimum together with the encoded swap payload.
//! State-changing operations run one pipeline (simulate, submit, confirm)
//! that aborts with a named error at the first failing step.
//!
//! Nothing is cached: every call resolves the registry and quotes a fresh
//! route, so concurrent calls share no state.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolCall;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::constants::{
    DEFAULT_BLOCKS_PER_MINUTE, DEFAULT_DEADLINE_BUFFER_SECONDS, DEFAULT_SLIPPAGE_BPS, TOKEN_WBTC,
    TOKEN_WBTC_DECIMALS,
};
use crate::core::ledger_reader::LedgerReader;
use crate::core::slippage::{apply_slippage, validate_slippage_bps};
use crate::errors::LeverageError;
use crate::execution::chain::{read_contract, ChainClient, ContractCall};
use crate::execution::contracts::{
    IExpiredVault, IMultiPoolStrategy, IPositionCloser, IPositionOpener, IERC20,
};
use crate::execution::payload::{
    build_route_path, deadline_after, decode_payload, decode_preview_payload, encode_payload,
    encode_preview_payload,
};
use crate::execution::registry::{resolve_registry, RegistrySource};
use crate::execution::route_resolver::{RouteSource, SwapRouteResolver};
use crate::types::{
    Asset, ClosePositionParams, ClosePreview, ContractRole, LedgerEntry, OpenPositionParams,
    OpenPreview, PipelineStage, RouteRequest, TxOutcome,
};

/// Tunables the orchestrator takes from configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorSettings {
    pub primary_collateral: Asset,
    pub blocks_per_minute: f64,
    pub default_slippage_bps: u32,
    pub deadline_buffer_seconds: u64,
}

impl OrchestratorSettings {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            primary_collateral: config.chain.primary_collateral,
            blocks_per_minute: config.chain.blocks_per_minute,
            default_slippage_bps: config.positions.default_slippage_bps,
            deadline_buffer_seconds: config.positions.deadline_buffer_seconds,
        }
    }
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            primary_collateral: Asset::new(TOKEN_WBTC, TOKEN_WBTC_DECIMALS),
            blocks_per_minute: DEFAULT_BLOCKS_PER_MINUTE,
            default_slippage_bps: DEFAULT_SLIPPAGE_BPS,
            deadline_buffer_seconds: DEFAULT_DEADLINE_BUFFER_SECONDS,
        }
    }
}

pub struct PositionOrchestrator {
    chain: Arc<dyn ChainClient>,
    registry: Arc<dyn RegistrySource>,
    resolver: SwapRouteResolver,
    ledger: LedgerReader,
    settings: OrchestratorSettings,
}

impl PositionOrchestrator {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        registry: Arc<dyn RegistrySource>,
        router: Arc<dyn RouteSource>,
        settings: OrchestratorSettings,
    ) -> Self {
        let ledger = LedgerReader::new(chain.clone(), registry.clone(), settings.blocks_per_minute);
        Self {
            chain,
            registry,
            resolver: SwapRouteResolver::new(router),
            ledger,
            settings,
        }
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    // -----------------------------------------------------------------------
    // Previews
    // -----------------------------------------------------------------------

    /// Quote opening a position of `collateral_amount + borrow_amount` of the
    /// primary collateral swapped into `strategy`'s asset.
    ///
    /// Slippage bounds the expected share count only. The payload is the
    /// `(path, deadline)` layout with no swap minimum; `minStrategyShares`
    /// guards the deposit instead.
    pub async fn preview_open(
        &self,
        collateral_amount: U256,
        borrow_amount: U256,
        strategy: Address,
        slippage_bps: Option<u32>,
    ) -> Result<OpenPreview, LeverageError> {
        let bps = slippage_bps.unwrap_or(self.settings.default_slippage_bps);
        validate_slippage_bps(bps)?;

        let amount_in = collateral_amount.checked_add(borrow_amount).ok_or_else(|| {
            LeverageError::Validation("collateral plus borrow amount overflows uint256".into())
        })?;

        debug!(stage = %PipelineStage::Previewing, %strategy, %amount_in, bps, "preview open");

        let chain_id = self.chain.chain_id()?;
        let strategy_asset = self.strategy_asset(strategy).await?;

        let route = self
            .resolver
            .resolve(
                chain_id,
                &RouteRequest {
                    amount_in,
                    token_in: self.settings.primary_collateral,
                    token_out: strategy_asset,
                },
            )
            .await?;
        let quoted = route.output_amount();

        let expected_shares = read_contract(
            self.chain.as_ref(),
            strategy,
            IMultiPoolStrategy::previewDepositCall { assets: quoted },
        )
        .await?;
        let minimum_expected_shares = apply_slippage(expected_shares, bps)?;
        let payload = encode_preview_payload(build_route_path(&route)?, self.deadline()?);

        info!(
            %strategy,
            %quoted,
            %expected_shares,
            %minimum_expected_shares,
            hops = route.hops().len(),
            "open preview ready"
        );

        Ok(OpenPreview {
            minimum_expected_shares,
            expected_shares,
            quoted_swap_output: quoted,
            payload,
        })
    }

    /// Quote closing `nft_id`: its strategy shares are valued in the strategy
    /// asset and swapped back to the primary collateral.
    pub async fn preview_close(
        &self,
        nft_id: U256,
        slippage_bps: Option<u32>,
    ) -> Result<ClosePreview, LeverageError> {
        let bps = slippage_bps.unwrap_or(self.settings.default_slippage_bps);
        validate_slippage_bps(bps)?;

        debug!(stage = %PipelineStage::Previewing, %nft_id, bps, "preview close");

        let chain_id = self.chain.chain_id()?;
        let entry = self.ledger.get_position(nft_id).await?;
        let strategy = entry.strategy_address;
        let strategy_asset = self.strategy_asset(strategy).await?;

        let expected_assets = read_contract(
            self.chain.as_ref(),
            strategy,
            IMultiPoolStrategy::convertToAssetsCall {
                shares: entry.strategy_shares,
            },
        )
        .await?;

        let route = self
            .resolver
            .resolve(
                chain_id,
                &RouteRequest {
                    amount_in: expected_assets,
                    token_in: strategy_asset,
                    token_out: self.settings.primary_collateral,
                },
            )
            .await?;
        let quoted = route.output_amount();
        let minimum_out = apply_slippage(quoted, bps)?;
        let payload = encode_payload(build_route_path(&route)?, self.deadline()?, minimum_out);

        info!(
            %nft_id,
            %expected_assets,
            %quoted,
            %minimum_out,
            hops = route.hops().len(),
            "close preview ready"
        );

        Ok(ClosePreview {
            minimum_out,
            quoted_swap_output: quoted,
            expected_assets,
            payload,
        })
    }

    // -----------------------------------------------------------------------
    // State-changing operations
    // -----------------------------------------------------------------------

    /// Open a position with the minimum and payload returned by
    /// [`Self::preview_open`]. The payload is submitted byte for byte.
    pub async fn open(
        &self,
        collateral_amount: U256,
        borrow_amount: U256,
        minimum_shares: U256,
        strategy: Address,
        payload: Bytes,
        account: Address,
    ) -> Result<TxOutcome, LeverageError> {
        self.check_deadline(decode_preview_payload(&payload)?.deadline)?;
        let opener = self.contract(ContractRole::PositionOpener).await?;

        let params = OpenPositionParams::uniswap_v3(
            collateral_amount,
            borrow_amount,
            strategy,
            minimum_shares,
            payload,
        );
        let call = IPositionOpener::openPositionCall {
            params: params.into(),
        };
        self.run_pipeline("open", account, opener, &call).await
    }

    /// Close `nft_id` with the minimum and payload returned by
    /// [`Self::preview_close`].
    pub async fn close(
        &self,
        nft_id: U256,
        min_out: U256,
        account: Address,
        payload: Bytes,
    ) -> Result<TxOutcome, LeverageError> {
        self.check_deadline(decode_payload(&payload)?.deadline)?;
        let closer = self.contract(ContractRole::PositionCloser).await?;

        let params = ClosePositionParams::uniswap_v3(nft_id, min_out, payload);
        let call = IPositionCloser::closePositionCall {
            params: params.into(),
        };
        self.run_pipeline("close", account, closer, &call).await
    }

    /// Approve the `PositionOpener` to pull `amount` of the primary collateral.
    pub async fn approve_spend(
        &self,
        account: Address,
        amount: U256,
    ) -> Result<TxOutcome, LeverageError> {
        let spender = self.contract(ContractRole::PositionOpener).await?;
        let token = self.settings.primary_collateral.address;

        debug!(stage = %PipelineStage::Approving, %token, %spender, %amount, "approving spend");

        let call = IERC20::approveCall { spender, amount };
        self.run_pipeline("approve", account, token, &call).await
    }

    /// Claim the proceeds of an expired or liquidated position.
    pub async fn claim(&self, nft_id: U256, account: Address) -> Result<TxOutcome, LeverageError> {
        let vault = self.contract(ContractRole::ExpiredVault).await?;
        let call = IExpiredVault::claimCall { nftId: nft_id };
        self.run_pipeline("claim", account, vault, &call).await
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub async fn get_position_state(&self, nft_id: U256) -> Result<LedgerEntry, LeverageError> {
        self.ledger.get_position(nft_id).await
    }

    /// Minutes until expiration, negative once the expiration block is past.
    pub async fn get_estimated_expiration(&self, nft_id: U256) -> Result<f64, LeverageError> {
        self.ledger.get_estimated_expiration(nft_id).await
    }

    // -----------------------------------------------------------------------
    // Pipeline
    // -----------------------------------------------------------------------

    /// Simulate, submit and confirm `call` from `account` to `to`.
    async fn run_pipeline<C: SolCall>(
        &self,
        operation: &'static str,
        account: Address,
        to: Address,
        call: &C,
    ) -> Result<TxOutcome, LeverageError> {
        let request = ContractCall::new(account, to, call);
        let mut stage = PipelineStage::Idle;

        let result = self.drive_pipeline(operation, &request, &mut stage).await;
        match &result {
            Ok(outcome) => info!(
                operation,
                stage = %PipelineStage::Done,
                tx_hash = %outcome.receipt.tx_hash,
                block = ?outcome.receipt.block_number,
                gas_used = outcome.receipt.gas_used,
                "pipeline complete"
            ),
            Err(e) => warn!(
                operation,
                stage = %PipelineStage::Failed,
                failed_at = %stage,
                error = %e,
                "pipeline aborted"
            ),
        }
        result
    }

    async fn drive_pipeline(
        &self,
        operation: &'static str,
        request: &ContractCall,
        stage: &mut PipelineStage,
    ) -> Result<TxOutcome, LeverageError> {
        *stage = PipelineStage::Simulating;
        debug!(operation, stage = %stage, to = %request.to, from = %request.from, "simulating");
        let simulation = self.chain.simulate(request).await?;

        *stage = PipelineStage::Submitting;
        debug!(operation, stage = %stage, gas_limit = ?simulation.request.gas_limit, "submitting");
        let tx_hash = self.chain.write(&simulation.request).await?;
        if tx_hash.is_zero() {
            return Err(LeverageError::SubmissionFailed {
                reason: format!("{operation}: node returned an empty transaction hash"),
            });
        }

        *stage = PipelineStage::Confirming;
        debug!(operation, stage = %stage, %tx_hash, "awaiting receipt");
        let receipt = self.chain.wait_for_receipt(tx_hash).await?;
        if !receipt.status {
            return Err(LeverageError::TxReverted {
                tx_hash: tx_hash.to_string(),
                reason: format!("{operation} reverted"),
            });
        }

        *stage = PipelineStage::Done;
        Ok(TxOutcome {
            result: simulation.output,
            receipt,
        })
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    async fn contract(&self, role: ContractRole) -> Result<Address, LeverageError> {
        let chain_id = self.chain.chain_id()?;
        resolve_registry(self.registry.as_ref(), chain_id)
            .await?
            .address(role)
    }

    /// Asset and decimals a strategy deposits in.
    async fn strategy_asset(&self, strategy: Address) -> Result<Asset, LeverageError> {
        let asset =
            read_contract(self.chain.as_ref(), strategy, IMultiPoolStrategy::assetCall {}).await?;
        let decimals = read_contract(self.chain.as_ref(), asset, IERC20::decimalsCall {}).await?;
        Ok(Asset::new(asset, decimals))
    }

    fn deadline(&self) -> Result<U256, LeverageError> {
        Ok(deadline_after(now_secs()?, self.settings.deadline_buffer_seconds))
    }

    /// Reject a swap payload whose deadline has passed.
    fn check_deadline(&self, deadline: U256) -> Result<(), LeverageError> {
        let now = U256::from(now_secs()?);
        if deadline <= now {
            return Err(LeverageError::Validation(format!(
                "swap payload deadline {deadline} has passed; preview again"
            )));
        }
        Ok(())
    }
}

fn now_secs() -> Result<u64, LeverageError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| LeverageError::Config(format!("system clock before unix epoch: {e}")))
}
