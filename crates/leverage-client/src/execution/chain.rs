//! Chain access: contract reads, simulation, signing, submission and receipts.
//!
//! [`ChainClient`] is the seam the orchestrator talks to. [`RpcChainClient`]
//! implements it over an Alloy HTTP provider: reads and simulation go through
//! `eth_call`, transactions are signed locally as legacy transactions and sent
//! raw, and receipts are polled until confirmed or the timeout elapses. A
//! failed receipt lookup is returned to the caller rather than polled again.

use std::time::Duration;

use alloy::consensus::{SignableTransaction, TxEnvelope, TxLegacy};
use alloy::eips::eip2718::Encodable2718;
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxKind, B256, U256};
use alloy::providers::{Provider, RootProvider};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use alloy::sol_types::SolCall;
use alloy::transports::http::reqwest::Url;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::TransactionTiming;
use crate::errors::LeverageError;
use crate::types::TxReceipt;

/// Concrete provider type: Alloy HTTP provider over Ethereum network.
pub type HttpProvider = RootProvider;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// `Error(string)` selector: `keccak256("Error(string)")[0..4]`.
const ERROR_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

/// `Panic(uint256)` selector: `keccak256("Panic(uint256)")[0..4]`.
const PANIC_SELECTOR: [u8; 4] = [0x4e, 0x48, 0x7b, 0x71];

/// Gas price safety buffer (10% above current price).
const GAS_PRICE_BUFFER: f64 = 1.1;

/// Gas limit safety buffer (20% above the estimate).
const GAS_LIMIT_BUFFER: f64 = 1.2;

// ---------------------------------------------------------------------------
// Call types
// ---------------------------------------------------------------------------

/// A state-changing contract call on behalf of `from`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    pub from: Address,
    pub to: Address,
    pub input: Bytes,
    pub value: U256,
    pub gas_limit: Option<u64>,
}

impl ContractCall {
    pub fn new<C: SolCall>(from: Address, to: Address, call: &C) -> Self {
        Self {
            from,
            to,
            input: Bytes::from(call.abi_encode()),
            value: U256::ZERO,
            gas_limit: None,
        }
    }

    fn to_request(&self) -> TransactionRequest {
        let mut tx = TransactionRequest::default();
        tx.set_from(self.from);
        tx.set_to(self.to);
        tx.set_value(self.value);
        tx.set_input(self.input.clone());
        if let Some(gas) = self.gas_limit {
            tx.set_gas_limit(gas);
        }
        tx
    }
}

/// Output of a successful simulation: the request to submit and its return data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Simulation {
    pub request: ContractCall,
    pub output: Bytes,
}

// ---------------------------------------------------------------------------
// ChainClient
// ---------------------------------------------------------------------------

/// Blockchain capability consumed by the orchestrator.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Chain id of the connected node.
    fn chain_id(&self) -> Result<u64, LeverageError>;

    async fn block_number(&self) -> Result<u64, LeverageError>;

    /// `eth_call` against `to` with raw calldata.
    async fn read(&self, to: Address, input: Bytes) -> Result<Bytes, LeverageError>;

    /// Dry-run a state-changing call and prepare it for submission.
    async fn simulate(&self, call: &ContractCall) -> Result<Simulation, LeverageError>;

    /// Sign and broadcast a simulated request.
    async fn write(&self, request: &ContractCall) -> Result<B256, LeverageError>;

    /// Block until `tx_hash` is mined; a reverted receipt is an error.
    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<TxReceipt, LeverageError>;
}

/// Typed view call through any [`ChainClient`].
pub async fn read_contract<C: SolCall>(
    client: &dyn ChainClient,
    to: Address,
    call: C,
) -> Result<C::Return, LeverageError> {
    let output = client.read(to, Bytes::from(call.abi_encode())).await?;
    C::abi_decode_returns(&output).map_err(|e| LeverageError::ReadFailed {
        function: C::SIGNATURE.to_string(),
        reason: format!("cannot decode return data from {to:#x}: {e}"),
    })
}

// ---------------------------------------------------------------------------
// RpcChainClient
// ---------------------------------------------------------------------------

/// [`ChainClient`] over an Alloy HTTP provider with an optional local signer.
///
/// Without a signer the client can read and simulate but not write.
pub struct RpcChainClient {
    provider: HttpProvider,
    signer: Option<PrivateKeySigner>,
    /// Async-safe nonce counter. `None` until first chain query.
    nonce: Mutex<Option<u64>>,
    chain_id: Option<u64>,
    simulation_timeout: Duration,
    confirmation_timeout: Duration,
    poll_interval: Duration,
}

impl RpcChainClient {
    /// Construct from a pre-built provider. `chain_id` stays unset until
    /// [`Self::connect`] or the caller supplies it.
    pub fn new(
        provider: HttpProvider,
        signer: Option<PrivateKeySigner>,
        timing: &TransactionTiming,
        chain_id: Option<u64>,
    ) -> Self {
        Self {
            provider,
            signer,
            nonce: Mutex::new(None),
            chain_id,
            simulation_timeout: Duration::from_secs(timing.simulation_timeout_seconds),
            confirmation_timeout: Duration::from_secs(timing.confirmation_timeout_seconds),
            poll_interval: Duration::from_millis(timing.receipt_poll_interval_ms),
        }
    }

    /// Build the provider for `rpc_url` and query its chain id.
    pub async fn connect(
        rpc_url: &str,
        signer: Option<PrivateKeySigner>,
        timing: &TransactionTiming,
    ) -> Result<Self, LeverageError> {
        let url: Url = rpc_url
            .parse()
            .map_err(|e| LeverageError::Config(format!("invalid RPC URL {rpc_url:?}: {e}")))?;
        let provider = RootProvider::new_http(url);
        let chain_id = provider.get_chain_id().await?;

        info!(
            chain_id,
            signer = ?signer.as_ref().map(|s| s.address()),
            simulation_timeout = timing.simulation_timeout_seconds,
            confirmation_timeout = timing.confirmation_timeout_seconds,
            "chain client connected"
        );

        Ok(Self::new(provider, signer, timing, Some(chain_id)))
    }

    /// Current gas price in Wei with a 10% buffer.
    pub async fn get_gas_price(&self) -> Result<u128, LeverageError> {
        let base_price = self.provider.get_gas_price().await?;
        Ok((base_price as f64 * GAS_PRICE_BUFFER) as u128)
    }

    // -----------------------------------------------------------------------
    // Revert decoding
    // -----------------------------------------------------------------------

    /// Decode a Solidity revert reason from raw return data.
    ///
    /// Handles `Error(string)` and `Panic(uint256)`; anything else is
    /// returned hex-encoded.
    pub fn decode_revert_reason(data: &[u8]) -> String {
        if data.is_empty() {
            return "Unknown revert".into();
        }

        if data.len() < 4 {
            return hex::encode(data);
        }

        // Error(string): selector(4) + offset(32) + length(32) + data
        if data[..4] == ERROR_SELECTOR && data.len() >= 68 {
            if let Ok(len_bytes) = <[u8; 8]>::try_from(&data[60..68]) {
                let str_len = u64::from_be_bytes(len_bytes) as usize;
                if data.len() >= 68 + str_len {
                    return String::from_utf8_lossy(&data[68..68 + str_len]).into_owned();
                }
            }
        }

        // Panic(uint256): selector(4) + code(32)
        if data[..4] == PANIC_SELECTOR && data.len() >= 36 {
            let code = U256::from_be_slice(&data[4..36]);
            return match code.saturating_to::<u64>() {
                0x01 => "Panic: assertion failed".into(),
                0x11 => "Panic: arithmetic overflow/underflow".into(),
                0x12 => "Panic: division by zero".into(),
                0x21 => "Panic: enum conversion out of range".into(),
                0x32 => "Panic: array index out of bounds".into(),
                _ => format!("Panic(0x{code:x})"),
            };
        }

        hex::encode(data)
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    fn signer_for(&self, from: Address) -> Result<&PrivateKeySigner, LeverageError> {
        let signer = self
            .signer
            .as_ref()
            .ok_or_else(|| LeverageError::Config("no signer configured for writes".into()))?;
        if signer.address() != from {
            return Err(LeverageError::Config(format!(
                "account {from:#x} does not match signer {:#x}",
                signer.address()
            )));
        }
        Ok(signer)
    }

    /// Get the next nonce, initialising from chain on the first call.
    async fn get_next_nonce(&self, account: Address) -> Result<u64, LeverageError> {
        let mut guard = self.nonce.lock().await;
        let nonce = match *guard {
            Some(n) => n,
            None => {
                let n = self.provider.get_transaction_count(account).await?;
                info!(nonce = n, "nonce initialized from chain");
                n
            }
        };
        *guard = Some(nonce + 1);
        Ok(nonce)
    }

    /// Drop the cached nonce so the next write re-reads it from chain.
    async fn reset_nonce(&self) {
        let mut guard = self.nonce.lock().await;
        let old = guard.take();
        warn!(old_nonce = ?old, "nonce cache cleared after failed submission");
    }

    /// Price, sign and broadcast `request` with an already reserved `nonce`.
    async fn sign_and_send(
        &self,
        signer: &PrivateKeySigner,
        request: &ContractCall,
        chain_id: u64,
        nonce: u64,
        gas_limit: u64,
    ) -> Result<B256, LeverageError> {
        let gas_price = self.get_gas_price().await?;

        let tx = TxLegacy {
            chain_id: Some(chain_id),
            nonce,
            gas_price,
            gas_limit,
            to: TxKind::Call(request.to),
            value: request.value,
            input: request.input.clone(),
        };

        // Sign the transaction hash locally
        let sig = signer
            .sign_hash_sync(&tx.signature_hash())
            .map_err(|e| LeverageError::SubmissionFailed {
                reason: format!("transaction signing failed: {e}"),
            })?;
        let raw = TxEnvelope::Legacy(tx.into_signed(sig)).encoded_2718();

        let pending = self
            .provider
            .send_raw_transaction(&raw)
            .await
            .map_err(|e| LeverageError::SubmissionFailed {
                reason: e.to_string(),
            })?;
        let tx_hash = *pending.tx_hash();

        info!(
            tx_hash = %tx_hash,
            to = %request.to,
            nonce,
            gas_price,
            gas_limit,
            "transaction submitted"
        );

        Ok(tx_hash)
    }

    fn revert_reason(err: &alloy::transports::TransportError) -> String {
        err.as_error_resp()
            .and_then(|payload| payload.as_revert_data())
            .map(|data| Self::decode_revert_reason(&data))
            .unwrap_or_else(|| err.to_string())
    }
}

#[async_trait]
impl ChainClient for RpcChainClient {
    fn chain_id(&self) -> Result<u64, LeverageError> {
        self.chain_id
            .ok_or_else(|| LeverageError::Config("chain id not initialized".into()))
    }

    async fn block_number(&self) -> Result<u64, LeverageError> {
        Ok(self.provider.get_block_number().await?)
    }

    async fn read(&self, to: Address, input: Bytes) -> Result<Bytes, LeverageError> {
        let mut tx = TransactionRequest::default();
        tx.set_to(to);
        tx.set_input(input);
        self.provider
            .call(tx)
            .await
            .map_err(|e| LeverageError::ReadFailed {
                function: format!("eth_call {to:#x}"),
                reason: Self::revert_reason(&e),
            })
    }

    async fn simulate(&self, call: &ContractCall) -> Result<Simulation, LeverageError> {
        let tx = call.to_request();
        let provider = &self.provider;
        let tx_clone = tx.clone();
        let output = match tokio::time::timeout(
            self.simulation_timeout,
            async move { provider.call(tx_clone).await },
        )
        .await
        {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(LeverageError::SimulationFailed {
                    reason: Self::revert_reason(&e),
                })
            }
            Err(_) => {
                return Err(LeverageError::SimulationFailed {
                    reason: format!(
                        "simulation timed out after {}s",
                        self.simulation_timeout.as_secs()
                    ),
                })
            }
        };

        let gas_limit = match call.gas_limit {
            Some(gas) => gas,
            None => {
                let estimate = self.provider.estimate_gas(tx).await.map_err(|e| {
                    LeverageError::SimulationFailed {
                        reason: format!("gas estimation failed: {}", Self::revert_reason(&e)),
                    }
                })?;
                (estimate as f64 * GAS_LIMIT_BUFFER) as u64
            }
        };

        debug!(to = %call.to, output_len = output.len(), gas_limit, "simulation succeeded");

        let mut request = call.clone();
        request.gas_limit = Some(gas_limit);
        Ok(Simulation { request, output })
    }

    async fn write(&self, request: &ContractCall) -> Result<B256, LeverageError> {
        let signer = self.signer_for(request.from)?;
        let chain_id = self.chain_id()?;
        let gas_limit = request.gas_limit.ok_or_else(|| LeverageError::SubmissionFailed {
            reason: "request has no gas limit; simulate it first".into(),
        })?;
        let nonce = self.get_next_nonce(request.from).await?;

        match self
            .sign_and_send(signer, request, chain_id, nonce, gas_limit)
            .await
        {
            Ok(tx_hash) => Ok(tx_hash),
            Err(e) => {
                // The reserved nonce was never broadcast.
                self.reset_nonce().await;
                Err(e)
            }
        }
    }

    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<TxReceipt, LeverageError> {
        let start = tokio::time::Instant::now();

        loop {
            match self.provider.get_transaction_receipt(tx_hash).await {
                Ok(Some(receipt)) => {
                    if !receipt.status() {
                        return Err(LeverageError::TxReverted {
                            tx_hash: tx_hash.to_string(),
                            reason: "transaction reverted on-chain".into(),
                        });
                    }
                    info!(
                        tx_hash = %tx_hash,
                        gas_used = receipt.gas_used,
                        "transaction confirmed"
                    );
                    return Ok(TxReceipt {
                        tx_hash,
                        block_number: receipt.block_number,
                        gas_used: receipt.gas_used,
                        status: true,
                    });
                }
                Ok(None) => {}
                Err(e) => {
                    return Err(LeverageError::ReceiptFailed {
                        tx_hash: tx_hash.to_string(),
                        reason: e.to_string(),
                    });
                }
            }

            if start.elapsed() >= self.confirmation_timeout {
                return Err(LeverageError::TxTimeout {
                    tx_hash: tx_hash.to_string(),
                    timeout_seconds: self.confirmation_timeout.as_secs(),
                });
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::contracts::IERC20;
    use alloy::primitives::address;

    fn timing() -> TransactionTiming {
        TransactionTiming {
            simulation_timeout_seconds: 5,
            confirmation_timeout_seconds: 60,
            receipt_poll_interval_ms: 1_000,
        }
    }

    fn offline_client(signer: Option<PrivateKeySigner>) -> RpcChainClient {
        let provider = RootProvider::new_http("http://127.0.0.1:8545".parse().unwrap());
        RpcChainClient::new(provider, signer, &timing(), None)
    }

    /// Client whose node refuses every connection.
    fn unreachable_client(signer: Option<PrivateKeySigner>) -> RpcChainClient {
        let provider = RootProvider::new_http("http://127.0.0.1:1".parse().unwrap());
        RpcChainClient::new(provider, signer, &timing(), Some(1))
    }

    // -- decode_revert_reason -----------------------------------------------

    #[test]
    fn decode_empty_data_returns_unknown() {
        assert_eq!(RpcChainClient::decode_revert_reason(&[]), "Unknown revert");
    }

    #[test]
    fn decode_short_data_returns_hex() {
        assert_eq!(RpcChainClient::decode_revert_reason(&[0xAB, 0xCD]), "abcd");
    }

    #[test]
    fn decode_error_string() {
        let msg = b"ERC20: insufficient allowance";
        let mut data = Vec::with_capacity(68 + msg.len());
        data.extend_from_slice(&ERROR_SELECTOR);
        data.extend_from_slice(&[0u8; 31]);
        data.push(0x20);
        data.extend_from_slice(&[0u8; 31]);
        data.push(msg.len() as u8);
        data.extend_from_slice(msg);

        assert_eq!(
            RpcChainClient::decode_revert_reason(&data),
            "ERC20: insufficient allowance"
        );
    }

    #[test]
    fn decode_panic_arithmetic_overflow() {
        let mut data = vec![0u8; 36];
        data[..4].copy_from_slice(&PANIC_SELECTOR);
        data[35] = 0x11;
        assert_eq!(
            RpcChainClient::decode_revert_reason(&data),
            "Panic: arithmetic overflow/underflow"
        );
    }

    #[test]
    fn decode_unknown_selector_returns_hex() {
        let data = [0xDE, 0xAD, 0xBE, 0xEF, 0x01];
        assert_eq!(RpcChainClient::decode_revert_reason(&data), "deadbeef01");
    }

    // -- configuration guards -----------------------------------------------

    #[test]
    fn chain_id_unset_is_configuration_error() {
        let client = offline_client(None);
        assert!(matches!(client.chain_id(), Err(LeverageError::Config(_))));
    }

    #[tokio::test]
    async fn write_without_signer_fails_before_rpc() {
        let client = offline_client(None);
        let call = ContractCall::new(
            address!("0000000000000000000000000000000000000001"),
            address!("0000000000000000000000000000000000000002"),
            &IERC20::decimalsCall {},
        );
        let err = client.write(&call).await.unwrap_err();
        assert!(matches!(err, LeverageError::Config(_)));
    }

    #[tokio::test]
    async fn write_from_other_account_is_rejected() {
        let signer = PrivateKeySigner::random();
        let client = offline_client(Some(signer));
        let call = ContractCall::new(
            address!("0000000000000000000000000000000000000001"),
            address!("0000000000000000000000000000000000000002"),
            &IERC20::decimalsCall {},
        );
        let err = client.write(&call).await.unwrap_err();
        assert!(err.to_string().contains("does not match signer"));
    }

    // -- failure paths ------------------------------------------------------

    #[tokio::test]
    async fn receipt_poll_error_surfaces_immediately() {
        let client = unreachable_client(None);
        let err = tokio::time::timeout(
            Duration::from_secs(10),
            client.wait_for_receipt(B256::repeat_byte(0x11)),
        )
        .await
        .expect("receipt error should not wait for the confirmation timeout")
        .unwrap_err();
        assert!(
            matches!(err, LeverageError::ReceiptFailed { .. }),
            "expected ReceiptFailed, got: {err}"
        );
    }

    #[tokio::test]
    async fn failed_submission_releases_reserved_nonce() {
        let signer = PrivateKeySigner::random();
        let from = signer.address();
        let client = unreachable_client(Some(signer));
        *client.nonce.lock().await = Some(7);

        let mut call = ContractCall::new(
            from,
            address!("0000000000000000000000000000000000000002"),
            &IERC20::decimalsCall {},
        );
        call.gas_limit = Some(60_000);

        assert!(client.write(&call).await.is_err());
        assert_eq!(*client.nonce.lock().await, None);
    }

    #[test]
    fn contract_call_encodes_selector() {
        let call = ContractCall::new(
            Address::ZERO,
            address!("2260FAC5E5542a773Aa44fBCfeDf7C193bc2C599"),
            &IERC20::approveCall {
                spender: Address::ZERO,
                amount: U256::from(1u64),
            },
        );
        assert_eq!(&call.input[..4], &[0x09, 0x5e, 0xa7, 0xb3]);
        assert_eq!(call.gas_limit, None);
        assert_eq!(call.value, U256::ZERO);
    }
}
