//! In-memory collaborators for orchestrator and resolver tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use alloy::primitives::{address, Address, Bytes, B256, U256};
use async_trait::async_trait;

use crate::errors::LeverageError;
use crate::types::{ContractRole, Hop, RegistryEntry, RouteQuote, RouteRequest, TxReceipt};

use super::chain::{ChainClient, ContractCall, Simulation};
use super::registry::RegistrySource;
use super::route_resolver::RouteSource;

pub(crate) const MOCK_POOL: Address = address!("cbcdf9626bc03e24f779434178a73a0b4bad62ed");
pub(crate) const MOCK_TX_HASH: B256 = B256::repeat_byte(0xab);

// ---------------------------------------------------------------------------
// MockRegistry
// ---------------------------------------------------------------------------

pub(crate) struct MockRegistry {
    entries: Vec<RegistryEntry>,
    fetches: AtomicUsize,
}

impl MockRegistry {
    pub fn complete() -> Self {
        Self::with_roles(&ContractRole::ALL)
    }

    pub fn without(missing: ContractRole) -> Self {
        let roles: Vec<ContractRole> = ContractRole::ALL
            .into_iter()
            .filter(|r| *r != missing)
            .collect();
        Self::with_roles(&roles)
    }

    fn with_roles(roles: &[ContractRole]) -> Self {
        let mut entries: Vec<RegistryEntry> = roles
            .iter()
            .map(|role| RegistryEntry {
                name: role.as_str().to_string(),
                address: Self::address_of(*role),
                abi: serde_json::Value::Array(vec![]),
            })
            .collect();
        // Registries also publish contracts this client never calls.
        entries.push(RegistryEntry {
            name: "WBTCVault".into(),
            address: Address::repeat_byte(0x77),
            abi: serde_json::Value::Null,
        });
        Self {
            entries,
            fetches: AtomicUsize::new(0),
        }
    }

    /// Deterministic address for `role`.
    pub fn address_of(role: ContractRole) -> Address {
        let idx = ContractRole::ALL
            .iter()
            .position(|r| *r == role)
            .unwrap_or_default();
        Address::with_last_byte(0x10 + idx as u8)
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RegistrySource for MockRegistry {
    async fn fetch_entries(&self, _chain_id: u64) -> Result<Vec<RegistryEntry>, LeverageError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.entries.clone())
    }
}

// ---------------------------------------------------------------------------
// MockRouter
// ---------------------------------------------------------------------------

pub(crate) struct MockRouter {
    quote: Option<RouteQuote>,
    calls: AtomicUsize,
    last_request: Mutex<Option<RouteRequest>>,
}

impl MockRouter {
    /// Single-pool route from `token_in` to `token_out` through a 0.3% pool.
    pub fn direct(token_in: Address, token_out: Address, output: U256) -> Self {
        let quote = RouteQuote::new(
            vec![Hop {
                pool: MOCK_POOL,
                fee: 3000,
            }],
            vec![token_in, token_out],
            output,
        )
        .unwrap();
        Self::with_quote(quote)
    }

    pub fn with_quote(quote: RouteQuote) -> Self {
        Self {
            quote: Some(quote),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn no_route() -> Self {
        Self {
            quote: None,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<RouteRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl RouteSource for MockRouter {
    async fn route(&self, _chain_id: u64, request: &RouteRequest) -> Result<RouteQuote, LeverageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        self.quote.clone().ok_or_else(|| LeverageError::RouteNotFound {
            token_in: format!("{:#x}", request.token_in.address),
            token_out: format!("{:#x}", request.token_out.address),
        })
    }
}

// ---------------------------------------------------------------------------
// MockChain
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ChainCall {
    Read { to: Address, selector: [u8; 4] },
    Simulate(ContractCall),
    Write(ContractCall),
    Receipt(B256),
}

pub(crate) struct MockChain {
    chain_id: u64,
    block: u64,
    reads: HashMap<(Address, [u8; 4]), Bytes>,
    simulation_output: Bytes,
    simulation_error: Option<String>,
    tx_hash: B256,
    reverts: bool,
    calls: Mutex<Vec<ChainCall>>,
}

impl MockChain {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            block: 19_000_000,
            reads: HashMap::new(),
            simulation_output: Bytes::new(),
            simulation_error: None,
            tx_hash: MOCK_TX_HASH,
            reverts: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn at_block(mut self, block: u64) -> Self {
        self.block = block;
        self
    }

    /// Answer `eth_call`s to `to` with `selector` with ABI-encoded `output`.
    pub fn on_read(mut self, to: Address, selector: [u8; 4], output: Vec<u8>) -> Self {
        self.reads.insert((to, selector), Bytes::from(output));
        self
    }

    pub fn simulation_returns(mut self, output: Vec<u8>) -> Self {
        self.simulation_output = Bytes::from(output);
        self
    }

    pub fn simulation_fails(mut self, reason: &str) -> Self {
        self.simulation_error = Some(reason.to_string());
        self
    }

    pub fn write_returns_zero_hash(mut self) -> Self {
        self.tx_hash = B256::ZERO;
        self
    }

    pub fn receipt_reverts(mut self) -> Self {
        self.reverts = true;
        self
    }

    pub fn calls(&self) -> Vec<ChainCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn writes(&self) -> Vec<ContractCall> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ChainCall::Write(call) => Some(call),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: ChainCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ChainClient for MockChain {
    fn chain_id(&self) -> Result<u64, LeverageError> {
        Ok(self.chain_id)
    }

    async fn block_number(&self) -> Result<u64, LeverageError> {
        Ok(self.block)
    }

    async fn read(&self, to: Address, input: Bytes) -> Result<Bytes, LeverageError> {
        let mut selector = [0u8; 4];
        selector.copy_from_slice(&input[..4]);
        self.record(ChainCall::Read { to, selector });
        self.reads
            .get(&(to, selector))
            .cloned()
            .ok_or_else(|| LeverageError::ReadFailed {
                function: format!("0x{}", hex::encode(selector)),
                reason: format!("no mock response for {to:#x}"),
            })
    }

    async fn simulate(&self, call: &ContractCall) -> Result<Simulation, LeverageError> {
        self.record(ChainCall::Simulate(call.clone()));
        if let Some(reason) = &self.simulation_error {
            return Err(LeverageError::SimulationFailed {
                reason: reason.clone(),
            });
        }
        let mut request = call.clone();
        request.gas_limit = Some(250_000);
        Ok(Simulation {
            request,
            output: self.simulation_output.clone(),
        })
    }

    async fn write(&self, request: &ContractCall) -> Result<B256, LeverageError> {
        self.record(ChainCall::Write(request.clone()));
        Ok(self.tx_hash)
    }

    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<TxReceipt, LeverageError> {
        self.record(ChainCall::Receipt(tx_hash));
        if self.reverts {
            return Err(LeverageError::TxReverted {
                tx_hash: tx_hash.to_string(),
                reason: "transaction reverted on-chain".into(),
            });
        }
        Ok(TxReceipt {
            tx_hash,
            block_number: Some(self.block + 1),
            gas_used: 180_000,
            status: true,
        })
    }
}
