//! Contract roles and the per-chain address registry.

use std::collections::HashMap;
use std::fmt;

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::LeverageError;

/// Contract roles the client needs from the address registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractRole {
    PositionOpener,
    PositionCloser,
    PositionLedger,
    ExpiredVault,
}

impl ContractRole {
    pub const ALL: [ContractRole; 4] = [
        Self::PositionOpener,
        Self::PositionCloser,
        Self::PositionLedger,
        Self::ExpiredVault,
    ];

    /// Registry `name` under which the role is published.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PositionOpener => "PositionOpener",
            Self::PositionCloser => "PositionCloser",
            Self::PositionLedger => "PositionLedger",
            Self::ExpiredVault => "ExpiredVault",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == name)
    }
}

impl fmt::Display for ContractRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One record from the remote registry document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub name: String,
    pub address: Address,
    /// JSON ABI as published. Calls are encoded from compiled `sol!`
    /// definitions, so this is carried only for inspection.
    #[serde(default)]
    pub abi: serde_json::Value,
}

/// Registry entries for one chain, keyed by role.
#[derive(Debug, Clone)]
pub struct ContractRegistry {
    chain_id: u64,
    entries: HashMap<ContractRole, RegistryEntry>,
}

impl ContractRegistry {
    /// Build the typed map from a raw registry list.
    ///
    /// Unknown names are skipped. Every role in [`ContractRole::ALL`] must be
    /// present, otherwise the first missing role is reported.
    pub fn from_entries(
        chain_id: u64,
        raw: impl IntoIterator<Item = RegistryEntry>,
    ) -> Result<Self, LeverageError> {
        let mut entries = HashMap::new();
        for entry in raw {
            match ContractRole::from_name(&entry.name) {
                Some(role) => {
                    entries.insert(role, entry);
                }
                None => debug!(name = %entry.name, chain_id, "ignoring unknown registry entry"),
            }
        }

        if let Some(role) = ContractRole::ALL
            .into_iter()
            .find(|r| !entries.contains_key(r))
        {
            return Err(LeverageError::ContractNotFound { role, chain_id });
        }

        Ok(Self { chain_id, entries })
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn entry(&self, role: ContractRole) -> Result<&RegistryEntry, LeverageError> {
        self.entries.get(&role).ok_or(LeverageError::ContractNotFound {
            role,
            chain_id: self.chain_id,
        })
    }

    pub fn address(&self, role: ContractRole) -> Result<Address, LeverageError> {
        self.entry(role).map(|e| e.address)
    }
}
