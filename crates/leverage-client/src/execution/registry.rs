//! Contract address registry client.
//!
//! The registry is a JSON document per chain listing `{name, address, abi}`
//! records. It is fetched on every orchestrator call; nothing is cached.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::config::RegistryConfig;
use crate::errors::LeverageError;
use crate::types::{ContractRegistry, RegistryEntry};

/// Source of raw registry records for a chain.
#[async_trait]
pub trait RegistrySource: Send + Sync {
    async fn fetch_entries(&self, chain_id: u64) -> Result<Vec<RegistryEntry>, LeverageError>;
}

/// Fetch and type the registry for `chain_id`.
pub async fn resolve_registry(
    source: &dyn RegistrySource,
    chain_id: u64,
) -> Result<ContractRegistry, LeverageError> {
    let entries = source.fetch_entries(chain_id).await?;
    debug!(chain_id, entries = entries.len(), "registry fetched");
    ContractRegistry::from_entries(chain_id, entries)
}

/// HTTP registry keyed by chain id.
pub struct HttpRegistry {
    http: Client,
    urls: HashMap<u64, String>,
    timeout: Duration,
}

impl HttpRegistry {
    pub fn new(config: &RegistryConfig) -> Result<Self, LeverageError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            http,
            urls: config.urls.clone(),
            timeout: Duration::from_secs(config.timeout_seconds),
        })
    }

    fn url_for(&self, chain_id: u64) -> Result<&str, LeverageError> {
        self.urls
            .get(&chain_id)
            .map(String::as_str)
            .ok_or_else(|| LeverageError::Config(format!("no registry URL for chain {chain_id}")))
    }
}

#[async_trait]
impl RegistrySource for HttpRegistry {
    async fn fetch_entries(&self, chain_id: u64) -> Result<Vec<RegistryEntry>, LeverageError> {
        let url = self.url_for(chain_id)?;

        let resp = self
            .http
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| LeverageError::Registry {
                reason: format!("GET {url}: {e}"),
            })?;

        let entries: Vec<RegistryEntry> = resp.json().await.map_err(|e| LeverageError::Registry {
            reason: format!("invalid registry document from {url}: {e}"),
        })?;

        Ok(entries)
    }
}
