use serde::Deserialize;
use std::collections::HashMap;

use crate::constants::{DEFAULT_DEADLINE_BUFFER_SECONDS, DEFAULT_SLIPPAGE_BPS};
use crate::types::Asset;

// ---------------------------------------------------------------------------
// Top-level aggregate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub app: AppConfig,
    pub chain: ChainConfig,
    pub routing: RoutingConfig,
    pub positions: PositionConfig,
}

// ---------------------------------------------------------------------------
// app.json
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Selects `chains/<chain_id>.json`.
    pub chain_id: u64,
    pub logging: LoggingConfig,
    pub registry: RegistryConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub log_dir: String,
    #[serde(default = "default_log_file")]
    pub log_file: String,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default)]
    pub filter: Option<String>,
    /// Mirror events to stderr in compact form.
    #[serde(default = "default_true")]
    pub stderr: bool,
}

fn default_log_file() -> String {
    "leverage-client.log".into()
}

fn default_true() -> bool {
    true
}

/// Contract registry endpoints, one document per chain id.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    pub urls: HashMap<u64, String>,
    pub timeout_seconds: u64,
}

// ---------------------------------------------------------------------------
// chains/<chain_id>.json
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    pub chain_id: u64,
    pub chain_name: String,
    pub rpc_url: String,
    /// Average blocks per minute, used for expiration estimates.
    pub blocks_per_minute: f64,
    /// Asset borrowed against and returned on close (WBTC on mainnet).
    pub primary_collateral: Asset,
    pub transaction: TransactionTiming,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionTiming {
    pub simulation_timeout_seconds: u64,
    pub confirmation_timeout_seconds: u64,
    pub receipt_poll_interval_ms: u64,
}

// ---------------------------------------------------------------------------
// routing.json
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct RoutingConfig {
    pub base_url: String,
    #[serde(default = "default_protocols")]
    pub protocols: Vec<String>,
    pub timeout_seconds: u64,
    /// Name of the env var holding the API key; empty for none.
    #[serde(default)]
    pub api_key_env: String,
}

fn default_protocols() -> Vec<String> {
    vec!["v3".into()]
}

// ---------------------------------------------------------------------------
// positions.json
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct PositionConfig {
    #[serde(default = "default_slippage_bps")]
    pub default_slippage_bps: u32,
    #[serde(default = "default_deadline_buffer")]
    pub deadline_buffer_seconds: u64,
}

fn default_slippage_bps() -> u32 {
    DEFAULT_SLIPPAGE_BPS
}

fn default_deadline_buffer() -> u64 {
    DEFAULT_DEADLINE_BUFFER_SECONDS
}

impl Default for PositionConfig {
    fn default() -> Self {
        Self {
            default_slippage_bps: DEFAULT_SLIPPAGE_BPS,
            deadline_buffer_seconds: DEFAULT_DEADLINE_BUFFER_SECONDS,
        }
    }
}
