use anyhow::{bail, Result};
use tracing_subscriber::EnvFilter;

use crate::constants::BPS_DENOMINATOR;

use super::types::ClientConfig;

/// Protocols whose routes the V3 path encoder can express.
const SUPPORTED_PROTOCOLS: [&str; 1] = ["v3"];

/// Validate invariants across the merged config that serde alone cannot enforce.
///
/// Every violation is collected so one run reports all of them. Called
/// automatically by [`super::load_config`].
pub fn validate_config(config: &ClientConfig) -> Result<()> {
    let mut errors: Vec<String> = Vec::new();

    validate_logging_config(config, &mut errors);
    validate_chain_config(config, &mut errors);
    validate_registry_config(config, &mut errors);
    validate_routing_config(config, &mut errors);
    validate_positions_config(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        let msg = format!(
            "Configuration validation failed ({} error{}):\n  - {}",
            errors.len(),
            if errors.len() == 1 { "" } else { "s" },
            errors.join("\n  - ")
        );
        bail!("{msg}");
    }
}

// ---------------------------------------------------------------------------
// Logging config
// ---------------------------------------------------------------------------

fn validate_logging_config(config: &ClientConfig, errors: &mut Vec<String>) {
    let logging = &config.app.logging;

    if logging.log_dir.is_empty() {
        errors.push("app.logging: log_dir is empty".into());
    }
    if logging.log_file.is_empty() {
        errors.push("app.logging: log_file is empty".into());
    }
    if let Some(filter) = &logging.filter {
        if let Err(e) = EnvFilter::try_new(filter) {
            errors.push(format!("app.logging: invalid filter '{filter}': {e}"));
        }
    }
}

// ---------------------------------------------------------------------------
// Chain config
// ---------------------------------------------------------------------------

fn validate_chain_config(config: &ClientConfig, errors: &mut Vec<String>) {
    let chain = &config.chain;

    if chain.chain_id != config.app.chain_id {
        errors.push(format!(
            "chain: chain_id ({}) does not match app.chain_id ({})",
            chain.chain_id, config.app.chain_id
        ));
    }

    if chain.rpc_url.is_empty() {
        errors.push("chain: rpc_url is empty".into());
    }

    if !chain.blocks_per_minute.is_finite() || chain.blocks_per_minute <= 0.0 {
        errors.push(format!(
            "chain: blocks_per_minute ({}) must be > 0",
            chain.blocks_per_minute
        ));
    }

    if let Err(e) = chain.primary_collateral.validate() {
        errors.push(format!("chain.primary_collateral: {e}"));
    }

    let tx = &chain.transaction;
    if tx.simulation_timeout_seconds == 0 {
        errors.push("chain.transaction: simulation_timeout_seconds must be > 0".into());
    }
    if tx.confirmation_timeout_seconds == 0 {
        errors.push("chain.transaction: confirmation_timeout_seconds must be > 0".into());
    }
    if tx.receipt_poll_interval_ms == 0 {
        errors.push("chain.transaction: receipt_poll_interval_ms must be > 0".into());
    }
}

// ---------------------------------------------------------------------------
// Registry config
// ---------------------------------------------------------------------------

fn validate_registry_config(config: &ClientConfig, errors: &mut Vec<String>) {
    let registry = &config.app.registry;

    match registry.urls.get(&config.chain.chain_id) {
        None => errors.push(format!(
            "app.registry: no URL for chain {}",
            config.chain.chain_id
        )),
        Some(url) if url.is_empty() => errors.push(format!(
            "app.registry: URL for chain {} is empty",
            config.chain.chain_id
        )),
        Some(_) => {}
    }

    if registry.timeout_seconds == 0 {
        errors.push("app.registry: timeout_seconds must be > 0".into());
    }
}

// ---------------------------------------------------------------------------
// Routing config
// ---------------------------------------------------------------------------

fn validate_routing_config(config: &ClientConfig, errors: &mut Vec<String>) {
    let routing = &config.routing;

    if routing.base_url.is_empty() {
        errors.push("routing: base_url is empty".into());
    }

    if routing.protocols.is_empty() {
        errors.push("routing: protocols must not be empty".into());
    }
    for protocol in &routing.protocols {
        if !SUPPORTED_PROTOCOLS.contains(&protocol.as_str()) {
            errors.push(format!(
                "routing: protocol '{protocol}' cannot be encoded (supported: {})",
                SUPPORTED_PROTOCOLS.join(", ")
            ));
        }
    }

    if routing.timeout_seconds == 0 {
        errors.push("routing: timeout_seconds must be > 0".into());
    }
}

// ---------------------------------------------------------------------------
// Positions config
// ---------------------------------------------------------------------------

fn validate_positions_config(config: &ClientConfig, errors: &mut Vec<String>) {
    let pos = &config.positions;

    if pos.default_slippage_bps > BPS_DENOMINATOR {
        errors.push(format!(
            "positions: default_slippage_bps ({}) must be <= {BPS_DENOMINATOR}",
            pos.default_slippage_bps
        ));
    }

    if pos.deadline_buffer_seconds == 0 {
        errors.push("positions: deadline_buffer_seconds must be > 0".into());
    }
}
