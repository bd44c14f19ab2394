//! Swap route resolution against the Uniswap routing engine.
//!
//! The engine picks the route; this module restricts it to V3 pools (the
//! only kind the packed-path encoder can express), turns the loosely-typed
//! JSON into a [`RouteQuote`], and checks the route actually connects the
//! requested tokens.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, U256};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, info};

use crate::config::RoutingConfig;
use crate::errors::LeverageError;
use crate::types::{Hop, RouteQuote, RouteRequest};

/// Pool type tag the routing engine uses for Uniswap V3 pools.
const V3_POOL_TYPE: &str = "v3-pool";

/// External engine returning the best exact-input route.
#[async_trait]
pub trait RouteSource: Send + Sync {
    async fn route(&self, chain_id: u64, request: &RouteRequest) -> Result<RouteQuote, LeverageError>;
}

// ---------------------------------------------------------------------------
// SwapRouteResolver
// ---------------------------------------------------------------------------

/// Validating front for a [`RouteSource`].
#[derive(Clone)]
pub struct SwapRouteResolver {
    source: Arc<dyn RouteSource>,
}

impl SwapRouteResolver {
    pub fn new(source: Arc<dyn RouteSource>) -> Self {
        Self { source }
    }

    /// Resolve a route for `request`. Read-only.
    pub async fn resolve(&self, chain_id: u64, request: &RouteRequest) -> Result<RouteQuote, LeverageError> {
        request.token_in.validate()?;
        request.token_out.validate()?;
        if request.token_in.address == request.token_out.address {
            return Err(LeverageError::InvalidAsset {
                reason: format!("cannot route {:#x} into itself", request.token_in.address),
            });
        }
        if request.amount_in.is_zero() {
            return Err(LeverageError::Validation("route amount is zero".into()));
        }

        let quote = self.source.route(chain_id, request).await?;

        if quote.token_in() != request.token_in.address || quote.token_out() != request.token_out.address {
            return Err(LeverageError::Routing {
                reason: format!(
                    "route connects {:#x} -> {:#x}, requested {:#x} -> {:#x}",
                    quote.token_in(),
                    quote.token_out(),
                    request.token_in.address,
                    request.token_out.address
                ),
            });
        }

        info!(
            token_in = %request.token_in.address,
            token_out = %request.token_out.address,
            amount_in = %request.amount_in,
            hops = quote.hops().len(),
            output = %quote.output_amount(),
            "route resolved"
        );

        Ok(quote)
    }
}

// ---------------------------------------------------------------------------
// UniswapRoutingClient
// ---------------------------------------------------------------------------

/// HTTP client for the Uniswap routing API.
pub struct UniswapRoutingClient {
    http: Client,
    config: RoutingConfig,
}

impl UniswapRoutingClient {
    pub fn new(config: &RoutingConfig) -> Result<Self, LeverageError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            http,
            config: config.clone(),
        })
    }

    async fn query(&self, chain_id: u64, request: &RouteRequest) -> Result<Option<serde_json::Value>> {
        let mut req = self
            .http
            .get(&self.config.base_url)
            .timeout(Duration::from_secs(self.config.timeout_seconds))
            .query(&[
                ("tokenInAddress", format!("{:#x}", request.token_in.address)),
                ("tokenInChainId", chain_id.to_string()),
                ("tokenOutAddress", format!("{:#x}", request.token_out.address)),
                ("tokenOutChainId", chain_id.to_string()),
                ("amount", request.amount_in.to_string()),
                ("type", "exactIn".into()),
                ("protocols", self.config.protocols.join(",")),
            ]);

        // Add API key if configured
        let api_key = if !self.config.api_key_env.is_empty() {
            std::env::var(&self.config.api_key_env).ok()
        } else {
            None
        };
        if let Some(key) = &api_key {
            req = req.header("x-api-key", key);
        }

        let resp = req.send().await.context("routing HTTP request failed")?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body: serde_json::Value = resp
            .error_for_status()
            .context("routing HTTP error status")?
            .json()
            .await
            .context("routing JSON parse failed")?;
        Ok(Some(body))
    }
}

#[async_trait]
impl RouteSource for UniswapRoutingClient {
    async fn route(&self, chain_id: u64, request: &RouteRequest) -> Result<RouteQuote, LeverageError> {
        let not_found = || LeverageError::RouteNotFound {
            token_in: format!("{:#x}", request.token_in.address),
            token_out: format!("{:#x}", request.token_out.address),
        };

        let body = self
            .query(chain_id, request)
            .await
            .map_err(|e| LeverageError::Routing {
                reason: format!("{e:#}"),
            })?
            .ok_or_else(not_found)?;

        debug!(chain_id, "routing response received");

        parse_route(&body)
            .map_err(|e| LeverageError::Routing {
                reason: format!("{e:#}"),
            })?
            .ok_or_else(not_found)
    }
}

/// Map a routing API body onto a [`RouteQuote`].
///
/// Only the first split is used since a packed path encodes one chain of
/// pools. `Ok(None)` means the engine found no route.
fn parse_route(body: &serde_json::Value) -> Result<Option<RouteQuote>> {
    let Some(first_split) = body["route"].as_array().and_then(|splits| splits.first()) else {
        return Ok(None);
    };
    let pools = first_split.as_array().context("route split is not an array")?;
    if pools.is_empty() {
        return Ok(None);
    }

    let mut hops = Vec::with_capacity(pools.len());
    let mut token_path = Vec::with_capacity(pools.len() + 1);

    for (i, pool) in pools.iter().enumerate() {
        let pool_type = pool["type"].as_str().context("missing pool type")?;
        if pool_type != V3_POOL_TYPE {
            bail!("hop {i} uses unsupported pool type {pool_type}");
        }

        let address = parse_address(&pool["address"]).with_context(|| format!("hop {i} address"))?;
        let fee = parse_u64(&pool["fee"]).with_context(|| format!("hop {i} fee"))?;
        let fee = u32::try_from(fee).with_context(|| format!("hop {i} fee {fee} out of range"))?;
        let token_in = parse_address(&pool["tokenIn"]["address"]).with_context(|| format!("hop {i} tokenIn"))?;
        let token_out =
            parse_address(&pool["tokenOut"]["address"]).with_context(|| format!("hop {i} tokenOut"))?;

        match token_path.last() {
            None => token_path.push(token_in),
            Some(prev) if *prev == token_in => {}
            Some(prev) => bail!("hop {i} starts at {token_in:#x} but previous hop ended at {prev:#x}"),
        }
        token_path.push(token_out);
        hops.push(Hop { pool: address, fee });
    }

    // Prefer the split's own output; `quote` totals every split.
    let last = &pools[pools.len() - 1];
    let output = match last.get("amountOut") {
        Some(v) if !v.is_null() => parse_u256(v).context("invalid amountOut")?,
        _ => parse_u256(&body["quote"]).context("missing quote")?,
    };

    let quote = RouteQuote::new(hops, token_path, output).map_err(|e| anyhow::anyhow!("{e}"))?;
    Ok(Some(quote))
}

fn parse_address(value: &serde_json::Value) -> Result<Address> {
    value
        .as_str()
        .context("expected address string")?
        .parse()
        .context("invalid address")
}

fn parse_u64(value: &serde_json::Value) -> Result<u64> {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
        .context("expected integer")
}

fn parse_u256(value: &serde_json::Value) -> Result<U256> {
    match value {
        serde_json::Value::String(s) => s.parse().context("invalid integer string"),
        serde_json::Value::Number(n) => n
            .as_u64()
            .map(U256::from)
            .context("expected unsigned integer"),
        _ => bail!("expected integer, got {value}"),
    }
}
