use std::path::PathBuf;
use std::sync::Arc;

use alloy::primitives::{Address, Bytes, U256};
use alloy::signers::local::PrivateKeySigner;
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing::info;

use leverage_client::config::{self, ClientConfig};
use leverage_client::core::orchestrator::{OrchestratorSettings, PositionOrchestrator};
use leverage_client::execution::chain::{ChainClient, RpcChainClient};
use leverage_client::execution::registry::HttpRegistry;
use leverage_client::execution::route_resolver::UniswapRoutingClient;
use leverage_client::logging;
use leverage_client::types::units::{format_units, parse_units};

#[derive(Parser)]
#[command(
    name = "leverage-client",
    about = "Preview, open and close leveraged strategy positions"
)]
struct Cli {
    /// Directory holding app.json, chains/, routing.json and positions.json.
    #[arg(long, env = "LEVERAGE_CONFIG_DIR", default_value = "config")]
    config_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Quote opening a position and print the minimum shares and swap payload.
    PreviewOpen {
        /// Collateral in primary-collateral units (e.g. 0.24).
        #[arg(long)]
        collateral: String,
        /// Amount to borrow in primary-collateral units.
        #[arg(long)]
        borrow: String,
        /// Strategy vault address.
        #[arg(long)]
        strategy: String,
        #[arg(long)]
        slippage_bps: Option<u32>,
    },
    /// Open a position. Without --min-shares/--payload a fresh preview is used.
    Open {
        #[arg(long)]
        collateral: String,
        #[arg(long)]
        borrow: String,
        #[arg(long)]
        strategy: String,
        /// Raw minimum share count from preview-open.
        #[arg(long, requires = "payload")]
        min_shares: Option<String>,
        /// Hex swap payload from preview-open.
        #[arg(long, requires = "min_shares")]
        payload: Option<String>,
        #[arg(long)]
        slippage_bps: Option<u32>,
    },
    /// Quote closing a position and print the minimum output and swap payload.
    PreviewClose {
        #[arg(long)]
        nft_id: String,
        #[arg(long)]
        slippage_bps: Option<u32>,
    },
    /// Close a position. Without --min-out/--payload a fresh preview is used.
    Close {
        #[arg(long)]
        nft_id: String,
        /// Raw minimum primary-collateral output from preview-close.
        #[arg(long, requires = "payload")]
        min_out: Option<String>,
        #[arg(long, requires = "min_out")]
        payload: Option<String>,
        #[arg(long)]
        slippage_bps: Option<u32>,
    },
    /// Approve the position opener to spend primary collateral.
    Approve {
        /// Amount in primary-collateral units.
        #[arg(long)]
        amount: String,
    },
    /// Claim an expired or liquidated position.
    Claim {
        #[arg(long)]
        nft_id: String,
    },
    /// Print the ledger record of a position.
    Position {
        #[arg(long)]
        nft_id: String,
    },
    /// Print the estimated minutes until a position expires.
    Expiration {
        #[arg(long)]
        nft_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignore if missing).
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = config::load_config(&cli.config_dir)?;

    // Hold the guard for the process lifetime.
    let _guard = logging::init_tracing(&config.app.logging)?;

    info!(
        chain_id = config.chain.chain_id,
        chain_name = %config.chain.chain_name,
        "leverage client starting"
    );

    let signer = init_signer()?;
    let orchestrator = build_orchestrator(&config, signer.clone()).await?;
    let decimals = config.chain.primary_collateral.decimals;

    match cli.command {
        Commands::PreviewOpen {
            collateral,
            borrow,
            strategy,
            slippage_bps,
        } => {
            let preview = orchestrator
                .preview_open(
                    parse_units(&collateral, decimals)?,
                    parse_units(&borrow, decimals)?,
                    parse_address(&strategy)?,
                    slippage_bps,
                )
                .await?;
            print_json(&preview)?;
        }
        Commands::Open {
            collateral,
            borrow,
            strategy,
            min_shares,
            payload,
            slippage_bps,
        } => {
            let account = require_account(signer.as_ref())?;
            let collateral = parse_units(&collateral, decimals)?;
            let borrow = parse_units(&borrow, decimals)?;
            let strategy = parse_address(&strategy)?;

            let (min_shares, payload) = match (min_shares, payload) {
                (Some(min), Some(payload)) => (parse_u256(&min)?, parse_bytes(&payload)?),
                _ => {
                    let preview = orchestrator
                        .preview_open(collateral, borrow, strategy, slippage_bps)
                        .await?;
                    (preview.minimum_expected_shares, preview.payload)
                }
            };

            let outcome = orchestrator
                .open(collateral, borrow, min_shares, strategy, payload, account)
                .await?;
            print_json(&outcome)?;
        }
        Commands::PreviewClose {
            nft_id,
            slippage_bps,
        } => {
            let preview = orchestrator
                .preview_close(parse_u256(&nft_id)?, slippage_bps)
                .await?;
            print_json(&json!({
                "minimum_out": preview.minimum_out,
                "minimum_out_formatted": format_units(preview.minimum_out, decimals)?,
                "quoted_swap_output": preview.quoted_swap_output,
                "expected_assets": preview.expected_assets,
                "payload": preview.payload,
            }))?;
        }
        Commands::Close {
            nft_id,
            min_out,
            payload,
            slippage_bps,
        } => {
            let account = require_account(signer.as_ref())?;
            let nft_id = parse_u256(&nft_id)?;

            let (min_out, payload) = match (min_out, payload) {
                (Some(min), Some(payload)) => (parse_u256(&min)?, parse_bytes(&payload)?),
                _ => {
                    let preview = orchestrator.preview_close(nft_id, slippage_bps).await?;
                    (preview.minimum_out, preview.payload)
                }
            };

            let outcome = orchestrator.close(nft_id, min_out, account, payload).await?;
            print_json(&outcome)?;
        }
        Commands::Approve { amount } => {
            let account = require_account(signer.as_ref())?;
            let outcome = orchestrator
                .approve_spend(account, parse_units(&amount, decimals)?)
                .await?;
            print_json(&outcome)?;
        }
        Commands::Claim { nft_id } => {
            let account = require_account(signer.as_ref())?;
            let outcome = orchestrator.claim(parse_u256(&nft_id)?, account).await?;
            print_json(&outcome)?;
        }
        Commands::Position { nft_id } => {
            let entry = orchestrator.get_position_state(parse_u256(&nft_id)?).await?;
            print_json(&entry)?;
        }
        Commands::Expiration { nft_id } => {
            let nft_id = parse_u256(&nft_id)?;
            let minutes = orchestrator.get_estimated_expiration(nft_id).await?;
            print_json(&json!({
                "nft_id": nft_id,
                "minutes_until_expiration": minutes,
                "expired": minutes < 0.0,
            }))?;
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

async fn build_orchestrator(
    config: &ClientConfig,
    signer: Option<PrivateKeySigner>,
) -> Result<PositionOrchestrator> {
    let chain = RpcChainClient::connect(&config.chain.rpc_url, signer, &config.chain.transaction)
        .await
        .context("failed to connect to RPC")?;

    let connected = chain.chain_id()?;
    if connected != config.chain.chain_id {
        bail!(
            "RPC reports chain {connected} but config is for chain {}",
            config.chain.chain_id
        );
    }

    let registry =
        HttpRegistry::new(&config.app.registry).context("failed to build registry client")?;
    let router =
        UniswapRoutingClient::new(&config.routing).context("failed to build routing client")?;

    Ok(PositionOrchestrator::new(
        Arc::new(chain),
        Arc::new(registry),
        Arc::new(router),
        OrchestratorSettings::from_config(config),
    ))
}

/// Signer from `LEVERAGE_PRIVATE_KEY`. Previews and reads work without one.
fn init_signer() -> Result<Option<PrivateKeySigner>> {
    match std::env::var("LEVERAGE_PRIVATE_KEY")
        .ok()
        .filter(|v| !v.is_empty())
    {
        Some(key) => {
            let key = key.strip_prefix("0x").unwrap_or(&key);
            let signer = key
                .parse::<PrivateKeySigner>()
                .context("failed to parse LEVERAGE_PRIVATE_KEY")?;
            info!(signer = %signer.address(), "signer loaded");
            Ok(Some(signer))
        }
        None => {
            info!("no private key set, running read-only");
            Ok(None)
        }
    }
}

fn require_account(signer: Option<&PrivateKeySigner>) -> Result<Address> {
    signer
        .map(|s| s.address())
        .context("LEVERAGE_PRIVATE_KEY is required for transactions")
}

// ---------------------------------------------------------------------------
// Argument parsing
// ---------------------------------------------------------------------------

fn parse_address(value: &str) -> Result<Address> {
    value
        .parse()
        .with_context(|| format!("invalid address {value:?}"))
}

fn parse_u256(value: &str) -> Result<U256> {
    value
        .parse()
        .with_context(|| format!("invalid integer {value:?}"))
}

fn parse_bytes(value: &str) -> Result<Bytes> {
    value
        .parse()
        .with_context(|| format!("invalid hex payload {value:?}"))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
