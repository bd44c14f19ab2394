use alloy::primitives::{address, Address};

// ---------------------------------------------------------------------------
// Numeric Constants
// ---------------------------------------------------------------------------

/// Basis-point denominator: 10_000 bps = 100%.
pub const BPS_DENOMINATOR: u32 = 10_000;

/// Slippage applied by previews when the caller does not pass one (0.5%).
pub const DEFAULT_SLIPPAGE_BPS: u32 = 50;

/// Seconds added to the current time to form a swap deadline.
pub const DEFAULT_DEADLINE_BUFFER_SECONDS: u64 = 1_800;

/// Ethereum mainnet produces one block per 12 s slot.
pub const DEFAULT_BLOCKS_PER_MINUTE: f64 = 5.0;

/// Largest decimal count whose scale `10^d` still fits a U256.
pub const MAX_TOKEN_DECIMALS: u8 = 77;

/// Uniswap V3 fees are packed as `uint24`.
pub const MAX_POOL_FEE: u32 = (1 << 24) - 1;

// ---------------------------------------------------------------------------
// Ledger Routing Constants
// ---------------------------------------------------------------------------

/// Only one swap route is deployed on the opener/closer contracts.
pub const SWAP_ROUTE_UNISWAP_V3: u8 = 0;

/// Exchange slot passed to opener/closer; unused while a single route exists.
pub const EXCHANGE_UNSET: Address = Address::ZERO;

// ---------------------------------------------------------------------------
// Ethereum Mainnet Token Addresses
// ---------------------------------------------------------------------------

pub const MAINNET_CHAIN_ID: u64 = 1;

pub const TOKEN_WBTC: Address = address!("2260FAC5E5542a773Aa44fBCfeDf7C193bc2C599");
pub const TOKEN_WBTC_DECIMALS: u8 = 8;
pub const TOKEN_WETH: Address = address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");
pub const TOKEN_USDC: Address = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");

// ---------------------------------------------------------------------------
// Remote Endpoints
// ---------------------------------------------------------------------------

pub const MAINNET_REGISTRY_URL: &str =
    "https://smart-contract-backend-config.s3.amazonaws.com/abis/tenderly_fork_leverage_abis.json";

pub const UNISWAP_ROUTING_API_URL: &str = "https://api.uniswap.org/v1/quote";
