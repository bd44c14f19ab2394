pub mod types;
pub mod validate;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Load and merge all config JSON files into a single [`ClientConfig`],
/// then apply environment variable overrides and validate.
///
/// Expected directory layout:
/// ```text
/// config/
///   app.json
///   chains/<chain_id>.json   (chain_id from app.json or LEVERAGE_CHAIN_ID)
///   routing.json
///   positions.json           (optional, defaults apply)
/// ```
///
/// # Environment variable overrides
///
/// | Env Var                    | Config Field                               |
/// |----------------------------|--------------------------------------------|
/// | `LEVERAGE_CHAIN_ID`        | `app.chain_id` (selects the chain file)    |
/// | `LEVERAGE_RPC_URL`         | `chain.rpc_url`                            |
/// | `LEVERAGE_REGISTRY_URL`    | `app.registry.urls[chain_id]`              |
/// | `ROUTING_API_URL`          | `routing.base_url`                         |
/// | `DEFAULT_SLIPPAGE_BPS`     | `positions.default_slippage_bps`           |
/// | `DEADLINE_BUFFER_SECONDS`  | `positions.deadline_buffer_seconds`        |
pub fn load_config(config_dir: &Path) -> Result<ClientConfig> {
    let read = |name: &str| -> Result<String> {
        let path = config_dir.join(name);
        std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file: {}", path.display()))
    };

    let mut app: AppConfig =
        serde_json::from_str(&read("app.json")?).context("parsing app.json")?;

    if let Some(val) = env_parse::<u64>("LEVERAGE_CHAIN_ID") {
        info!(val, "env override: LEVERAGE_CHAIN_ID");
        app.chain_id = val;
    }

    let chain_file = format!("chains/{}.json", app.chain_id);
    let chain: ChainConfig = serde_json::from_str(&read(&chain_file)?)
        .with_context(|| format!("parsing {chain_file}"))?;

    let routing: RoutingConfig =
        serde_json::from_str(&read("routing.json")?).context("parsing routing.json")?;

    // Positions config is optional.
    let positions: PositionConfig = match read("positions.json") {
        Ok(contents) => serde_json::from_str(&contents).context("parsing positions.json")?,
        Err(_) => PositionConfig::default(),
    };

    let mut config = ClientConfig {
        app,
        chain,
        routing,
        positions,
    };

    apply_env_overrides(&mut config);
    validate::validate_config(&config)?;

    Ok(config)
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides to the loaded config.
///
/// Only non-empty env vars take effect. Parse failures are skipped
/// (the JSON value remains).
fn apply_env_overrides(config: &mut ClientConfig) {
    // -- Endpoints -----------------------------------------------------------
    if let Some(val) = env_string("LEVERAGE_RPC_URL") {
        info!("env override: LEVERAGE_RPC_URL");
        config.chain.rpc_url = val;
    }

    if let Some(val) = env_string("LEVERAGE_REGISTRY_URL") {
        info!(chain_id = config.chain.chain_id, "env override: LEVERAGE_REGISTRY_URL");
        config.app.registry.urls.insert(config.chain.chain_id, val);
    }

    if let Some(val) = env_string("ROUTING_API_URL") {
        info!("env override: ROUTING_API_URL");
        config.routing.base_url = val;
    }

    // -- Positions -----------------------------------------------------------
    if let Some(val) = env_parse::<u32>("DEFAULT_SLIPPAGE_BPS") {
        info!(val, "env override: DEFAULT_SLIPPAGE_BPS");
        config.positions.default_slippage_bps = val;
    }

    if let Some(val) = env_parse::<u64>("DEADLINE_BUFFER_SECONDS") {
        info!(val, "env override: DEADLINE_BUFFER_SECONDS");
        config.positions.deadline_buffer_seconds = val;
    }
}

/// Read a non-empty env var as a `String`.
fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Read a non-empty env var and parse it as `T`.
fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{
        MAINNET_CHAIN_ID, MAINNET_REGISTRY_URL, TOKEN_WBTC, UNISWAP_ROUTING_API_URL,
    };
    use serial_test::serial;
    use std::path::PathBuf;

    fn project_config_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("config")
    }

    // -----------------------------------------------------------------------
    // Helper: write a minimal set of config JSON files to a temp dir.
    // -----------------------------------------------------------------------

    fn write_test_configs(dir: &Path) {
        std::fs::create_dir_all(dir.join("chains")).unwrap();

        std::fs::write(
            dir.join("app.json"),
            r#"{
                "chain_id": 1,
                "logging": { "log_dir": "logs" },
                "registry": {
                    "urls": { "1": "https://registry.example.com/mainnet.json" },
                    "timeout_seconds": 10
                }
            }"#,
        )
        .unwrap();

        std::fs::write(
            dir.join("chains/1.json"),
            r#"{
                "chain_id": 1,
                "chain_name": "Ethereum Mainnet",
                "rpc_url": "http://127.0.0.1:8545",
                "blocks_per_minute": 5.0,
                "primary_collateral": { "address": "0x2260FAC5E5542a773Aa44fBCfeDf7C193bc2C599", "decimals": 8 },
                "transaction": {
                    "simulation_timeout_seconds": 15,
                    "confirmation_timeout_seconds": 120,
                    "receipt_poll_interval_ms": 1000
                }
            }"#,
        )
        .unwrap();

        std::fs::write(
            dir.join("routing.json"),
            r#"{
                "base_url": "https://api.uniswap.org/v1/quote",
                "protocols": ["v3"],
                "timeout_seconds": 10,
                "api_key_env": "UNISWAP_API_KEY"
            }"#,
        )
        .unwrap();

        std::fs::write(
            dir.join("positions.json"),
            r#"{ "default_slippage_bps": 50, "deadline_buffer_seconds": 1800 }"#,
        )
        .unwrap();
    }

    // -----------------------------------------------------------------------
    // Env cleanup helper, keeps env-mutating tests independent.
    // -----------------------------------------------------------------------

    fn clean_client_env() {
        for key in [
            "LEVERAGE_CHAIN_ID",
            "LEVERAGE_RPC_URL",
            "LEVERAGE_REGISTRY_URL",
            "ROUTING_API_URL",
            "DEFAULT_SLIPPAGE_BPS",
            "DEADLINE_BUFFER_SECONDS",
        ] {
            std::env::remove_var(key);
        }
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[test]
    #[serial]
    fn test_load_real_configs() {
        clean_client_env();
        let dir = project_config_dir();
        if !dir.exists() {
            eprintln!("skipping: config dir not found at {}", dir.display());
            return;
        }
        let config = load_config(&dir).expect("config should load and validate");
        assert_eq!(config.chain.chain_id, MAINNET_CHAIN_ID);
        assert_eq!(config.chain.primary_collateral.address, TOKEN_WBTC);
        assert_eq!(config.app.registry.urls[&MAINNET_CHAIN_ID], MAINNET_REGISTRY_URL);
        assert_eq!(config.routing.base_url, UNISWAP_ROUTING_API_URL);
        assert_eq!(config.routing.protocols, vec!["v3".to_string()]);
        clean_client_env();
    }

    #[test]
    #[serial]
    fn test_load_test_configs() {
        clean_client_env();
        let tmp = tempfile::tempdir().unwrap();
        write_test_configs(tmp.path());
        let config = load_config(tmp.path()).expect("test config should load");
        assert_eq!(config.chain.chain_id, 1);
        assert_eq!(config.chain.primary_collateral.decimals, 8);
        assert_eq!(config.positions.default_slippage_bps, 50);
        assert_eq!(config.app.logging.log_file, "leverage-client.log");
        clean_client_env();
    }

    #[test]
    #[serial]
    fn test_missing_config_file_errors() {
        clean_client_env();
        let tmp = tempfile::tempdir().unwrap();
        let err = load_config(tmp.path()).unwrap_err();
        assert!(
            err.to_string().contains("failed to read config file"),
            "expected file-not-found error, got: {err}"
        );
        clean_client_env();
    }

    #[test]
    #[serial]
    fn test_positions_file_optional() {
        clean_client_env();
        let tmp = tempfile::tempdir().unwrap();
        write_test_configs(tmp.path());
        std::fs::remove_file(tmp.path().join("positions.json")).unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.positions.deadline_buffer_seconds, 1_800);
        clean_client_env();
    }

    #[test]
    #[serial]
    fn test_env_override_rpc_and_routing_urls() {
        clean_client_env();
        let tmp = tempfile::tempdir().unwrap();
        write_test_configs(tmp.path());

        std::env::set_var("LEVERAGE_RPC_URL", "https://rpc.example.com");
        std::env::set_var("ROUTING_API_URL", "https://router.example.com/quote");
        std::env::set_var("LEVERAGE_REGISTRY_URL", "https://registry.example.com/fork.json");
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.chain.rpc_url, "https://rpc.example.com");
        assert_eq!(config.routing.base_url, "https://router.example.com/quote");
        assert_eq!(
            config.app.registry.urls[&1],
            "https://registry.example.com/fork.json"
        );
        clean_client_env();
    }

    #[test]
    #[serial]
    fn test_env_override_positions() {
        clean_client_env();
        let tmp = tempfile::tempdir().unwrap();
        write_test_configs(tmp.path());

        std::env::set_var("DEFAULT_SLIPPAGE_BPS", "125");
        std::env::set_var("DEADLINE_BUFFER_SECONDS", "600");
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.positions.default_slippage_bps, 125);
        assert_eq!(config.positions.deadline_buffer_seconds, 600);
        clean_client_env();
    }

    #[test]
    #[serial]
    fn test_env_override_chain_id_selects_chain_file() {
        clean_client_env();
        let tmp = tempfile::tempdir().unwrap();
        write_test_configs(tmp.path());

        std::env::set_var("LEVERAGE_CHAIN_ID", "11155111");
        let err = load_config(tmp.path()).unwrap_err();
        assert!(
            err.to_string().contains("chains/11155111.json"),
            "expected missing chain file error, got: {err}"
        );
        clean_client_env();
    }

    #[test]
    #[serial]
    fn test_env_override_out_of_range_slippage_fails_validation() {
        clean_client_env();
        let tmp = tempfile::tempdir().unwrap();
        write_test_configs(tmp.path());

        std::env::set_var("DEFAULT_SLIPPAGE_BPS", "20000");
        let err = load_config(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("default_slippage_bps"));
        clean_client_env();
    }

    #[test]
    #[serial]
    fn test_env_override_empty_or_invalid_ignored() {
        clean_client_env();
        let tmp = tempfile::tempdir().unwrap();
        write_test_configs(tmp.path());

        std::env::set_var("DEFAULT_SLIPPAGE_BPS", "");
        std::env::set_var("DEADLINE_BUFFER_SECONDS", "soon");
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.positions.default_slippage_bps, 50);
        assert_eq!(config.positions.deadline_buffer_seconds, 1_800);
        clean_client_env();
    }
}
