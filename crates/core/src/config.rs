use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub chain: ChainConfig,
    pub dex: DexConfig,
    pub executor: ExecutorConfig,
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    pub rpc_ws: String,
    /// When set, `connect` refuses a node reporting a different chain id.
    #[serde(default)]
    pub chain_id: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DexConfig {
    pub router: String,
    pub factory: String,
    pub wrapped_native: String,
    #[serde(default = "default_pair_dedup_capacity")]
    pub pair_dedup_capacity: usize,
    #[serde(default = "default_pair_dedup_ttl_ms")]
    pub pair_dedup_ttl_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    #[serde(default = "default_private_key_env")]
    pub private_key_env: String,
    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,
    #[serde(default = "default_fallback_gas_price_wei")]
    pub fallback_gas_price_wei: u64,
    #[serde(default = "default_max_slippage_bps")]
    pub max_slippage_bps: u32,
    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Upper bound on the settlement wait; 0 waits forever.
    #[serde(default = "default_settlement_timeout_ms")]
    pub settlement_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default)]
    pub metrics_enabled: bool,
    #[serde(default = "default_metrics_bind")]
    pub metrics_bind: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl AppConfig {
    pub fn load(path: &str) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(
                config::Environment::with_prefix("SNIPER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(cfg.try_deserialize()?)
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            settlement_timeout_ms: default_settlement_timeout_ms(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_bind: default_metrics_bind(),
            log_level: default_log_level(),
        }
    }
}

fn default_pair_dedup_capacity() -> usize {
    4096
}

fn default_pair_dedup_ttl_ms() -> u64 {
    600_000
}

fn default_private_key_env() -> String {
    "SNIPER_PRIVATE_KEY".to_string()
}

fn default_gas_limit() -> u64 {
    300_000
}

fn default_fallback_gas_price_wei() -> u64 {
    1_000_000_000
}

fn default_max_slippage_bps() -> u32 {
    5_000
}

fn default_deadline_secs() -> u64 {
    1_200
}

fn default_settlement_timeout_ms() -> u64 {
    120_000
}

fn default_metrics_bind() -> String {
    "127.0.0.1:9100".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_defaults_apply_when_omitted() {
        let raw = r#"
            [chain]
            rpc_ws = "ws://localhost:8546"

            [dex]
            router = "0x10ED43C718714eb63d5aA57B78B54704E256024E"
            factory = "0xcA143Ce32Fe78f1f7019d7d551a6402fC5350c73"
            wrapped_native = "0xbb4CdB9CBd36B01bD1cBaEBF2De08d9173bc095c"

            [executor]
        "#;
        let cfg: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(cfg.chain.chain_id, None);
        assert_eq!(cfg.executor.gas_limit, 300_000);
        assert_eq!(cfg.executor.fallback_gas_price_wei, 1_000_000_000);
        assert_eq!(cfg.executor.max_slippage_bps, 5_000);
        assert_eq!(cfg.executor.deadline_secs, 1_200);
        assert_eq!(cfg.executor.private_key_env, "SNIPER_PRIVATE_KEY");
        assert_eq!(cfg.tracker.settlement_timeout_ms, 120_000);
        assert!(!cfg.observability.metrics_enabled);
        assert_eq!(cfg.observability.log_level, "info");
    }

    #[test]
    fn shipped_bsc_config_loads() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../config/bsc.toml");
        let cfg = AppConfig::load(path).unwrap();

        assert_eq!(cfg.chain.chain_id, Some(56));
        assert_eq!(
            cfg.dex.wrapped_native,
            "0xbb4CdB9CBd36B01bD1cBaEBF2De08d9173bc095c"
        );
        assert_eq!(cfg.executor.fallback_gas_price_wei, 1_000_000_000);
        assert_eq!(cfg.executor.gas_limit, 300_000);
        assert_eq!(cfg.tracker.settlement_timeout_ms, 120_000);
        crate::utils::parse_address(&cfg.dex.router).unwrap();
        crate::utils::parse_address(&cfg.dex.factory).unwrap();
        crate::utils::parse_address(&cfg.dex.wrapped_native).unwrap();
    }
}
