//! Tunables for [`SwapClient`](crate::SwapClient).

use std::time::Duration;

use serde::Deserialize;
use solana_sdk::pubkey::Pubkey;

// ─── Defaults ─────────────────────────────────────────────────────────────────

/// Priority fee, micro-lamports per compute unit.
pub const DEFAULT_COMPUTE_UNIT_PRICE: u64 = 498_750;
pub const DEFAULT_COMPUTE_UNIT_LIMIT: u32 = 4_000_000;
/// Retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(3);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
/// Blocks past the submission height before confirmation is abandoned.
pub const DEFAULT_CONFIRM_BLOCK_BUDGET: u64 = 50;
pub const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_RESOLVE_TIMEOUT: Duration = Duration::from_secs(3);
/// Pause between failed RPC calls inside a deadline-bounded fetch.
pub const DEFAULT_INNER_RETRY_PAUSE: Duration = Duration::from_millis(100);

// ─── Config ───────────────────────────────────────────────────────────────────

/// Durations are written in milliseconds when deserialized.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SwapConfig {
    pub compute_unit_price:   u64,
    pub compute_unit_limit:   u32,
    pub max_retries:          u32,
    #[serde(with = "millis")]
    pub retry_delay:          Duration,
    #[serde(with = "millis")]
    pub poll_interval:        Duration,
    pub confirm_block_budget: u64,
    #[serde(with = "millis")]
    pub discovery_timeout:    Duration,
    #[serde(with = "millis")]
    pub resolve_timeout:      Duration,
    #[serde(with = "millis")]
    pub inner_retry_pause:    Duration,
    /// Pre-funded wrapped-SOL account to spend from.  When unset the payer's
    /// WSOL associated token account is used.
    #[serde(with = "opt_pubkey")]
    pub wsol_account:         Option<Pubkey>,
}

impl Default for SwapConfig {
    fn default() -> Self {
        Self {
            compute_unit_price:   DEFAULT_COMPUTE_UNIT_PRICE,
            compute_unit_limit:   DEFAULT_COMPUTE_UNIT_LIMIT,
            max_retries:          DEFAULT_MAX_RETRIES,
            retry_delay:          DEFAULT_RETRY_DELAY,
            poll_interval:        DEFAULT_POLL_INTERVAL,
            confirm_block_budget: DEFAULT_CONFIRM_BLOCK_BUDGET,
            discovery_timeout:    DEFAULT_DISCOVERY_TIMEOUT,
            resolve_timeout:      DEFAULT_RESOLVE_TIMEOUT,
            inner_retry_pause:    DEFAULT_INNER_RETRY_PAUSE,
            wsol_account:         None,
        }
    }
}

impl SwapConfig {
    pub fn with_wsol_account(mut self, account: Pubkey) -> Self {
        self.wsol_account = Some(account);
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_priority_fee(mut self, unit_price: u64, unit_limit: u32) -> Self {
        self.compute_unit_price = unit_price;
        self.compute_unit_limit = unit_limit;
        self
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

mod opt_pubkey {
    use std::str::FromStr;

    use serde::{de::Error, Deserialize, Deserializer};
    use solana_sdk::pubkey::Pubkey;

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Pubkey>, D::Error> {
        Option::<String>::deserialize(d)?
            .map(|s| Pubkey::from_str(&s).map_err(D::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn partial_config_keeps_defaults() {
        let wsol = Pubkey::new_unique();
        let cfg: SwapConfig = serde_json::from_value(json!({
            "max_retries": 4,
            "retry_delay": 1500,
            "wsol_account": wsol.to_string(),
        }))
        .unwrap();
        assert_eq!(cfg.max_retries, 4);
        assert_eq!(cfg.retry_delay, Duration::from_millis(1500));
        assert_eq!(cfg.wsol_account, Some(wsol));
        assert_eq!(cfg.compute_unit_price, DEFAULT_COMPUTE_UNIT_PRICE);
        assert_eq!(cfg.poll_interval, Duration::from_millis(500));
        assert_eq!(cfg.confirm_block_budget, 50);
    }

    #[test]
    fn invalid_wsol_account_is_rejected() {
        let res: Result<SwapConfig, _> = serde_json::from_value(json!({ "wsol_account": "xyz" }));
        assert!(res.is_err());
    }
}
