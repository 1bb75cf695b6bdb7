//! Off-chain pool registry fallback.
//!
//! When the on-chain scan finds nothing, the pool is looked up in Raydium's
//! published liquidity list (`{"official": [...], "unOfficial": [...]}`).
//! The response body is cached verbatim on disk and read through on later
//! lookups; a cache that is missing, unreadable or lacks the mint triggers
//! one fresh download.

use std::{
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use async_trait::async_trait;
use serde::Deserialize;
use solana_sdk::pubkey::Pubkey;

use crate::{
    error::{Error, Result},
    instructions::WSOL_MINT,
    types::PoolKeySet,
};

/// Raydium v2 SDK liquidity list.
pub const DEFAULT_REGISTRY_URL: &str = "https://api.raydium.io/v2/sdk/liquidity/mainnet.json";
/// Where the downloaded list is kept between runs.
pub const DEFAULT_CACHE_PATH: &str = "all_pools.json";
/// Budget for one download of the list, from connect to last body byte.
pub const DEFAULT_REGISTRY_TIMEOUT: Duration = Duration::from_secs(30);

// ─── Snapshot format ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrySnapshot {
    #[serde(default)]
    pub official:    Vec<RegistryPool>,
    #[serde(default)]
    pub un_official: Vec<RegistryPool>,
}

impl RegistrySnapshot {
    pub fn pools(&self) -> impl Iterator<Item = &RegistryPool> {
        self.official.iter().chain(self.un_official.iter())
    }
}

/// One pool descriptor as published by the registry.  Addresses stay
/// strings until a matching entry is converted.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryPool {
    pub id:                 String,
    pub base_mint:          String,
    pub quote_mint:         String,
    pub lp_mint:            String,
    pub base_decimals:      u8,
    pub quote_decimals:     u8,
    pub authority:          String,
    pub open_orders:        String,
    pub target_orders:      String,
    pub base_vault:         String,
    pub quote_vault:        String,
    pub market_program_id:  String,
    pub market_id:          String,
    pub market_authority:   String,
    pub market_base_vault:  String,
    pub market_quote_vault: String,
    pub market_bids:        String,
    pub market_asks:        String,
    pub market_event_queue: String,
}

impl RegistryPool {
    /// Whether this pool pairs `mint` with `counter`, in either order.
    pub fn pairs(&self, mint: &str, counter: &str) -> bool {
        (self.base_mint == mint && self.quote_mint == counter)
            || (self.quote_mint == mint && self.base_mint == counter)
    }

    pub fn to_pool_keys(&self) -> Result<PoolKeySet> {
        Ok(PoolKeySet {
            amm_id:             parse_key("id", &self.id)?,
            authority:          parse_key("authority", &self.authority)?,
            base_mint:          parse_key("baseMint", &self.base_mint)?,
            base_decimals:      self.base_decimals,
            quote_mint:         parse_key("quoteMint", &self.quote_mint)?,
            quote_decimals:     self.quote_decimals,
            lp_mint:            parse_key("lpMint", &self.lp_mint)?,
            open_orders:        parse_key("openOrders", &self.open_orders)?,
            target_orders:      parse_key("targetOrders", &self.target_orders)?,
            base_vault:         parse_key("baseVault", &self.base_vault)?,
            quote_vault:        parse_key("quoteVault", &self.quote_vault)?,
            market_program_id:  parse_key("marketProgramId", &self.market_program_id)?,
            market_id:          parse_key("marketId", &self.market_id)?,
            market_base_vault:  parse_key("marketBaseVault", &self.market_base_vault)?,
            market_quote_vault: parse_key("marketQuoteVault", &self.market_quote_vault)?,
            market_authority:   parse_key("marketAuthority", &self.market_authority)?,
            bids:               parse_key("marketBids", &self.market_bids)?,
            asks:               parse_key("marketAsks", &self.market_asks)?,
            event_queue:        parse_key("marketEventQueue", &self.market_event_queue)?,
        })
    }
}

fn parse_key(field: &'static str, value: &str) -> Result<Pubkey> {
    Pubkey::from_str(value)
        .map_err(|_| Error::InvalidRegistryEntry { field, value: value.to_string() })
}

/// First pool pairing `mint` with wrapped SOL.
pub fn find_registry_entry<'a>(
    snapshot: &'a RegistrySnapshot,
    mint:     &Pubkey,
) -> Result<&'a RegistryPool> {
    let mint_str = mint.to_string();
    let wsol     = WSOL_MINT.to_string();
    snapshot
        .pools()
        .find(|p| p.pairs(&mint_str, &wsol))
        .ok_or(Error::PoolNotFound(*mint))
}

// ─── Registry capability ──────────────────────────────────────────────────────

/// Fallback source of pool keys, consulted when the on-chain scan is empty.
#[async_trait]
pub trait PoolRegistry: Send + Sync {
    async fn lookup(&self, mint: &Pubkey) -> Result<PoolKeySet>;
}

/// Registry backed by the Raydium HTTP list and an on-disk cache.
pub struct HttpPoolRegistry {
    url:        String,
    cache_path: PathBuf,
    timeout:    Duration,
    http:       reqwest::Client,
}

impl HttpPoolRegistry {
    pub fn new(url: impl Into<String>, cache_path: impl Into<PathBuf>) -> Self {
        Self {
            url:        url.into(),
            cache_path: cache_path.into(),
            timeout:    DEFAULT_REGISTRY_TIMEOUT,
            http:       reqwest::Client::new(),
        }
    }

    /// Bound each download to `timeout`; a server that stalls past it
    /// yields [`Error::Deadline`].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    async fn read_cache(&self) -> Result<RegistrySnapshot> {
        let raw = tokio::fs::read(&self.cache_path).await?;
        Ok(serde_json::from_slice(&raw)?)
    }

    async fn fetch_body(&self) -> Result<Vec<u8>> {
        let body = self
            .http
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(body.to_vec())
    }

    async fn download(&self) -> Result<RegistrySnapshot> {
        tracing::info!(url = %self.url, "downloading pool registry");
        let body = tokio::time::timeout(self.timeout, self.fetch_body())
            .await
            .map_err(|_| Error::Deadline { what: "downloading pool registry", budget: self.timeout })??;
        let snapshot = serde_json::from_slice(&body)?;
        tokio::fs::write(&self.cache_path, &body).await?;
        tracing::debug!(path = %self.cache_path.display(), bytes = body.len(), "cached pool registry");
        Ok(snapshot)
    }
}

impl Default for HttpPoolRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_REGISTRY_URL, DEFAULT_CACHE_PATH)
    }
}

#[async_trait]
impl PoolRegistry for HttpPoolRegistry {
    async fn lookup(&self, mint: &Pubkey) -> Result<PoolKeySet> {
        match self.read_cache().await {
            Ok(cached) => match find_registry_entry(&cached, mint) {
                Ok(entry) => return entry.to_pool_keys(),
                Err(_) => tracing::debug!(%mint, "mint not in cached registry"),
            },
            Err(err) => tracing::debug!(error = %err, "pool registry cache unavailable"),
        }

        let fresh = self.download().await?;
        find_registry_entry(&fresh, mint)?.to_pool_keys()
    }
}
