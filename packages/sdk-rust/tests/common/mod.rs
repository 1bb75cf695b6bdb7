//! Scripted in-memory capabilities shared by the integration tests.

#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU32, AtomicU64, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;
use raydium_buy_sdk::{
    instructions::{AMM_AUTHORITY_V4, OPENBOOK_PROGRAM_ID, WSOL_MINT},
    layout::{LayoutSchema, AMM_INFO_LAYOUT_V4, MARKET_STATE_LAYOUT_V3},
    Error, MemcmpFilter, PoolKeySet, PoolRegistry, Result, SignatureStatus, SwapRpc,
};
use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_sdk::{
    hash::Hash,
    pubkey::Pubkey,
    signature::Signature,
    transaction::VersionedTransaction,
};

pub fn transient(msg: &str) -> Error {
    Error::Rpc(ClientError::from(ClientErrorKind::Custom(msg.to_string())))
}

// ─── RPC stub ─────────────────────────────────────────────────────────────────

pub struct StubRpc {
    /// Result of every program-account scan.
    pub pools:           Vec<Pubkey>,
    /// Scans that fail with a transient error before scans start succeeding.
    pub scan_failures:   AtomicU32,
    /// Every scan hangs forever.
    pub scan_hangs:      bool,
    pub accounts:        HashMap<Pubkey, Vec<u8>>,
    pub token_accounts:  Vec<Pubkey>,
    /// Sends that fail with a transient error before sends start succeeding.
    pub send_failures:   AtomicU32,
    pub status:          Mutex<SignatureStatus>,
    /// Added to the block height on every read.
    pub height_step:     u64,

    pub height:          AtomicU64,
    pub blockhash_calls: AtomicU32,
    pub scans:           Mutex<Vec<MemcmpFilter>>,
    pub sent:            Mutex<Vec<VersionedTransaction>>,
}

impl Default for StubRpc {
    fn default() -> Self {
        Self {
            pools:           Vec::new(),
            scan_failures:   AtomicU32::new(0),
            scan_hangs:      false,
            accounts:        HashMap::new(),
            token_accounts:  Vec::new(),
            send_failures:   AtomicU32::new(0),
            status:          Mutex::new(SignatureStatus::Confirmed),
            height_step:     1,
            height:          AtomicU64::new(100),
            blockhash_calls: AtomicU32::new(0),
            scans:           Mutex::new(Vec::new()),
            sent:            Mutex::new(Vec::new()),
        }
    }
}

impl StubRpc {
    pub fn set_status(&self, status: SignatureStatus) {
        *self.status.lock().unwrap() = status;
    }

    pub fn blockhash_calls(&self) -> u32 {
        self.blockhash_calls.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<VersionedTransaction> {
        self.sent.lock().unwrap().clone()
    }

    pub fn scans(&self) -> Vec<MemcmpFilter> {
        self.scans.lock().unwrap().clone()
    }
}

#[async_trait]
impl SwapRpc for StubRpc {
    async fn latest_blockhash(&self) -> Result<Hash> {
        self.blockhash_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Hash::new_unique())
    }

    async fn block_height(&self) -> Result<u64> {
        Ok(self.height.fetch_add(self.height_step, Ordering::SeqCst))
    }

    async fn scan_program_accounts(
        &self,
        _program_id: &Pubkey,
        filter:      MemcmpFilter,
    ) -> Result<Vec<Pubkey>> {
        self.scans.lock().unwrap().push(filter);
        if self.scan_hangs {
            std::future::pending::<()>().await;
        }
        let failing = self
            .scan_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(transient("getProgramAccounts timed out"));
        }
        Ok(self.pools.clone())
    }

    async fn account_data(&self, address: &Pubkey) -> Result<Vec<u8>> {
        self.accounts
            .get(address)
            .cloned()
            .ok_or_else(|| transient("account not found"))
    }

    async fn token_accounts_by_owner(&self, _owner: &Pubkey, _mint: &Pubkey) -> Result<Vec<Pubkey>> {
        Ok(self.token_accounts.clone())
    }

    async fn send_transaction(
        &self,
        tx:              &VersionedTransaction,
        _skip_preflight: bool,
    ) -> Result<Signature> {
        self.sent.lock().unwrap().push(tx.clone());
        let failing = self
            .send_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(transient("node is behind"));
        }
        Ok(tx.signatures[0])
    }

    async fn signature_status(&self, _signature: &Signature) -> Result<SignatureStatus> {
        Ok(self.status.lock().unwrap().clone())
    }
}

// ─── Registry stub ────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct StubRegistry {
    pub keys:    Option<PoolKeySet>,
    pub lookups: AtomicU32,
}

impl StubRegistry {
    pub fn lookups(&self) -> u32 {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PoolRegistry for StubRegistry {
    async fn lookup(&self, mint: &Pubkey) -> Result<PoolKeySet> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.keys.clone().ok_or(Error::PoolNotFound(*mint))
    }
}

// ─── Account fixtures ─────────────────────────────────────────────────────────

fn put(buf: &mut [u8], schema: &LayoutSchema, field: &str, bytes: &[u8]) {
    let offset = schema.offset_of(field).unwrap();
    buf[offset..offset + bytes.len()].copy_from_slice(bytes);
}

/// AMM id, market id, and the two account blobs of a consistent pool.
pub struct PoolFixture {
    pub amm_id:      Pubkey,
    pub market_id:   Pubkey,
    pub mint:        Pubkey,
    pub nonce:       u64,
    pub amm_data:    Vec<u8>,
    pub market_data: Vec<u8>,
}

impl PoolFixture {
    /// Pool pairing `mint` (base) with wrapped SOL (quote).
    pub fn new(mint: Pubkey) -> Self {
        let amm_id = Pubkey::new_unique();

        // Markets are created with a nonce whose derived signer is off-curve.
        let (market_id, nonce) = loop {
            let candidate = Pubkey::new_unique();
            let found = (0u64..256).find(|n| {
                Pubkey::create_program_address(&[candidate.as_ref(), &n.to_le_bytes()], &OPENBOOK_PROGRAM_ID)
                    .is_ok()
            });
            if let Some(n) = found {
                break (candidate, n);
            }
        };

        let amm_schema = &AMM_INFO_LAYOUT_V4;
        let mut amm_data = vec![0u8; amm_schema.total_width()];
        put(&mut amm_data, amm_schema, "coinDecimals", &6u64.to_le_bytes());
        put(&mut amm_data, amm_schema, "pcDecimals", &9u64.to_le_bytes());
        put(&mut amm_data, amm_schema, "coinMintAddress", mint.as_ref());
        put(&mut amm_data, amm_schema, "pcMintAddress", WSOL_MINT.as_ref());
        put(&mut amm_data, amm_schema, "serumMarket", market_id.as_ref());
        put(&mut amm_data, amm_schema, "serumProgramId", OPENBOOK_PROGRAM_ID.as_ref());
        for field in [
            "poolCoinTokenAccount",
            "poolPcTokenAccount",
            "lpMintAddress",
            "ammOpenOrders",
            "ammTargetOrders",
        ] {
            put(&mut amm_data, amm_schema, field, Pubkey::new_unique().as_ref());
        }

        let mkt_schema = &MARKET_STATE_LAYOUT_V3;
        let mut market_data = vec![0u8; mkt_schema.total_width()];
        put(&mut market_data, mkt_schema, "ownAddress", market_id.as_ref());
        put(&mut market_data, mkt_schema, "vaultSignerNonce", &nonce.to_le_bytes());
        put(&mut market_data, mkt_schema, "baseMint", mint.as_ref());
        put(&mut market_data, mkt_schema, "quoteMint", WSOL_MINT.as_ref());
        for field in ["baseVault", "quoteVault", "bids", "asks", "eventQueue"] {
            put(&mut market_data, mkt_schema, field, Pubkey::new_unique().as_ref());
        }

        Self { amm_id, market_id, mint, nonce, amm_data, market_data }
    }

    /// RPC stub that finds this pool on-chain and serves both accounts.
    pub fn rpc(&self) -> StubRpc {
        let mut rpc = StubRpc { pools: vec![self.amm_id], ..Default::default() };
        rpc.accounts.insert(self.amm_id, self.amm_data.clone());
        rpc.accounts.insert(self.market_id, self.market_data.clone());
        rpc
    }
}

/// Key set as a registry would publish it, for a pool that is not on-chain.
pub fn registry_keys(mint: Pubkey) -> PoolKeySet {
    PoolKeySet {
        amm_id:             Pubkey::new_unique(),
        authority:          AMM_AUTHORITY_V4,
        base_mint:          mint,
        base_decimals:      6,
        quote_mint:         WSOL_MINT,
        quote_decimals:     9,
        lp_mint:            Pubkey::new_unique(),
        open_orders:        Pubkey::new_unique(),
        target_orders:      Pubkey::new_unique(),
        base_vault:         Pubkey::new_unique(),
        quote_vault:        Pubkey::new_unique(),
        market_program_id:  OPENBOOK_PROGRAM_ID,
        market_id:          Pubkey::new_unique(),
        market_base_vault:  Pubkey::new_unique(),
        market_quote_vault: Pubkey::new_unique(),
        market_authority:   Pubkey::new_unique(),
        bids:               Pubkey::new_unique(),
        asks:               Pubkey::new_unique(),
        event_queue:        Pubkey::new_unique(),
    }
}
