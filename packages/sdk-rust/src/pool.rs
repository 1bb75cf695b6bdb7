//! Locate a Raydium v4 pool for a mint and assemble its [`PoolKeySet`].
//!
//! Two paths:
//! - [`find_pool_by_mint`] scans the AMM program with a memcmp filter on the
//!   embedded mint and returns the first matching pool address.
//! - [`resolve_pool`] decodes a known AMM account, follows it to its
//!   order-book market, and builds the full key set from both accounts.

use std::time::Duration;

use solana_sdk::pubkey::Pubkey;

use crate::{
    error::{Error, Result},
    instructions::{AMM_AUTHORITY_V4, AMM_PROGRAM_ID},
    layout::{DecodedRecord, AMM_INFO_LAYOUT_V4, MARKET_STATE_LAYOUT_V3},
    retry::retry_until_deadline,
    rpc::{MemcmpFilter, SwapRpc},
    types::PoolKeySet,
};

// ─── Launch kind ──────────────────────────────────────────────────────────────

/// Mint-address suffix used by the pump.fun launchpad.
pub const MIGRATED_MINT_SUFFIX: &str = "pump";

/// How the pool for a mint was created, which decides where the mint sits
/// inside the AMM account.
///
/// Pools migrated from the launchpad put the token on the quote side
/// (`pcMintAddress`); everything else is matched on the base side
/// (`coinMintAddress`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchKind {
    StandardLaunch,
    MigratedLaunch,
}

impl LaunchKind {
    pub fn from_mint(mint: &Pubkey) -> Self {
        if mint.to_string().ends_with(MIGRATED_MINT_SUFFIX) {
            Self::MigratedLaunch
        } else {
            Self::StandardLaunch
        }
    }

    /// AMM layout field holding the mint for this launch kind.
    pub fn mint_field(self) -> &'static str {
        match self {
            Self::StandardLaunch => "coinMintAddress",
            Self::MigratedLaunch => "pcMintAddress",
        }
    }

    /// Byte offset of [`mint_field`](Self::mint_field) in the AMM account.
    ///
    /// # Panics
    ///
    /// If [`AMM_INFO_LAYOUT_V4`] no longer has the field.  Both names are
    /// part of the static schema, so this only fires on a broken layout.
    pub fn mint_offset(self) -> usize {
        AMM_INFO_LAYOUT_V4
            .offset_of(self.mint_field())
            .expect("mint field missing from AMM layout")
    }
}

// ─── Discovery ────────────────────────────────────────────────────────────────

/// Memcmp filter matching AMM accounts that embed `mint`.
pub fn mint_filter(mint: &Pubkey) -> MemcmpFilter {
    MemcmpFilter {
        offset: LaunchKind::from_mint(mint).mint_offset(),
        bytes:  mint.to_bytes().to_vec(),
    }
}

/// Find the AMM account for `mint` with a filtered program-account scan.
///
/// Failed scans are retried until `budget` runs out, after which the pool
/// is reported as not found.  This never returns an error.
pub async fn find_pool_by_mint(
    rpc:    &dyn SwapRpc,
    mint:   &Pubkey,
    budget: Duration,
    pause:  Duration,
) -> Option<Pubkey> {
    let kind   = LaunchKind::from_mint(mint);
    let filter = mint_filter(mint);
    tracing::debug!(%mint, ?kind, offset = filter.offset, "scanning AMM program");

    let found = retry_until_deadline("scanning AMM accounts by mint", budget, pause, || {
        rpc.scan_program_accounts(&AMM_PROGRAM_ID, filter.clone())
    })
    .await;

    match found {
        Ok(pools) => pools.into_iter().next(),
        Err(err) => {
            tracing::warn!(%mint, error = %err, "pool discovery gave up");
            None
        }
    }
}

// ─── Direct resolution ────────────────────────────────────────────────────────

/// Derive the order-book vault signer for `market`.
///
/// Seeds: `market address ‖ vault_signer_nonce as u64 LE`, under the
/// market's own program.
pub fn derive_market_authority(
    market:            &Pubkey,
    vault_signer_nonce: u64,
    market_program_id: &Pubkey,
) -> Result<Pubkey> {
    Ok(Pubkey::create_program_address(
        &[market.as_ref(), &vault_signer_nonce.to_le_bytes()],
        market_program_id,
    )?)
}

/// Fetch and decode the AMM account and its market into a [`PoolKeySet`].
///
/// Each fetch has its own `budget`.  A timeout, a missing account or a
/// malformed blob all come back as an `Err`; no partial key set is
/// returned.
pub async fn resolve_pool(
    rpc:    &dyn SwapRpc,
    amm_id: &Pubkey,
    budget: Duration,
    pause:  Duration,
) -> Result<PoolKeySet> {
    let amm_data = retry_until_deadline("fetching AMM account", budget, pause, || {
        rpc.account_data(amm_id)
    })
    .await?;
    let amm = AMM_INFO_LAYOUT_V4.decode(&amm_data)?;

    let market_program_id = amm.pubkey("serumProgramId")?;
    let market_id         = amm.pubkey("serumMarket")?;
    tracing::debug!(amm = %amm_id, market = %market_id, "resolved market from AMM");

    let market_data = retry_until_deadline("fetching market account", budget, pause, || {
        rpc.account_data(&market_id)
    })
    .await?;
    let market = MARKET_STATE_LAYOUT_V3.decode(&market_data)?;

    pool_keys_from_accounts(*amm_id, &amm, market_id, &market, market_program_id)
}

/// Assemble a key set from already-decoded AMM and market records.
///
/// Every market-side address comes from the single `market` record.
pub fn pool_keys_from_accounts(
    amm_id:            Pubkey,
    amm:               &DecodedRecord<'_>,
    market_id:         Pubkey,
    market:            &DecodedRecord<'_>,
    market_program_id: Pubkey,
) -> Result<PoolKeySet> {
    let own_address = market.pubkey("ownAddress")?;
    if own_address != market_id {
        return Err(Error::MarketMismatch { expected: market_id, found: own_address });
    }

    let market_authority = derive_market_authority(
        &market_id,
        market.u64("vaultSignerNonce")?,
        &market_program_id,
    )?;

    Ok(PoolKeySet {
        amm_id,
        authority:          AMM_AUTHORITY_V4,
        base_mint:          market.pubkey("baseMint")?,
        base_decimals:      amm.u8("coinDecimals")?,
        quote_mint:         market.pubkey("quoteMint")?,
        quote_decimals:     amm.u8("pcDecimals")?,
        lp_mint:            amm.pubkey("lpMintAddress")?,
        open_orders:        amm.pubkey("ammOpenOrders")?,
        target_orders:      amm.pubkey("ammTargetOrders")?,
        base_vault:         amm.pubkey("poolCoinTokenAccount")?,
        quote_vault:        amm.pubkey("poolPcTokenAccount")?,
        market_program_id,
        market_id,
        market_base_vault:  market.pubkey("baseVault")?,
        market_quote_vault: market.pubkey("quoteVault")?,
        market_authority,
        bids:               market.pubkey("bids")?,
        asks:               market.pubkey("asks")?,
        event_queue:        market.pubkey("eventQueue")?,
    })
}
