//! [`SwapClient`]: the main entry point for buying through a Raydium v4 pool.

use std::sync::Arc;

use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    instruction::Instruction,
    message::{v0, VersionedMessage},
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::VersionedTransaction,
};
use tokio::time::sleep;

use crate::{
    config::SwapConfig,
    error::{Error, Result},
    instructions::{compute_budget_ixs, derive_ata, swap_base_in_ix, WSOL_MINT},
    pool::{find_pool_by_mint, resolve_pool},
    registry::{HttpPoolRegistry, PoolRegistry},
    rpc::SwapRpc,
    token_account::resolve_or_create,
    types::{
        AttemptState, BuyParams, BuyReport, PoolKeySet, SignatureStatus, TransactionAttempt,
    },
};

// ─── Client ───────────────────────────────────────────────────────────────────

/// Async Raydium v4 buy client.
///
/// ```rust,no_run
/// # use raydium_buy_sdk::{BuyParams, SwapClient};
/// # use solana_sdk::{pubkey::Pubkey, signature::Keypair};
/// # use std::str::FromStr;
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = SwapClient::from_rpc_url("https://api.mainnet-beta.solana.com");
/// let payer  = Keypair::new();
/// let mint   = Pubkey::from_str("DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263")?;
/// let report = client.try_buy(&payer, BuyParams { mint, amount_in: 10_000_000 }).await?;
/// println!("bought in {} attempt(s): {}", report.attempts, report.signature);
/// # Ok(())
/// # }
/// ```
pub struct SwapClient {
    rpc:      Arc<dyn SwapRpc>,
    registry: Arc<dyn PoolRegistry>,
    config:   SwapConfig,
}

impl SwapClient {
    /// Build a client from explicit capabilities.
    pub fn new(rpc: Arc<dyn SwapRpc>, registry: Arc<dyn PoolRegistry>) -> Self {
        Self { rpc, registry, config: SwapConfig::default() }
    }

    /// Client on a JSON-RPC endpoint at confirmed commitment, with the
    /// default HTTP registry and cache file.
    pub fn from_rpc_url(rpc_url: impl Into<String>) -> Self {
        let rpc = RpcClient::new_with_commitment(rpc_url.into(), CommitmentConfig::confirmed());
        Self::new(Arc::new(rpc), Arc::new(HttpPoolRegistry::default()))
    }

    pub fn with_config(mut self, config: SwapConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_registry(mut self, registry: Arc<dyn PoolRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn config(&self) -> &SwapConfig {
        &self.config
    }

    // ── Read operations ───────────────────────────────────────────────────────

    /// Resolve the full key set of the pool trading `mint`.
    ///
    /// The AMM program is scanned first; only when the scan finds nothing is
    /// the registry consulted.  A pool found on-chain that then fails to
    /// resolve is an error, not a registry fallback.
    pub async fn pool_keys(&self, mint: &Pubkey) -> Result<PoolKeySet> {
        let cfg = &self.config;
        let found = find_pool_by_mint(
            self.rpc.as_ref(),
            mint,
            cfg.discovery_timeout,
            cfg.inner_retry_pause,
        )
        .await;

        let keys = match found {
            Some(amm_id) => {
                tracing::info!(%mint, amm = %amm_id, "pool found on-chain");
                resolve_pool(self.rpc.as_ref(), &amm_id, cfg.resolve_timeout, cfg.inner_retry_pause)
                    .await?
            }
            None => {
                tracing::info!(%mint, "no pool on-chain, trying registry");
                self.registry.lookup(mint).await?
            }
        };

        if keys.counter_mint(mint) != Some(WSOL_MINT) {
            tracing::warn!(%mint, amm = %keys.amm_id, "pool does not pair the mint with wrapped SOL");
        }
        Ok(keys)
    }

    // ── Write operations ──────────────────────────────────────────────────────

    /// Buy `params.mint` with `params.amount_in` lamports of wrapped SOL.
    ///
    /// Returns `true` once the swap is confirmed.  Every failure is logged
    /// with its cause and reported as `false`; use [`try_buy`](Self::try_buy)
    /// to get the error itself.
    pub async fn buy(&self, payer: &Keypair, params: BuyParams) -> bool {
        match self.try_buy(payer, params).await {
            Ok(report) => {
                tracing::info!(
                    signature = %report.signature,
                    amm       = %report.amm_id,
                    attempts  = report.attempts,
                    "buy confirmed"
                );
                true
            }
            Err(err) => {
                tracing::error!(mint = %params.mint, error = %err, "buy failed");
                false
            }
        }
    }

    /// Buy and return either the confirmation report or the error that
    /// ended the call.
    ///
    /// Up to `1 + max_retries` attempts are made.  Each attempt rebuilds
    /// the transaction from scratch with a fresh blockhash.  An on-chain
    /// failure or a non-transient error stops immediately.
    pub async fn try_buy(&self, payer: &Keypair, params: BuyParams) -> Result<BuyReport> {
        if params.amount_in == 0 {
            return Err(Error::InvalidArgument("amount_in must be greater than zero".into()));
        }

        let total = self.config.max_retries.saturating_add(1);
        let mut number = 0u32;
        loop {
            number += 1;
            let err = match self.run_attempt(payer, &params, number).await {
                Ok(report) => return Ok(report),
                Err(err) => err,
            };

            if !err.is_retryable() {
                return Err(err);
            }
            if number >= total {
                return Err(Error::RetriesExhausted { attempts: number, last: Box::new(err) });
            }
            tracing::warn!(
                attempt = number,
                of      = total,
                error   = %err,
                delay   = ?self.config.retry_delay,
                "attempt failed, retrying"
            );
            sleep(self.config.retry_delay).await;
        }
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    async fn run_attempt(
        &self,
        payer:  &Keypair,
        params: &BuyParams,
        number: u32,
    ) -> Result<BuyReport> {
        tracing::info!(attempt = number, mint = %params.mint, "building transaction");
        let owner = payer.pubkey();

        let keys = self.pool_keys(&params.mint).await?;
        let (token_account, create_ix) =
            resolve_or_create(self.rpc.as_ref(), &owner, &params.mint).await;
        let created_token_account = create_ix.is_some();

        let source = self.config.wsol_account.unwrap_or_else(|| derive_ata(&owner, &WSOL_MINT));
        let instructions = self.assemble(
            create_ix,
            params.amount_in,
            &source,
            &token_account,
            &keys,
            &owner,
        );

        let blockhash = self.rpc.latest_blockhash().await?;
        let mut attempt = TransactionAttempt::new(number, blockhash, instructions);

        let outcome = self.submit_and_confirm(payer, &mut attempt).await;
        let finished = match &outcome {
            Ok(_)                                  => AttemptState::Confirmed,
            Err(Error::ConfirmationTimeout { .. }) => AttemptState::TimedOut,
            Err(_)                                 => AttemptState::Failed,
        };
        attempt.advance(finished);

        Ok(BuyReport {
            signature: outcome?,
            amm_id:    keys.amm_id,
            amount_in: params.amount_in,
            token_account,
            created_token_account,
            attempts:  number,
        })
    }

    /// `[create ATA?], swap, compute price, compute limit`.
    fn assemble(
        &self,
        create_ix:     Option<Instruction>,
        amount_in:     u64,
        source:        &Pubkey,
        destination:   &Pubkey,
        keys:          &PoolKeySet,
        owner:         &Pubkey,
    ) -> Vec<Instruction> {
        let mut ixs: Vec<Instruction> = create_ix.into_iter().collect();
        ixs.push(swap_base_in_ix(amount_in, source, destination, keys, owner));
        ixs.extend(compute_budget_ixs(self.config.compute_unit_price, self.config.compute_unit_limit));
        ixs
    }

    async fn submit_and_confirm(
        &self,
        payer:   &Keypair,
        attempt: &mut TransactionAttempt,
    ) -> Result<Signature> {
        let message = v0::Message::try_compile(
            &payer.pubkey(),
            &attempt.instructions,
            &[],
            attempt.blockhash,
        )?;
        let tx = VersionedTransaction::try_new(VersionedMessage::V0(message), &[payer])?;

        let signature = self.rpc.send_transaction(&tx, true).await?;
        attempt.signature = Some(signature);
        attempt.advance(AttemptState::Submitted);
        tracing::info!(attempt = attempt.number, %signature, "transaction sent");

        attempt.advance(AttemptState::Confirming);
        self.confirm(&signature).await?;
        Ok(signature)
    }

    /// Poll until `signature` lands, fails, or the chain moves past the
    /// block-height budget.
    ///
    /// A failed status poll is logged and retried on the next tick; the
    /// block-height bound still applies.
    async fn confirm(&self, signature: &Signature) -> Result<()> {
        let start = self.rpc.block_height().await?;
        let last_valid_block_height = start.saturating_add(self.config.confirm_block_budget);

        loop {
            match self.rpc.signature_status(signature).await {
                Ok(SignatureStatus::Confirmed) => return Ok(()),
                Ok(SignatureStatus::Failed(reason)) => {
                    return Err(Error::OnChain { signature: *signature, reason });
                }
                Ok(SignatureStatus::Pending) => {}
                Err(err) => tracing::debug!(%signature, error = %err, "status poll failed"),
            }

            let height = self.rpc.block_height().await?;
            if height > last_valid_block_height {
                return Err(Error::ConfirmationTimeout { signature: *signature, last_valid_block_height });
            }
            sleep(self.config.poll_interval).await;
        }
    }
}
