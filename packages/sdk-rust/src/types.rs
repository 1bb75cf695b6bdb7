//! Plain data types shared across the SDK.

use solana_sdk::{hash::Hash, instruction::Instruction, pubkey::Pubkey, signature::Signature};

// ─── Pool keys ────────────────────────────────────────────────────────────────

/// Every address the Raydium v4 `swapBaseIn` instruction needs, plus mint
/// decimals.
///
/// Built in one step from a decoded AMM + market pair or from a registry
/// entry; there is no way to construct a partially filled set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolKeySet {
    pub amm_id:             Pubkey,
    pub authority:          Pubkey,
    pub base_mint:          Pubkey,
    pub base_decimals:      u8,
    pub quote_mint:         Pubkey,
    pub quote_decimals:     u8,
    pub lp_mint:            Pubkey,
    pub open_orders:        Pubkey,
    pub target_orders:      Pubkey,
    pub base_vault:         Pubkey,
    pub quote_vault:        Pubkey,
    pub market_program_id:  Pubkey,
    pub market_id:          Pubkey,
    pub market_base_vault:  Pubkey,
    pub market_quote_vault: Pubkey,
    pub market_authority:   Pubkey,
    pub bids:               Pubkey,
    pub asks:               Pubkey,
    pub event_queue:        Pubkey,
}

impl PoolKeySet {
    /// The mint on the other side of `mint` in this pool, if `mint` is one
    /// of the pool's two mints.
    pub fn counter_mint(&self, mint: &Pubkey) -> Option<Pubkey> {
        if *mint == self.base_mint {
            Some(self.quote_mint)
        } else if *mint == self.quote_mint {
            Some(self.base_mint)
        } else {
            None
        }
    }
}

// ─── Buy ──────────────────────────────────────────────────────────────────────

/// Parameters for [`SwapClient::buy`](crate::SwapClient::buy).
#[derive(Debug, Clone, Copy)]
pub struct BuyParams {
    /// Token to buy.
    pub mint:      Pubkey,
    /// Lamports of wrapped SOL to spend.
    pub amount_in: u64,
}

/// Result of a confirmed buy.
#[derive(Debug, Clone)]
pub struct BuyReport {
    pub signature:             Signature,
    pub amm_id:                Pubkey,
    pub amount_in:             u64,
    /// Destination token account that received the output.
    pub token_account:         Pubkey,
    /// Whether the destination account was created by this transaction.
    pub created_token_account: bool,
    /// Number of Building phases it took, `1` when the first one landed.
    pub attempts:              u32,
}

// ─── Attempt lifecycle ────────────────────────────────────────────────────────

/// Where a single submission attempt currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    Building,
    Submitted,
    Confirming,
    Confirmed,
    Failed,
    TimedOut,
}

impl AttemptState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Confirmed | Self::Failed | Self::TimedOut)
    }
}

/// One pass through Building → Submitted → Confirming.
///
/// A retry creates a new attempt with its own blockhash; attempts are never
/// reused.
#[derive(Debug)]
pub struct TransactionAttempt {
    pub number:       u32,
    pub blockhash:    Hash,
    pub instructions: Vec<Instruction>,
    pub signature:    Option<Signature>,
    pub state:        AttemptState,
}

impl TransactionAttempt {
    pub fn new(number: u32, blockhash: Hash, instructions: Vec<Instruction>) -> Self {
        Self { number, blockhash, instructions, signature: None, state: AttemptState::Building }
    }

    /// Move to `next`, logging the transition.
    ///
    /// A terminal state is final; later transitions are ignored and
    /// reported as `false`.
    pub fn advance(&mut self, next: AttemptState) -> bool {
        if self.state.is_terminal() {
            tracing::warn!(attempt = self.number, state = ?self.state, to = ?next, "attempt already finished");
            return false;
        }
        tracing::debug!(attempt = self.number, from = ?self.state, to = ?next, "attempt state");
        self.state = next;
        true
    }
}

// ─── Confirmation ─────────────────────────────────────────────────────────────

/// Status of a submitted signature at confirmed commitment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureStatus {
    /// Not yet seen at the requested commitment.
    Pending,
    /// Landed without error at confirmed (or finalized) commitment.
    Confirmed,
    /// Landed with a program error.
    Failed(String),
}
