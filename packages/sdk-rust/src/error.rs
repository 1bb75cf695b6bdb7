//! SDK error type.

use std::time::Duration;

use solana_sdk::{
    message::CompileError,
    pubkey::{Pubkey, PubkeyError},
    signature::Signature,
    signer::SignerError,
};

/// All errors returned by the Raydium Buy SDK.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // ── Account layouts ──────────────────────────────────────────────────────
    /// Raw account bytes are too short for the schema, or a field overruns.
    #[error("Layout error in {schema}: need {needed} bytes, buffer has {actual}")]
    Layout {
        schema: &'static str,
        needed: usize,
        actual: usize,
    },

    /// The schema has no field with this name.
    #[error("Unknown field '{field}' in layout {schema}")]
    UnknownField { schema: &'static str, field: String },

    /// The field exists but was read as the wrong kind (integer vs bytes),
    /// or its value does not fit the requested width.
    #[error("Field '{field}' in layout {schema} cannot be read as {wanted}")]
    FieldKind {
        schema: &'static str,
        field:  &'static str,
        wanted: &'static str,
    },

    // ── RPC / network ────────────────────────────────────────────────────────
    /// A Solana JSON-RPC call failed.
    #[error("RPC error: {0}")]
    Rpc(#[from] solana_client::client_error::ClientError),

    /// An inner fetch loop kept failing until its wall-clock budget ran out.
    #[error("Timed out after {budget:?} while {what}")]
    Deadline { what: &'static str, budget: Duration },

    /// The network moved past the block-height budget without confirming.
    #[error("Transaction {signature} not confirmed before block height {last_valid_block_height}")]
    ConfirmationTimeout {
        signature:               Signature,
        last_valid_block_height: u64,
    },

    /// The transaction landed but the program returned an error.
    #[error("Transaction {signature} failed on-chain: {reason}")]
    OnChain { signature: Signature, reason: String },

    /// Every attempt failed with a retryable error.
    #[error("Gave up after {attempts} attempts; last error: {last}")]
    RetriesExhausted { attempts: u32, last: Box<Error> },

    // ── Pool discovery ───────────────────────────────────────────────────────
    /// Neither the on-chain scan nor the registry snapshot has a WSOL pool.
    #[error("Pool not found for mint {0}")]
    PoolNotFound(Pubkey),

    /// The market account names a different market than the AMM points at.
    #[error("Market account {expected} describes market {found}")]
    MarketMismatch { expected: Pubkey, found: Pubkey },

    /// A registry entry carries an address that does not parse.
    #[error("Registry entry has invalid {field}: '{value}'")]
    InvalidRegistryEntry { field: &'static str, value: String },

    #[error("Registry download failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Registry cache I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Registry snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Program-address derivation failed (seeds land on the curve).
    #[error("Address derivation failed: {0}")]
    Pubkey(#[from] PubkeyError),

    // ── Transaction assembly ─────────────────────────────────────────────────
    #[error("Message compile failed: {0}")]
    Compile(#[from] CompileError),

    #[error("Signing failed: {0}")]
    Signer(#[from] SignerError),

    // ── Validation ───────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Whether the orchestrator should rebuild and resubmit after this error.
    ///
    /// Transient network failures and confirmation timeouts are retried;
    /// on-chain program errors and malformed data are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Rpc(_) | Error::Deadline { .. } | Error::ConfirmationTimeout { .. }
        )
    }
}

/// Convenience alias so every module can write `Result<T>`.
pub type Result<T> = std::result::Result<T, Error>;
