//! Caller-side token account lookup.

use solana_sdk::{instruction::Instruction, pubkey::Pubkey};

use crate::{
    instructions::{create_ata_ix, derive_ata},
    rpc::SwapRpc,
};

/// Existing token account of `owner` for `mint`, if the RPC reports one.
pub async fn find_token_account(rpc: &dyn SwapRpc, owner: &Pubkey, mint: &Pubkey) -> Option<Pubkey> {
    match rpc.token_accounts_by_owner(owner, mint).await {
        Ok(accounts) => accounts.into_iter().next(),
        Err(err) => {
            tracing::debug!(%owner, %mint, error = %err, "token account lookup failed");
            None
        }
    }
}

/// Return `owner`'s token account for `mint`, plus the instruction that
/// creates it when none exists yet.
///
/// A failed lookup is treated like an empty one.  The creation instruction
/// is only returned, never sent; the caller bundles it into its own
/// transaction ahead of the swap.
pub async fn resolve_or_create(
    rpc:   &dyn SwapRpc,
    owner: &Pubkey,
    mint:  &Pubkey,
) -> (Pubkey, Option<Instruction>) {
    if let Some(existing) = find_token_account(rpc, owner, mint).await {
        tracing::debug!(%existing, "using existing token account");
        return (existing, None);
    }

    let ata = derive_ata(owner, mint);
    tracing::info!(%ata, %mint, "token account missing, will create associated account");
    (ata, Some(create_ata_ix(owner, mint)))
}
