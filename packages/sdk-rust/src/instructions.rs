//! Low-level instruction builders.
//!
//! Each function constructs a [`solana_sdk::instruction::Instruction`] ready
//! for signing and submission.  Account order mirrors what the Raydium
//! Liquidity Pool V4 program expects exactly; reordering breaks the swap.

use solana_sdk::{
    compute_budget::ComputeBudgetInstruction,
    instruction::{AccountMeta, Instruction},
    pubkey,
    pubkey::Pubkey,
};

use crate::types::PoolKeySet;

// ─── Well-known program IDs ───────────────────────────────────────────────────

/// Raydium Liquidity Pool V4.
pub const AMM_PROGRAM_ID: Pubkey = pubkey!("675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8");

/// Raydium V4 AMM authority (PDA of the AMM program, identical for every pool).
pub const AMM_AUTHORITY_V4: Pubkey = pubkey!("5Q544fKrFoe6tsEbD7S8EmxGTJYAKtTVhAW5Q5pge4j1");

/// OpenBook / Serum v3 DEX program.
pub const OPENBOOK_PROGRAM_ID: Pubkey = pubkey!("srmqPvymJeFKQ4zGQed1GFppgkRHL9kaELCbyksJtPX");

/// Wrapped SOL mint.
pub const WSOL_MINT: Pubkey = pubkey!("So11111111111111111111111111111111111111112");

pub(crate) fn spl_token_id() -> Pubkey {
    spl_token::id()
}

// ─── Swap ─────────────────────────────────────────────────────────────────────

/// `swapBaseIn` instruction tag.
pub const SWAP_BASE_IN_OPCODE: u8 = 9;

/// Minimum output sent with every swap.  No slippage guard is applied at
/// this layer: any non-zero output is accepted.
pub const MIN_AMOUNT_OUT: u64 = 1;

/// Build the `swapBaseIn` instruction.
///
/// Data layout: `opcode(1) amount_in(8, LE) min_amount_out(8, LE)`.
pub fn swap_base_in_ix(
    amount_in:   u64,
    account_in:  &Pubkey,
    account_out: &Pubkey,
    keys:        &PoolKeySet,
    owner:       &Pubkey,
) -> Instruction {
    let mut data = Vec::with_capacity(17);
    data.push(SWAP_BASE_IN_OPCODE);
    data.extend_from_slice(&amount_in.to_le_bytes());
    data.extend_from_slice(&MIN_AMOUNT_OUT.to_le_bytes());

    Instruction {
        program_id: AMM_PROGRAM_ID,
        accounts: vec![
            AccountMeta::new_readonly(spl_token_id(),          false),
            AccountMeta::new(keys.amm_id,                       false),  // mut
            AccountMeta::new_readonly(keys.authority,           false),
            AccountMeta::new(keys.open_orders,                  false),  // mut
            AccountMeta::new(keys.target_orders,                false),  // mut
            AccountMeta::new(keys.base_vault,                   false),  // mut
            AccountMeta::new(keys.quote_vault,                  false),  // mut
            AccountMeta::new_readonly(keys.market_program_id,   false),
            AccountMeta::new(keys.market_id,                    false),  // mut
            AccountMeta::new(keys.bids,                         false),  // mut
            AccountMeta::new(keys.asks,                         false),  // mut
            AccountMeta::new(keys.event_queue,                  false),  // mut
            AccountMeta::new(keys.market_base_vault,            false),  // mut
            AccountMeta::new(keys.market_quote_vault,           false),  // mut
            AccountMeta::new_readonly(keys.market_authority,    false),
            AccountMeta::new(*account_in,                       false),  // mut, user source
            AccountMeta::new(*account_out,                      false),  // mut, user destination
            AccountMeta::new_readonly(*owner,                   true),   // signer
        ],
        data,
    }
}

// ─── Compute budget ───────────────────────────────────────────────────────────

/// Priority-fee and compute-limit directives, in that order.
pub fn compute_budget_ixs(unit_price_micro_lamports: u64, unit_limit: u32) -> [Instruction; 2] {
    [
        ComputeBudgetInstruction::set_compute_unit_price(unit_price_micro_lamports),
        ComputeBudgetInstruction::set_compute_unit_limit(unit_limit),
    ]
}

// ─── Associated token accounts ────────────────────────────────────────────────

/// Derive the Associated Token Account for a wallet + mint.
pub fn derive_ata(wallet: &Pubkey, mint: &Pubkey) -> Pubkey {
    spl_associated_token_account::get_associated_token_address(wallet, mint)
}

/// Build the instruction that creates `wallet`'s ATA for `mint`, paid by
/// `wallet`.
pub fn create_ata_ix(wallet: &Pubkey, mint: &Pubkey) -> Instruction {
    spl_associated_token_account::instruction::create_associated_token_account(
        wallet,
        wallet,
        mint,
        &spl_token_id(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_keys() -> PoolKeySet {
        PoolKeySet {
            amm_id:             Pubkey::new_unique(),
            authority:          AMM_AUTHORITY_V4,
            base_mint:          Pubkey::new_unique(),
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

    #[test]
    fn payload_carries_amount_in_little_endian() {
        let keys  = sample_keys();
        let owner = Pubkey::new_unique();
        let amount_in = 650_000u64;
        let ix = swap_base_in_ix(amount_in, &Pubkey::new_unique(), &Pubkey::new_unique(), &keys, &owner);

        assert_eq!(ix.program_id, AMM_PROGRAM_ID);
        assert_eq!(ix.data.len(), 17);
        assert_eq!(ix.data[0], SWAP_BASE_IN_OPCODE);
        let recovered = u64::from_le_bytes(ix.data[1..9].try_into().unwrap());
        assert_eq!(recovered, amount_in);
        let min_out = u64::from_le_bytes(ix.data[9..17].try_into().unwrap());
        assert_eq!(min_out, 1);
    }

    #[test]
    fn account_order_and_flags_are_fixed() {
        let keys     = sample_keys();
        let owner    = Pubkey::new_unique();
        let src      = Pubkey::new_unique();
        let dst      = Pubkey::new_unique();
        let ix = swap_base_in_ix(1, &src, &dst, &keys, &owner);

        let expected = [
            (spl_token::id(),          false),
            (keys.amm_id,              true),
            (keys.authority,           false),
            (keys.open_orders,         true),
            (keys.target_orders,       true),
            (keys.base_vault,          true),
            (keys.quote_vault,         true),
            (keys.market_program_id,   false),
            (keys.market_id,           true),
            (keys.bids,                true),
            (keys.asks,                true),
            (keys.event_queue,         true),
            (keys.market_base_vault,   true),
            (keys.market_quote_vault,  true),
            (keys.market_authority,    false),
            (src,                      true),
            (dst,                      true),
            (owner,                    false),
        ];
        assert_eq!(ix.accounts.len(), 18);
        for (i, (meta, (pk, writable))) in ix.accounts.iter().zip(expected).enumerate() {
            assert_eq!(meta.pubkey, pk, "account #{i}");
            assert_eq!(meta.is_writable, writable, "writable flag #{i}");
            assert_eq!(meta.is_signer, i == 17, "signer flag #{i}");
        }
    }

    #[test]
    fn compute_budget_targets_budget_program() {
        let [price, limit] = compute_budget_ixs(498_750, 4_000_000);
        assert_eq!(price.program_id, solana_sdk::compute_budget::id());
        assert_eq!(limit.program_id, solana_sdk::compute_budget::id());
        assert_ne!(price.data, limit.data);
    }

    #[test]
    fn ata_creation_targets_derived_address() {
        let wallet = Pubkey::new_unique();
        let mint   = Pubkey::new_unique();
        let ix  = create_ata_ix(&wallet, &mint);
        let ata = derive_ata(&wallet, &mint);
        assert_eq!(ix.program_id, spl_associated_token_account::id());
        assert_eq!(ix.accounts[0].pubkey, wallet);
        assert_eq!(ix.accounts[1].pubkey, ata);
    }
}
