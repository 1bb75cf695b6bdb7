//! The network capability the SDK runs against.
//!
//! Everything that touches the cluster goes through [`SwapRpc`], so the
//! orchestrator, resolvers and tests share one seam.  The production
//! implementation wraps the nonblocking `solana_client` RPC client.

use std::str::FromStr;

use async_trait::async_trait;
use solana_client::{
    nonblocking::rpc_client::RpcClient,
    rpc_config::{RpcAccountInfoConfig, RpcProgramAccountsConfig, RpcSendTransactionConfig},
    rpc_filter::{Memcmp, MemcmpEncodedBytes, RpcFilterType},
    rpc_request::TokenAccountsFilter,
};
use solana_sdk::{
    commitment_config::CommitmentConfig,
    hash::Hash,
    pubkey::Pubkey,
    signature::Signature,
    transaction::VersionedTransaction,
};

use crate::{error::Result, types::SignatureStatus};

/// A `getProgramAccounts` byte-comparison filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemcmpFilter {
    pub offset: usize,
    pub bytes:  Vec<u8>,
}

impl From<MemcmpFilter> for RpcFilterType {
    fn from(f: MemcmpFilter) -> Self {
        RpcFilterType::Memcmp(Memcmp::new(f.offset, MemcmpEncodedBytes::Bytes(f.bytes)))
    }
}

/// JSON-RPC calls needed to find a pool and land a swap.
#[async_trait]
pub trait SwapRpc: Send + Sync {
    async fn latest_blockhash(&self) -> Result<Hash>;

    async fn block_height(&self) -> Result<u64>;

    /// Addresses of accounts owned by `program_id` matching `filter`.
    async fn scan_program_accounts(
        &self,
        program_id: &Pubkey,
        filter:     MemcmpFilter,
    ) -> Result<Vec<Pubkey>>;

    /// Raw data of one account.
    async fn account_data(&self, address: &Pubkey) -> Result<Vec<u8>>;

    /// Token accounts owned by `owner` that hold `mint`.
    async fn token_accounts_by_owner(&self, owner: &Pubkey, mint: &Pubkey) -> Result<Vec<Pubkey>>;

    async fn send_transaction(
        &self,
        tx:             &VersionedTransaction,
        skip_preflight: bool,
    ) -> Result<Signature>;

    async fn signature_status(&self, signature: &Signature) -> Result<SignatureStatus>;
}

#[async_trait]
impl SwapRpc for RpcClient {
    async fn latest_blockhash(&self) -> Result<Hash> {
        Ok(self.get_latest_blockhash().await?)
    }

    async fn block_height(&self) -> Result<u64> {
        Ok(self.get_block_height_with_commitment(CommitmentConfig::confirmed()).await?)
    }

    async fn scan_program_accounts(
        &self,
        program_id: &Pubkey,
        filter:     MemcmpFilter,
    ) -> Result<Vec<Pubkey>> {
        let config = RpcProgramAccountsConfig {
            filters: Some(vec![filter.into()]),
            account_config: RpcAccountInfoConfig {
                commitment: Some(CommitmentConfig::confirmed()),
                ..Default::default()
            },
            ..Default::default()
        };
        let raw = self.get_program_accounts_with_config(program_id, config).await?;
        Ok(raw.into_iter().map(|(pk, _)| pk).collect())
    }

    async fn account_data(&self, address: &Pubkey) -> Result<Vec<u8>> {
        Ok(self.get_account_data(address).await?)
    }

    async fn token_accounts_by_owner(&self, owner: &Pubkey, mint: &Pubkey) -> Result<Vec<Pubkey>> {
        let keyed = self
            .get_token_accounts_by_owner(owner, TokenAccountsFilter::Mint(*mint))
            .await?;
        // Unparseable entries are skipped rather than failing the lookup.
        Ok(keyed
            .into_iter()
            .filter_map(|acc| Pubkey::from_str(&acc.pubkey).ok())
            .collect())
    }

    async fn send_transaction(
        &self,
        tx:             &VersionedTransaction,
        skip_preflight: bool,
    ) -> Result<Signature> {
        let config = RpcSendTransactionConfig { skip_preflight, ..Default::default() };
        Ok(self.send_transaction_with_config(tx, config).await?)
    }

    async fn signature_status(&self, signature: &Signature) -> Result<SignatureStatus> {
        let status = self
            .get_signature_status_with_commitment(signature, CommitmentConfig::confirmed())
            .await?;
        Ok(match status {
            None         => SignatureStatus::Pending,
            Some(Ok(())) => SignatureStatus::Confirmed,
            Some(Err(e)) => SignatureStatus::Failed(e.to_string()),
        })
    }
}
