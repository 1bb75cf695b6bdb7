//! Raydium Buy Rust SDK
//!
//! Buys an SPL token with wrapped SOL through its Raydium Liquidity Pool V4.
//! The pool is found by scanning the AMM program (with the Raydium liquidity
//! list as fallback), the swap is assembled into a versioned transaction
//! with a priority fee, submitted, and polled to confirmation with bounded
//! retries.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use raydium_buy_sdk::{BuyParams, SwapClient, SwapConfig};
//! use solana_sdk::{pubkey::Pubkey, signature::Keypair};
//! use std::str::FromStr;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = SwapClient::from_rpc_url("https://api.mainnet-beta.solana.com")
//!         .with_config(SwapConfig::default().with_max_retries(3));
//!     let payer = Keypair::new(); // use a funded keypair holding WSOL
//!
//!     let mint = Pubkey::from_str("DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263")?;
//!
//!     // 1. Inspect the pool first
//!     let keys = client.pool_keys(&mint).await?;
//!     println!("AMM {}  market {}", keys.amm_id, keys.market_id);
//!
//!     // 2. Spend 0.01 SOL
//!     let report = client.try_buy(&payer, BuyParams { mint, amount_in: 10_000_000 }).await?;
//!     println!("Bought! tx: {}", report.signature);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Feature Overview
//!
//! | Item | Description |
//! |------|-------------|
//! | [`SwapClient::buy`] | Buy and report success as `bool` |
//! | [`SwapClient::try_buy`] | Buy and return a [`BuyReport`] or the error |
//! | [`SwapClient::pool_keys`] | Resolve the pool key set for a mint |
//! | [`layout`] | Fixed-width decoder for AMM and market accounts |
//! | [`instructions`] | `swapBaseIn`, compute budget and ATA builders |
//! | [`SwapRpc`] / [`PoolRegistry`] | Injectable network capabilities |

pub mod client;
pub mod config;
pub mod error;
pub mod instructions;
pub mod layout;
pub mod pool;
pub mod registry;
pub mod retry;
pub mod rpc;
pub mod token_account;
pub mod types;

pub use client::SwapClient;
pub use config::SwapConfig;
pub use error::{Error, Result};
pub use registry::{HttpPoolRegistry, PoolRegistry};
pub use rpc::{MemcmpFilter, SwapRpc};
pub use types::*;
