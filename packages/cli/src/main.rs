use std::{path::PathBuf, str::FromStr, sync::Arc, time::Duration};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use raydium_buy_sdk::{
    registry::{DEFAULT_CACHE_PATH, DEFAULT_REGISTRY_TIMEOUT, DEFAULT_REGISTRY_URL},
    BuyParams, HttpPoolRegistry, SwapClient, SwapConfig,
};
use serde_json::json;
use solana_sdk::{
    native_token::{lamports_to_sol, sol_to_lamports},
    pubkey::Pubkey,
    signature::{read_keypair_file, Keypair, Signer},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// ─── CLI definition ───────────────────────────────────────────────────────────

/// Buy a token with wrapped SOL through its Raydium AMM v4 pool.
///
/// Global options can also be set via environment variables or a `.env`
/// file in the working directory.
#[derive(Parser)]
#[command(
    name    = "raydium-buy",
    version = env!("CARGO_PKG_VERSION"),
    about   = "Buy SPL tokens through Raydium Liquidity Pool V4 on Solana.",
    after_help = "\
ENVIRONMENT:
  RPC_HTTPS_URL        Solana JSON-RPC endpoint
  PRIVATE_KEY          Base-58 payer secret key (or use --keypair)
  WSOL_TOKEN_ACCOUNT   Wrapped-SOL account to spend from  [default: payer's WSOL ATA]
  RUST_LOG             Log filter  [default: info]

QUICK START:
  raydium-buy pool --mint DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263
  raydium-buy buy  --mint DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263 --amount 0.01"
)]
struct Cli {
    /// Solana JSON-RPC endpoint
    #[arg(long, global = true, value_name = "URL", env = "RPC_HTTPS_URL")]
    rpc_url: Option<String>,

    /// Base-58 encoded payer secret key
    #[arg(long, global = true, value_name = "BASE58", env = "PRIVATE_KEY", hide_env_values = true)]
    private_key: Option<String>,

    /// Path to the payer's Ed25519 keypair JSON file (used when no private key is set)
    #[arg(long, global = true, value_name = "PATH")]
    keypair: Option<String>,

    /// Wrapped-SOL token account to spend from
    #[arg(long, global = true, value_name = "ADDRESS", env = "WSOL_TOKEN_ACCOUNT")]
    wsol_account: Option<String>,

    /// JSON file overriding swap tunables (priority fee, retries, timeouts)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Pool registry used when the on-chain scan finds nothing
    #[arg(long, global = true, value_name = "URL", default_value = DEFAULT_REGISTRY_URL)]
    registry_url: String,

    /// Local cache of the pool registry
    #[arg(long, global = true, value_name = "PATH", default_value = DEFAULT_CACHE_PATH)]
    pool_cache: PathBuf,

    /// Give up on a registry download after this many seconds
    #[arg(long, global = true, value_name = "SECS", default_value_t = DEFAULT_REGISTRY_TIMEOUT.as_secs())]
    registry_timeout: u64,

    /// Output machine-readable JSON instead of human-readable text
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Swap wrapped SOL for a token and wait for confirmation
    #[command(
        after_help = "\
EXAMPLES:
  # Spend 0.05 SOL on a pump.fun graduate
  raydium-buy buy --mint 9BB6NFEcjBCtnNLFko2FqVQBq8HHM13kCyYcdQbgpump --amount 0.05

  # Machine-readable output
  raydium-buy buy --mint <MINT> --amount 0.05 --json"
    )]
    Buy {
        /// Mint address of the token to buy
        #[arg(long, value_name = "MINT")]
        mint: String,

        /// Wrapped SOL to spend, in SOL
        #[arg(long, value_name = "SOL")]
        amount: f64,
    },

    /// Resolve and print the pool key set for a mint without sending anything
    Pool {
        /// Mint address of the token
        #[arg(long, value_name = "MINT")]
        mint: String,
    },
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

/// Expand `~/` to `$HOME/` in keypair paths.
fn expand_home(path: &str) -> String {
    match path.strip_prefix("~/") {
        Some(rest) => format!("{}/{rest}", std::env::var("HOME").unwrap_or_default()),
        None       => path.to_string(),
    }
}

fn load_payer(cli: &Cli) -> Result<Keypair> {
    if let Some(secret) = cli.private_key.as_deref().filter(|s| !s.is_empty()) {
        let bytes = bs58::decode(secret.trim())
            .into_vec()
            .map_err(|e| anyhow!("PRIVATE_KEY is not valid base-58: {e}"))?;
        return Keypair::from_bytes(&bytes)
            .map_err(|e| anyhow!("PRIVATE_KEY is not a 64-byte Ed25519 secret key: {e}"));
    }

    let path = cli
        .keypair
        .as_deref()
        .ok_or_else(|| anyhow!("No payer configured.\n  Set PRIVATE_KEY or pass --keypair <PATH>."))?;
    let expanded = expand_home(path);
    read_keypair_file(&expanded).map_err(|e| anyhow!("Cannot load keypair from '{expanded}': {e}"))
}

fn parse_mint(mint: &str) -> Result<Pubkey> {
    Pubkey::from_str(mint).map_err(|_| anyhow!("'{mint}' is not a base-58 mint address."))
}

fn load_config(cli: &Cli) -> Result<SwapConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let raw = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_slice(&raw).with_context(|| format!("parsing {}", path.display()))?
        }
        None => SwapConfig::default(),
    };
    if let Some(account) = cli.wsol_account.as_deref().filter(|s| !s.is_empty()) {
        let account = Pubkey::from_str(account)
            .map_err(|_| anyhow!("WSOL_TOKEN_ACCOUNT '{account}' is not a valid address."))?;
        config = config.with_wsol_account(account);
    }
    Ok(config)
}

fn build_client(cli: &Cli) -> Result<SwapClient> {
    let rpc_url = cli
        .rpc_url
        .as_deref()
        .ok_or_else(|| anyhow!("No RPC endpoint configured.\n  Set RPC_HTTPS_URL or pass --rpc-url <URL>."))?;
    let registry = HttpPoolRegistry::new(cli.registry_url.clone(), cli.pool_cache.clone())
        .with_timeout(Duration::from_secs(cli.registry_timeout));
    Ok(SwapClient::from_rpc_url(rpc_url)
        .with_registry(Arc::new(registry))
        .with_config(load_config(cli)?))
}

// ─── buy ──────────────────────────────────────────────────────────────────────

async fn cmd_buy(cli: &Cli, mint: &str, amount_sol: f64) -> Result<()> {
    let mint = parse_mint(mint).context("--mint")?;
    if !amount_sol.is_finite() || amount_sol <= 0.0 {
        return Err(anyhow!("--amount must be a positive number of SOL."));
    }
    let amount_in = sol_to_lamports(amount_sol);

    let payer  = load_payer(cli)?;
    let client = build_client(cli)?;
    tracing::info!(payer = %payer.pubkey(), %mint, lamports = amount_in, "starting buy");

    let report = client
        .try_buy(&payer, BuyParams { mint, amount_in })
        .await
        .with_context(|| format!("buying {mint}"))?;

    if cli.json {
        println!("{}", json!({
            "mint":                  mint.to_string(),
            "amount_in":             report.amount_in,
            "amm_id":                report.amm_id.to_string(),
            "token_account":         report.token_account.to_string(),
            "created_token_account": report.created_token_account,
            "attempts":              report.attempts,
            "tx":                    report.signature.to_string(),
        }));
    } else {
        println!("─── Buy Confirmed ────────────────────────────────────────────────");
        println!("  Mint             {mint}");
        println!("  Spent            {} SOL  ({} lamports)", lamports_to_sol(report.amount_in), report.amount_in);
        println!("  Pool             {}", report.amm_id);
        println!(
            "  Token account    {}{}",
            report.token_account,
            if report.created_token_account { "  (created)" } else { "" },
        );
        println!("  Attempts         {}", report.attempts);
        println!("  Transaction      {}", report.signature);
    }
    Ok(())
}

// ─── pool ─────────────────────────────────────────────────────────────────────

async fn cmd_pool(cli: &Cli, mint: &str) -> Result<()> {
    let mint   = parse_mint(mint).context("--mint")?;
    let client = build_client(cli)?;
    let keys   = client
        .pool_keys(&mint)
        .await
        .with_context(|| format!("resolving pool for {mint}"))?;

    if cli.json {
        println!("{}", json!({
            "amm_id":             keys.amm_id.to_string(),
            "authority":          keys.authority.to_string(),
            "base_mint":          keys.base_mint.to_string(),
            "base_decimals":      keys.base_decimals,
            "quote_mint":         keys.quote_mint.to_string(),
            "quote_decimals":     keys.quote_decimals,
            "lp_mint":            keys.lp_mint.to_string(),
            "open_orders":        keys.open_orders.to_string(),
            "target_orders":      keys.target_orders.to_string(),
            "base_vault":         keys.base_vault.to_string(),
            "quote_vault":        keys.quote_vault.to_string(),
            "market_program_id":  keys.market_program_id.to_string(),
            "market_id":          keys.market_id.to_string(),
            "market_authority":   keys.market_authority.to_string(),
            "market_base_vault":  keys.market_base_vault.to_string(),
            "market_quote_vault": keys.market_quote_vault.to_string(),
            "bids":               keys.bids.to_string(),
            "asks":               keys.asks.to_string(),
            "event_queue":        keys.event_queue.to_string(),
        }));
    } else {
        println!("─── Pool ─────────────────────────────────────────────────────────");
        println!("  AMM              {}", keys.amm_id);
        println!("  Base mint        {}  ({} decimals)", keys.base_mint, keys.base_decimals);
        println!("  Quote mint       {}  ({} decimals)", keys.quote_mint, keys.quote_decimals);
        println!("  LP mint          {}", keys.lp_mint);
        println!("  Base vault       {}", keys.base_vault);
        println!("  Quote vault      {}", keys.quote_vault);
        println!("  Open orders      {}", keys.open_orders);
        println!("  Target orders    {}", keys.target_orders);
        println!();
        println!("  ─── Market ───────────────────────────────────────");
        println!("  Program          {}", keys.market_program_id);
        println!("  Market           {}", keys.market_id);
        println!("  Authority        {}", keys.market_authority);
        println!("  Base vault       {}", keys.market_base_vault);
        println!("  Quote vault      {}", keys.market_quote_vault);
        println!("  Bids             {}", keys.bids);
        println!("  Asks             {}", keys.asks);
        println!("  Event queue      {}", keys.event_queue);
    }
    Ok(())
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match &cli.command {
        Commands::Buy { mint, amount } => cmd_buy(&cli, mint, *amount).await,
        Commands::Pool { mint }        => cmd_pool(&cli, mint).await,
    }
}
