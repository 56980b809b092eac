//! Operator configuration loaded from environment variables.
//!
//! Required: `PROGRAM_ID` (all on-chain commands), `HMAC_SECRET` (`serve` only)
//! Optional: `RPC_URL`, `WS_URL`, `AUTHORITY_KEYPAIR_PATH`, `CLUSTER`,
//!           `HTTP_PORT`, `MAX_RETRIES`, `INITIAL_RETRY_DELAY_MS`,
//!           `PRIORITY_FEE_MICRO_LAMPORTS`, `FULFILLMENT_CONCURRENCY`

use anyhow::{Context, Result};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{read_keypair_file, Keypair};
use std::str::FromStr;
use std::sync::Arc;

/// Settings shared by every command that talks to the cluster.
#[derive(Clone)]
pub struct AppConfig {
    /// Solana JSON-RPC endpoint (HTTP).
    pub rpc_url: String,
    /// Solana PubSub endpoint (WebSocket) for log subscriptions.
    pub ws_url: String,
    /// Signs every transaction. Acts as episode owner for configuration
    /// commands and as `vrf_authority` when serving.
    pub authority_keypair: Arc<Keypair>,
    /// The deployed episode program ID.
    pub program_id: Pubkey,
    /// Cluster name for explorer URLs.
    pub cluster: String,
    /// Maximum send attempts per transaction.
    pub max_retries: u32,
    pub initial_retry_delay_ms: u64,
    /// Priority fee in micro-lamports per compute unit; 0 disables it.
    pub priority_fee_micro_lamports: u64,
}

/// Extra settings for the randomness oracle (`serve`).
#[derive(Clone)]
pub struct OracleConfig {
    /// Secret key for HMAC-SHA256 randomness generation.
    pub hmac_secret: Vec<u8>,
    pub http_port: u16,
    /// Maximum concurrent fulfillment tasks.
    pub fulfillment_concurrency: usize,
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let rpc_url = std::env::var("RPC_URL").unwrap_or_else(|_| "http://127.0.0.1:8899".into());
        let ws_url = std::env::var("WS_URL").unwrap_or_else(|_| "ws://127.0.0.1:8900".into());

        let keypair_path = std::env::var("AUTHORITY_KEYPAIR_PATH")
            .unwrap_or_else(|_| "~/.config/solana/id.json".into());
        let keypair_path = shellexpand::tilde(&keypair_path).to_string();
        let authority_keypair = read_keypair_file(&keypair_path)
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("failed to read keypair from {keypair_path}"))?;

        let program_id_str = std::env::var("PROGRAM_ID").context("PROGRAM_ID env var must be set")?;
        let program_id = Pubkey::from_str(&program_id_str)
            .with_context(|| format!("invalid PROGRAM_ID: {program_id_str}"))?;

        Ok(Self {
            rpc_url,
            ws_url,
            authority_keypair: Arc::new(authority_keypair),
            program_id,
            cluster: std::env::var("CLUSTER").unwrap_or_else(|_| "devnet".into()),
            max_retries: env_or("MAX_RETRIES", 5).max(1),
            initial_retry_delay_ms: env_or("INITIAL_RETRY_DELAY_MS", 500),
            priority_fee_micro_lamports: env_or("PRIORITY_FEE_MICRO_LAMPORTS", 0),
        })
    }

    /// Return the Solscan explorer URL for a given transaction signature.
    pub fn explorer_url(&self, signature: &str) -> String {
        match self.cluster.as_str() {
            "mainnet-beta" => format!("https://solscan.io/tx/{signature}"),
            cluster => format!("https://solscan.io/tx/{signature}?cluster={cluster}"),
        }
    }
}

impl OracleConfig {
    pub fn from_env() -> Result<Self> {
        let hmac_secret = std::env::var("HMAC_SECRET")
            .context("HMAC_SECRET env var must be set")?
            .into_bytes();
        anyhow::ensure!(!hmac_secret.is_empty(), "HMAC_SECRET must not be empty");

        Ok(Self {
            hmac_secret,
            http_port: env_or("HTTP_PORT", 8080),
            fulfillment_concurrency: env_or("FULFILLMENT_CONCURRENCY", 4).max(1),
        })
    }
}
