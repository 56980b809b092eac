//! Transaction submission shared by the oracle and the operator commands.

use anyhow::{Context, Result};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signer;
use solana_sdk::transaction::Transaction;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::AppConfig;

/// Instructions per configuration transaction. Keeps label-heavy batches
/// well under the packet size limit.
pub const BATCH_SIZE: usize = 4;

const COMPUTE_BUDGET_PROGRAM: Pubkey =
    Pubkey::from_str_const("ComputeBudget111111111111111111111111111111");

/// Build a `SetComputeUnitPrice` instruction.
pub fn set_compute_unit_price(micro_lamports: u64) -> Instruction {
    let mut data = Vec::with_capacity(9);
    data.push(3u8);
    data.extend_from_slice(&micro_lamports.to_le_bytes());
    Instruction {
        program_id: COMPUTE_BUDGET_PROGRAM,
        accounts: vec![],
        data,
    }
}

/// Prepend the configured priority fee, if any.
pub fn with_priority_fee(config: &AppConfig, instructions: Vec<Instruction>) -> Vec<Instruction> {
    if config.priority_fee_micro_lamports == 0 {
        return instructions;
    }
    let mut all = Vec::with_capacity(instructions.len() + 1);
    all.push(set_compute_unit_price(config.priority_fee_micro_lamports));
    all.extend(instructions);
    all
}

/// Sign with the operator keypair and send, with exponential backoff on
/// `BlockhashNotFound`.
pub async fn send_with_retries(
    rpc_client: &RpcClient,
    config: &AppConfig,
    instructions: &[Instruction],
    what: &str,
) -> Result<String> {
    let mut retry_delay = Duration::from_millis(config.initial_retry_delay_ms);

    for attempt in 0..config.max_retries {
        let blockhash = rpc_client
            .get_latest_blockhash()
            .await
            .context("failed to fetch latest blockhash")?;

        let tx = Transaction::new_signed_with_payer(
            instructions,
            Some(&config.authority_keypair.pubkey()),
            &[config.authority_keypair.as_ref()],
            blockhash,
        );

        match rpc_client.send_and_confirm_transaction(&tx).await {
            Ok(sig) => return Ok(sig.to_string()),
            Err(e)
                if e.to_string().contains("BlockhashNotFound")
                    && attempt + 1 < config.max_retries =>
            {
                warn!(
                    attempt = attempt + 1,
                    delay = ?retry_delay,
                    what,
                    "BlockhashNotFound, retrying"
                );
                tokio::time::sleep(retry_delay).await;
                retry_delay = retry_delay.saturating_mul(2).min(Duration::from_secs(60));
            }
            Err(e) => return Err(e).with_context(|| format!("{what}: send_and_confirm_transaction failed")),
        }
    }

    anyhow::bail!("max retries ({}) exceeded for {what}", config.max_retries)
}

/// Send `instructions` in batches of [`BATCH_SIZE`], starting at `skip`.
///
/// Batches land in order; on failure the error names the first instruction
/// of the failed batch so the run can be resumed from there.
pub async fn send_batched(
    rpc_client: &RpcClient,
    config: &AppConfig,
    instructions: &[Instruction],
    skip: usize,
) -> Result<()> {
    let pending = instructions.get(skip..).unwrap_or_default();
    for (batch, chunk) in pending.chunks(BATCH_SIZE).enumerate() {
        let first = skip + batch * BATCH_SIZE;
        let what = format!("instructions {first}..{}", first + chunk.len());
        let sig = send_with_retries(
            rpc_client,
            config,
            &with_priority_fee(config, chunk.to_vec()),
            &what,
        )
        .await
        .with_context(|| format!("resume with --skip {first}"))?;
        info!(
            batch = %what,
            signature = %sig,
            explorer = %config.explorer_url(&sig),
            "Batch confirmed"
        );
    }
    Ok(())
}
