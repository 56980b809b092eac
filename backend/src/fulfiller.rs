//! Fulfillment engine: consumes reveal requests and submits on-chain
//! fulfillment transactions carrying an Ed25519 signature proof.
//!
//! Each fulfillment transaction contains:
//! 1. A native Ed25519 signature-verify instruction over
//!    `episode || request_id || randomness`. The program reads it at index 0.
//! 2. The `fulfill_randomness` instruction, which checks the proof through
//!    the instructions sysvar and stores the reveal seed.
//! 3. (Optional) A `set_compute_unit_price` instruction for priority fees.

use anyhow::Result;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_commitment_config::CommitmentConfig;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tokio::sync::{Semaphore, mpsc};
use tracing::{error, info, instrument, warn};

use crate::config::{AppConfig, OracleConfig};
use crate::instructions;
use crate::listener::RandomnessRequestedEvent;
use crate::metrics::Metrics;
use crate::transactions::{send_with_retries, set_compute_unit_price};
use crate::vrf::compute_randomness;

/// Errors after which resubmitting the same fulfillment cannot succeed.
const NON_RETRYABLE: [&str; 5] = [
    "NoOutstandingRequest",
    "RequestIdMismatch",
    "AlreadyRevealed",
    "Unauthorized",
    "AccountNotInitialized",
];

/// Anchor error codes (`6000 + index`) of the same errors, as they appear in
/// raw `custom program error: 0x..` messages.
const NON_RETRYABLE_CODES: [u32; 4] = [6000, 6029, 6030, 6031];

fn is_non_retryable(err_str: &str) -> bool {
    NON_RETRYABLE.iter().any(|name| err_str.contains(name))
        || NON_RETRYABLE_CODES
            .iter()
            .any(|code| err_str.contains(&format!("custom program error: 0x{code:x}")))
}

/// Main fulfiller loop.
pub async fn run_fulfiller(
    config: AppConfig,
    oracle: OracleConfig,
    mut rx: mpsc::Receiver<RandomnessRequestedEvent>,
    pending_count: Arc<AtomicU64>,
    metrics: Arc<Metrics>,
) {
    let rpc_client = Arc::new(RpcClient::new_with_commitment(
        config.rpc_url.clone(),
        CommitmentConfig::confirmed(),
    ));

    let semaphore = Arc::new(Semaphore::new(oracle.fulfillment_concurrency));
    let oracle = Arc::new(oracle);

    while let Some(event) = rx.recv().await {
        pending_count.fetch_add(1, Ordering::Relaxed);

        let permit = match semaphore.clone().acquire_owned().await {
            Ok(p) => p,
            Err(_) => {
                error!("Semaphore closed, stopping fulfiller");
                break;
            }
        };
        let rpc = rpc_client.clone();
        let cfg = config.clone();
        let oracle = oracle.clone();
        let pending = pending_count.clone();
        let met = metrics.clone();

        tokio::spawn(async move {
            let _permit = permit;
            let start = Instant::now();

            info!(
                episode = %event.episode,
                request_id = event.request_id,
                slot = event.request_slot,
                "Fulfilling reveal request"
            );

            match fulfill_request(&rpc, &cfg, &oracle, &event).await {
                Ok(sig) => {
                    let latency_ms = start.elapsed().as_millis() as u64;
                    met.record_fulfillment(latency_ms);
                    info!(
                        episode = %event.episode,
                        request_id = event.request_id,
                        signature = %sig,
                        latency_ms,
                        explorer = %cfg.explorer_url(&sig),
                        "Fulfilled successfully"
                    );
                }
                Err(e) => handle_fulfillment_error(&event, e, &met),
            }

            pending.fetch_sub(1, Ordering::Relaxed);
        });
    }

    info!("Fulfiller channel closed, shutting down");
}

fn handle_fulfillment_error(event: &RandomnessRequestedEvent, error: anyhow::Error, metrics: &Metrics) {
    let err_str = format!("{error:#}");
    if is_non_retryable(&err_str) {
        metrics.record_skip();
        warn!(
            episode = %event.episode,
            request_id = event.request_id,
            reason = %err_str,
            "Skipping request (non-retryable)"
        );
    } else {
        metrics.record_failure();
        error!(
            episode = %event.episode,
            request_id = event.request_id,
            error = %err_str,
            "Failed to fulfill"
        );
    }
}

/// Build, sign, and submit a fulfillment transaction.
#[instrument(skip_all, fields(episode = %event.episode, request_id = event.request_id))]
async fn fulfill_request(
    rpc_client: &RpcClient,
    config: &AppConfig,
    oracle: &OracleConfig,
    event: &RandomnessRequestedEvent,
) -> Result<String> {
    let randomness = compute_randomness(
        &oracle.hmac_secret,
        &event.episode,
        &event.seed,
        event.request_slot,
        event.request_id,
    )?;
    let instructions = fulfillment_instructions(
        &config.program_id,
        config.authority_keypair.as_ref(),
        event,
        &randomness,
        config.priority_fee_micro_lamports,
    );
    let what = format!("fulfill {} #{}", event.episode, event.request_id);
    send_with_retries(rpc_client, config, &instructions, &what).await
}

/// Message signed by the oracle: `episode (32) || request_id (8 LE) || randomness (32)`.
pub fn fulfillment_message(episode: &Pubkey, request_id: u64, randomness: &[u8; 32]) -> Vec<u8> {
    let mut message = Vec::with_capacity(72);
    message.extend_from_slice(episode.as_ref());
    message.extend_from_slice(&request_id.to_le_bytes());
    message.extend_from_slice(randomness);
    message
}

/// Proof at index 0, then the fulfillment, then the optional priority fee.
pub fn fulfillment_instructions(
    program_id: &Pubkey,
    authority: &Keypair,
    event: &RandomnessRequestedEvent,
    randomness: &[u8; 32],
    priority_fee_micro_lamports: u64,
) -> Vec<Instruction> {
    let message = fulfillment_message(&event.episode, event.request_id, randomness);
    let mut instructions = vec![
        build_ed25519_instruction(authority, &message),
        instructions::fulfill_randomness(
            program_id,
            &authority.pubkey(),
            &event.episode,
            event.request_id,
            randomness,
        ),
    ];
    if priority_fee_micro_lamports > 0 {
        instructions.push(set_compute_unit_price(priority_fee_micro_lamports));
    }
    instructions
}

/// Construct a native Ed25519 signature-verify instruction whose offsets
/// all point into its own data.
fn build_ed25519_instruction(keypair: &Keypair, message: &[u8]) -> Instruction {
    use solana_sdk::ed25519_program;

    let signature = keypair.sign_message(message);
    let pubkey = keypair.pubkey();

    const DATA_START: usize = 2 + 7 * 2; // 16
    let public_key_offset: u16 = DATA_START as u16;
    let signature_offset: u16 = (DATA_START + 32) as u16;
    let message_data_offset: u16 = (DATA_START + 32 + 64) as u16;
    let message_data_size: u16 = message.len() as u16;

    let mut data = Vec::with_capacity(DATA_START + 32 + 64 + message.len());

    data.push(1u8); // num_signatures
    data.push(0u8); // padding

    for value in [
        signature_offset,
        u16::MAX,
        public_key_offset,
        u16::MAX,
        message_data_offset,
        message_data_size,
        u16::MAX,
    ] {
        data.extend_from_slice(&value.to_le_bytes());
    }

    data.extend_from_slice(&pubkey.to_bytes());
    data.extend_from_slice(signature.as_ref());
    data.extend_from_slice(message);

    Instruction {
        program_id: ed25519_program::id(),
        accounts: vec![],
        data,
    }
}
