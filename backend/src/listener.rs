//! On-chain event listener for the episode program.
//!
//! Two complementary strategies ensure no reveal request is missed:
//!
//! 1. **Catch-up scan** ([`catch_up_pending_requests`]): on startup, queries
//!    `getProgramAccounts` for episodes whose reveal is still `Requesting`.
//!
//! 2. **Live stream** ([`listen_for_events`]): subscribes to program logs
//!    via WebSocket, forwards `RandomnessRequested` events to the fulfiller
//!    and logs chapter changes. Reconnects on disconnection.

use base64::Engine;
use solana_account_decoder::UiAccountEncoding;
use solana_client::nonblocking::pubsub_client::PubsubClient;
use solana_client::rpc_config::{
    RpcAccountInfoConfig, RpcProgramAccountsConfig, RpcTransactionLogsConfig,
    RpcTransactionLogsFilter,
};
use solana_client::rpc_filter::{Memcmp, RpcFilterType};
use solana_commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::episode::{LIFECYCLE_EVENTS, LabelBook};
use crate::instructions::{account_discriminator, event_discriminator};
use crate::metrics::Metrics;

/// Parsed `RandomnessRequested` event, or a pending request found by the scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RandomnessRequestedEvent {
    pub episode: Pubkey,
    pub request_id: u64,
    pub seed: [u8; 32],
    pub request_slot: u64,
}

/// A chapter change reported by one of the lifecycle events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterChange {
    pub event: &'static str,
    pub episode: Pubkey,
    pub from: [u8; 32],
    pub to: [u8; 32],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgramEvent {
    RandomnessRequested(RandomnessRequestedEvent),
    ChapterChanged(ChapterChange),
}

/// Event discriminators the listener understands.
pub struct EventDecoder {
    randomness_requested: [u8; 8],
    lifecycle: Vec<([u8; 8], &'static str)>,
}

impl Default for EventDecoder {
    fn default() -> Self {
        Self {
            randomness_requested: event_discriminator("RandomnessRequested"),
            lifecycle: LIFECYCLE_EVENTS
                .iter()
                .map(|name| (event_discriminator(name), *name))
                .collect(),
        }
    }
}

impl EventDecoder {
    /// Decode one log line. Anything other than a known `Program data:` entry
    /// yields `None`.
    pub fn decode(&self, log_line: &str) -> Option<ProgramEvent> {
        let data_str = log_line.strip_prefix("Program data: ")?;
        let decoded = match base64::engine::general_purpose::STANDARD.decode(data_str.trim()) {
            Ok(d) => d,
            Err(e) => {
                debug!(error = %e, "Failed to decode base64 log data");
                return None;
            }
        };
        if decoded.len() < 8 {
            return None;
        }
        let (disc, body) = decoded.split_at(8);

        if disc == self.randomness_requested {
            return parse_randomness_requested(body).map(ProgramEvent::RandomnessRequested);
        }
        let (_, event) = self.lifecycle.iter().find(|(d, _)| d == disc)?;
        parse_chapter_change(event, body).map(ProgramEvent::ChapterChanged)
    }
}

fn pubkey_at(data: &[u8], at: usize) -> Option<Pubkey> {
    Pubkey::try_from(data.get(at..at + 32)?).ok()
}

fn u64_at(data: &[u8], at: usize) -> Option<u64> {
    Some(u64::from_le_bytes(data.get(at..at + 8)?.try_into().ok()?))
}

fn hash_at(data: &[u8], at: usize) -> Option<[u8; 32]> {
    data.get(at..at + 32)?.try_into().ok()
}

/// Layout: `episode (32) + request_id (8) + seed (32) + request_slot (8)`.
fn parse_randomness_requested(data: &[u8]) -> Option<RandomnessRequestedEvent> {
    Some(RandomnessRequestedEvent {
        episode: pubkey_at(data, 0)?,
        request_id: u64_at(data, 32)?,
        seed: hash_at(data, 40)?,
        request_slot: u64_at(data, 72)?,
    })
}

/// Layout: `episode (32) + from (32) + to (32)`.
fn parse_chapter_change(event: &'static str, data: &[u8]) -> Option<ChapterChange> {
    Some(ChapterChange {
        event,
        episode: pubkey_at(data, 0)?,
        from: hash_at(data, 32)?,
        to: hash_at(data, 64)?,
    })
}

// Episode account layout (offsets include the 8-byte discriminator):
//   [0..8]      discriminator
//   [8..104]    owner, vrf_authority, treasury
//   [104..136]  name_hash
//   [136..152]  max_supply, total_supply
//   [152..184]  whitelist_root
//   [184]       reveal.status (u8)  1 = Requesting
//   [185..193]  reveal.request_counter
//   [193..201]  reveal.request_id
//   [201..209]  reveal.request_slot
//   [209..241]  reveal.request_seed
const REVEAL_STATUS_OFFSET: usize = 184;
const REVEAL_STATUS_REQUESTING: u8 = 1;
const MIN_ACCOUNT_DATA_LEN: usize = 241;

/// Extract the outstanding request from raw `Episode` account data.
pub fn pending_request(episode: Pubkey, data: &[u8]) -> Option<RandomnessRequestedEvent> {
    if data.len() < MIN_ACCOUNT_DATA_LEN || data[REVEAL_STATUS_OFFSET] != REVEAL_STATUS_REQUESTING {
        return None;
    }
    Some(RandomnessRequestedEvent {
        episode,
        request_id: u64_at(data, 193)?,
        request_slot: u64_at(data, 201)?,
        seed: hash_at(data, 209)?,
    })
}

/// Scan for episodes with an unfulfilled reveal request on startup.
///
/// Filters `getProgramAccounts` on the `Episode` discriminator and on the
/// reveal status byte. Each hit is sent through the channel for fulfillment.
pub async fn catch_up_pending_requests(
    config: &AppConfig,
    tx: &mpsc::Sender<RandomnessRequestedEvent>,
) {
    info!("Scanning for pending reveal requests");

    let client = solana_client::nonblocking::rpc_client::RpcClient::new(config.rpc_url.clone());

    let filters = vec![
        RpcFilterType::Memcmp(Memcmp::new_raw_bytes(
            0,
            account_discriminator("Episode").to_vec(),
        )),
        RpcFilterType::Memcmp(Memcmp::new_raw_bytes(
            REVEAL_STATUS_OFFSET,
            vec![REVEAL_STATUS_REQUESTING],
        )),
    ];

    let account_config = RpcProgramAccountsConfig {
        filters: Some(filters),
        account_config: RpcAccountInfoConfig {
            encoding: Some(UiAccountEncoding::Base64),
            commitment: Some(CommitmentConfig::confirmed()),
            ..Default::default()
        },
        ..Default::default()
    };

    let accounts = match client
        .get_program_ui_accounts_with_config(&config.program_id, account_config)
        .await
    {
        Ok(accounts) => accounts,
        Err(e) => {
            error!(error = %e, "Failed to fetch program accounts");
            return;
        }
    };

    info!(count = accounts.len(), "Found pending reveal requests");
    for (pubkey, ui_account) in accounts {
        let Some(data) = ui_account.data.decode() else {
            warn!(episode = %pubkey, "Failed to decode account data, skipping");
            continue;
        };
        let Some(event) = pending_request(pubkey, &data) else {
            warn!(episode = %pubkey, len = data.len(), "Unexpected episode layout, skipping");
            continue;
        };

        info!(
            episode = %pubkey,
            request_id = event.request_id,
            slot = event.request_slot,
            "Queued pending request"
        );
        if tx.send(event).await.is_err() {
            error!("Channel closed while catching up pending requests");
            return;
        }
    }
}

/// Subscribe to program logs via WebSocket. Reveal requests go to the
/// fulfiller; chapter changes are logged with their labels.
pub async fn listen_for_events(
    config: AppConfig,
    tx: mpsc::Sender<RandomnessRequestedEvent>,
    labels: Arc<LabelBook>,
    metrics: Arc<Metrics>,
) {
    let decoder = EventDecoder::default();

    loop {
        info!(url = %config.ws_url, "Connecting to WebSocket");

        match PubsubClient::new(&config.ws_url).await {
            Ok(pubsub) => {
                info!("WebSocket connected");

                let filter =
                    RpcTransactionLogsFilter::Mentions(vec![config.program_id.to_string()]);
                let logs_config = RpcTransactionLogsConfig {
                    commitment: Some(CommitmentConfig::confirmed()),
                };

                match pubsub.logs_subscribe(filter, logs_config).await {
                    Ok((mut stream, _unsub)) => {
                        use futures_util::StreamExt;
                        while let Some(log_result) = stream.next().await {
                            let delivered = process_log_lines(
                                &log_result.value.logs,
                                &decoder,
                                &tx,
                                &labels,
                                &metrics,
                            )
                            .await;
                            if !delivered {
                                error!("Channel closed, stopping listener");
                                return;
                            }
                        }
                        warn!("WebSocket stream ended, reconnecting");
                    }
                    Err(e) => {
                        error!(error = %e, "Failed to subscribe to logs");
                    }
                }
            }
            Err(e) => {
                error!(error = %e, "Failed to connect to WebSocket");
            }
        }

        info!(delay = ?WS_RECONNECT_DELAY, "Reconnecting");
        tokio::time::sleep(WS_RECONNECT_DELAY).await;
    }
}

/// Delay before reconnecting to the WebSocket after a disconnect or error.
const WS_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Returns `false` once the fulfiller channel is gone.
async fn process_log_lines(
    logs: &[String],
    decoder: &EventDecoder,
    tx: &mpsc::Sender<RandomnessRequestedEvent>,
    labels: &LabelBook,
    metrics: &Metrics,
) -> bool {
    for event in logs.iter().filter_map(|line| decoder.decode(line)) {
        match event {
            ProgramEvent::RandomnessRequested(request) => {
                info!(
                    episode = %request.episode,
                    request_id = request.request_id,
                    slot = request.request_slot,
                    "Received RandomnessRequested event"
                );
                metrics.record_request();
                if tx.send(request).await.is_err() {
                    return false;
                }
            }
            ProgramEvent::ChapterChanged(change) => {
                metrics.record_lifecycle_event();
                info!(
                    episode = %change.episode,
                    event = change.event,
                    from = %labels.describe(&change.from),
                    to = %labels.describe(&change.to),
                    "Episode changed chapter"
                );
            }
        }
    }
    true
}
