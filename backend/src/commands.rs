//! Operator commands: episode setup, whitelist publishing and progression.

use anyhow::{Context, Result};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signer;
use std::path::Path;
use tracing::info;

use crate::config::AppConfig;
use crate::episode::EpisodeLayout;
use crate::instructions;
use crate::transactions::{send_batched, send_with_retries, with_priority_fee};
use crate::whitelist;

fn rpc(config: &AppConfig) -> RpcClient {
    RpcClient::new_with_commitment(config.rpc_url.clone(), CommitmentConfig::confirmed())
}

/// Create and configure the episode described by `file`.
pub async fn write_episode(config: &AppConfig, file: &Path, skip: usize, dry_run: bool) -> Result<()> {
    let layout = EpisodeLayout::load(file)?;
    let operator = config.authority_keypair.pubkey();
    let (episode, plan) = layout.plan(&config.program_id, &operator)?;

    info!(
        episode = %episode,
        name = %layout.name,
        chapters = layout.chapters.len(),
        mint_groups = layout.mint_groups.len(),
        transitions = layout.transitions.len(),
        instructions = plan.len(),
        "Episode layout validated"
    );
    if dry_run {
        return Ok(());
    }

    send_batched(&rpc(config), config, &plan, skip).await?;
    info!(episode = %episode, "Episode configured");
    Ok(())
}

/// Build the whitelist tree and write root plus proofs as JSON.
pub fn build_whitelist(input: &Path, output: &Path) -> Result<()> {
    let allocations = whitelist::load_allocations(input)?;
    let proofs = whitelist::build(&allocations)?;
    let json = serde_json::to_string_pretty(&proofs).context("failed to encode proofs")?;
    std::fs::write(output, json).with_context(|| format!("failed to write {}", output.display()))?;

    info!(
        root = %proofs.root,
        allocations = proofs.entries.len(),
        output = %output.display(),
        "Whitelist built"
    );
    Ok(())
}

/// Resolve the root from `--root` or from a proofs file.
pub fn resolve_root(root: Option<&str>, proofs: Option<&Path>) -> Result<[u8; 32]> {
    match (root, proofs) {
        (Some(root), _) => whitelist::parse_root(root),
        (None, Some(path)) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let proofs: whitelist::WhitelistProofs = serde_json::from_str(&raw)
                .with_context(|| format!("invalid proofs file {}", path.display()))?;
            whitelist::parse_root(&proofs.root)
        }
        (None, None) => anyhow::bail!("either --root or --proofs is required"),
    }
}

pub async fn publish_whitelist(config: &AppConfig, episode: &Pubkey, root: [u8; 32]) -> Result<()> {
    let ix = instructions::set_whitelist_root(
        &config.program_id,
        &config.authority_keypair.pubkey(),
        episode,
        &root,
    );
    let sig = send_with_retries(&rpc(config), config, &with_priority_fee(config, vec![ix]), "set_whitelist_root")
        .await?;
    info!(
        episode = %episode,
        root = %hex::encode(root),
        signature = %sig,
        explorer = %config.explorer_url(&sig),
        "Whitelist root published"
    );
    Ok(())
}

/// Emit an onlife event, `EpisodeProgressedOnlife` unless `event` is given.
pub async fn progress(config: &AppConfig, episode: &Pubkey, event: Option<&str>) -> Result<()> {
    let ix = instructions::emit_onlife_event(
        &config.program_id,
        &config.authority_keypair.pubkey(),
        episode,
        event,
    );
    let sig = send_with_retries(&rpc(config), config, &with_priority_fee(config, vec![ix]), "emit_onlife_event")
        .await?;
    info!(
        episode = %episode,
        event = event.unwrap_or("EpisodeProgressedOnlife"),
        signature = %sig,
        "Onlife event emitted"
    );
    Ok(())
}

/// Ask the oracle for reveal randomness.
pub async fn request_reveal(config: &AppConfig, episode: &Pubkey) -> Result<()> {
    let ix = instructions::reveal(&config.program_id, &config.authority_keypair.pubkey(), episode);
    let sig = send_with_retries(&rpc(config), config, &with_priority_fee(config, vec![ix]), "reveal").await?;
    info!(episode = %episode, signature = %sig, "Reveal requested");
    Ok(())
}
