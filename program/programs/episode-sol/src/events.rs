use anchor_lang::prelude::*;

use crate::state::{LifecycleEvent, MintGroupRules, Step};

/// Emitted once when an episode account is created.
#[event]
pub struct EpisodeInitialized {
    pub episode: Pubkey,
    pub owner: Pubkey,
    pub name: String,
    pub initial_chapter: [u8; 32],
    pub max_supply: u64,
}

/// Acknowledges `write_chapter`, echoing its arguments.
#[event]
pub struct ChapterWritten {
    pub episode: Pubkey,
    pub label: String,
    pub chapter: [u8; 32],
    pub whitelisting: bool,
    pub limit: u64,
    pub price: u64,
    pub is_open: bool,
    pub revealing: bool,
    pub is_conclusion: bool,
}

#[event]
pub struct ChapterRemoved {
    pub episode: Pubkey,
    pub chapter: [u8; 32],
}

/// Acknowledges `write_mint_group`, echoing its arguments.
#[event]
pub struct MintGroupWritten {
    pub episode: Pubkey,
    pub chapter_label: String,
    pub group_label: String,
    pub rules: MintGroupRules,
}

#[event]
pub struct MintGroupRemoved {
    pub episode: Pubkey,
    pub chapter: [u8; 32],
    pub group: [u8; 32],
}

/// Acknowledges `write_transition`, echoing its arguments.
#[event]
pub struct TransitionWritten {
    pub episode: Pubkey,
    pub from_label: String,
    pub to_label: String,
    pub event_label: String,
}

#[event]
pub struct TransitionRemoved {
    pub episode: Pubkey,
    pub from: [u8; 32],
    pub event: [u8; 32],
}

#[event]
pub struct WhitelistRootSet {
    pub episode: Pubkey,
    pub root: [u8; 32],
}

/// Emitted for every successful mint.
#[event]
pub struct TokensMinted {
    pub episode: Pubkey,
    pub minter: Pubkey,
    pub group: [u8; 32],
    /// First token id of the minted range.
    pub first_token_id: u64,
    pub quantity: u64,
    pub cost: u64,
}

/// The owner moved the episode forward with the default onlife event.
#[event]
pub struct EpisodeProgressedOnlife {
    pub episode: Pubkey,
    pub from: [u8; 32],
    pub to: [u8; 32],
}

/// The owner moved the episode forward with a custom onlife event.
#[event]
pub struct OnlifeEventEmitted {
    pub episode: Pubkey,
    pub event: String,
    pub from: [u8; 32],
    pub to: [u8; 32],
}

/// A non-final minting chapter reached its limit.
#[event]
pub struct ChapterMinted {
    pub episode: Pubkey,
    pub from: [u8; 32],
    pub to: [u8; 32],
}

/// Total supply reached max supply.
#[event]
pub struct EpisodeMinted {
    pub episode: Pubkey,
    pub from: [u8; 32],
    pub to: [u8; 32],
}

#[event]
pub struct MintingSealed {
    pub episode: Pubkey,
    pub from: [u8; 32],
    pub to: [u8; 32],
}

#[event]
pub struct EpisodeRevealed {
    pub episode: Pubkey,
    pub from: [u8; 32],
    pub to: [u8; 32],
}

/// Emitted when the owner requests reveal randomness.
///
/// The off-chain oracle backend subscribes to these events via WebSocket log
/// monitoring and triggers fulfillment automatically.
#[event]
pub struct RandomnessRequested {
    pub episode: Pubkey,
    pub request_id: u64,
    pub seed: [u8; 32],
    pub request_slot: u64,
}

/// Emitted when the oracle fulfills the reveal request.
#[event]
pub struct RandomnessFulfilled {
    pub episode: Pubkey,
    pub request_id: u64,
    pub randomness: [u8; 32],
}

#[event]
pub struct ConfigUpdated {
    pub episode: Pubkey,
    pub owner: Pubkey,
    pub vrf_authority: Pubkey,
    pub treasury: Pubkey,
}

/// Emit the typed event matching a lifecycle transition.
pub fn emit_lifecycle(episode: Pubkey, event: LifecycleEvent, step: Step) {
    let (from, to) = (step.from, step.to);
    match event {
        LifecycleEvent::ProgressedOnlife => emit!(EpisodeProgressedOnlife { episode, from, to }),
        LifecycleEvent::ChapterMinted => emit!(ChapterMinted { episode, from, to }),
        LifecycleEvent::EpisodeMinted => emit!(EpisodeMinted { episode, from, to }),
        LifecycleEvent::MintingSealed => emit!(MintingSealed { episode, from, to }),
        LifecycleEvent::EpisodeRevealed => emit!(EpisodeRevealed { episode, from, to }),
    }
}
