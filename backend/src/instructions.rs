//! Hand-rolled client for the episode program.
//!
//! Anchor discriminators and Borsh argument encoding are produced here so
//! the backend does not link the on-chain crate.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sha3::Keccak256;
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;
use solana_sdk_ids::system_program;
use solana_sdk::sysvar;

pub const EPISODE_SEED: &[u8] = b"episode";

/// keccak-256 of a chapter, group or event label.
pub fn hash_label(label: &str) -> [u8; 32] {
    Keccak256::digest(label.as_bytes()).into()
}

fn discriminator(namespace: &str, name: &str) -> [u8; 8] {
    let hash = Sha256::digest(format!("{namespace}:{name}"));
    let mut disc = [0u8; 8];
    disc.copy_from_slice(&hash[..8]);
    disc
}

/// `sha256("global:<name>")[..8]`
pub fn instruction_discriminator(name: &str) -> [u8; 8] {
    discriminator("global", name)
}

/// `sha256("event:<Name>")[..8]`
pub fn event_discriminator(name: &str) -> [u8; 8] {
    discriminator("event", name)
}

/// `sha256("account:<Name>")[..8]`
pub fn account_discriminator(name: &str) -> [u8; 8] {
    discriminator("account", name)
}

/// Episode PDA for `owner` and `name`.
pub fn episode_address(program_id: &Pubkey, owner: &Pubkey, name: &str) -> Pubkey {
    Pubkey::find_program_address(
        &[EPISODE_SEED, owner.as_ref(), &hash_label(name)],
        program_id,
    )
    .0
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MintingConfig {
    pub limit: u64,
    /// Lamports per token.
    pub price: u64,
    pub is_open: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChapterConfig {
    pub whitelisting: bool,
    pub minting: MintingConfig,
    pub revealing: bool,
    pub is_conclusion: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintGroupRules {
    pub enabled: bool,
    pub fixed_price: bool,
}

/// Borsh writer for instruction arguments.
struct Args(Vec<u8>);

impl Args {
    fn new(instruction: &str) -> Self {
        Self(instruction_discriminator(instruction).to_vec())
    }

    fn bool(mut self, value: bool) -> Self {
        self.0.push(value as u8);
        self
    }

    fn u64(mut self, value: u64) -> Self {
        self.0.extend_from_slice(&value.to_le_bytes());
        self
    }

    fn bytes32(mut self, value: &[u8; 32]) -> Self {
        self.0.extend_from_slice(value);
        self
    }

    fn string(mut self, value: &str) -> Self {
        self.0
            .extend_from_slice(&(value.len() as u32).to_le_bytes());
        self.0.extend_from_slice(value.as_bytes());
        self
    }

    fn option_string(mut self, value: Option<&str>) -> Self {
        match value {
            None => {
                self.0.push(0);
                self
            }
            Some(value) => {
                self.0.push(1);
                self.string(value)
            }
        }
    }

    fn chapter_config(self, config: &ChapterConfig) -> Self {
        self.bool(config.whitelisting)
            .u64(config.minting.limit)
            .u64(config.minting.price)
            .bool(config.minting.is_open)
            .bool(config.revealing)
            .bool(config.is_conclusion)
    }

    fn finish(self) -> Vec<u8> {
        self.0
    }
}

fn owner_action(program_id: &Pubkey, owner: &Pubkey, episode: &Pubkey, data: Vec<u8>) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*owner, true),
            AccountMeta::new(*episode, false),
        ],
        data,
    }
}

/// Arguments of the `initialize` instruction.
pub struct InitializeArgs<'a> {
    pub name: &'a str,
    pub initial_chapter: &'a str,
    pub initial_config: ChapterConfig,
    pub max_supply: u64,
    pub veil_uri: &'a str,
    pub base_uri: &'a str,
}

pub fn initialize(
    program_id: &Pubkey,
    owner: &Pubkey,
    vrf_authority: &Pubkey,
    treasury: &Pubkey,
    args: &InitializeArgs,
) -> Instruction {
    let episode = episode_address(program_id, owner, args.name);
    let data = Args::new("initialize")
        .string(args.name)
        .string(args.initial_chapter)
        .chapter_config(&args.initial_config)
        .u64(args.max_supply)
        .string(args.veil_uri)
        .string(args.base_uri)
        .finish();

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*owner, true),
            AccountMeta::new_readonly(*vrf_authority, false),
            AccountMeta::new_readonly(*treasury, false),
            AccountMeta::new(episode, false),
            AccountMeta::new_readonly(system_program::ID, false),
        ],
        data,
    }
}

pub fn write_chapter(
    program_id: &Pubkey,
    owner: &Pubkey,
    episode: &Pubkey,
    label: &str,
    config: &ChapterConfig,
) -> Instruction {
    let data = Args::new("write_chapter")
        .string(label)
        .chapter_config(config)
        .finish();
    owner_action(program_id, owner, episode, data)
}

pub fn write_mint_group(
    program_id: &Pubkey,
    owner: &Pubkey,
    episode: &Pubkey,
    chapter: &str,
    group: &str,
    rules: &MintGroupRules,
) -> Instruction {
    let data = Args::new("write_mint_group")
        .string(chapter)
        .string(group)
        .bool(rules.enabled)
        .bool(rules.fixed_price)
        .finish();
    owner_action(program_id, owner, episode, data)
}

pub fn write_transition(
    program_id: &Pubkey,
    owner: &Pubkey,
    episode: &Pubkey,
    from: &str,
    to: &str,
    event: &str,
) -> Instruction {
    let data = Args::new("write_transition")
        .string(from)
        .string(to)
        .string(event)
        .finish();
    owner_action(program_id, owner, episode, data)
}

pub fn set_whitelist_root(
    program_id: &Pubkey,
    owner: &Pubkey,
    episode: &Pubkey,
    root: &[u8; 32],
) -> Instruction {
    let data = Args::new("set_whitelist_root").bytes32(root).finish();
    owner_action(program_id, owner, episode, data)
}

/// `None` progresses on `EpisodeProgressedOnlife`.
pub fn emit_onlife_event(
    program_id: &Pubkey,
    owner: &Pubkey,
    episode: &Pubkey,
    label: Option<&str>,
) -> Instruction {
    let data = Args::new("emit_onlife_event").option_string(label).finish();
    owner_action(program_id, owner, episode, data)
}

pub fn reveal(program_id: &Pubkey, owner: &Pubkey, episode: &Pubkey) -> Instruction {
    owner_action(program_id, owner, episode, Args::new("reveal").finish())
}

/// `fulfill_randomness`; must follow the Ed25519 proof at index 0.
pub fn fulfill_randomness(
    program_id: &Pubkey,
    vrf_authority: &Pubkey,
    episode: &Pubkey,
    request_id: u64,
    randomness: &[u8; 32],
) -> Instruction {
    let data = Args::new("fulfill_randomness")
        .u64(request_id)
        .bytes32(randomness)
        .finish();

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*vrf_authority, true),
            AccountMeta::new(*episode, false),
            AccountMeta::new_readonly(sysvar::instructions::ID, false),
        ],
        data,
    }
}
