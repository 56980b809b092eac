//! Episode layout files.
//!
//! A layout describes one episode the way an operator thinks about it:
//! labelled chapters with their minting rules, the groups each chapter
//! admits and the branching between chapters. It is checked locally against
//! the same rules the program enforces, then turned into the instruction
//! sequence that creates and configures the episode.

use anyhow::{Context, Result, bail, ensure};
use serde::{Deserialize, Serialize};
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::str::FromStr;

use crate::instructions::{self, ChapterConfig, InitializeArgs, MintGroupRules, hash_label};

pub const MAX_LABEL_LEN: usize = 64;
pub const MAX_URI_LEN: usize = 128;
pub const MAX_CHAPTERS: usize = 16;
pub const MAX_EVENTS: usize = 16;
pub const MAX_TRANSITIONS: usize = 48;
pub const MAX_MINT_GROUPS: usize = 32;

/// Events fired by the program itself.
pub const LIFECYCLE_EVENTS: [&str; 5] = [
    "EpisodeProgressedOnlife",
    "ChapterMinted",
    "EpisodeMinted",
    "MintingSealed",
    "EpisodeRevealed",
];

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChapterEntry {
    pub label: String,
    #[serde(flatten)]
    pub config: ChapterConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MintGroupEntry {
    pub chapter: String,
    pub group: String,
    #[serde(flatten)]
    pub rules: MintGroupRules,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransitionEntry {
    pub from: String,
    pub event: String,
    pub to: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EpisodeLayout {
    pub name: String,
    pub max_supply: u64,
    #[serde(default)]
    pub veil_uri: String,
    #[serde(default)]
    pub base_uri: String,
    /// Oracle key (base58); defaults to the operator keypair.
    #[serde(default)]
    pub vrf_authority: Option<String>,
    /// Payment receiver (base58); defaults to the operator keypair.
    #[serde(default)]
    pub treasury: Option<String>,
    pub initial_chapter: String,
    pub chapters: Vec<ChapterEntry>,
    #[serde(default)]
    pub mint_groups: Vec<MintGroupEntry>,
    #[serde(default)]
    pub transitions: Vec<TransitionEntry>,
}

fn parse_key(field: &str, value: Option<&String>, fallback: &Pubkey) -> Result<Pubkey> {
    match value {
        None => Ok(*fallback),
        Some(value) => Pubkey::from_str(value).with_context(|| format!("invalid {field} {value}")),
    }
}

fn check_label(kind: &str, label: &str) -> Result<()> {
    ensure!(
        !label.is_empty() && label.len() <= MAX_LABEL_LEN,
        "{kind} label {label:?} must be 1..={MAX_LABEL_LEN} bytes"
    );
    Ok(())
}

impl EpisodeLayout {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let layout: Self = serde_json::from_str(&raw)
            .with_context(|| format!("invalid episode layout {}", path.display()))?;
        layout.validate()?;
        Ok(layout)
    }

    fn chapter(&self, label: &str) -> Option<&ChapterEntry> {
        self.chapters.iter().find(|c| c.label == label)
    }

    /// Reject anything the program would refuse, before any fee is paid.
    pub fn validate(&self) -> Result<()> {
        check_label("episode", &self.name)?;
        ensure!(self.max_supply > 0, "max_supply must be non-zero");
        ensure!(self.veil_uri.len() <= MAX_URI_LEN, "veil_uri too long");
        ensure!(self.base_uri.len() <= MAX_URI_LEN, "base_uri too long");
        ensure!(
            self.chapters.len() <= MAX_CHAPTERS,
            "at most {MAX_CHAPTERS} chapters"
        );
        ensure!(
            self.mint_groups.len() <= MAX_MINT_GROUPS,
            "at most {MAX_MINT_GROUPS} mint groups"
        );
        ensure!(
            self.transitions.len() <= MAX_TRANSITIONS,
            "at most {MAX_TRANSITIONS} transitions"
        );

        let mut labels = HashSet::new();
        for chapter in &self.chapters {
            check_label("chapter", &chapter.label)?;
            ensure!(
                labels.insert(chapter.label.as_str()),
                "chapter {:?} listed twice",
                chapter.label
            );
            let minting = &chapter.config.minting;
            ensure!(
                !(chapter.config.revealing && minting.limit > 0),
                "chapter {:?} cannot both mint and reveal",
                chapter.label
            );
            ensure!(
                minting.limit <= self.max_supply,
                "chapter {:?} limit exceeds max_supply",
                chapter.label
            );
        }
        ensure!(
            self.chapter(&self.initial_chapter).is_some(),
            "initial chapter {:?} is not listed",
            self.initial_chapter
        );

        let mut pairs = HashSet::new();
        for rule in &self.mint_groups {
            ensure!(
                rule.chapter != rule.group,
                "mint group {:?} refers to its own chapter",
                rule.chapter
            );
            for label in [&rule.chapter, &rule.group] {
                let Some(chapter) = self.chapter(label) else {
                    bail!("mint group refers to unknown chapter {label:?}");
                };
                ensure!(
                    chapter.config.minting.limit > 0,
                    "mint group refers to non-minting chapter {label:?}"
                );
            }
            ensure!(
                pairs.insert((&rule.chapter, &rule.group)),
                "mint group ({:?}, {:?}) listed twice",
                rule.chapter,
                rule.group
            );
        }

        let mut edges = HashSet::new();
        let mut events = HashSet::new();
        for transition in &self.transitions {
            check_label("event", &transition.event)?;
            for label in [&transition.from, &transition.to] {
                ensure!(
                    self.chapter(label).is_some(),
                    "transition refers to unknown chapter {label:?}"
                );
            }
            ensure!(
                edges.insert((&transition.from, &transition.event)),
                "transition ({:?}, {:?}) listed twice",
                transition.from,
                transition.event
            );
            events.insert(transition.event.as_str());
        }
        ensure!(events.len() <= MAX_EVENTS, "at most {MAX_EVENTS} distinct events");

        let placeholder = Pubkey::default();
        parse_key("vrf_authority", self.vrf_authority.as_ref(), &placeholder)?;
        parse_key("treasury", self.treasury.as_ref(), &placeholder)?;
        Ok(())
    }

    /// Full instruction sequence: `initialize`, the remaining chapters, mint
    /// groups, then transitions. Transitions come last so every endpoint
    /// already exists.
    pub fn plan(
        &self,
        program_id: &Pubkey,
        operator: &Pubkey,
    ) -> Result<(Pubkey, Vec<Instruction>)> {
        let initial = self
            .chapter(&self.initial_chapter)
            .ok_or_else(|| anyhow::anyhow!("initial chapter {:?} is not listed", self.initial_chapter))?;
        let episode = instructions::episode_address(program_id, operator, &self.name);

        let vrf_authority = parse_key("vrf_authority", self.vrf_authority.as_ref(), operator)?;
        let treasury = parse_key("treasury", self.treasury.as_ref(), operator)?;

        let mut plan = vec![instructions::initialize(
            program_id,
            operator,
            &vrf_authority,
            &treasury,
            &InitializeArgs {
                name: &self.name,
                initial_chapter: &initial.label,
                initial_config: initial.config,
                max_supply: self.max_supply,
                veil_uri: &self.veil_uri,
                base_uri: &self.base_uri,
            },
        )];
        plan.extend(
            self.chapters
                .iter()
                .filter(|c| c.label != self.initial_chapter)
                .map(|c| instructions::write_chapter(program_id, operator, &episode, &c.label, &c.config)),
        );
        plan.extend(self.mint_groups.iter().map(|rule| {
            instructions::write_mint_group(
                program_id,
                operator,
                &episode,
                &rule.chapter,
                &rule.group,
                &rule.rules,
            )
        }));
        plan.extend(self.transitions.iter().map(|t| {
            instructions::write_transition(program_id, operator, &episode, &t.from, &t.to, &t.event)
        }));
        Ok((episode, plan))
    }

    /// Reverse lookup from on-chain hashes to the labels of this layout.
    pub fn label_book(&self) -> LabelBook {
        let mut book = LabelBook::default();
        for chapter in &self.chapters {
            book.insert(&chapter.label);
        }
        for transition in &self.transitions {
            book.insert(&transition.event);
        }
        book
    }
}

/// Hash to label table. Always knows the lifecycle event labels.
#[derive(Clone, Debug)]
pub struct LabelBook(HashMap<[u8; 32], String>);

impl Default for LabelBook {
    fn default() -> Self {
        let mut book = Self(HashMap::new());
        for label in LIFECYCLE_EVENTS {
            book.insert(label);
        }
        book
    }
}

impl LabelBook {
    pub fn insert(&mut self, label: &str) {
        self.0.insert(hash_label(label), label.to_string());
    }

    /// The label for `hash`, or its hex form when unknown.
    pub fn describe(&self, hash: &[u8; 32]) -> String {
        self.0
            .get(hash)
            .cloned()
            .unwrap_or_else(|| format!("0x{}", hex::encode(hash)))
    }
}
