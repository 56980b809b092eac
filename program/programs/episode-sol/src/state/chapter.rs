use anchor_lang::prelude::*;

use crate::errors::EpisodeError;
use crate::state::labels::Hash;

pub const MAX_CHAPTERS: usize = 16;
pub const MAX_MINT_GROUPS: usize = 32;

/// Minting policy of a chapter.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq, InitSpace)]
pub struct MintingConfig {
    /// Collection supply at which the chapter is minted out. Zero disables minting.
    pub limit: u64,
    /// Lamports per token for native and public mints.
    pub price: u64,
    /// Whether accounts without a whitelist proof may mint.
    pub is_open: bool,
}

/// Policy flags written for a chapter during configuration.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq, InitSpace)]
pub struct ChapterConfig {
    pub whitelisting: bool,
    pub minting: MintingConfig,
    pub revealing: bool,
    pub is_conclusion: bool,
}

impl ChapterConfig {
    pub fn validate(&self, max_supply: u64) -> Result<()> {
        require!(
            !(self.revealing && self.minting.limit > 0),
            EpisodeError::InvalidChapter
        );
        require!(
            self.minting.limit <= max_supply,
            EpisodeError::ChapterLimitExceedsSupply
        );
        Ok(())
    }

    pub fn mints(&self) -> bool {
        self.minting.limit > 0
    }
}

/// A chapter as stored in the episode account.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq, InitSpace)]
pub struct Chapter {
    /// keccak-256 of the chapter label; also its automaton state id.
    pub id: [u8; 32],
    pub config: ChapterConfig,
}

/// Flags of a mint group rule, as passed to `write_mint_group`.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq, InitSpace)]
pub struct MintGroupRules {
    pub enabled: bool,
    /// Mint at the group's own chapter price instead of the current one.
    pub fixed_price: bool,
}

/// Admits the whitelist cohort of chapter `group` into chapter `chapter`.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq, InitSpace)]
pub struct MintGroupRule {
    pub chapter: [u8; 32],
    pub group: [u8; 32],
    pub rules: MintGroupRules,
}

impl MintGroupRule {
    pub fn references(&self, chapter: &Hash) -> bool {
        self.chapter == *chapter || self.group == *chapter
    }
}
