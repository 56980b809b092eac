use anchor_lang::prelude::*;

use crate::errors::EpisodeError;
use crate::state::labels::Hash;

/// Which cap a mint is counted against.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash, InitSpace)]
pub enum Allowance {
    /// `MAX_MINTABLE` per account in the current chapter.
    #[default]
    Public,
    /// The `limit` of a proven whitelist leaf.
    Whitelist,
}

impl Allowance {
    pub fn seed(self) -> &'static [u8] {
        match self {
            Allowance::Public => b"public",
            Allowance::Whitelist => b"whitelist",
        }
    }
}

/// Tokens minted by one account under one allowance.
///
/// Seeds: `["mint-record", episode, minter, allowance, group]`
///
/// `group` is the whitelist chapter for proven mints and the current chapter
/// for public mints, so public allowances reset from chapter to chapter and
/// never share a counter with a whitelist allocation.
#[account]
#[derive(InitSpace)]
pub struct MintRecord {
    pub episode: Pubkey,
    pub minter: Pubkey,
    pub allowance: Allowance,
    pub group: [u8; 32],
    pub minted: u64,
    /// PDA bump seed cached for efficient re-derivation.
    pub bump: u8,
}

impl MintRecord {
    pub const SEED_PREFIX: &'static [u8] = b"mint-record";

    /// Bind a record created by `init_if_needed`. No-op once bound.
    pub fn bind(
        &mut self,
        episode: Pubkey,
        minter: Pubkey,
        allowance: Allowance,
        group: Hash,
        bump: u8,
    ) {
        if self.episode == Pubkey::default() {
            self.episode = episode;
            self.minter = minter;
            self.allowance = allowance;
            self.group = group;
            self.minted = 0;
            self.bump = bump;
        }
    }

    pub fn record(&mut self, quantity: u64) -> Result<()> {
        self.minted = self
            .minted
            .checked_add(quantity)
            .ok_or(EpisodeError::ArithmeticOverflow)?;
        Ok(())
    }
}
