use anchor_lang::prelude::*;

use crate::errors::EpisodeError;
use crate::instructions::mint::settle_mint;
use crate::state::{Episode, MintRecord, WhitelistClaim};

/// Accounts required for a mint backed by a whitelist allocation.
///
/// The mint record is keyed by the allowance the proof draws on: the proven
/// group's allocation, shared across every chapter that admits the group,
/// or the public cap of an open chapter that does not admit it.
#[derive(Accounts)]
#[instruction(quantity: u64, offer: u64, limit: u64, group: [u8; 32])]
pub struct MintWhitelisted<'info> {
    /// The whitelisted account; pays the offer and the record rent.
    #[account(mut)]
    pub minter: Signer<'info>,

    #[account(
        mut,
        has_one = treasury @ EpisodeError::TreasuryMismatch,
    )]
    pub episode: Account<'info, Episode>,

    /// Seeds: `["mint-record", episode, minter, allowance, group]`, resolved
    /// by `Episode::mint_allowance`.
    #[account(
        init_if_needed,
        payer = minter,
        space = 8 + MintRecord::INIT_SPACE,
        seeds = [
            MintRecord::SEED_PREFIX,
            episode.key().as_ref(),
            minter.key().as_ref(),
            episode.mint_allowance(Some(&group)).0.seed(),
            episode.mint_allowance(Some(&group)).1.as_ref(),
        ],
        bump,
    )]
    pub mint_record: Account<'info, MintRecord>,

    /// Payment recipient; must match `episode.treasury`.
    /// CHECK: Validated by the `has_one` constraint on `episode`.
    #[account(mut)]
    pub treasury: UncheckedAccount<'info>,

    pub system_program: Program<'info, System>,
}

/// Mint against the allocation `(minter, limit, group)` proven by `proof`.
pub fn handler(
    ctx: Context<MintWhitelisted>,
    quantity: u64,
    offer: u64,
    limit: u64,
    group: [u8; 32],
    proof: Vec<[u8; 32]>,
) -> Result<()> {
    let accounts = &mut *ctx.accounts;
    let minter = accounts.minter.key();
    let (allowance, record_group) = accounts.episode.mint_allowance(Some(&group));
    let record_group = *record_group;
    accounts.mint_record.bind(
        accounts.episode.key(),
        minter,
        allowance,
        record_group,
        ctx.bumps.mint_record,
    );

    let claim = WhitelistClaim {
        limit,
        group,
        proof,
    };
    let quote = accounts.episode.quote_mint(
        &minter,
        quantity,
        offer,
        Some(&claim),
        accounts.mint_record.minted,
    )?;
    settle_mint(
        &mut accounts.episode,
        &mut accounts.mint_record,
        &accounts.minter,
        &accounts.treasury,
        &accounts.system_program,
        &quote,
    )
}
