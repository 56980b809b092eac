use anchor_lang::prelude::*;

use crate::events::EpisodeInitialized;
use crate::state::{checked_label_hash, hash_label, ChapterConfig, Episode};

/// Accounts required to create an episode.
#[derive(Accounts)]
#[instruction(name: String)]
pub struct InitializeEpisode<'info> {
    /// Initial owner who pays for account creation.
    #[account(mut)]
    pub owner: Signer<'info>,

    /// The oracle's Ed25519 public key that will sign reveal randomness.
    /// CHECK: Stored as configuration; validated to be non-zero.
    pub vrf_authority: UncheckedAccount<'info>,

    /// Receives mint payments.
    /// CHECK: Stored as configuration; validated to be non-zero.
    pub treasury: UncheckedAccount<'info>,

    /// Episode PDA. Seeds: `["episode", owner, keccak256(name)]`.
    #[account(
        init,
        payer = owner,
        space = 8 + Episode::INIT_SPACE,
        seeds = [Episode::SEED_PREFIX, owner.key().as_ref(), hash_label(&name).as_ref()],
        bump,
    )]
    pub episode: Account<'info, Episode>,

    pub system_program: Program<'info, System>,
}

/// Create the episode sitting in its initial (configuration) chapter.
#[allow(clippy::too_many_arguments)]
pub fn handler(
    ctx: Context<InitializeEpisode>,
    name: String,
    initial_chapter: String,
    initial_config: ChapterConfig,
    max_supply: u64,
    veil_uri: String,
    base_uri: String,
) -> Result<()> {
    let name_hash = checked_label_hash(&name)?;
    let chapter = checked_label_hash(&initial_chapter)?;
    let episode_key = ctx.accounts.episode.key();

    let episode = &mut ctx.accounts.episode;
    episode.setup(
        ctx.accounts.owner.key(),
        ctx.accounts.vrf_authority.key(),
        ctx.accounts.treasury.key(),
        name_hash,
        max_supply,
        chapter,
        initial_config,
        ctx.bumps.episode,
    )?;
    episode.set_uris(Some(veil_uri), Some(base_uri))?;

    emit!(EpisodeInitialized {
        episode: episode_key,
        owner: episode.owner,
        name,
        initial_chapter: chapter,
        max_supply,
    });

    msg!("Episode initialized, max_supply={}", max_supply);
    Ok(())
}
