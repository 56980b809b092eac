use anchor_lang::prelude::*;

use crate::state::{Episode, MintGroupRules};

/// Read-only access to an episode for view instructions.
#[derive(Accounts)]
pub struct EpisodeView<'info> {
    pub episode: Account<'info, Episode>,
}

pub fn token_uri(ctx: Context<EpisodeView>, token_id: u64) -> Result<String> {
    ctx.accounts.episode.token_uri(token_id)
}

pub fn current_default_price(ctx: Context<EpisodeView>) -> Result<u64> {
    ctx.accounts.episode.current_default_price()
}

pub fn current_group_price(ctx: Context<EpisodeView>, group: [u8; 32]) -> Result<u64> {
    ctx.accounts.episode.current_group_price(&group)
}

pub fn offer_matches_group_price(
    ctx: Context<EpisodeView>,
    group: [u8; 32],
    quantity: u64,
    offer: u64,
) -> Result<bool> {
    ctx.accounts
        .episode
        .offer_matches_group_price(&group, quantity, offer)
}

pub fn group_rule(ctx: Context<EpisodeView>, group: [u8; 32]) -> Result<Option<MintGroupRules>> {
    Ok(ctx.accounts.episode.group_rule(&group))
}

pub fn is_final(ctx: Context<EpisodeView>) -> Result<bool> {
    Ok(ctx.accounts.episode.is_final())
}
