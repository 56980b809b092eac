use anchor_lang::prelude::*;

use crate::events::MintGroupRemoved;
use crate::instructions::owner_action::OwnerAction;

pub fn handler(ctx: Context<OwnerAction>, chapter: [u8; 32], group: [u8; 32]) -> Result<()> {
    let episode = &mut ctx.accounts.episode;
    episode.remove_mint_group(&chapter, &group)?;

    emit!(MintGroupRemoved {
        episode: episode.key(),
        chapter,
        group,
    });
    Ok(())
}
