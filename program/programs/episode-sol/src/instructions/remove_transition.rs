use anchor_lang::prelude::*;

use crate::events::TransitionRemoved;
use crate::instructions::owner_action::OwnerAction;

pub fn handler(ctx: Context<OwnerAction>, from: [u8; 32], event: [u8; 32]) -> Result<()> {
    let episode = &mut ctx.accounts.episode;
    episode.remove_transition(&from, &event)?;

    emit!(TransitionRemoved {
        episode: episode.key(),
        from,
        event,
    });
    Ok(())
}
