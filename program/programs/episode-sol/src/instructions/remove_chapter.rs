use anchor_lang::prelude::*;

use crate::events::ChapterRemoved;
use crate::instructions::owner_action::OwnerAction;

/// Remove a non-initial chapter along with its transitions and mint group rules.
pub fn handler(ctx: Context<OwnerAction>, chapter: [u8; 32]) -> Result<()> {
    let episode = &mut ctx.accounts.episode;
    episode.remove_chapter(&chapter)?;

    emit!(ChapterRemoved {
        episode: episode.key(),
        chapter,
    });
    Ok(())
}
