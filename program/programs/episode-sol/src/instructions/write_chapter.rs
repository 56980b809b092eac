use anchor_lang::prelude::*;

use crate::events::ChapterWritten;
use crate::instructions::owner_action::OwnerAction;
use crate::state::{checked_label_hash, ChapterConfig};

/// Create or overwrite a chapter while the episode is in configuration.
pub fn handler(ctx: Context<OwnerAction>, label: String, config: ChapterConfig) -> Result<()> {
    let chapter = checked_label_hash(&label)?;
    let episode = &mut ctx.accounts.episode;
    episode.write_chapter(chapter, config)?;

    emit!(ChapterWritten {
        episode: episode.key(),
        label,
        chapter,
        whitelisting: config.whitelisting,
        limit: config.minting.limit,
        price: config.minting.price,
        is_open: config.minting.is_open,
        revealing: config.revealing,
        is_conclusion: config.is_conclusion,
    });
    Ok(())
}
