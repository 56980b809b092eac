use anchor_lang::prelude::*;

use crate::events::MintGroupWritten;
use crate::instructions::owner_action::OwnerAction;
use crate::state::{checked_label_hash, MintGroupRules};

/// Admit the whitelist cohort of `group_label` into `chapter_label`.
pub fn handler(
    ctx: Context<OwnerAction>,
    chapter_label: String,
    group_label: String,
    rules: MintGroupRules,
) -> Result<()> {
    let chapter = checked_label_hash(&chapter_label)?;
    let group = checked_label_hash(&group_label)?;
    let episode = &mut ctx.accounts.episode;
    episode.write_mint_group(chapter, group, rules)?;

    emit!(MintGroupWritten {
        episode: episode.key(),
        chapter_label,
        group_label,
        rules,
    });
    Ok(())
}
