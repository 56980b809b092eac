use anchor_lang::prelude::*;

use crate::events::WhitelistRootSet;
use crate::instructions::owner_action::OwnerAction;

/// Replace the whitelist root. Only while the current chapter enables whitelisting.
pub fn handler(ctx: Context<OwnerAction>, root: [u8; 32]) -> Result<()> {
    let episode = &mut ctx.accounts.episode;
    episode.set_whitelist_root(root)?;

    emit!(WhitelistRootSet {
        episode: episode.key(),
        root,
    });
    Ok(())
}
