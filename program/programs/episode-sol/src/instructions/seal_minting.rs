use anchor_lang::prelude::*;

use crate::events::emit_lifecycle;
use crate::instructions::owner_action::OwnerAction;
use crate::state::LifecycleEvent;

/// Close the current minting chapter before it reaches its limit.
pub fn handler(ctx: Context<OwnerAction>) -> Result<()> {
    let episode = &mut ctx.accounts.episode;
    match episode.seal_minting()? {
        Some(step) => emit_lifecycle(episode.key(), LifecycleEvent::MintingSealed, step),
        None => msg!("MintingSealed has no edge from the current chapter"),
    }
    Ok(())
}
