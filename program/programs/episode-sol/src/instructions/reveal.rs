use anchor_lang::prelude::*;

use crate::events::RandomnessRequested;
use crate::instructions::owner_action::OwnerAction;

/// Request reveal randomness from the oracle.
///
/// Only valid in a revealing chapter and only once per episode. Emits
/// [`RandomnessRequested`], which the oracle backend answers with
/// `fulfill_randomness`.
pub fn handler(ctx: Context<OwnerAction>) -> Result<()> {
    let slot = Clock::get()?.slot;
    let episode_key = ctx.accounts.episode.key();
    let episode = &mut ctx.accounts.episode;
    let request_id = episode.request_reveal(&episode_key, slot)?;

    emit!(RandomnessRequested {
        episode: episode_key,
        request_id,
        seed: episode.reveal.request_seed,
        request_slot: slot,
    });

    msg!("Reveal requested, request_id={}", request_id);
    Ok(())
}
